use crate::timeline::Timeline;
use std::fmt;

pub const BANNER_HEADING: &str = "Waiting for Human Review";

/// Notice shown while the run is parked on a human-review block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanReviewBanner {
    pub label: String,
    pub review_url: Option<String>,
}

impl HumanReviewBanner {
    pub fn from_timeline(timeline: &Timeline, app_url: Option<&str>) -> Option<Self> {
        let pending = timeline.find_pending_human_review()?;
        Some(Self {
            label: pending.display_label().to_string(),
            review_url: app_url
                .filter(|url| !url.trim().is_empty())
                .map(str::to_string),
        })
    }
}

impl fmt::Display for HumanReviewBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BANNER_HEADING}")?;
        write!(
            f,
            "The workflow has paused at block \"{}\" and is waiting for a human to review and approve before continuing.",
            self.label
        )?;
        if let Some(url) = &self.review_url {
            write!(f, "\nReview: {url}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::normalize_timeline;
    use serde_json::json;

    #[test]
    fn labelled_review_block_shows_its_label() {
        let timeline = normalize_timeline(&json!([
            {"type": "block", "block": {"block_type": "human_interaction", "label": "Approve invoice", "status": "running"}}
        ]));
        let banner = HumanReviewBanner::from_timeline(&timeline, Some("https://app.example.com/runs/wr_1"))
            .expect("banner");
        let text = banner.to_string();
        assert!(text.contains("\"Approve invoice\""), "{text}");
        assert!(text.ends_with("Review: https://app.example.com/runs/wr_1"), "{text}");
    }

    #[test]
    fn completed_review_block_shows_nothing() {
        let timeline = normalize_timeline(&json!([
            {"type": "block", "block": {"block_type": "human_interaction", "status": "completed"}}
        ]));
        assert!(HumanReviewBanner::from_timeline(&timeline, None).is_none());
    }
}
