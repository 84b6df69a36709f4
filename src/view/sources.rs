use super::ArtifactUrlProxy;
use crate::run::{sort_chronologically, Artifact, Run};

/// Artifact types that count as run screenshots.
pub const SCREENSHOT_TYPES: [&str; 5] = [
    "screenshot_action",
    "screenshot_final",
    "screenshot",
    "screenshot_streaming",
    "screenshot_llm",
];

/// The artifact type whose latest entry stands in for a block's live view.
pub const BLOCK_SCREENSHOT_TYPE: &str = "screenshot_llm";

/// Chronological screenshot history of a run, oldest first.
///
/// The run record's own URL list wins when it has entries; otherwise the
/// screenshot artifacts are used, ordered by creation time.
pub fn run_screenshot_urls(
    run: Option<&Run>,
    artifacts: &[Artifact],
    proxy: &ArtifactUrlProxy,
) -> Vec<String> {
    let from_run: Vec<String> = run
        .and_then(|run| run.screenshot_urls.as_deref())
        .unwrap_or_default()
        .iter()
        .filter(|url| !url.trim().is_empty())
        .map(|url| proxy.rewrite(url))
        .collect();
    if !from_run.is_empty() {
        return from_run;
    }

    let mut shots: Vec<Artifact> = artifacts
        .iter()
        .filter(|artifact| SCREENSHOT_TYPES.contains(&artifact.artifact_type.as_str()))
        .cloned()
        .collect();
    sort_chronologically(&mut shots);
    shots
        .iter()
        .filter_map(Artifact::fetch_url)
        .map(|url| proxy.rewrite(url))
        .collect()
}

pub fn block_screenshot_url(block_artifacts: &[Artifact], proxy: &ArtifactUrlProxy) -> Option<String> {
    block_artifacts
        .iter()
        .rev()
        .find(|artifact| artifact.artifact_type == BLOCK_SCREENSHOT_TYPE)
        .and_then(Artifact::fetch_url)
        .map(|url| proxy.rewrite(url))
}

/// Browser-loadable form of a base64 stream frame.
pub fn frame_data_url(frame: &str) -> String {
    if frame.starts_with("data:") {
        frame.to_string()
    } else {
        format!("data:image/png;base64,{frame}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(kind: &str, url: &str, created_at: Option<&str>) -> Artifact {
        Artifact {
            artifact_id: format!("a_{url}"),
            artifact_type: kind.to_string(),
            uri: format!("s3://bucket/{url}"),
            signed_url: Some(format!("https://cdn.example.com/{url}")),
            created_at: created_at.map(str::to_string),
        }
    }

    #[test]
    fn run_url_list_wins_over_artifacts() {
        let run = Run {
            screenshot_urls: Some(vec!["https://cdn.example.com/r1.png".to_string()]),
            ..Run::default()
        };
        let artifacts = vec![artifact("screenshot", "x.png", None)];
        assert_eq!(
            run_screenshot_urls(Some(&run), &artifacts, &ArtifactUrlProxy::disabled()),
            vec!["https://cdn.example.com/r1.png".to_string()]
        );
    }

    #[test]
    fn artifacts_are_filtered_and_sorted_by_creation() {
        let artifacts = vec![
            artifact("screenshot_final", "late.png", Some("2024-05-01T10:00:05Z")),
            artifact("recording", "video.webm", Some("2024-05-01T10:00:00Z")),
            artifact("screenshot_action", "early.png", Some("2024-05-01T10:00:01Z")),
        ];
        let urls = run_screenshot_urls(None, &artifacts, &ArtifactUrlProxy::disabled());
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/early.png".to_string(),
                "https://cdn.example.com/late.png".to_string(),
            ]
        );
    }

    #[test]
    fn block_screenshot_is_last_llm_shot() {
        let artifacts = vec![
            artifact("screenshot_llm", "first.png", None),
            artifact("screenshot_action", "other.png", None),
            artifact("screenshot_llm", "second.png", None),
        ];
        assert_eq!(
            block_screenshot_url(&artifacts, &ArtifactUrlProxy::disabled()).as_deref(),
            Some("https://cdn.example.com/second.png")
        );
        assert_eq!(block_screenshot_url(&[], &ArtifactUrlProxy::disabled()), None);
    }

    #[test]
    fn frame_becomes_png_data_url() {
        assert_eq!(frame_data_url("AAA"), "data:image/png;base64,AAA");
        assert_eq!(frame_data_url("data:image/jpeg;base64,AAA"), "data:image/jpeg;base64,AAA");
    }
}
