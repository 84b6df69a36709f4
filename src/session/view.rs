use crate::render::{
    live_source_label, render_artifacts, render_outline, render_run_header, render_screenshot,
    HumanReviewBanner, OutlineOptions, ViewElement,
};
use crate::run::{Artifact, Run, RunAffordances, RunPhase};
use crate::shared::RunId;
use crate::stream::StreamSnapshot;
use crate::timeline::Timeline;
use crate::view::{
    block_screenshot_url, run_screenshot_urls, select_view, ArtifactUrlProxy, ScreenshotView,
    ViewInputs,
};
use std::fmt::Write as _;

/// Everything one render of the run detail needs, derived from the latest
/// resolved value of each cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RunView {
    pub run_id: RunId,
    pub run: Option<Run>,
    pub phase: RunPhase,
    pub timeline: Timeline,
    pub action_count: usize,
    pub screenshot: ScreenshotView,
    pub banner: Option<HumanReviewBanner>,
    pub affordances: RunAffordances,
    /// Run artifacts grouped by category, already rendered.
    pub artifact_summary: String,
    pub stream: StreamSnapshot,
    pub not_found: bool,
    pub errors: Vec<String>,
}

impl RunView {
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        run_id: &RunId,
        run: Option<&Run>,
        timeline: Option<&Timeline>,
        artifacts: &[Artifact],
        block_artifacts: &[Artifact],
        stream: &StreamSnapshot,
        proxy: &ArtifactUrlProxy,
        not_found: bool,
        errors: Vec<String>,
    ) -> Self {
        let phase = RunPhase::classify(run.and_then(|run| run.status.as_deref()));
        let timeline = timeline.cloned().unwrap_or_default();
        let history = run_screenshot_urls(run, artifacts, proxy);
        let block_screenshot = block_screenshot_url(block_artifacts, proxy);
        let screenshot = select_view(&ViewInputs {
            active: phase.is_active(),
            live_frame: stream.current_image.as_deref(),
            block_screenshot: block_screenshot.as_deref(),
            history: &history,
        });
        let banner = if phase.is_finished() {
            None
        } else {
            HumanReviewBanner::from_timeline(&timeline, run.and_then(|run| run.app_url.as_deref()))
        };

        Self {
            run_id: run_id.clone(),
            run: run.cloned(),
            phase,
            action_count: timeline.count_actions(),
            timeline,
            screenshot,
            banner,
            affordances: RunAffordances::for_run(run),
            artifact_summary: render_artifacts(artifacts, proxy),
            stream: stream.clone(),
            not_found,
            errors,
        }
    }

    pub fn screenshot_element(&self) -> ViewElement {
        render_screenshot(&self.screenshot)
    }

    pub fn render_text(&self, outline: &OutlineOptions) -> String {
        let mut out = String::new();
        if self.not_found {
            let _ = writeln!(out, "run {} was not found", self.run_id);
            return out;
        }
        match &self.run {
            Some(run) => out.push_str(&render_run_header(run, &self.timeline)),
            None => {
                let _ = writeln!(out, "{} [loading]", self.run_id);
            }
        }
        if let Some(banner) = &self.banner {
            let _ = writeln!(out, "\n{banner}");
        }

        let stream_state = if self.stream.is_connected {
            "connected"
        } else {
            "disconnected"
        };
        let source = match &self.screenshot {
            ScreenshotView::Live { source, .. } => {
                format!("{} from {}", self.screenshot.name(), live_source_label(*source))
            }
            other => other.name().to_string(),
        };
        let _ = writeln!(out, "\nscreenshot ({source}, stream {stream_state}):");
        let _ = writeln!(out, "{}", self.screenshot_element());

        if !self.timeline.is_empty() {
            let _ = writeln!(out, "\ntimeline:");
            out.push_str(&render_outline(&self.timeline, outline));
        }
        if !self.artifact_summary.is_empty() {
            let _ = writeln!(out, "\nartifacts:");
            out.push_str(&self.artifact_summary);
        }
        for error in &self.errors {
            let _ = writeln!(out, "error: {error}");
        }
        if let Some(error) = &self.stream.last_error {
            let _ = writeln!(out, "stream: {error}");
        }
        out
    }
}
