use super::labels::count_label;
use crate::run::{failure_heading, group_artifacts, Artifact, Run, RunAffordances};
use crate::shared::time::{format_duration_secs, parse_timestamp};
use crate::timeline::Timeline;
use crate::view::ArtifactUrlProxy;
use std::fmt::Write as _;

/// Header lines for a run: status, counters, timing and failure details.
pub fn render_run_header(run: &Run, timeline: &Timeline) -> String {
    let mut out = String::new();
    let title = run.title().unwrap_or(run.run_id.as_str());
    let status = run.status.as_deref().unwrap_or("unknown");
    let _ = writeln!(out, "{title} [{status}]");
    let _ = writeln!(
        out,
        "{} | {}",
        count_label(run.step_count() as usize, "step"),
        count_label(timeline.count_actions(), "action")
    );
    if let Some(elapsed) = elapsed_secs(run) {
        let _ = writeln!(out, "elapsed: {}", format_duration_secs(elapsed));
    }

    let affordances = RunAffordances::for_run(Some(run));
    let mut available = Vec::new();
    if affordances.can_cancel {
        available.push("cancel");
    }
    if affordances.can_rerun {
        available.push("rerun");
    }
    if !available.is_empty() {
        let _ = writeln!(out, "actions: {}", available.join(", "));
    }

    if let (Some(heading), Some(reason)) = (failure_heading(run), run.failure_reason.as_deref()) {
        let _ = writeln!(out, "{heading}: {reason}");
    }
    if let Some(recording) = run.recording_url.as_deref() {
        let _ = writeln!(out, "recording: {recording}");
    }
    for file in &run.downloaded_files {
        let _ = writeln!(out, "download: {} ({})", file.name(), file.url());
    }
    out
}

fn elapsed_secs(run: &Run) -> Option<f64> {
    let started = parse_timestamp(run.started_at.as_deref()?)?;
    let finished = parse_timestamp(run.finished_at.as_deref()?)?;
    let millis = (finished - started).num_milliseconds();
    (millis >= 0).then(|| millis as f64 / 1000.0)
}

/// Artifact list grouped by category, one URL per line.
pub fn render_artifacts(artifacts: &[Artifact], proxy: &ArtifactUrlProxy) -> String {
    let mut out = String::new();
    for (category, items) in group_artifacts(artifacts) {
        let _ = writeln!(out, "{} ({})", category.label(), items.len());
        for artifact in items {
            let url = artifact
                .fetch_url()
                .map(|url| proxy.rewrite(url))
                .unwrap_or_default();
            let _ = writeln!(out, "  {} {}", artifact.file_name(), url);
        }
    }
    out
}
