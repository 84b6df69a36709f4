use crate::shared::{RunId, RunKind};

const API_PREFIX: &str = "api/v1";

/// Resource paths, relative to the backend base URL.
///
/// Workflow runs (`wr_` prefix) live under the workflow-scoped resource
/// family; everything else uses the flat run resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunRoutes;

impl RunRoutes {
    pub fn run(run_id: &RunId) -> String {
        format!("{API_PREFIX}/runs/{}", encode(run_id.as_str()))
    }

    pub fn timeline(run_id: &RunId) -> String {
        match run_id.kind() {
            RunKind::Workflow => format!(
                "{API_PREFIX}/workflows/runs/{}/timeline",
                encode(run_id.as_str())
            ),
            RunKind::Task => format!("{API_PREFIX}/runs/{}/timeline", encode(run_id.as_str())),
        }
    }

    pub fn run_artifacts(run_id: &RunId) -> String {
        format!("{API_PREFIX}/runs/{}/artifacts", encode(run_id.as_str()))
    }

    pub fn block_artifacts(block_id: &str) -> String {
        format!(
            "{API_PREFIX}/workflow_run_blocks/{}/artifacts",
            encode(block_id)
        )
    }

    pub fn cancel(run_id: &RunId) -> String {
        match run_id.kind() {
            RunKind::Workflow => format!(
                "{API_PREFIX}/workflows/runs/{}/cancel",
                encode(run_id.as_str())
            ),
            RunKind::Task => format!("{API_PREFIX}/runs/{}/cancel", encode(run_id.as_str())),
        }
    }

    pub fn stream(run_id: &RunId) -> String {
        match run_id.kind() {
            RunKind::Workflow => format!(
                "{API_PREFIX}/stream/workflow_runs/{}",
                encode(run_id.as_str())
            ),
            RunKind::Task => format!("{API_PREFIX}/stream/tasks/{}", encode(run_id.as_str())),
        }
    }

    /// Websocket URL of a run's live stream: the API base with its scheme
    /// switched from http(s) to ws(s), authenticated by query parameter.
    pub fn stream_url(api_base: &str, api_key: Option<&str>, run_id: &RunId) -> String {
        let base = api_base.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        let mut url = format!("{base}/{}", Self::stream(run_id));
        if let Some(key) = api_key.filter(|key| !key.trim().is_empty()) {
            url.push_str("?apikey=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

fn encode(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}
