use super::{ApiError, RunBackend, RunRoutes};
use crate::config::Settings;
use crate::run::{parse_artifacts, parse_run, Artifact, Run};
use crate::shared::RunId;
use crate::timeline::{parse_timeline, Timeline};
use serde_json::json;
use std::time::Duration;

/// Blocking HTTP client for the automation backend.
#[derive(Debug, Clone)]
pub struct HttpRunBackend {
    api_base: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl HttpRunBackend {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            api_base: api_base.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            agent,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.api_url.clone(),
            settings.api_key.clone(),
            Duration::from_millis(settings.http.timeout_ms),
        )
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    fn with_auth(&self, request: ureq::Request) -> ureq::Request {
        match &self.api_key {
            Some(key) => request.set("x-api-key", key),
            None => request,
        }
    }

    fn get_body(&self, path: &str) -> Result<String, ApiError> {
        let request = self
            .with_auth(self.agent.get(&self.endpoint(path)))
            .set("Accept", "application/json");
        let response = request.call().map_err(|err| map_ureq_error(path, err))?;
        response.into_string().map_err(|err| ApiError::Request {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }

    fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let request = self.with_auth(self.agent.post(&self.endpoint(path)));
        request
            .send_json(json!({}))
            .map(|_| ())
            .map_err(|err| map_ureq_error(path, err))
    }
}

fn map_ureq_error(path: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(404, _) => ApiError::NotFound {
            path: path.to_string(),
        },
        ureq::Error::Status(status, _) => ApiError::Status {
            path: path.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => ApiError::Request {
            path: path.to_string(),
            reason: transport.to_string(),
        },
    }
}

fn decode_error(path: &str, reason: String) -> ApiError {
    ApiError::Decode {
        path: path.to_string(),
        reason,
    }
}

impl RunBackend for HttpRunBackend {
    fn fetch_run(&self, run_id: &RunId) -> Result<Run, ApiError> {
        let path = RunRoutes::run(run_id);
        let body = self.get_body(&path)?;
        parse_run(&body).map_err(|reason| decode_error(&path, reason))
    }

    fn fetch_timeline(&self, run_id: &RunId) -> Result<Timeline, ApiError> {
        let path = RunRoutes::timeline(run_id);
        let body = self.get_body(&path)?;
        parse_timeline(&body).map_err(|reason| decode_error(&path, reason))
    }

    fn fetch_run_artifacts(&self, run_id: &RunId) -> Result<Vec<Artifact>, ApiError> {
        let path = RunRoutes::run_artifacts(run_id);
        let body = self.get_body(&path)?;
        parse_artifacts(&body).map_err(|reason| decode_error(&path, reason))
    }

    fn fetch_block_artifacts(&self, block_id: &str) -> Result<Vec<Artifact>, ApiError> {
        let path = RunRoutes::block_artifacts(block_id);
        let body = self.get_body(&path)?;
        parse_artifacts(&body).map_err(|reason| decode_error(&path, reason))
    }

    fn cancel_run(&self, run_id: &RunId) -> Result<(), ApiError> {
        self.post_empty(&RunRoutes::cancel(run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_is_not_sent() {
        let backend = HttpRunBackend::new("http://x/", Some("  ".to_string()), Duration::from_secs(1));
        assert!(backend.api_key.is_none());
        assert_eq!(backend.endpoint("api/v1/runs/a"), "http://x/api/v1/runs/a");
    }

    #[test]
    fn unreachable_backend_is_a_request_error() {
        let backend = HttpRunBackend::new(
            "http://127.0.0.1:9",
            None,
            Duration::from_millis(500),
        );
        let run_id = RunId::parse("tsk_1").expect("id");
        let err = backend.fetch_run(&run_id).expect_err("no server");
        assert!(matches!(err, ApiError::Request { .. }), "{err:?}");
        assert!(!err.is_not_found());
    }
}
