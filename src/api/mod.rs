//! Backend seam: the calls the console makes against the automation API.

use crate::run::{Artifact, Run};
use crate::shared::RunId;
use crate::timeline::Timeline;

pub mod http;
pub mod routes;

pub use http::HttpRunBackend;
pub use routes::RunRoutes;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request to {path} failed: {reason}")]
    Request { path: String, reason: String },
    #[error("{path} responded with status {status}")]
    Status { path: String, status: u16 },
    #[error("{path} was not found")]
    NotFound { path: String },
    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl ApiError {
    /// Not-found is terminal for the identifier that produced it.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Read and cancel operations against the automation backend.
///
/// Implementations block the calling thread; callers run them off the
/// event-loop thread.
pub trait RunBackend: Send + Sync {
    fn fetch_run(&self, run_id: &RunId) -> Result<Run, ApiError>;

    fn fetch_timeline(&self, run_id: &RunId) -> Result<Timeline, ApiError>;

    fn fetch_run_artifacts(&self, run_id: &RunId) -> Result<Vec<Artifact>, ApiError>;

    fn fetch_block_artifacts(&self, block_id: &str) -> Result<Vec<Artifact>, ApiError>;

    fn cancel_run(&self, run_id: &RunId) -> Result<(), ApiError>;
}
