//! Run-detail orchestration: pollers, live stream and view assembly for one
//! run, driven from a single event-loop thread.

use crate::api::ApiError;
use crate::config::ConfigError;

pub mod event;
pub mod options;
pub mod run_session;
pub mod view;

pub use event::SessionEvent;
pub use options::SessionOptions;
pub use run_session::RunSession;
pub use view::RunView;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid run id: {0}")]
    InvalidRunId(String),
    #[error("run {run_id} cannot be cancelled in status `{status}`")]
    NotCancellable { run_id: String, status: String },
}
