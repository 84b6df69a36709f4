pub mod ids;
pub mod logging;
pub mod serde_ext;
pub mod time;

pub use ids::{RunId, RunKind};
pub use logging::{EventLog, LogLevel};
