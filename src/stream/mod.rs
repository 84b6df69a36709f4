//! Live screenshot stream: frame decoding, the per-view observer, and the
//! connection registry that owns transport threads.

pub mod frame;
pub mod observer;
pub mod registry;
pub mod transport;

pub use frame::{decode_screenshot, parse_frame, StreamFrame};
pub use observer::{
    ObserverCommand, StreamObserver, StreamSnapshot, DISCONNECTED, STREAM_UNAVAILABLE,
};
pub use registry::{ConnectionRegistry, ReconnectPolicy, StreamEvent};
pub use transport::{ReadOutcome, StreamConnection, StreamTransport, WebSocketTransport};

pub type ConnectionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("stream transport unavailable: {0}")]
    Unavailable(String),
    #[error("stream connect failed: {0}")]
    Connect(String),
    #[error("stream read failed: {0}")]
    Read(String),
}

/// Transport-level happenings on one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    /// The remote side closed the connection.
    Closed,
    Failed(StreamError),
}
