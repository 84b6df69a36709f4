use crate::api::ApiError;
use crate::poll::FetchCompletion;
use crate::shared::RunId;
use crate::stream::StreamEvent;

/// Everything the session's event loop reacts to. Worker threads only ever
/// send these; all state changes happen on the loop thread.
#[derive(Debug)]
pub enum SessionEvent {
    Fetched(FetchCompletion),
    Stream(StreamEvent),
    CancelFinished {
        run_id: RunId,
        result: Result<(), ApiError>,
    },
}

impl From<FetchCompletion> for SessionEvent {
    fn from(value: FetchCompletion) -> Self {
        Self::Fetched(value)
    }
}

impl From<StreamEvent> for SessionEvent {
    fn from(value: StreamEvent) -> Self {
        Self::Stream(value)
    }
}
