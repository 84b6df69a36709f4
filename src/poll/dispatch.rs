use super::PollTicket;
use crate::api::{ApiError, RunBackend};
use crate::run::{Artifact, Run};
use crate::shared::RunId;
use crate::timeline::Timeline;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

/// One fetch to run against the backend, tagged with the ticket of the
/// poller that asked for it.
#[derive(Debug, Clone)]
pub enum FetchJob {
    Run(PollTicket<RunId>),
    Timeline(PollTicket<RunId>),
    RunArtifacts(PollTicket<RunId>),
    BlockArtifacts(PollTicket<String>),
}

#[derive(Debug)]
pub enum FetchCompletion {
    Run(PollTicket<RunId>, Result<Run, ApiError>),
    Timeline(PollTicket<RunId>, Result<Timeline, ApiError>),
    RunArtifacts(PollTicket<RunId>, Result<Vec<Artifact>, ApiError>),
    BlockArtifacts(PollTicket<String>, Result<Vec<Artifact>, ApiError>),
}

impl FetchJob {
    pub fn execute(self, backend: &dyn RunBackend) -> FetchCompletion {
        match self {
            Self::Run(ticket) => {
                let result = backend.fetch_run(&ticket.key);
                FetchCompletion::Run(ticket, result)
            }
            Self::Timeline(ticket) => {
                let result = backend.fetch_timeline(&ticket.key);
                FetchCompletion::Timeline(ticket, result)
            }
            Self::RunArtifacts(ticket) => {
                let result = backend.fetch_run_artifacts(&ticket.key);
                FetchCompletion::RunArtifacts(ticket, result)
            }
            Self::BlockArtifacts(ticket) => {
                let result = backend.fetch_block_artifacts(&ticket.key);
                FetchCompletion::BlockArtifacts(ticket, result)
            }
        }
    }
}

/// Runs blocking fetches off the caller's thread and reports each
/// completion on a channel, in completion order.
#[derive(Clone)]
pub struct FetchDispatcher {
    backend: Arc<dyn RunBackend>,
}

impl FetchDispatcher {
    pub fn new(backend: Arc<dyn RunBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn RunBackend> {
        &self.backend
    }

    pub fn dispatch<E>(&self, job: FetchJob, events: &Sender<E>)
    where
        E: From<FetchCompletion> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let tx = events.clone();
        let _ = thread::spawn(move || {
            let completion = job.execute(backend.as_ref());
            let _ = tx.send(E::from(completion));
        });
    }
}
