use super::{RunView, SessionEvent, SessionOptions};
use crate::api::{RunBackend, RunRoutes};
use crate::poll::{FetchCompletion, FetchDispatcher, FetchJob, Halt, PollOutcome, Poller};
use crate::run::{Artifact, Run, RunAffordances};
use crate::shared::{EventLog, RunId};
use crate::stream::{
    ConnectionRegistry, ObserverCommand, StreamEvent, StreamObserver,
    StreamTransport, STREAM_UNAVAILABLE,
};
use crate::timeline::Timeline;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn run_settled(run: &Run) -> bool {
    !run.phase().is_active()
}

/// Live state of one run's detail view.
///
/// Owns four pollers (run, timeline, run artifacts, block artifacts) and the
/// live-stream observer. Blocking I/O happens on worker threads; their
/// results come back as [`SessionEvent`]s and are applied only by
/// [`RunSession::handle`], on whichever thread drives the session.
pub struct RunSession {
    run_id: RunId,
    options: SessionOptions,
    dispatcher: FetchDispatcher,
    registry: ConnectionRegistry,
    observer: StreamObserver,
    run: Poller<RunId, Run>,
    timeline: Poller<RunId, Timeline>,
    artifacts: Poller<RunId, Vec<Artifact>>,
    block_artifacts: Poller<String, Vec<Artifact>>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    cancel_in_flight: bool,
    last_cancel_error: Option<String>,
    stream_attempts: u32,
    stream_retry_at: Option<Instant>,
    log: EventLog,
}

impl RunSession {
    pub fn new(
        run_id: RunId,
        backend: Arc<dyn RunBackend>,
        transport: Arc<dyn StreamTransport>,
        options: SessionOptions,
        log: EventLog,
    ) -> Self {
        let polling = &options.polling;
        let mut run = Poller::new("run", polling.run_interval()).repeat_until(run_settled);
        let mut timeline = Poller::new("timeline", polling.timeline_interval());
        let mut artifacts = Poller::new("artifacts", polling.artifacts_interval());
        let block_artifacts = Poller::new("block_artifacts", polling.block_artifacts_interval());
        run.set_target(Some(run_id.clone()));
        timeline.set_target(Some(run_id.clone()));
        artifacts.set_target(Some(run_id.clone()));

        let (events_tx, events_rx) = mpsc::channel();
        Self {
            run_id,
            options,
            dispatcher: FetchDispatcher::new(backend),
            registry: ConnectionRegistry::new(transport, log.clone()),
            observer: StreamObserver::new(),
            run,
            timeline,
            artifacts,
            block_artifacts,
            events_tx,
            events_rx,
            cancel_in_flight: false,
            last_cancel_error: None,
            stream_attempts: 0,
            stream_retry_at: None,
            log,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    fn is_active(&self) -> bool {
        self.run.value().is_some_and(|run| run.phase().is_active())
    }

    /// Recomputes which pollers repeat, which block is followed, and
    /// whether the live stream is open, from the latest cached values.
    fn sync_gates(&mut self) {
        let active = self.is_active();
        self.timeline.set_repeat(active);
        self.artifacts.set_repeat(active);

        let block_id = self
            .timeline
            .value()
            .and_then(Timeline::find_best_block)
            .map(|block| block.id.clone())
            .filter(|id| !id.trim().is_empty());
        if self.block_artifacts.set_target(block_id.clone()) {
            self.log.debug(
                "session.block_selected",
                &format!("{}: {}", self.run_id, block_id.as_deref().unwrap_or("none")),
            );
        }
        self.block_artifacts.set_repeat(active);

        let stream_id = self.run_id.clone();
        let commands = self
            .observer
            .observe(&stream_id, self.options.stream_enabled && active);
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<ObserverCommand>) {
        for command in commands {
            match command {
                ObserverCommand::Open {
                    connection,
                    stream_id,
                } => {
                    let url = RunRoutes::stream_url(
                        &self.options.api_base,
                        self.options.api_key.as_deref(),
                        &stream_id,
                    );
                    self.registry.open(connection, &url, &self.events_tx);
                }
                ObserverCommand::Close { connection } => self.registry.close(connection),
            }
        }
    }

    /// Re-opens a dropped live stream after the configured backoff, as long
    /// as the run is still active and the drop was not an unavailable
    /// endpoint.
    fn retry_stream(&mut self, now: Instant) {
        if !(self.options.stream_enabled && self.is_active()) {
            self.stream_attempts = 0;
            self.stream_retry_at = None;
            return;
        }
        let dropped = self.observer.open_connection().is_none()
            && self
                .observer
                .snapshot()
                .last_error
                .as_deref()
                .is_some_and(|error| error != STREAM_UNAVAILABLE);
        if !dropped {
            self.stream_retry_at = None;
            return;
        }

        let policy = self.options.stream_retry;
        match self.stream_retry_at {
            None if self.stream_attempts < policy.max_attempts => {
                let delay = policy.jittered_delay_for(self.stream_attempts);
                self.stream_retry_at = Some(now + delay);
                self.log.info(
                    "stream.retry_scheduled",
                    &format!(
                        "{} attempt {} in {}ms",
                        self.run_id,
                        self.stream_attempts + 1,
                        delay.as_millis()
                    ),
                );
            }
            None if policy.max_attempts > 0 && self.stream_attempts == policy.max_attempts => {
                self.stream_attempts += 1;
                self.log.warn(
                    "stream.retry_exhausted",
                    &format!("{} gave up after {} attempts", self.run_id, policy.max_attempts),
                );
            }
            Some(at) if now >= at => {
                self.stream_attempts += 1;
                self.stream_retry_at = None;
                let commands = self.observer.reopen();
                self.execute(commands);
            }
            _ => {}
        }
    }

    /// Issues every fetch that is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        self.sync_gates();
        self.retry_stream(now);
        if let Some(ticket) = self.run.poll_due(now) {
            self.dispatcher.dispatch(FetchJob::Run(ticket), &self.events_tx);
        }
        if let Some(ticket) = self.timeline.poll_due(now) {
            self.dispatcher
                .dispatch(FetchJob::Timeline(ticket), &self.events_tx);
        }
        if let Some(ticket) = self.artifacts.poll_due(now) {
            self.dispatcher
                .dispatch(FetchJob::RunArtifacts(ticket), &self.events_tx);
        }
        if let Some(ticket) = self.block_artifacts.poll_due(now) {
            self.dispatcher
                .dispatch(FetchJob::BlockArtifacts(ticket), &self.events_tx);
        }
    }

    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Fetched(completion) => self.apply_fetch(completion),
            SessionEvent::Stream(StreamEvent { connection, event }) => {
                let commands = self.observer.handle(connection, event);
                self.execute(commands);
                if self.observer.snapshot().is_connected {
                    self.stream_attempts = 0;
                }
            }
            SessionEvent::CancelFinished { run_id, result } => {
                self.cancel_in_flight = false;
                match result {
                    Ok(()) => {
                        self.log.info("session.cancelled", run_id.as_str());
                        self.last_cancel_error = None;
                        self.run.invalidate();
                        self.timeline.invalidate();
                    }
                    Err(err) => {
                        self.log.error("session.cancel_failed", &err.to_string());
                        self.last_cancel_error = Some(err.to_string());
                    }
                }
            }
        }
    }

    fn apply_fetch(&mut self, completion: FetchCompletion) {
        let (label, outcome, error) = match completion {
            FetchCompletion::Run(ticket, result) => {
                let outcome = self.run.complete(&ticket, result);
                (self.run.label(), outcome, self.run.last_error().cloned())
            }
            FetchCompletion::Timeline(ticket, result) => {
                let outcome = self.timeline.complete(&ticket, result);
                (self.timeline.label(), outcome, self.timeline.last_error().cloned())
            }
            FetchCompletion::RunArtifacts(ticket, result) => {
                let outcome = self.artifacts.complete(&ticket, result);
                (self.artifacts.label(), outcome, self.artifacts.last_error().cloned())
            }
            FetchCompletion::BlockArtifacts(ticket, result) => {
                let outcome = self.block_artifacts.complete(&ticket, result);
                (
                    self.block_artifacts.label(),
                    outcome,
                    self.block_artifacts.last_error().cloned(),
                )
            }
        };

        match outcome {
            PollOutcome::Applied => {}
            PollOutcome::Settled => self
                .log
                .info("poll.settled", &format!("{label} for {} stopped polling", self.run_id)),
            PollOutcome::Failed => {
                let reason = error.map(|err| err.to_string()).unwrap_or_default();
                self.log.warn("poll.failed", &format!("{label}: {reason}"));
            }
            PollOutcome::NotFound => self
                .log
                .warn("poll.not_found", &format!("{label} for {}", self.run_id)),
            PollOutcome::Stale => self.log.debug("poll.stale", label),
            PollOutcome::Cancelled => self.log.debug("poll.cancelled", label),
        }
        self.sync_gates();
    }

    /// Waits up to `timeout` for the next event, then applies it and every
    /// other event already queued. Returns how many were applied.
    pub fn pump(&mut self, timeout: Duration) -> usize {
        let first = match self.events_rx.recv_timeout(timeout) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return 0,
        };
        self.handle(first);
        let mut applied = 1;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
            applied += 1;
        }
        applied
    }

    /// Pumps until no fetch is outstanding or `timeout` elapses.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.fetches_in_flight() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pump(deadline - now);
        }
        true
    }

    pub fn fetches_in_flight(&self) -> bool {
        self.run.in_flight()
            || self.timeline.in_flight()
            || self.artifacts.in_flight()
            || self.block_artifacts.in_flight()
    }

    /// The run is over (or unknown to the backend) and every cache holds
    /// its final value.
    pub fn is_finished(&self) -> bool {
        match self.run.halt() {
            Some(Halt::NotFound) => true,
            Some(Halt::Settled) => {
                self.timeline.is_idle()
                    && self.artifacts.is_idle()
                    && self.block_artifacts.is_idle()
                    && self.observer.open_connection().is_none()
                    && !self.cancel_in_flight
            }
            None => false,
        }
    }

    /// Asks the backend to cancel the run. The outcome arrives as an event;
    /// on success the run and timeline are refetched.
    pub fn request_cancel(&mut self) -> bool {
        if self.cancel_in_flight || !self.affordances().can_cancel {
            return false;
        }
        self.cancel_in_flight = true;
        let backend = Arc::clone(self.dispatcher.backend());
        let run_id = self.run_id.clone();
        let tx = self.events_tx.clone();
        let _ = thread::spawn(move || {
            let result = backend.cancel_run(&run_id);
            let _ = tx.send(SessionEvent::CancelFinished { run_id, result });
        });
        true
    }

    pub fn affordances(&self) -> RunAffordances {
        RunAffordances::for_run(self.run.value())
    }

    /// Stops polling and closes the live stream.
    pub fn close(&mut self) {
        self.run.set_target(None);
        self.timeline.set_target(None);
        self.artifacts.set_target(None);
        self.block_artifacts.set_target(None);
        let stream_id = self.run_id.clone();
        let commands = self.observer.observe(&stream_id, false);
        self.execute(commands);
        self.registry.close_all();
    }

    pub fn view(&self) -> RunView {
        let mut errors = Vec::new();
        for (label, error) in [
            (self.run.label(), self.run.last_error()),
            (self.timeline.label(), self.timeline.last_error()),
            (self.artifacts.label(), self.artifacts.last_error()),
            (self.block_artifacts.label(), self.block_artifacts.last_error()),
        ] {
            if let Some(error) = error {
                errors.push(format!("{label}: {error}"));
            }
        }
        if let Some(error) = &self.last_cancel_error {
            errors.push(format!("cancel: {error}"));
        }

        RunView::assemble(
            &self.run_id,
            self.run.value(),
            self.timeline.value(),
            self.artifacts.value().map(Vec::as_slice).unwrap_or_default(),
            self.block_artifacts.value().map(Vec::as_slice).unwrap_or_default(),
            self.observer.snapshot(),
            &self.options.proxy,
            self.run.halt() == Some(Halt::NotFound),
            errors,
        )
    }
}

impl Drop for RunSession {
    fn drop(&mut self) {
        self.registry.close_all();
    }
}
