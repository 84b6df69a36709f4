use crate::api::ApiError;
use std::time::{Duration, Instant};

/// Identity of one issued fetch. Completions carry it back so the poller can
/// tell current responses from cancelled or superseded ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket<K> {
    pub key: K,
    pub epoch: u64,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    /// Applied, and the value says no further polling is needed.
    Settled,
    Failed,
    NotFound,
    /// A newer response (success or failure) was already applied.
    Stale,
    /// Issued before the target changed or polling was switched off.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    NotFound,
    Settled,
}

/// Cache plus refresh policy for one remote resource.
///
/// The poller never performs I/O. Callers ask it for a ticket with
/// [`Poller::poll_due`], run the fetch wherever they like, and hand the
/// result back through [`Poller::complete`].
#[derive(Debug)]
pub struct Poller<K, T> {
    label: &'static str,
    interval: Duration,
    key: Option<K>,
    repeat: bool,
    settle: Option<fn(&T) -> bool>,
    epoch: u64,
    next_generation: u64,
    applied_generation: u64,
    resolved_generation: u64,
    last_issued_at: Option<Instant>,
    refresh_requested: bool,
    value: Option<T>,
    last_error: Option<ApiError>,
    halt: Option<Halt>,
}

impl<K: Clone + PartialEq, T> Poller<K, T> {
    pub fn new(label: &'static str, interval: Duration) -> Self {
        Self {
            label,
            interval,
            key: None,
            repeat: false,
            settle: None,
            epoch: 0,
            next_generation: 0,
            applied_generation: 0,
            resolved_generation: 0,
            last_issued_at: None,
            refresh_requested: false,
            value: None,
            last_error: None,
            halt: None,
        }
    }

    /// Keeps repeating until an applied value satisfies `settled`, then
    /// stops for good (until [`Poller::invalidate`]).
    pub fn repeat_until(mut self, settled: fn(&T) -> bool) -> Self {
        self.repeat = true;
        self.settle = Some(settled);
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn halt(&self) -> Option<Halt> {
        self.halt
    }

    /// A fetch of the current target is outstanding.
    pub fn in_flight(&self) -> bool {
        self.next_generation > self.resolved_generation
    }

    /// Nothing more will be fetched unless the target changes or the poller
    /// is invalidated.
    pub fn is_idle(&self) -> bool {
        if self.key.is_none() || self.halt.is_some() {
            return true;
        }
        self.value.is_some() && !self.repeat && !self.refresh_requested && !self.in_flight()
    }

    fn cancel_in_flight(&mut self) {
        self.epoch += 1;
        self.resolved_generation = self.next_generation;
    }

    /// Points the poller at a new identifier, or switches it off with
    /// `None`. A change drops the cache and cancels everything in flight.
    pub fn set_target(&mut self, key: Option<K>) -> bool {
        if self.key == key {
            return false;
        }
        self.key = key;
        self.cancel_in_flight();
        self.value = None;
        self.last_error = None;
        self.halt = None;
        self.last_issued_at = None;
        self.refresh_requested = false;
        true
    }

    /// Turning repetition off cancels in-flight fetches and schedules one
    /// final refresh so the cache ends on the settled state.
    pub fn set_repeat(&mut self, repeat: bool) {
        if self.settle.is_some() || self.repeat == repeat {
            return;
        }
        self.repeat = repeat;
        if !repeat {
            self.cancel_in_flight();
            self.refresh_requested = true;
            self.last_issued_at = None;
        }
    }

    /// Requests an immediate refetch and lifts a settled halt.
    pub fn invalidate(&mut self) {
        if self.halt == Some(Halt::NotFound) {
            return;
        }
        self.halt = None;
        self.refresh_requested = true;
        self.last_issued_at = None;
    }

    pub fn poll_due(&mut self, now: Instant) -> Option<PollTicket<K>> {
        let key = self.key.clone()?;
        if self.halt.is_some() {
            return None;
        }
        let wanted = self.value.is_none() || self.repeat || self.refresh_requested;
        if !wanted {
            return None;
        }
        if let Some(issued) = self.last_issued_at {
            if now.saturating_duration_since(issued) < self.interval {
                return None;
            }
        }
        self.next_generation += 1;
        self.last_issued_at = Some(now);
        self.refresh_requested = false;
        Some(PollTicket {
            key,
            epoch: self.epoch,
            generation: self.next_generation,
        })
    }

    pub fn complete(&mut self, ticket: &PollTicket<K>, result: Result<T, ApiError>) -> PollOutcome {
        if ticket.epoch != self.epoch || self.key.as_ref() != Some(&ticket.key) {
            return PollOutcome::Cancelled;
        }
        self.resolved_generation = self.resolved_generation.max(ticket.generation);
        // A newer tick already completed; whatever this one carries is old news.
        if ticket.generation <= self.applied_generation {
            return PollOutcome::Stale;
        }
        self.applied_generation = ticket.generation;
        match result {
            Ok(value) => {
                self.last_error = None;
                let settled = self.settle.is_some_and(|settled| settled(&value));
                self.value = Some(value);
                if settled {
                    self.halt = Some(Halt::Settled);
                    PollOutcome::Settled
                } else {
                    PollOutcome::Applied
                }
            }
            Err(err) => {
                let not_found = err.is_not_found();
                self.last_error = Some(err);
                if not_found {
                    self.halt = Some(Halt::NotFound);
                    PollOutcome::NotFound
                } else {
                    PollOutcome::Failed
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> ApiError {
        ApiError::Request {
            path: "api/v1/runs/r1".to_string(),
            reason: "connection refused".to_string(),
        }
    }

    fn poller() -> Poller<String, u32> {
        let mut poller = Poller::new("test", Duration::from_secs(2));
        poller.set_target(Some("r1".to_string()));
        poller
    }

    #[test]
    fn first_fetch_is_due_immediately_then_waits_for_interval() {
        let start = Instant::now();
        let mut poller = poller();
        poller.set_repeat(true);
        assert!(poller.poll_due(start).is_some());
        assert!(poller.poll_due(start + Duration::from_millis(500)).is_none());
        assert!(poller.poll_due(start + Duration::from_secs(2)).is_some());
    }

    #[test]
    fn non_repeating_poller_stops_after_first_success() {
        let start = Instant::now();
        let mut poller = poller();
        let ticket = poller.poll_due(start).expect("first");
        assert_eq!(poller.complete(&ticket, Ok(1)), PollOutcome::Applied);
        assert!(poller.poll_due(start + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn failure_keeps_cached_value_and_retries_next_tick() {
        let start = Instant::now();
        let mut poller = poller();
        poller.set_repeat(true);
        let first = poller.poll_due(start).expect("first");
        poller.complete(&first, Ok(7));
        let second = poller.poll_due(start + Duration::from_secs(2)).expect("second");
        assert_eq!(poller.complete(&second, Err(transport())), PollOutcome::Failed);
        assert_eq!(poller.value(), Some(&7));
        assert!(poller.last_error().is_some());
        assert!(poller.poll_due(start + Duration::from_secs(4)).is_some());
    }

    #[test]
    fn older_response_arriving_late_is_discarded() {
        let start = Instant::now();
        let mut poller = poller();
        poller.set_repeat(true);
        let older = poller.poll_due(start).expect("n");
        let newer = poller.poll_due(start + Duration::from_secs(2)).expect("n+1");
        assert_eq!(poller.complete(&newer, Ok(2)), PollOutcome::Applied);
        assert_eq!(poller.complete(&older, Ok(1)), PollOutcome::Stale);
        assert_eq!(poller.value(), Some(&2));
    }

    #[test]
    fn older_failure_arriving_late_is_discarded() {
        let start = Instant::now();
        let mut poller = poller();
        poller.set_repeat(true);
        let older = poller.poll_due(start).expect("n");
        let newer = poller.poll_due(start + Duration::from_secs(2)).expect("n+1");
        assert_eq!(poller.complete(&newer, Ok(2)), PollOutcome::Applied);
        assert_eq!(poller.complete(&older, Err(transport())), PollOutcome::Stale);
        assert!(poller.last_error().is_none());
        assert_eq!(poller.halt(), None);
    }

    #[test]
    fn older_success_does_not_clear_a_newer_failure() {
        let start = Instant::now();
        let mut poller = poller();
        poller.set_repeat(true);
        let older = poller.poll_due(start).expect("n");
        let newer = poller.poll_due(start + Duration::from_secs(2)).expect("n+1");
        assert_eq!(poller.complete(&newer, Err(transport())), PollOutcome::Failed);
        assert_eq!(poller.complete(&older, Ok(1)), PollOutcome::Stale);
        assert!(poller.last_error().is_some());
    }

    #[test]
    fn retarget_cancels_in_flight_and_clears_cache() {
        let start = Instant::now();
        let mut poller = poller();
        let ticket = poller.poll_due(start).expect("first");
        poller.complete(&ticket, Ok(1));
        let pending = PollTicket {
            key: "r1".to_string(),
            epoch: ticket.epoch,
            generation: 99,
        };
        assert!(poller.set_target(Some("r2".to_string())));
        assert_eq!(poller.value(), None);
        assert_eq!(poller.complete(&pending, Ok(5)), PollOutcome::Cancelled);
        assert!(!poller.set_target(Some("r2".to_string())));
    }

    #[test]
    fn deactivation_cancels_in_flight_and_refreshes_once() {
        let start = Instant::now();
        let mut poller = poller();
        poller.set_repeat(true);
        let first = poller.poll_due(start).expect("first");
        poller.complete(&first, Ok(1));
        let in_flight = poller.poll_due(start + Duration::from_secs(2)).expect("second");

        poller.set_repeat(false);
        assert_eq!(poller.complete(&in_flight, Ok(2)), PollOutcome::Cancelled);
        let last = poller
            .poll_due(start + Duration::from_millis(2100))
            .expect("final refresh");
        assert_eq!(poller.complete(&last, Ok(3)), PollOutcome::Applied);
        assert!(poller.poll_due(start + Duration::from_secs(30)).is_none());
        assert_eq!(poller.value(), Some(&3));
    }

    #[test]
    fn settled_value_stops_polling_until_invalidated() {
        let start = Instant::now();
        let mut poller: Poller<String, u32> =
            Poller::new("run", Duration::from_secs(2)).repeat_until(|value| *value >= 10);
        poller.set_target(Some("r1".to_string()));
        let first = poller.poll_due(start).expect("first");
        assert_eq!(poller.complete(&first, Ok(10)), PollOutcome::Settled);
        for secs in [2, 4, 60] {
            assert!(poller.poll_due(start + Duration::from_secs(secs)).is_none());
        }
        poller.invalidate();
        assert!(poller.poll_due(start + Duration::from_secs(61)).is_some());
    }

    #[test]
    fn not_found_is_terminal() {
        let start = Instant::now();
        let mut poller = poller();
        poller.set_repeat(true);
        let ticket = poller.poll_due(start).expect("first");
        let outcome = poller.complete(
            &ticket,
            Err(ApiError::NotFound {
                path: "api/v1/runs/r1".to_string(),
            }),
        );
        assert_eq!(outcome, PollOutcome::NotFound);
        assert_eq!(poller.halt(), Some(Halt::NotFound));
        poller.invalidate();
        assert!(poller.poll_due(start + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn idle_once_final_value_lands() {
        let start = Instant::now();
        let mut poller = poller();
        assert!(!poller.is_idle());
        let ticket = poller.poll_due(start).expect("first");
        assert!(poller.in_flight());
        assert!(!poller.is_idle());
        poller.complete(&ticket, Ok(1));
        assert!(!poller.in_flight());
        assert!(poller.is_idle());
        poller.invalidate();
        assert!(!poller.is_idle());
    }

    #[test]
    fn disabled_poller_issues_nothing() {
        let mut poller: Poller<String, u32> = Poller::new("idle", Duration::from_secs(1));
        assert!(poller.poll_due(Instant::now()).is_none());
    }
}
