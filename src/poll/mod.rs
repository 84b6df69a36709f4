//! Refresh policies for the run, timeline and artifact caches.

pub mod dispatch;
pub mod poller;

pub use dispatch::{FetchCompletion, FetchDispatcher, FetchJob};
pub use poller::{Halt, PollOutcome, PollTicket, Poller};
