//! Run status partitions.
//!
//! The console observes but never drives the run state machine:
//! `created | queued -> running -> completed | failed | terminated | canceled | timed_out`.

pub const ACTIVE_STATUSES: [&str; 3] = ["running", "queued", "created"];

/// Both spellings of canceled are emitted upstream.
pub const FINISHED_STATUSES: [&str; 6] = [
    "completed",
    "failed",
    "terminated",
    "canceled",
    "cancelled",
    "timed_out",
];

/// Statuses that end a live stream. Wider than [`FINISHED_STATUSES`]: the
/// stream endpoint also reports `timeout` and `not_found`.
pub const STREAM_END_STATUSES: [&str; 8] = [
    "completed",
    "failed",
    "terminated",
    "canceled",
    "cancelled",
    "timed_out",
    "timeout",
    "not_found",
];

pub fn is_active(status: &str) -> bool {
    ACTIVE_STATUSES.contains(&status)
}

pub fn is_finished(status: &str) -> bool {
    FINISHED_STATUSES.contains(&status)
}

pub fn ends_stream(status: &str) -> bool {
    STREAM_END_STATUSES.contains(&status)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Active,
    Finished,
    /// Not loaded yet, or a status outside both sets. Nothing may be enabled
    /// that assumes either state.
    Unknown,
}

impl RunPhase {
    pub fn classify(status: Option<&str>) -> Self {
        match status {
            Some(status) if is_active(status) => Self::Active,
            Some(status) if is_finished(status) => Self::Finished,
            _ => Self::Unknown,
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn is_finished(self) -> bool {
        self == Self::Finished
    }
}
