use super::record::Run;
use super::status::RunPhase;

/// What the operator may do with a run, derived purely from its latest
/// known record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunAffordances {
    pub can_cancel: bool,
    pub can_rerun: bool,
}

impl RunAffordances {
    pub fn for_run(run: Option<&Run>) -> Self {
        let Some(run) = run else {
            return Self {
                can_cancel: false,
                can_rerun: false,
            };
        };
        let phase = run.phase();
        Self {
            can_cancel: phase == RunPhase::Active,
            can_rerun: phase == RunPhase::Finished && run.workflow_id().is_some(),
        }
    }
}

/// Heading shown above a failure reason.
pub fn failure_heading(run: &Run) -> Option<&'static str> {
    run.failure_reason.as_ref()?;
    if run.status.as_deref() == Some("terminated") {
        Some("Termination Reason")
    } else {
        Some("Failure Reason")
    }
}
