//! Run records, artifacts and the status classifier.

pub mod affordances;
pub mod artifact;
pub mod record;
pub mod status;

pub use affordances::{failure_heading, RunAffordances};
pub use artifact::{
    group_artifacts, parse_artifacts, sort_chronologically, Artifact, ArtifactCategory,
};
pub use record::{parse_run, DownloadedFile, Run, RunRequest};
pub use status::{ends_stream, is_active, is_finished, RunPhase};
