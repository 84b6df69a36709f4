//! Recursive run execution tree: blocks, thoughts and browser actions.

pub mod model;
pub mod normalize;
pub mod query;

pub use model::{
    Action, ActionStatus, ActionType, Block, BlockType, EntryKind, Thought, Timeline,
    TimelineEntry,
};
pub use normalize::{normalize_timeline, parse_timeline};
pub use query::{PendingReview, Walk};
