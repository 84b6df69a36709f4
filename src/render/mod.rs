//! Text rendering surfaces. Everything here is a pure function of already
//! selected state.

pub mod banner;
pub mod labels;
pub mod outline;
pub mod screen;
pub mod summary;

pub use banner::{HumanReviewBanner, BANNER_HEADING};
pub use labels::{action_label, block_type_label, count_label};
pub use outline::{render_outline, OutlineOptions};
pub use screen::{live_source_label, render_screenshot, Thumbnail, ViewElement, EMPTY_TEXT, WAITING_TEXT};
pub use summary::{render_artifacts, render_run_header};
