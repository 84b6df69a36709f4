//! Screenshot source extraction and the composed view selector.

pub mod gallery;
pub mod proxy;
pub mod select;
pub mod sources;

pub use gallery::Gallery;
pub use proxy::{ArtifactUrlProxy, PROXIED_HOST_SUFFIXES};
pub use select::{select_view, LiveSource, ScreenshotView, ViewInputs};
pub use sources::{
    block_screenshot_url, frame_data_url, run_screenshot_urls, BLOCK_SCREENSHOT_TYPE,
    SCREENSHOT_TYPES,
};
