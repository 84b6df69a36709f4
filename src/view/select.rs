use super::sources::frame_data_url;
use super::Gallery;

/// Everything the selector looks at, already reduced to plain values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewInputs<'a> {
    pub active: bool,
    /// Latest base64 frame from the live stream.
    pub live_frame: Option<&'a str>,
    /// Latest screenshot of the block the run is currently on.
    pub block_screenshot: Option<&'a str>,
    /// Run screenshot history, oldest first.
    pub history: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveSource {
    StreamFrame,
    BlockScreenshot,
    LatestHistorical,
}

/// The single screenshot presentation chosen for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenshotView {
    Live { source: LiveSource, url: String },
    Waiting,
    Gallery(Gallery),
    Single { url: String },
    Empty,
}

impl ScreenshotView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Live { .. } => "live",
            Self::Waiting => "waiting",
            Self::Gallery(_) => "gallery",
            Self::Single { .. } => "single",
            Self::Empty => "empty",
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Picks the screenshot view. While the run is active the freshest source
/// wins: stream frame, then block screenshot, then newest history entry,
/// then a waiting placeholder. Once inactive the full history is shown,
/// then a lone block screenshot, then nothing.
pub fn select_view(inputs: &ViewInputs<'_>) -> ScreenshotView {
    let block = present(inputs.block_screenshot);
    let latest = inputs.history.last().map(String::as_str);

    if inputs.active {
        if let Some(frame) = present(inputs.live_frame) {
            return ScreenshotView::Live {
                source: LiveSource::StreamFrame,
                url: frame_data_url(frame),
            };
        }
        if let Some(url) = block {
            return ScreenshotView::Live {
                source: LiveSource::BlockScreenshot,
                url: url.to_string(),
            };
        }
        if let Some(url) = latest {
            return ScreenshotView::Live {
                source: LiveSource::LatestHistorical,
                url: url.to_string(),
            };
        }
        return ScreenshotView::Waiting;
    }

    if let Some(gallery) = Gallery::at_latest(inputs.history.to_vec()) {
        return ScreenshotView::Gallery(gallery);
    }
    if let Some(url) = block {
        return ScreenshotView::Single {
            url: url.to_string(),
        };
    }
    ScreenshotView::Empty
}
