use crate::stream::decode_screenshot;
use crate::view::{LiveSource, ScreenshotView};
use std::fmt;

pub const WAITING_TEXT: &str = "Waiting for screenshots...";
pub const EMPTY_TEXT: &str = "No screenshots available for this run.";
const DATA_URL_PREVIEW: usize = 48;

/// Renderable shape of the screenshot area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewElement {
    Placeholder {
        text: &'static str,
        busy: bool,
    },
    Image {
        url: String,
        live: bool,
    },
    Gallery {
        main: String,
        counter: String,
        thumbnails: Vec<Thumbnail>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub selected: bool,
}

impl ViewElement {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

pub fn render_screenshot(view: &ScreenshotView) -> ViewElement {
    match view {
        ScreenshotView::Live { url, .. } => ViewElement::Image {
            url: url.clone(),
            live: true,
        },
        ScreenshotView::Waiting => ViewElement::Placeholder {
            text: WAITING_TEXT,
            busy: true,
        },
        ScreenshotView::Gallery(gallery) => ViewElement::Gallery {
            main: gallery.current().to_string(),
            counter: gallery.counter(),
            thumbnails: gallery
                .urls()
                .iter()
                .enumerate()
                .map(|(index, url)| Thumbnail {
                    url: url.clone(),
                    selected: index == gallery.cursor(),
                })
                .collect(),
        },
        ScreenshotView::Single { url } => ViewElement::Image {
            url: url.clone(),
            live: false,
        },
        ScreenshotView::Empty => ViewElement::Placeholder {
            text: EMPTY_TEXT,
            busy: false,
        },
    }
}

pub fn live_source_label(source: LiveSource) -> &'static str {
    match source {
        LiveSource::StreamFrame => "stream",
        LiveSource::BlockScreenshot => "current block",
        LiveSource::LatestHistorical => "latest screenshot",
    }
}

fn display_url(url: &str) -> String {
    if !url.starts_with("data:") {
        return url.to_string();
    }
    let prefix: String = url.chars().take(DATA_URL_PREVIEW).collect();
    match decode_screenshot(url) {
        Ok(bytes) => format!("{prefix}... ({} byte image)", bytes.len()),
        Err(_) => format!("{prefix}... (undecodable frame)"),
    }
}

impl fmt::Display for ViewElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder { text, .. } => write!(f, "{text}"),
            Self::Image { url, live: true } => write!(f, "[LIVE] {}", display_url(url)),
            Self::Image { url, live: false } => write!(f, "{}", display_url(url)),
            Self::Gallery {
                main,
                counter,
                thumbnails,
            } => {
                writeln!(f, "[{counter}] {}", display_url(main))?;
                for (index, thumb) in thumbnails.iter().enumerate() {
                    let mark = if thumb.selected { '*' } else { ' ' };
                    writeln!(f, " {mark} {}. {}", index + 1, display_url(&thumb.url))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Gallery;

    #[test]
    fn waiting_and_empty_are_placeholders() {
        let waiting = render_screenshot(&ScreenshotView::Waiting);
        assert!(waiting.is_placeholder());
        assert_eq!(waiting.to_string(), WAITING_TEXT);
        assert_eq!(render_screenshot(&ScreenshotView::Empty).to_string(), EMPTY_TEXT);
    }

    #[test]
    fn gallery_marks_selected_thumbnail() {
        let gallery = Gallery::at_latest(vec!["a.png".into(), "b.png".into()]).expect("gallery");
        let element = render_screenshot(&ScreenshotView::Gallery(gallery));
        let text = element.to_string();
        assert!(text.starts_with("[2 / 2] b.png"), "{text}");
        assert!(text.contains(" * 2. b.png"), "{text}");
    }

    #[test]
    fn live_image_is_tagged_and_data_urls_shortened() {
        let url = format!("data:image/png;base64,{}", "A".repeat(500));
        let element = render_screenshot(&ScreenshotView::Live {
            source: LiveSource::StreamFrame,
            url,
        });
        let text = element.to_string();
        assert!(text.starts_with("[LIVE] data:image/png;base64,"), "{text}");
        assert!(text.ends_with("(375 byte image)"), "{text}");
    }
}
