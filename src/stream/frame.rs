use crate::run::ends_stream;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

/// One decoded message from a run's live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Connected,
    Error(String),
    /// Terminal run status without a picture; the stream is over.
    End(String),
    Image {
        screenshot: String,
        status: Option<String>,
    },
    /// Well-formed but carries nothing the observer acts on.
    Ignored,
}

/// Decodes one text message. `None` means the payload was not JSON at all;
/// such frames are dropped without affecting the connection.
pub fn parse_frame(text: &str) -> Option<StreamFrame> {
    let value: Value = serde_json::from_str(text).ok()?;
    let Some(object) = value.as_object() else {
        return Some(StreamFrame::Ignored);
    };

    if let Some(error) = object.get("error").filter(|value| truthy(value)) {
        let message = match error {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        return Some(StreamFrame::Error(message));
    }
    if object.get("connected").is_some_and(truthy) {
        return Some(StreamFrame::Connected);
    }

    let status = object
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string);
    let screenshot = object
        .get("screenshot")
        .and_then(Value::as_str)
        .filter(|shot| !shot.is_empty())
        .map(str::to_string);

    match (screenshot, status) {
        (Some(screenshot), status) => Some(StreamFrame::Image { screenshot, status }),
        (None, Some(status)) if ends_stream(&status) => Some(StreamFrame::End(status)),
        _ => Some(StreamFrame::Ignored),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Decodes a frame's base64 payload into image bytes. Frames are kept
/// encoded and only decoded when a consumer needs the pixels.
pub fn decode_screenshot(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = encoded
        .split_once(";base64,")
        .map(|(_, data)| data)
        .unwrap_or(encoded);
    STANDARD.decode(payload.trim())
}
