use crate::timeline::{ActionType, BlockType};

pub fn action_label(action_type: &ActionType) -> &str {
    match action_type {
        ActionType::Click => "Click",
        ActionType::InputText => "Input",
        ActionType::DownloadFile => "Download",
        ActionType::UploadFile => "Upload",
        ActionType::SelectOption => "Select",
        ActionType::Checkbox => "Checkbox",
        ActionType::Hover => "Hover",
        ActionType::Wait => "Wait",
        ActionType::SolveCaptcha => "Captcha",
        ActionType::Terminate => "Terminate",
        ActionType::Complete => "Complete",
        ActionType::ReloadPage => "Reload",
        ActionType::GotoUrl => "Navigate",
        ActionType::Scroll => "Scroll",
        ActionType::Keypress => "Keypress",
        ActionType::NullAction => "No Action",
        ActionType::Extract => "Extract",
        ActionType::Drag => "Drag",
        ActionType::Other(raw) => raw.as_str(),
    }
}

pub fn block_type_label(block_type: &BlockType) -> String {
    block_type.as_str().replace('_', " ")
}

pub fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
