use serde::Serialize;
use serde_json::Value;

/// Tag of a workflow block. The backend vocabulary is open-ended, so unknown
/// tags are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum BlockType {
    Task,
    TaskV2,
    Navigation,
    Action,
    Login,
    Extraction,
    Code,
    ForLoop,
    Conditional,
    Wait,
    GotoUrl,
    FileDownload,
    FileUpload,
    FileUrlParser,
    PdfParser,
    PrintPage,
    SendEmail,
    HttpRequest,
    TextPrompt,
    Validation,
    HumanInteraction,
    Other(String),
}

impl BlockType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "task" => Self::Task,
            "task_v2" => Self::TaskV2,
            "navigation" => Self::Navigation,
            "action" => Self::Action,
            "login" => Self::Login,
            "extraction" => Self::Extraction,
            "code" => Self::Code,
            "for_loop" => Self::ForLoop,
            "conditional" => Self::Conditional,
            "wait" => Self::Wait,
            "goto_url" => Self::GotoUrl,
            "file_download" => Self::FileDownload,
            "file_upload" => Self::FileUpload,
            "file_url_parser" => Self::FileUrlParser,
            "pdf_parser" => Self::PdfParser,
            "print_page" => Self::PrintPage,
            "send_email" => Self::SendEmail,
            "http_request" => Self::HttpRequest,
            "text_prompt" => Self::TextPrompt,
            "validation" => Self::Validation,
            "human_interaction" => Self::HumanInteraction,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Task => "task",
            Self::TaskV2 => "task_v2",
            Self::Navigation => "navigation",
            Self::Action => "action",
            Self::Login => "login",
            Self::Extraction => "extraction",
            Self::Code => "code",
            Self::ForLoop => "for_loop",
            Self::Conditional => "conditional",
            Self::Wait => "wait",
            Self::GotoUrl => "goto_url",
            Self::FileDownload => "file_download",
            Self::FileUpload => "file_upload",
            Self::FileUrlParser => "file_url_parser",
            Self::PdfParser => "pdf_parser",
            Self::PrintPage => "print_page",
            Self::SendEmail => "send_email",
            Self::HttpRequest => "http_request",
            Self::TextPrompt => "text_prompt",
            Self::Validation => "validation",
            Self::HumanInteraction => "human_interaction",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Blocks whose children are themselves block entries.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::ForLoop | Self::Conditional)
    }
}

impl From<BlockType> for String {
    fn from(value: BlockType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ActionType {
    Click,
    InputText,
    DownloadFile,
    UploadFile,
    Hover,
    SelectOption,
    Checkbox,
    Wait,
    ReloadPage,
    GotoUrl,
    Drag,
    Scroll,
    Keypress,
    NullAction,
    Extract,
    SolveCaptcha,
    Terminate,
    Complete,
    Other(String),
}

impl ActionType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "click" => Self::Click,
            "input_text" => Self::InputText,
            "download_file" => Self::DownloadFile,
            "upload_file" => Self::UploadFile,
            "hover" => Self::Hover,
            "select_option" => Self::SelectOption,
            "checkbox" => Self::Checkbox,
            "wait" => Self::Wait,
            "reload_page" => Self::ReloadPage,
            "goto_url" => Self::GotoUrl,
            "drag" => Self::Drag,
            "scroll" => Self::Scroll,
            "keypress" => Self::Keypress,
            "null_action" => Self::NullAction,
            "extract" => Self::Extract,
            "solve_captcha" => Self::SolveCaptcha,
            "terminate" => Self::Terminate,
            "complete" => Self::Complete,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::InputText => "input_text",
            Self::DownloadFile => "download_file",
            Self::UploadFile => "upload_file",
            Self::Hover => "hover",
            Self::SelectOption => "select_option",
            Self::Checkbox => "checkbox",
            Self::Wait => "wait",
            Self::ReloadPage => "reload_page",
            Self::GotoUrl => "goto_url",
            Self::Drag => "drag",
            Self::Scroll => "scroll",
            Self::Keypress => "keypress",
            Self::NullAction => "null_action",
            Self::Extract => "extract",
            Self::SolveCaptcha => "solve_captcha",
            Self::Terminate => "terminate",
            Self::Complete => "complete",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ActionStatus {
    Completed,
    Failed,
    Skipped,
    Pending,
    Other(String),
}

impl ActionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "skipped" => Self::Skipped,
            "pending" | "" => Self::Pending,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Pending => "pending",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<ActionStatus> for String {
    fn from(value: ActionStatus) -> Self {
        value.as_str().to_string()
    }
}

/// A single browser-level operation inside a block. Actions have no children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub action_type: ActionType,
    pub status: ActionStatus,
    pub description: Option<String>,
    pub reasoning: Option<String>,
    pub element_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: String,
    pub block_type: BlockType,
    pub label: Option<String>,
    /// `None` means the backend has not reported a status yet.
    pub status: Option<String>,
    pub output: Option<Value>,
    pub failure_reason: Option<String>,
    pub url: Option<String>,
    pub navigation_goal: Option<String>,
    /// Seconds.
    pub duration: Option<f64>,
    pub actions: Vec<Action>,
    pub created_at: Option<String>,
}

impl Block {
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some("running")
    }

    /// Still waiting on the backend: running, or no status reported yet.
    pub fn is_pending(&self) -> bool {
        self.status.is_none() || self.is_running()
    }

    /// Human-facing title: label, else navigation goal.
    pub fn title(&self) -> Option<&str> {
        self.label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .or_else(|| {
                self.navigation_goal
                    .as_deref()
                    .filter(|goal| !goal.trim().is_empty())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thought {
    pub thought: String,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    Block(Block),
    Thought(Thought),
}

/// One node of the execution tree. Child order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub kind: EntryKind,
    pub created_at: Option<String>,
    pub children: Vec<TimelineEntry>,
}

impl TimelineEntry {
    pub fn block(&self) -> Option<&Block> {
        match &self.kind {
            EntryKind::Block(block) => Some(block),
            EntryKind::Thought(_) => None,
        }
    }

    pub fn thought(&self) -> Option<&Thought> {
        match &self.kind {
            EntryKind::Thought(thought) => Some(thought),
            EntryKind::Block(_) => None,
        }
    }
}

/// A whole execution tree, rebuilt from scratch on every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new(entries: Vec<TimelineEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pre-order, document-order traversal over every entry.
    pub fn walk(&self) -> super::query::Walk<'_> {
        super::query::Walk::new(&self.entries)
    }
}
