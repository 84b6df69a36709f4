use super::status::RunPhase;
use crate::shared::serde_ext::{
    object_or_empty, opt_string, opt_string_list, opt_u64, opt_value, string_or_empty,
    value_list,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend record of one run. Every attribute is optional on the wire; a
/// field of the wrong shape decodes as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub run_id: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_value")]
    pub output: Option<Value>,
    #[serde(default, deserialize_with = "opt_string")]
    pub recording_url: Option<String>,
    #[serde(default, deserialize_with = "opt_string_list")]
    pub screenshot_urls: Option<Vec<String>>,
    #[serde(default, deserialize_with = "downloaded_files")]
    pub downloaded_files: Vec<DownloadedFile>,
    #[serde(default, deserialize_with = "opt_string")]
    pub failure_reason: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub modified_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub queued_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub started_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub finished_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub app_url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub browser_session_id: Option<String>,
    #[serde(default, deserialize_with = "opt_u64")]
    pub step_count: Option<u64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub run_type: Option<String>,
    #[serde(default, deserialize_with = "value_list")]
    pub errors: Vec<Value>,
    #[serde(default, deserialize_with = "run_request")]
    pub run_request: Option<RunRequest>,
}

impl Run {
    pub fn phase(&self) -> RunPhase {
        RunPhase::classify(self.status.as_deref())
    }

    pub fn step_count(&self) -> u64 {
        self.step_count.unwrap_or(0)
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.run_request
            .as_ref()
            .and_then(|request| request.workflow_id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.run_request
            .as_ref()
            .and_then(|request| request.title.as_deref())
            .filter(|title| !title.trim().is_empty())
    }
}

/// The parameters the run was submitted with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default, deserialize_with = "opt_string")]
    pub workflow_id: Option<String>,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub parameters: Map<String, Value>,
    #[serde(default, deserialize_with = "opt_string")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub navigation_goal: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub data_extraction_goal: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub proxy_location: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub webhook_url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub totp_identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DownloadedFile {
    Url(String),
    Info {
        #[serde(default)]
        name: String,
        url: String,
        #[serde(default)]
        size: Option<u64>,
    },
}

impl DownloadedFile {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Info { url, .. } => url,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Url(url) => url.rsplit('/').next().unwrap_or(url),
            Self::Info { name, url, .. } if name.trim().is_empty() => {
                url.rsplit('/').next().unwrap_or(url)
            }
            Self::Info { name, .. } => name,
        }
    }
}

fn downloaded_files<'de, D>(deserializer: D) -> Result<Vec<DownloadedFile>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(crate::shared::serde_ext::decode_each(value_list(deserializer)?))
}

fn run_request<'de, D>(deserializer: D) -> Result<Option<RunRequest>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match opt_value(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Decodes a run body. A body that is not a JSON object is rejected; any
/// object decodes.
pub fn parse_run(body: &str) -> Result<Run, String> {
    let raw: Value = serde_json::from_str(body).map_err(|err| err.to_string())?;
    if !raw.is_object() {
        return Err("run body must be a JSON object".to_string());
    }
    serde_json::from_value(raw).map_err(|err| err.to_string())
}
