use crate::shared::serde_ext::{decode_each, opt_string, string_or_empty};
use crate::shared::time::parse_timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A stored output of a run or block. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub artifact_id: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub artifact_type: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub uri: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub signed_url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactCategory {
    Screenshot,
    Recording,
    LogOrTrace,
    GeneratedCode,
    Other,
}

impl ArtifactCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Screenshot => "Screenshots",
            Self::Recording => "Recordings",
            Self::LogOrTrace => "Logs & Traces",
            Self::GeneratedCode => "Generated Code",
            Self::Other => "Other",
        }
    }

    const DISPLAY_ORDER: [ArtifactCategory; 5] = [
        Self::Screenshot,
        Self::Recording,
        Self::LogOrTrace,
        Self::GeneratedCode,
        Self::Other,
    ];
}

impl Artifact {
    /// Browser-fetchable URL: the pre-signed URL when present, else the
    /// storage URI.
    pub fn fetch_url(&self) -> Option<&str> {
        self.signed_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| Some(self.uri.as_str()).filter(|uri| !uri.trim().is_empty()))
    }

    pub fn category(&self) -> ArtifactCategory {
        let kind = self.artifact_type.as_str();
        if kind.starts_with("screenshot") {
            ArtifactCategory::Screenshot
        } else if kind == "recording" {
            ArtifactCategory::Recording
        } else if kind.contains("log") || kind == "har" || kind == "trace" {
            ArtifactCategory::LogOrTrace
        } else if kind == "script_file" {
            ArtifactCategory::GeneratedCode
        } else {
            ArtifactCategory::Other
        }
    }

    pub fn file_name(&self) -> &str {
        let url = self.fetch_url().unwrap_or_default();
        let path = url.split(['?', '#']).next().unwrap_or(url);
        match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => self.artifact_type.as_str(),
        }
    }
}

/// Orders artifacts oldest first. Artifacts without a parseable timestamp
/// sort ahead of dated ones; ties keep their input order.
pub fn sort_chronologically(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| {
        let a = a.created_at.as_deref().and_then(parse_timestamp);
        let b = b.created_at.as_deref().and_then(parse_timestamp);
        match (a, b) {
            (Some(a), Some(b)) => a.cmp(&b),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Groups artifacts for display. Empty groups are omitted.
pub fn group_artifacts(artifacts: &[Artifact]) -> Vec<(ArtifactCategory, Vec<&Artifact>)> {
    ArtifactCategory::DISPLAY_ORDER
        .iter()
        .map(|category| {
            let items: Vec<&Artifact> = artifacts
                .iter()
                .filter(|artifact| artifact.category() == *category)
                .collect();
            (*category, items)
        })
        .filter(|(_, items)| !items.is_empty())
        .collect()
}

/// Decodes an artifact list body, dropping malformed elements.
pub fn parse_artifacts(body: &str) -> Result<Vec<Artifact>, String> {
    match serde_json::from_str::<Value>(body).map_err(|err| err.to_string())? {
        Value::Array(items) => Ok(decode_each(items)),
        _ => Err("artifact body must be a JSON array".to_string()),
    }
}
