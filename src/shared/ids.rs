use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

const WORKFLOW_RUN_PREFIX: &str = "wr_";

pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-' or '_'"
    ))
}

/// Which backend resource family a run identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Task,
    Workflow,
}

impl RunKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Workflow => "workflow",
        }
    }
}

/// Identifier of one run. Workflow runs carry the `wr_` prefix; everything
/// else is addressed as a task run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        validate_identifier_value("run id", raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> RunKind {
        if self.0.starts_with(WORKFLOW_RUN_PREFIX) {
            RunKind::Workflow
        } else {
            RunKind::Task
        }
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::borrow::Borrow<str> for RunId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for RunId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|err| D::Error::custom(format!("invalid run id `{raw}`: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_prefix_selects_workflow_kind() {
        assert_eq!(RunId::parse("wr_123").expect("id").kind(), RunKind::Workflow);
        assert_eq!(RunId::parse("tsk_9").expect("id").kind(), RunKind::Task);
        assert_eq!(RunId::parse("wr123").expect("id").kind(), RunKind::Task);
    }

    #[test]
    fn rejects_empty_and_path_like_ids() {
        assert!(RunId::parse("").is_err());
        assert!(RunId::parse("../etc").is_err());
        assert!(RunId::parse("wr_1/cancel").is_err());
    }
}
