use super::model::{
    Action, ActionStatus, ActionType, Block, BlockType, EntryKind, Thought, Timeline,
    TimelineEntry,
};
use crate::shared::serde_ext::{
    decode_each, opt_f64, opt_string, opt_value, string_or_empty, value_list,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, rename = "type", deserialize_with = "opt_string")]
    tag: Option<String>,
    #[serde(default, deserialize_with = "opt_value")]
    block: Option<Value>,
    #[serde(default, deserialize_with = "opt_value")]
    thought: Option<Value>,
    #[serde(default, deserialize_with = "value_list")]
    children: Vec<Value>,
    #[serde(default, deserialize_with = "opt_string")]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(default, deserialize_with = "string_or_empty")]
    workflow_run_block_id: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    block_type: String,
    #[serde(default, rename = "type", deserialize_with = "string_or_empty")]
    type_tag: String,
    #[serde(default, deserialize_with = "opt_string")]
    label: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "opt_value")]
    output: Option<Value>,
    #[serde(default, deserialize_with = "opt_string")]
    failure_reason: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    navigation_goal: Option<String>,
    #[serde(default, deserialize_with = "opt_f64")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "value_list")]
    actions: Vec<Value>,
    #[serde(default, deserialize_with = "opt_string")]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThought {
    #[serde(default, deserialize_with = "opt_string")]
    thought: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default, deserialize_with = "string_or_empty")]
    action_type: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    status: String,
    #[serde(default, deserialize_with = "opt_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    reasoning: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    element_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preferred {
    Block,
    Thought,
    Either,
}

/// Parses a timeline response body. Only a body that is not JSON, or whose
/// top level is not an array, is an error; malformed entries inside the array
/// are dropped.
///
/// serde_json stops at 128 levels of nesting, and every entry level costs two
/// (the entry object and its `children` array). Bodies nested deeper than
/// about 60 entries are rejected as a whole, which also bounds the recursion
/// in [`normalize_timeline`].
pub fn parse_timeline(body: &str) -> Result<Timeline, String> {
    let raw: Value = serde_json::from_str(body).map_err(|err| err.to_string())?;
    match raw {
        Value::Array(_) => Ok(normalize_timeline(&raw)),
        other => Err(format!(
            "timeline body must be a JSON array, got {}",
            json_kind(&other)
        )),
    }
}

/// Builds a render-safe tree from an arbitrary snapshot. Never fails: a
/// non-array input yields an empty tree.
pub fn normalize_timeline(raw: &Value) -> Timeline {
    match raw {
        Value::Array(items) => Timeline::new(normalize_entries(items)),
        _ => Timeline::default(),
    }
}

fn normalize_entries(items: &[Value]) -> Vec<TimelineEntry> {
    items.iter().filter_map(normalize_entry).collect()
}

fn normalize_entry(item: &Value) -> Option<TimelineEntry> {
    let raw = RawEntry::deserialize(item).ok()?;
    let preferred = match raw.tag.as_deref() {
        Some("block") => Preferred::Block,
        Some("thought") => Preferred::Thought,
        _ => Preferred::Either,
    };

    let block = raw.block.as_ref().and_then(normalize_block);
    let thought = raw.thought.as_ref().and_then(normalize_thought);
    let kind = match (preferred, block, thought) {
        (Preferred::Thought, _, Some(thought)) => EntryKind::Thought(thought),
        (_, Some(block), _) => EntryKind::Block(block),
        (_, None, Some(thought)) => EntryKind::Thought(thought),
        (_, None, None) => return None,
    };

    Some(TimelineEntry {
        kind,
        created_at: raw.created_at,
        children: normalize_entries(&raw.children),
    })
}

fn normalize_block(raw: &Value) -> Option<Block> {
    if !raw.is_object() {
        return None;
    }
    let raw = RawBlock::deserialize(raw).ok()?;
    // Some snapshots tag the block kind as `type` instead of `block_type`.
    let block_type = if raw.block_type.trim().is_empty() {
        &raw.type_tag
    } else {
        &raw.block_type
    };
    Some(Block {
        block_type: BlockType::parse(block_type),
        id: raw.workflow_run_block_id,
        label: raw.label,
        status: raw.status,
        output: raw.output,
        failure_reason: raw.failure_reason,
        url: raw.url,
        navigation_goal: raw.navigation_goal,
        duration: raw.duration,
        actions: decode_each::<RawAction>(raw.actions)
            .into_iter()
            .map(|action| Action {
                action_type: ActionType::parse(&action.action_type),
                status: ActionStatus::parse(&action.status),
                description: action.description,
                reasoning: action.reasoning,
                element_id: action.element_id,
            })
            .collect(),
        created_at: raw.created_at,
    })
}

fn normalize_thought(raw: &Value) -> Option<Thought> {
    if !raw.is_object() {
        return None;
    }
    let raw = RawThought::deserialize(raw).ok()?;
    Some(Thought {
        thought: raw.thought.unwrap_or_default(),
        answer: raw.answer,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_without_payload_are_dropped() {
        let timeline = normalize_timeline(&json!([
            {"type": "block", "children": []},
            {"type": "thought", "thought": {"thought": "look", "answer": null}},
            42,
            "junk"
        ]));
        assert_eq!(timeline.entries.len(), 1);
        assert_eq!(
            timeline.entries[0].thought().map(|t| t.thought.as_str()),
            Some("look")
        );
    }

    #[test]
    fn missing_children_default_to_empty() {
        let timeline = normalize_timeline(&json!([
            {"type": "block", "block": {"block_type": "task", "status": "completed"}},
            {"type": "block", "block": {"block_type": "task"}, "children": null}
        ]));
        assert_eq!(timeline.entries.len(), 2);
        assert!(timeline.entries.iter().all(|entry| entry.children.is_empty()));
    }

    #[test]
    fn tag_selects_payload_when_both_are_present() {
        let timeline = normalize_timeline(&json!([
            {
                "type": "thought",
                "block": {"block_type": "task"},
                "thought": {"thought": "prefer me"}
            },
            {
                "block": {"block_type": "task"},
                "thought": {"thought": "untagged"}
            }
        ]));
        assert!(timeline.entries[0].thought().is_some());
        assert!(timeline.entries[1].block().is_some());
    }

    #[test]
    fn malformed_actions_are_dropped_and_fields_tolerate_wrong_types() {
        let timeline = normalize_timeline(&json!([
            {
                "type": "block",
                "block": {
                    "workflow_run_block_id": "wrb_1",
                    "block_type": "navigation",
                    "status": 7,
                    "duration": "long",
                    "actions": [
                        {"action_type": "click", "status": "completed"},
                        "not an action",
                        {"action_type": "input_text"}
                    ]
                }
            }
        ]));
        let block = timeline.entries[0].block().expect("block");
        assert_eq!(block.status, None);
        assert_eq!(block.duration, None);
        assert_eq!(block.actions.len(), 2);
        assert_eq!(block.actions[1].status, ActionStatus::Pending);
        assert_eq!(block.actions[0].action_type, ActionType::Click);
    }

    #[test]
    fn block_kind_falls_back_to_type_tag() {
        let timeline = normalize_timeline(&json!([
            {"type": "block", "block": {"type": "human_interaction", "status": null}, "children": []}
        ]));
        let block = timeline.entries[0].block().expect("block");
        assert_eq!(block.block_type, BlockType::HumanInteraction);
    }

    fn nested_body(depth: usize) -> String {
        let mut body = String::from("[");
        for _ in 0..depth {
            body.push_str(r#"{"type":"block","block":{"block_type":"task"},"children":["#);
        }
        body.push_str(&"]}".repeat(depth));
        body.push(']');
        body
    }

    #[test]
    fn fifty_levels_of_nesting_parse() {
        let timeline = parse_timeline(&nested_body(50)).expect("depth 50");
        assert_eq!(timeline.walk().count(), 50);
    }

    #[test]
    fn nesting_past_the_parser_limit_is_rejected() {
        assert!(parse_timeline(&nested_body(100)).is_err());
    }

    #[test]
    fn parse_rejects_non_array_bodies_only() {
        assert!(parse_timeline("{\"detail\": \"nope\"}").is_err());
        assert!(parse_timeline("<html>").is_err());
        assert_eq!(parse_timeline("[]").expect("empty").entries.len(), 0);
    }
}
