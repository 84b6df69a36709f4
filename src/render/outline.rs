use super::labels::{action_label, block_type_label, count_label};
use crate::shared::time::format_duration_secs;
use crate::timeline::{Action, Block, EntryKind, Thought, Timeline, TimelineEntry};
use std::collections::BTreeSet;
use std::fmt::Write as _;

const INDENT: &str = "  ";
const OUTPUT_PREVIEW_CHARS: usize = 160;

/// Which blocks of the outline show their details and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineOptions {
    /// Blocks shallower than this depth start expanded.
    pub expand_depth: usize,
    /// Block ids whose default expansion is flipped.
    pub toggled: BTreeSet<String>,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            expand_depth: 1,
            toggled: BTreeSet::new(),
        }
    }
}

impl OutlineOptions {
    pub fn expanded_all() -> Self {
        Self {
            expand_depth: usize::MAX,
            toggled: BTreeSet::new(),
        }
    }

    pub fn toggle(&mut self, block_id: &str) {
        if !self.toggled.remove(block_id) {
            self.toggled.insert(block_id.to_string());
        }
    }

    fn is_expanded(&self, block: &Block, depth: usize) -> bool {
        (depth < self.expand_depth) != self.toggled.contains(&block.id)
    }
}

fn has_content(entry: &TimelineEntry, block: &Block) -> bool {
    !entry.children.is_empty()
        || !block.actions.is_empty()
        || block.output.is_some()
        || block.failure_reason.is_some()
}

/// Renders the execution tree as an indented, collapsible text outline.
/// Walks with an explicit stack so nesting depth is not bounded by the
/// call stack.
pub fn render_outline(timeline: &Timeline, options: &OutlineOptions) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&TimelineEntry, usize)> =
        timeline.entries.iter().rev().map(|entry| (entry, 0)).collect();

    while let Some((entry, depth)) = stack.pop() {
        let pad = INDENT.repeat(depth);
        match &entry.kind {
            EntryKind::Thought(thought) => write_thought(&mut out, &pad, thought),
            EntryKind::Block(block) => {
                let expandable = has_content(entry, block);
                let expanded = expandable && options.is_expanded(block, depth);
                write_block_header(&mut out, &pad, block, expandable, expanded);
                if expanded {
                    write_block_details(&mut out, &pad, block);
                    stack.extend(entry.children.iter().rev().map(|child| (child, depth + 1)));
                }
            }
        }
    }
    out
}

fn write_thought(out: &mut String, pad: &str, thought: &Thought) {
    let _ = writeln!(out, "{pad}  thought: {}", thought.thought);
    if let Some(answer) = thought.answer.as_deref().filter(|a| !a.trim().is_empty()) {
        let _ = writeln!(out, "{pad}    answer: {answer}");
    }
}

fn write_block_header(out: &mut String, pad: &str, block: &Block, expandable: bool, expanded: bool) {
    let marker = match (expandable, expanded) {
        (false, _) => ' ',
        (true, true) => 'v',
        (true, false) => '>',
    };
    let mut line = format!("{pad}{marker} [{}]", block_type_label(&block.block_type));
    if let Some(title) = block.title() {
        let _ = write!(line, " {title}");
    }
    let mut meta = Vec::new();
    if !block.actions.is_empty() {
        meta.push(count_label(block.actions.len(), "action"));
    }
    if let Some(duration) = block.duration {
        meta.push(format_duration_secs(duration));
    }
    if let Some(status) = block.status.as_deref() {
        meta.push(status.to_string());
    }
    if !meta.is_empty() {
        let _ = write!(line, " ({})", meta.join(", "));
    }
    let _ = writeln!(out, "{line}");
}

fn write_block_details(out: &mut String, pad: &str, block: &Block) {
    if let Some(url) = block.url.as_deref() {
        let _ = writeln!(out, "{pad}    url: {url}");
    }
    if block.label.is_some() {
        if let Some(goal) = block.navigation_goal.as_deref() {
            let _ = writeln!(out, "{pad}    goal: {goal}");
        }
    }
    if let Some(reason) = block.failure_reason.as_deref() {
        let _ = writeln!(out, "{pad}    failure: {reason}");
    }
    for (index, action) in block.actions.iter().enumerate() {
        write_action(out, pad, index, action);
    }
    if let Some(output) = &block.output {
        let _ = writeln!(out, "{pad}    output: {}", preview(&output.to_string()));
    }
}

fn write_action(out: &mut String, pad: &str, index: usize, action: &Action) {
    let mut line = format!(
        "{pad}    {}. {} [{}]",
        index + 1,
        action_label(&action.action_type),
        action.status.as_str()
    );
    let detail = action
        .reasoning
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .or(action.description.as_deref());
    if let Some(detail) = detail {
        let _ = write!(line, " {detail}");
    }
    let _ = writeln!(out, "{line}");
}

fn preview(text: &str) -> String {
    if text.chars().count() <= OUTPUT_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(OUTPUT_PREVIEW_CHARS).collect();
    format!("{cut}...")
}
