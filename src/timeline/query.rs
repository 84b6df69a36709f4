use super::model::{Block, BlockType, Timeline, TimelineEntry};

/// Pre-order traversal backed by an explicit stack, so tree depth never
/// translates into call-stack depth.
pub struct Walk<'a> {
    stack: Vec<std::slice::Iter<'a, TimelineEntry>>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(entries: &'a [TimelineEntry]) -> Self {
        Self {
            stack: vec![entries.iter()],
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TimelineEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(entry) => {
                    if !entry.children.is_empty() {
                        self.stack.push(entry.children.iter());
                    }
                    return Some(entry);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// A human-review checkpoint the run is parked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReview<'a> {
    pub label: Option<&'a str>,
}

impl PendingReview<'_> {
    pub const FALLBACK_LABEL: &'static str = "Human Review";

    pub fn display_label(&self) -> &str {
        self.label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(Self::FALLBACK_LABEL)
    }
}

impl Timeline {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.walk().filter_map(TimelineEntry::block)
    }

    /// The block live observation should follow: the first running block in
    /// document order, else the last block visited.
    pub fn find_best_block(&self) -> Option<&Block> {
        let mut last = None;
        for block in self.blocks() {
            if block.is_running() {
                return Some(block);
            }
            last = Some(block);
        }
        last
    }

    /// First human-review block that is running or has no status yet.
    pub fn find_pending_human_review(&self) -> Option<PendingReview<'_>> {
        self.blocks()
            .find(|block| block.block_type == BlockType::HumanInteraction && block.is_pending())
            .map(|block| PendingReview {
                label: block.label.as_deref(),
            })
    }

    pub fn count_actions(&self) -> usize {
        self.blocks().map(|block| block.actions.len()).sum()
    }
}
