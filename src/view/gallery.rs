/// Chronological screenshot sequence with a viewing cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    urls: Vec<String>,
    cursor: usize,
}

impl Gallery {
    /// Opens on the most recent entry. Returns `None` for an empty list.
    pub fn at_latest(urls: Vec<String>) -> Option<Self> {
        let cursor = urls.len().checked_sub(1)?;
        Some(Self { urls, cursor })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &str {
        self.urls
            .get(self.cursor)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.urls.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) {
        self.cursor = if self.cursor + 1 < self.urls.len() {
            self.cursor + 1
        } else {
            0
        };
    }

    pub fn previous(&mut self) {
        self.cursor = if self.cursor > 0 {
            self.cursor - 1
        } else {
            self.urls.len().saturating_sub(1)
        };
    }

    /// One-based position, e.g. `3 / 7`.
    pub fn counter(&self) -> String {
        format!("{} / {}", self.cursor + 1, self.urls.len())
    }
}
