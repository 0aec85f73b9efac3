//! Session history: a stack of entries with a cursor, like `window.history`.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Structured state passed to `push_state`/`replace_state`.
    pub state: Value,
    /// Site-relative path the entry points at.
    pub url: String,
}

/// What a back/forward traversal hands to popstate listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct PopState {
    pub state: Value,
    pub url: String,
}

impl PopState {
    /// The `url` carried in the state object, if any.
    pub fn state_url(&self) -> Option<&str> {
        self.state.get("url").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl History {
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![HistoryEntry {
                state: Value::Null,
                url: initial_url.to_string(),
            }],
            index: 0,
        }
    }

    /// Push a new entry, discarding any forward entries.
    pub fn push_state(&mut self, state: Value, url: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            state,
            url: url.to_string(),
        });
        self.index = self.entries.len() - 1;
    }

    pub fn replace_state(&mut self, state: Value, url: &str) {
        self.entries[self.index] = HistoryEntry {
            state,
            url: url.to_string(),
        };
    }

    pub fn back(&mut self) -> Option<PopState> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.pop_state())
    }

    pub fn forward(&mut self) -> Option<PopState> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.pop_state())
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    /// The current entry's state.
    pub fn state(&self) -> &Value {
        &self.current().state
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn pop_state(&self) -> PopState {
        let entry = self.current();
        PopState {
            state: entry.state.clone(),
            url: entry.url.clone(),
        }
    }
}
