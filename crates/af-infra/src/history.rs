use std::sync::{Mutex, PoisonError};

use af_core::ports::HistoryPort;

/// History stack with a cursor at the last entry.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<String>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistoryPort for InMemoryHistory {
    fn current(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn push(&self, url: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
    }

    fn replace(&self, url: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.last_mut() {
            Some(last) => *last = url.to_string(),
            None => entries.push(url.to_string()),
        }
    }
}
