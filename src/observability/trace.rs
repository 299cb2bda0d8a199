//! Trace tag sinks
//!
//! Tags are key/value annotations for an instrumentation backend. Sinks
//! never fail and never influence the request.

use std::sync::Mutex;

/// Receives trace tags for the current operation
pub trait TraceSink: Send + Sync {
    fn tag(&self, key: &str, value: &str);
}

/// Sink that drops every tag
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTraceSink;

impl TraceSink for NoOpTraceSink {
    fn tag(&self, _key: &str, _value: &str) {}
}

/// Sink that keeps tags in memory (for testing)
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    tags: Mutex<Vec<(String, String)>>,
}

impl MemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All tags in arrival order
    pub fn tags(&self) -> Vec<(String, String)> {
        self.tags.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Latest value recorded for `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.tags
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.tags.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for MemoryTraceSink {
    fn tag(&self, key: &str, value: &str) {
        if let Ok(mut tags) = self.tags.lock() {
            tags.push((key.to_string(), value.to_string()));
        }
    }
}
