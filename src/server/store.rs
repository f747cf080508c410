//! In-memory key-value store backing the local service.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

/// Values are JSON documents; keys are namespaced per bearer token.
#[derive(Debug, Default)]
pub struct KvStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl KvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: Value) {
        self.lock().insert(key.to_string(), value);
    }

    /// Append to the JSON array at `key`, keeping at most `limit` items.
    pub fn append(&self, key: &str, item: Value, limit: usize) {
        let mut entries = self.lock();
        let slot = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(item);
            if items.len() > limit {
                let excess = items.len() - limit;
                items.drain(..excess);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Key for one user's document.
pub fn user_key(token: &str, name: &str) -> String {
    format!("user:{token}:{name}")
}
