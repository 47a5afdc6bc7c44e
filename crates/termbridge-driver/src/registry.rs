use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::driver::SessionHandle;

/// One tracked session.
#[derive(Debug, Clone)]
pub struct RegisteredSession {
    pub handle: SessionHandle,
    pub created_at: DateTime<Utc>,
}

/// Owns the identifier -> handle mapping for all live sessions. The registry
/// is the sole authority on whether a session exists; lookups on missing
/// identifiers return None rather than failing.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: HashMap<String, RegisteredSession>,
    // Insertion order for `list`; kept in sync with `entries`.
    order: Vec<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate an identifier with a handle, replacing any prior entry for
    /// the same identifier. A replaced entry keeps its original position.
    pub fn put(&mut self, id: impl Into<String>, handle: SessionHandle) {
        let id = id.into();
        let session = RegisteredSession {
            handle,
            created_at: Utc::now(),
        };
        if self.entries.insert(id.clone(), session).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&SessionHandle> {
        self.entries.get(id).map(|entry| &entry.handle)
    }

    /// Remove an entry. Removing an unknown identifier is a no-op.
    pub fn remove(&mut self, id: &str) {
        if self.entries.remove(id).is_some() {
            self.order.retain(|known| known != id);
        }
    }

    /// Snapshot of current entries in insertion order.
    pub fn list(&self) -> Vec<(&str, &RegisteredSession)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| (id.as_str(), entry)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
