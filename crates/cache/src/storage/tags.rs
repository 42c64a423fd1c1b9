//! Tag subscriptions for the in-memory store

use std::collections::HashMap;

/// Tag name → subscribed entries (entry id → key)
///
/// Entry ids are unique per write, so a subscription never outlives the
/// exact entry it was created for even when the key is rewritten.
#[derive(Debug, Default)]
pub(crate) struct TagIndex {
    subscribers: HashMap<String, HashMap<u64, String>>,
}

impl TagIndex {
    /// Tags compare case-insensitively
    pub fn normalize(tag: &str) -> String {
        tag.to_lowercase()
    }

    pub fn subscribe(&mut self, tags: &[String], key: &str, id: u64) {
        for tag in tags {
            self.subscribers
                .entry(tag.clone())
                .or_default()
                .insert(id, key.to_string());
        }
    }

    pub fn unsubscribe(&mut self, tags: &[String], id: u64) {
        for tag in tags {
            if let Some(entries) = self.subscribers.get_mut(tag) {
                entries.remove(&id);
                if entries.is_empty() {
                    self.subscribers.remove(tag);
                }
            }
        }
    }

    /// Retire and return every subscriber of `tag`
    pub fn take(&mut self, tag: &str) -> Vec<(u64, String)> {
        self.subscribers
            .remove(tag)
            .map(|entries| entries.into_iter().collect())
            .unwrap_or_default()
    }

    /// Retire and return every subscriber of every tag
    pub fn take_all(&mut self) -> Vec<(u64, String)> {
        let mut all = HashMap::new();
        for (_, entries) in self.subscribers.drain() {
            all.extend(entries);
        }
        all.into_iter().collect()
    }

    pub fn tag_count(&self) -> usize {
        self.subscribers.len()
    }
}
