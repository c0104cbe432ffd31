//! The ephemeral draft-order cache (`spec.md` §5, §9; `SPEC_FULL.md` §12).
//!
//! Hands data from an order-generation request to an order-edit UI via a
//! random token. Process-local, not replicated, not persisted -- loss on
//! restart is documented, acceptable behavior. Fixed at a 1 hour TTL,
//! evicted lazily on access rather than via a background sweeper, mirroring
//! `original_source/scheduler.py`'s habit of folding cleanup into the next
//! access instead of running a separate daemon.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use kiosk_forecast::OrderSuggestion;

const DRAFT_TTL: Duration = Duration::from_secs(60 * 60);

struct Entry {
    items: Vec<OrderSuggestion>,
    expires_at: Instant,
}

/// Token-keyed handoff for order drafts awaiting admin edits before
/// `OrderBook::create`. `token` is caller-supplied (a random string); this
/// cache does not generate tokens itself.
pub struct DraftOrderCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for DraftOrderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftOrderCache {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    pub fn put(&self, token: String, items: Vec<OrderSuggestion>) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(token, Entry { items, expires_at: Instant::now() + DRAFT_TTL });
    }

    /// Returns the draft if present and not expired. An expired entry is
    /// evicted as a side effect of this lookup, not by a timer.
    pub fn get(&self, token: &str) -> Option<Vec<OrderSuggestion>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(token) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.items.clone()),
            Some(_) => {
                entries.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn remove(&self, token: &str) {
        self.entries.lock().unwrap().remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<OrderSuggestion> {
        vec![OrderSuggestion {
            product_id: kiosk_core::ProductId::from_raw(1),
            avg_daily: 2.0,
            days_left: 5.0,
            deficit_weight: 10.0,
            boxes: 1,
            cost: 56_000.0,
            urgent: false,
        }]
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = DraftOrderCache::new();
        cache.put("tok1".into(), sample());
        assert_eq!(cache.get("tok1"), Some(sample()));
    }

    #[test]
    fn missing_token_is_none() {
        let cache = DraftOrderCache::new();
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entry_is_evicted_on_access() {
        let cache = DraftOrderCache::new();
        cache.entries.lock().unwrap().insert(
            "expired".into(),
            Entry { items: sample(), expires_at: Instant::now() - Duration::from_secs(1) },
        );
        assert_eq!(cache.get("expired"), None);
        assert!(!cache.entries.lock().unwrap().contains_key("expired"));
    }
}
