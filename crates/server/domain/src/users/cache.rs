//! Known-Users Cache
//!
//! Concurrent, insert-only membership set of every user id this process has
//! observed via `UserRegistered` events. Membership reads reflect only
//! locally applied consumer state and may lag the upstream user service —
//! callers treat `is_known` as a soft check, never as a hard guarantee.
//!
//! There is no removal and no eviction: memory grows with the number of
//! distinct users observed over the process lifetime.

use crate::shared_kernel::UserId;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct KnownUsersCache {
    known: DashMap<UserId, ()>,
}

impl KnownUsersCache {
    pub fn new() -> Self {
        Self {
            known: DashMap::new(),
        }
    }

    /// Record that a user exists. Idempotent and safe under concurrent calls.
    pub fn observe(&self, user_id: UserId) {
        self.known.insert(user_id, ());
    }

    /// Non-blocking membership read of current local knowledge.
    pub fn is_known(&self, user_id: &UserId) -> bool {
        self.known.contains_key(user_id)
    }

    /// Number of distinct users observed so far.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_observe_then_is_known() {
        let cache = KnownUsersCache::new();
        let user_id = UserId::new();

        assert!(!cache.is_known(&user_id));
        cache.observe(user_id);
        assert!(cache.is_known(&user_id));
    }

    #[test]
    fn test_observe_is_idempotent() {
        let cache = KnownUsersCache::new();
        let user_id = UserId::new();

        for _ in 0..10 {
            cache.observe(user_id);
        }

        assert!(cache.is_known(&user_id));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_observers_do_not_duplicate() {
        let cache = Arc::new(KnownUsersCache::new());
        let user_id = UserId::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    cache.observe(user_id);
                    assert!(cache.is_known(&user_id));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 1);
    }
}
