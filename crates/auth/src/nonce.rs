//! Bounded nonce cache for replay defense.
//!
//! Insertion-ordered FIFO with a per-record TTL and a hard cap. Losing
//! the cache on restart is acceptable: request timestamps already bound
//! the replay window to the configured tolerance.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct Inner {
    queue: VecDeque<(String, Instant)>,
    live: HashSet<String>,
}

/// O(1) membership with insertion-ordered eviction. The only mutation
/// is [`check_and_insert`](NonceCache::check_and_insert), which is
/// atomic under the lock.
pub struct NonceCache {
    inner: Mutex<Inner>,
    cap: usize,
    ttl: Duration,
}

impl NonceCache {
    pub fn new(cap: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                live: HashSet::new(),
            }),
            cap,
            ttl,
        }
    }

    /// Returns `true` if this nonce was already seen within the TTL
    /// (replay). Otherwise records it and returns `false`.
    pub fn check_and_insert(&self, nonce: &str) -> bool {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        Self::evict(&mut inner, now, self.cap, self.ttl);

        if inner.live.contains(nonce) {
            return true;
        }
        inner.queue.push_back((nonce.to_owned(), now));
        inner.live.insert(nonce.to_owned());
        false
    }

    /// Non-consuming membership probe.
    pub fn contains(&self, nonce: &str) -> bool {
        let mut inner = self.inner.lock();
        Self::evict(&mut inner, Instant::now(), self.cap, self.ttl);
        inner.live.contains(nonce)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired records, then oldest records beyond the cap.
    /// Entries are pushed in time order, so the front is always oldest.
    fn evict(inner: &mut Inner, now: Instant, cap: usize, ttl: Duration) {
        while inner
            .queue
            .front()
            .is_some_and(|(_, ts)| now.duration_since(*ts) >= ttl)
        {
            if let Some((nonce, _)) = inner.queue.pop_front() {
                inner.live.remove(&nonce);
            }
        }
        while inner.queue.len() >= cap {
            match inner.queue.pop_front() {
                Some((nonce, _)) => {
                    inner.live.remove(&nonce);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_accepted_second_rejected() {
        let cache = NonceCache::new(16, Duration::from_secs(60));
        assert!(!cache.check_and_insert("n1"));
        assert!(cache.check_and_insert("n1"));
        assert!(!cache.check_and_insert("n2"));
    }

    #[test]
    fn expired_nonce_is_accepted_again() {
        let cache = NonceCache::new(16, Duration::from_millis(0));
        assert!(!cache.check_and_insert("n1"));
        std::thread::sleep(Duration::from_millis(1));
        assert!(!cache.check_and_insert("n1"));
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let cache = NonceCache::new(3, Duration::from_secs(60));
        assert!(!cache.check_and_insert("a"));
        assert!(!cache.check_and_insert("b"));
        assert!(!cache.check_and_insert("c"));
        // Inserting a fourth evicts "a", the oldest.
        assert!(!cache.check_and_insert("d"));
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.len() <= 3);
        // "a" can now be replayed undetected — bounded memory wins.
        assert!(!cache.check_and_insert("a"));
    }

    #[test]
    fn contains_does_not_consume() {
        let cache = NonceCache::new(16, Duration::from_secs(60));
        assert!(!cache.contains("n1"));
        assert!(!cache.check_and_insert("n1"));
        assert!(cache.contains("n1"));
    }
}
