//! Monotonic-token staleness gate.
//!
//! Each request takes a [`Ticket`]; issuing a ticket records its token as the
//! latest for its key. Before every externally visible step the request calls
//! [`Ticket::checkpoint`], and abandons the rest of its work once a newer
//! ticket exists. No lock is held across a step: a request already inside an
//! external call finishes the call and discards the result afterwards.
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superseded;

#[derive(Debug)]
struct Inner<K> {
    counter: AtomicU64,
    latest: Mutex<HashMap<K, u64>>,
}

#[derive(Debug, Clone)]
pub struct StalenessGate<K = PathBuf> {
    inner: Arc<Inner<K>>,
}

#[derive(Debug, Clone)]
pub struct Ticket<K = PathBuf> {
    gate: StalenessGate<K>,
    key: K,
    token: u64,
}

impl<K: Eq + Hash + Clone> Default for StalenessGate<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> StalenessGate<K> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner { counter: AtomicU64::new(0), latest: Mutex::new(HashMap::new()) }),
        }
    }

    /// Issue a fresh token for `key`, superseding every earlier ticket for it.
    pub fn issue(&self, key: K) -> Ticket<K> {
        let token = self.inner.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut latest = self.inner.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.insert(key.clone(), token);
        Ticket { gate: self.clone(), key, token }
    }

    pub fn latest(&self, key: &K) -> Option<u64> {
        let latest = self.inner.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.get(key).copied()
    }
}

impl<K: Eq + Hash + Clone> Ticket<K> {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn is_current(&self) -> bool {
        self.gate.latest(&self.key) == Some(self.token)
    }

    pub fn checkpoint(&self) -> Result<(), Superseded> {
        if self.is_current() { Ok(()) } else { Err(Superseded) }
    }
}
