//! Forcing an artifact into the language service's working set.
//!
//! The service only answers accurately for files it has opened once, so the
//! first request per path opens it beside the current view, waits (bounded)
//! for it to be indexed, and closes it again. Membership is a one-time fact
//! per path and is never removed.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::service::LanguageService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for IndexWait {
    fn default() -> Self {
        Self { timeout: Duration::from_millis(2000), poll_interval: Duration::from_millis(500) }
    }
}

#[derive(Debug, Default)]
pub struct IndexedSet {
    paths: Mutex<HashSet<PathBuf>>,
}

impl IndexedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        let paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.contains(path)
    }

    fn insert(&self, path: &Path) {
        let mut paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.insert(path.to_path_buf());
    }

    /// Make sure `path` has been indexed by `service` at least once.
    ///
    /// Gives up waiting after `wait.timeout` and proceeds regardless.
    pub async fn ensure_indexed(&self, path: &Path, service: &dyn LanguageService, wait: IndexWait) {
        if self.contains(path) {
            return;
        }
        // someone else keeps it open (and indexed)
        if service.is_open(path) {
            return;
        }

        if let Err(error) = service.open_beside(path).await {
            warn!(path = %path.display(), %error, "failed to open artifact for indexing");
            return;
        }

        let started = Instant::now();
        while started.elapsed() < wait.timeout && !service.has_diagnostics(path) {
            tokio::time::sleep(wait.poll_interval).await;
        }
        if !service.has_diagnostics(path) {
            debug!(path = %path.display(), "indexing wait timed out; continuing");
        }

        service.close(path).await;
        self.insert(path);
    }
}
