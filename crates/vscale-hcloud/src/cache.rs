//! TTL-bounded cache of server types.
//!
//! Server types and their prices change rarely; the cache keeps one list
//! and the instant it was fetched. A stale entry is treated as absent.

use std::time::Duration;

use tokio::time::Instant;

use crate::types::ServerType;

#[derive(Debug)]
pub struct SizeCache {
    entries: Option<Vec<ServerType>>,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl SizeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: None,
            fetched_at: None,
            ttl,
        }
    }

    /// Cached server types, if fetched less than `ttl` ago.
    pub fn get(&self) -> Option<&[ServerType]> {
        let fetched_at = self.fetched_at?;
        if fetched_at.elapsed() >= self.ttl {
            return None;
        }
        self.entries.as_deref()
    }

    pub fn store(&mut self, entries: Vec<ServerType>) {
        self.entries = Some(entries);
        self.fetched_at = Some(Instant::now());
    }

    pub fn invalidate(&mut self) {
        self.entries = None;
        self.fetched_at = None;
    }
}
