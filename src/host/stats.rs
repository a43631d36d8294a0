//! Frame counters for the display and scan loops
//!
//! Lock-free so the signal task and the loops can share them freely.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Stats {
    /// Frames handed to the display sink
    shown: AtomicU64,
    /// Scanned frames that added information
    accepted: AtomicU64,
    /// Scanned frames already seen
    duplicate: AtomicU64,
    /// Scanned lines that did not parse
    malformed: AtomicU64,
    /// Scanned frames of another payload
    foreign: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub shown: u64,
    pub accepted: u64,
    pub duplicate: u64,
    pub malformed: u64,
    pub foreign: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_shown(&self) {
        self.shown.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_duplicate(&self) {
        self.duplicate.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_foreign(&self) {
        self.foreign.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            shown: self.shown.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            foreign: self.foreign.load(Ordering::Relaxed),
        }
    }
}
