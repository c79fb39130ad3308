//! Thread-safe content cell.
//!
//! [`ContentCell`] holds the cached file content and the bookkeeping that
//! read completions need: the epoch counter, the sequence number of the
//! read whose result is current, and the closed flag set at teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Outcome of applying a completed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    /// Content replaced. `stale` is set when a newer read had already
    /// been applied, i.e. this result regressed the content.
    Replaced { epoch: u64, stale: bool },
    /// The cell was closed; the result was discarded.
    Closed,
}

struct Slot {
    content: Arc<String>,
    applied_seq: u64,
    closed: bool,
}

/// Cached content shared between the owning [`LiveFile`](crate::LiveFile)
/// and its read threads.
///
/// Readers get an `Arc<String>` and never block writers for longer than a
/// pointer swap.
pub(crate) struct ContentCell {
    inner: RwLock<Slot>,

    /// Incremented on each read-driven replacement.
    epoch: AtomicU64,
}

impl ContentCell {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Slot {
                content: Arc::new(String::new()),
                applied_seq: 0,
                closed: false,
            }),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> Arc<String> {
        self.inner.read().content.clone()
    }

    pub fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let guard = self.inner.read();
        f(guard.content.as_str())
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    /// Overwrite the content directly. Does not touch the epoch.
    pub fn set(&self, content: String) {
        self.inner.write().content = Arc::new(content);
    }

    /// Apply the result of read number `seq`.
    ///
    /// The closed check and the swap happen under one write lock, so a
    /// read finishing concurrently with teardown cannot resurrect content.
    pub fn apply_read(&self, seq: u64, content: Arc<String>) -> Applied {
        let mut guard = self.inner.write();
        if guard.closed {
            return Applied::Closed;
        }

        let stale = seq < guard.applied_seq;
        guard.applied_seq = guard.applied_seq.max(seq);
        guard.content = content;

        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        Applied::Replaced { epoch, stale }
    }

    /// Mark the cell closed and clear the content. Returns `false` if it
    /// was already closed.
    pub fn close(&self) -> bool {
        let mut guard = self.inner.write();
        if guard.closed {
            return false;
        }
        guard.closed = true;
        guard.content = Arc::new(String::new());
        true
    }
}

// Manual Debug impl to keep file content out of logs
impl std::fmt::Debug for ContentCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.read();
        f.debug_struct("ContentCell")
            .field("len", &guard.content.len())
            .field("epoch", &self.epoch())
            .field("closed", &guard.closed)
            .finish_non_exhaustive()
    }
}
