//! Bounded directory queue with a pending-work barrier
//!
//! Every directory handed to the queue carries a [`PendingGuard`]. The guard
//! is released when the directory and everything submitted while it was
//! being processed is done, so a zero count means the traversal is drained
//! and the queue can be closed. A submit never blocks: when the channel is
//! full the item is handed back to the caller to be walked inline.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};

/// Count of directories submitted but not yet fully processed
#[derive(Debug, Default)]
pub struct Pending {
    count:   AtomicUsize,
    lock:    Mutex<()>,
    drained: Condvar,
}

impl Pending {
    /// Create an empty barrier
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one unit of pending work
    #[must_use = "work is only finished when the guard is dropped"]
    pub fn enter(self: &Arc<Self>) -> PendingGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        PendingGuard { pending: Arc::clone(self) }
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Block until the count reaches zero
    pub fn wait(&self) {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.count.load(Ordering::SeqCst) != 0 {
            guard = self.drained.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn leave(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.drained.notify_all();
        }
    }
}

/// RAII marker for one pending directory
#[derive(Debug)]
pub struct PendingGuard {
    pending: Arc<Pending>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.leave();
    }
}

/// A directory waiting to be listed
#[derive(Debug)]
pub struct WorkItem {
    path:   PathBuf,
    _guard: PendingGuard,
}

impl WorkItem {
    /// Create an item tracked by `pending`
    #[must_use]
    pub fn new(path: PathBuf, pending: &Arc<Pending>) -> Self {
        Self { path, _guard: pending.enter() }
    }

    /// Directory to list
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Outcome of a non-blocking submit
#[derive(Debug)]
pub enum Submit {
    /// The item is in the queue
    Queued,
    /// The queue is full; the caller now owns the item
    Full(WorkItem),
}

/// Bounded multi-producer multi-consumer queue of directories
#[derive(Debug)]
pub struct WorkQueue {
    sender:   Sender<WorkItem>,
    receiver: Receiver<WorkItem>,
    closer:   Mutex<Option<Sender<()>>>,
    closed:   Receiver<()>,
    pending:  Arc<Pending>,
}

impl WorkQueue {
    /// Create a queue holding at most `capacity` directories
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        let (closer, closed) = bounded(0);
        Self {
            sender,
            receiver,
            closer: Mutex::new(Some(closer)),
            closed,
            pending: Pending::new(),
        }
    }

    /// Pending barrier shared by every item of this queue
    #[must_use]
    pub const fn pending(&self) -> &Arc<Pending> {
        &self.pending
    }

    /// Submit a directory without blocking
    pub fn submit(&self, path: PathBuf) -> Submit {
        let item = WorkItem::new(path, &self.pending);
        match self.sender.try_send(item) {
            Ok(()) => Submit::Queued,
            Err(TrySendError::Full(item) | TrySendError::Disconnected(item)) => Submit::Full(item),
        }
    }

    /// Wait for the next directory; `None` once the queue is closed
    pub fn recv(&self) -> Option<WorkItem> {
        select! {
            recv(self.receiver) -> item => item.ok(),
            recv(self.closed) -> _ => None,
        }
    }

    /// Wake every receiver; only called once the pending count is zero
    pub fn close(&self) {
        self.closer.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
