use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::part::PartId;

/// Handle for work that finishes after the call that started it, such as a
/// save running on a worker thread.
///
/// The page checks the token again when the work completes: a cancelled
/// token, or one whose part was closed or reopened in the meantime, leaves
/// the page untouched. Clones share the cancellation flag, so a worker can
/// hold one and the UI another.
#[derive(Debug, Clone)]
pub struct OperationToken {
    part: PartId,
    stamp: u64,
    cancelled: Arc<AtomicBool>,
}

impl OperationToken {
    pub(crate) fn new(part: PartId, stamp: u64) -> Self {
        Self {
            part,
            stamp,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn part(&self) -> &PartId {
        &self.part
    }

    pub(crate) fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Flag to hand to a worker thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

/// What to do with the token's part once the deferred work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    Activate,
    BringToTop,
    CloseEditor,
    HideView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_cancellation() {
        let token = OperationToken::new(PartId::new("a"), 1);
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());

        let flag = token.cancel_flag();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_flag_crosses_threads() {
        let token = OperationToken::new(PartId::new("a"), 1);
        let flag = token.cancel_flag();
        std::thread::spawn(move || flag.store(true, Ordering::SeqCst))
            .join()
            .unwrap();
        assert!(token.is_cancelled());
    }
}
