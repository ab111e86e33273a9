use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use more_asserts::debug_assert_le;

use crate::{TransferEvent, TransferEventKind};

/// Receives progress notifications for a single file transfer.
///
/// Implementations are called from the task driving the transfer, so they
/// should return quickly.
pub trait TransferProgressListener: Debug + Send + Sync {
    fn progress_changed(&self, event: &TransferEvent);
}

/// This struct keeps the byte bookkeeping for one file transfer and forwards
/// each phase to the wrapped listener.
#[derive(Debug)]
pub struct ItemTransferTracker {
    total_bytes: u64,
    consumed_bytes: AtomicU64,
    inner: Arc<dyn TransferProgressListener>,
}

impl ItemTransferTracker {
    pub fn new(inner: Arc<dyn TransferProgressListener>, total_bytes: u64) -> Self {
        Self {
            total_bytes,
            consumed_bytes: AtomicU64::new(0),
            inner,
        }
    }

    pub fn consumed_bytes(&self) -> u64 {
        self.consumed_bytes.load(Ordering::Relaxed)
    }

    /// Reports the start of the transfer.  `already_consumed` counts bytes
    /// that were stored by an earlier, interrupted attempt.
    pub fn start(&self, already_consumed: u64) {
        debug_assert_le!(already_consumed, self.total_bytes);
        self.consumed_bytes.store(already_consumed, Ordering::Relaxed);
        self.publish(TransferEventKind::Started);
    }

    /// Adds `increment` bytes to the completed count and reports a data event.
    pub fn update(&self, increment: u64) {
        let consumed = self.consumed_bytes.fetch_add(increment, Ordering::Relaxed) + increment;
        debug_assert_le!(consumed, self.total_bytes);
        self.publish(TransferEventKind::Data);
    }

    pub fn complete(&self) {
        self.consumed_bytes.store(self.total_bytes, Ordering::Relaxed);
        self.publish(TransferEventKind::Completed);
    }

    pub fn fail(&self) {
        self.publish(TransferEventKind::Failed);
    }

    fn publish(&self, kind: TransferEventKind) {
        let event = TransferEvent::new(kind, self.consumed_bytes(), self.total_bytes);
        self.inner.progress_changed(&event);
    }
}
