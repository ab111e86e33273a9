use std::fmt::Debug;

/// The phase of a single file transfer that a [TransferEvent] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferEventKind {
    Started,
    Data,
    Completed,
    Failed,
}

/// A point-in-time report of the progress of one file transfer.
///
/// Events carry no state across calls; `consumed_bytes` is always the absolute
/// number of bytes of the file known to be stored remotely, including bytes
/// restored from a previous attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferEvent {
    pub kind: TransferEventKind,
    pub consumed_bytes: u64,
    pub total_bytes: u64,
}

impl TransferEvent {
    pub fn new(kind: TransferEventKind, consumed_bytes: u64, total_bytes: u64) -> Self {
        Self {
            kind,
            consumed_bytes,
            total_bytes,
        }
    }

    /// Completion percentage, truncated.  An empty transfer counts as complete.
    pub fn percent(&self) -> u64 {
        if self.total_bytes == 0 {
            return 100;
        }
        self.consumed_bytes.saturating_mul(100) / self.total_bytes
    }
}
