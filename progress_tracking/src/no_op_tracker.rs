use std::sync::Arc;

use crate::{TransferEvent, TransferProgressListener};

#[derive(Debug, Default)]
pub struct NoOpProgressListener;

impl NoOpProgressListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {})
    }
}

impl TransferProgressListener for NoOpProgressListener {
    fn progress_changed(&self, _event: &TransferEvent) {}
}
