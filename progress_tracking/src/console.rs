use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{TransferEvent, TransferEventKind, TransferProgressListener};

/// Prints one status line per transfer phase.
///
/// Data events start with a carriage return so that consecutive updates
/// overwrite the same console line; the completed and failed lines begin with a
/// newline to leave the last data line intact.
pub struct ConsoleProgressPrinter<W: Write + Send = io::Stdout> {
    file_name: Arc<str>,
    writer: Mutex<W>,
}

impl ConsoleProgressPrinter<io::Stdout> {
    pub fn stdout(file_name: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self::new(file_name, io::stdout()))
    }
}

impl<W: Write + Send> ConsoleProgressPrinter<W> {
    pub fn new(file_name: impl Into<Arc<str>>, writer: W) -> Self {
        Self {
            file_name: file_name.into(),
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn format_event(&self, event: &TransferEvent) -> String {
        let name = &self.file_name;
        let (consumed, total) = (event.consumed_bytes, event.total_bytes);
        match event.kind {
            TransferEventKind::Started => {
                format!("Transfer {name} Started, ConsumedBytes: {consumed}, TotalBytes {total}.\n")
            },
            TransferEventKind::Data => {
                let percent = event.percent();
                format!("\rTransfer {name} Data, ConsumedBytes: {consumed}, TotalBytes {total}, {percent}%.")
            },
            TransferEventKind::Completed => {
                format!("\nTransfer {name} Completed, ConsumedBytes: {consumed}, TotalBytes {total}.\n")
            },
            TransferEventKind::Failed => {
                format!("\nTransfer {name} Failed, ConsumedBytes: {consumed}, TotalBytes {total}.\n")
            },
        }
    }
}

impl<W: Write + Send> fmt::Debug for ConsoleProgressPrinter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleProgressPrinter")
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> TransferProgressListener for ConsoleProgressPrinter<W> {
    fn progress_changed(&self, event: &TransferEvent) {
        let line = self.format_event(event);
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|_| writer.flush()) {
            debug!("Failed to print transfer progress for {}: {e}", self.file_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(events: &[TransferEvent]) -> String {
        let printer = ConsoleProgressPrinter::new("./a.bin", Vec::new());
        for event in events {
            printer.progress_changed(event);
        }
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn test_started_and_completed_lines() {
        let out = printed(&[
            TransferEvent::new(TransferEventKind::Started, 0, 2048),
            TransferEvent::new(TransferEventKind::Completed, 2048, 2048),
        ]);
        assert_eq!(
            out,
            "Transfer ./a.bin Started, ConsumedBytes: 0, TotalBytes 2048.\n\
             \nTransfer ./a.bin Completed, ConsumedBytes: 2048, TotalBytes 2048.\n"
        );
    }

    #[test]
    fn test_data_lines_overwrite() {
        let out = printed(&[
            TransferEvent::new(TransferEventKind::Data, 512, 2048),
            TransferEvent::new(TransferEventKind::Data, 1024, 2048),
        ]);
        assert_eq!(
            out,
            "\rTransfer ./a.bin Data, ConsumedBytes: 512, TotalBytes 2048, 25%.\
             \rTransfer ./a.bin Data, ConsumedBytes: 1024, TotalBytes 2048, 50%."
        );
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_failed_line() {
        let out = printed(&[TransferEvent::new(TransferEventKind::Failed, 100, 300)]);
        assert_eq!(out, "\nTransfer ./a.bin Failed, ConsumedBytes: 100, TotalBytes 300.\n");
    }
}
