mod console;
mod no_op_tracker;
mod progress_info;
mod update_interfaces;

pub use console::ConsoleProgressPrinter;
pub use no_op_tracker::NoOpProgressListener;
pub use progress_info::{TransferEvent, TransferEventKind};
pub use update_interfaces::{ItemTransferTracker, TransferProgressListener};
