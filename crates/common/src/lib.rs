//! Common utilities for serial-scout
//!
//! Shared plumbing between the interactive runtime and the blocking scan
//! thread: the error type, logging setup, and the async channel bridge the
//! two execution contexts talk over.

pub mod channel;
pub mod error;
pub mod logging;

pub use channel::{ScanBridge, ScanCommand, ScanEvent, ScanWorker, create_scan_bridge};
pub use error::{Error, Result};
pub use logging::setup_logging;
