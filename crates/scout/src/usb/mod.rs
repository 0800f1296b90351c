//! USB enumeration subsystem
//!
//! Everything that touches libusb lives here and runs on the dedicated
//! `usb-scan` thread; the interactive runtime only ever sees the immutable
//! snapshots the thread sends back.

pub mod device;
pub mod enumerator;
pub mod worker;

pub use enumerator::Enumerator;
pub use worker::spawn_scan_worker;
