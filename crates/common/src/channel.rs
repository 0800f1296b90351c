//! Async channel bridge between the interactive runtime and the scan thread
//!
//! Device enumeration blocks on libusb, so it runs on a dedicated OS thread.
//! This bridge carries commands to that thread and enumeration results back,
//! keeping the interactive runtime free to handle selection and permission
//! events while a pass is running.

use async_channel::{Receiver, Sender, bounded};
use probe::EntrySnapshot;

/// Commands from the interactive runtime to the scan thread.
#[derive(Debug)]
pub enum ScanCommand {
    /// Run one enumeration pass, stamping its snapshot with `seq`.
    Scan { seq: u64 },

    /// Stop the scan thread.
    Shutdown,
}

/// Events from the scan thread back to the interactive runtime.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// One enumeration pass finished.
    Completed { snapshot: EntrySnapshot },
}

/// Interactive-runtime endpoint (async).
#[derive(Clone)]
pub struct ScanBridge {
    cmd_tx: Sender<ScanCommand>,
    event_rx: Receiver<ScanEvent>,
}

impl ScanBridge {
    /// Send a command to the scan thread.
    pub async fn send_command(&self, cmd: ScanCommand) -> crate::Result<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Wait for the next event from the scan thread.
    pub async fn recv_event(&self) -> crate::Result<ScanEvent> {
        self.event_rx
            .recv()
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }
}

/// Scan-thread endpoint (blocking).
pub struct ScanWorker {
    cmd_rx: Receiver<ScanCommand>,
    event_tx: Sender<ScanEvent>,
}

impl ScanWorker {
    /// Block until the next command arrives.
    pub fn recv_command(&self) -> crate::Result<ScanCommand> {
        self.cmd_rx
            .recv_blocking()
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Deliver an event to the interactive runtime.
    pub fn send_event(&self, event: ScanEvent) -> crate::Result<()> {
        self.event_tx
            .send_blocking(event)
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }
}

/// Create the bridge; hand the `ScanWorker` to the scan thread and keep the
/// `ScanBridge` on the interactive runtime.
pub fn create_scan_bridge() -> (ScanBridge, ScanWorker) {
    let (cmd_tx, cmd_rx) = bounded(16);
    let (event_tx, event_rx) = bounded(16);

    (
        ScanBridge { cmd_tx, event_rx },
        ScanWorker { cmd_rx, event_tx },
    )
}
