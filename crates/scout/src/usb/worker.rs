//! Scan thread
//!
//! Dedicated OS thread that owns the `Enumerator` and serves scan commands
//! from the interactive runtime. One command, one pass, one event back; the
//! thread exits on `Shutdown` or when either channel endpoint goes away.

use crate::usb::Enumerator;
use common::{ScanCommand, ScanEvent, ScanWorker};
use probe::Prober;
use tracing::{debug, info};

/// Command loop run on the `usb-scan` thread.
pub struct ScanThread {
    enumerator: Enumerator,
    worker: ScanWorker,
}

impl ScanThread {
    pub fn new(worker: ScanWorker, prober: Prober) -> Self {
        Self {
            enumerator: Enumerator::new(prober),
            worker,
        }
    }

    pub fn run(mut self) {
        info!("scan thread started");

        loop {
            match self.worker.recv_command() {
                Ok(ScanCommand::Scan { seq }) => {
                    let snapshot = self.enumerator.scan(seq);
                    if self
                        .worker
                        .send_event(ScanEvent::Completed { snapshot })
                        .is_err()
                    {
                        debug!("interactive side gone, stopping scan thread");
                        break;
                    }
                }
                Ok(ScanCommand::Shutdown) => {
                    info!("scan thread shutting down");
                    break;
                }
                Err(_) => {
                    debug!("command channel closed, stopping scan thread");
                    break;
                }
            }
        }

        info!("scan thread stopped");
    }
}

/// Spawn the `usb-scan` thread and return its join handle.
pub fn spawn_scan_worker(worker: ScanWorker, prober: Prober) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("usb-scan".to_string())
        .spawn(move || ScanThread::new(worker, prober).run())
        .expect("Failed to spawn usb-scan thread")
}
