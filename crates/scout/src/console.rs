//! Console hand-off
//!
//! The consumer of an authorized device. The scout's responsibility ends at
//! `open`: whatever session the console runs over the device afterwards is
//! its own business.

use probe::{DeviceDescriptor, DriverBinding};
use tracing::info;

/// Receives an authorized device exactly once per granted request.
pub trait Console: Send {
    fn open(&self, descriptor: &DeviceDescriptor, binding: DriverBinding);
}

/// Announces the hand-off on the terminal. Stands in for a full serial
/// console session, which is outside the scout's scope.
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn open(&self, descriptor: &DeviceDescriptor, binding: DriverBinding) {
        info!("handing {descriptor} to the {} console", binding.kind);
        println!("Opening {descriptor} with the {} driver", binding.kind);
    }
}
