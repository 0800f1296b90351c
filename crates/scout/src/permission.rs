//! Host authorization
//!
//! Opening a USB device needs the host's blessing, and the host answers in
//! its own time: a request is fire-and-forget, and the decision arrives later
//! as an event on a channel the session actor drains. Each request carries a
//! fresh single-use correlation token; the coordinator nevertheless matches
//! decisions to the pending request by descriptor identity, so a decision for
//! a superseded request falls through harmlessly.

use probe::DeviceDescriptor;
use rusb::UsbContext;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Single-use token minted per permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationToken(u64);

impl CorrelationToken {
    pub fn fresh() -> Self {
        Self(rand::random())
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The host's answer to one permission request.
#[derive(Debug, Clone)]
pub struct PermissionDecision {
    pub descriptor: DeviceDescriptor,
    pub granted: bool,
    pub token: CorrelationToken,
}

/// Asks the host for authorization to open a device.
///
/// Implementations must not block the caller; exactly one decision per
/// accepted request is emitted later, through whatever channel the
/// implementation was built with. A decision may never arrive at all if the
/// device disappears first.
pub trait PermissionService: Send {
    fn request_permission(&self, descriptor: &DeviceDescriptor, token: CorrelationToken);
}

/// Permission service backed by the host's own access control: the check
/// attempts to open the device off the interactive runtime and reports
/// whether the OS allowed it.
pub struct HostPermissionService {
    decisions: mpsc::UnboundedSender<PermissionDecision>,
}

impl HostPermissionService {
    pub fn new(decisions: mpsc::UnboundedSender<PermissionDecision>) -> Self {
        Self { decisions }
    }
}

impl PermissionService for HostPermissionService {
    fn request_permission(&self, descriptor: &DeviceDescriptor, token: CorrelationToken) {
        let decisions = self.decisions.clone();
        let descriptor = descriptor.clone();

        tokio::task::spawn_blocking(move || {
            let granted = host_grants_access(&descriptor);
            debug!(
                "host decision for {} (token {token}): granted={granted}",
                descriptor.label()
            );
            // The receiver may be gone if the session shut down mid-request.
            let _ = decisions.send(PermissionDecision {
                descriptor,
                granted,
                token,
            });
        });
    }
}

/// Blocking probe of the host's access control for one device.
///
/// Uses its own short-lived libusb context; the scan thread keeps the
/// long-lived one.
fn host_grants_access(descriptor: &DeviceDescriptor) -> bool {
    let context = match rusb::Context::new() {
        Ok(context) => context,
        Err(e) => {
            warn!("USB context unavailable for access check: {e}");
            return false;
        }
    };

    let devices = match context.devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("device registry unreachable for access check: {e}");
            return false;
        }
    };

    for device in devices.iter() {
        if device.bus_number() == descriptor.bus_number && device.address() == descriptor.address {
            return match device.open() {
                Ok(_handle) => true,
                Err(rusb::Error::Access) => false,
                Err(e) => {
                    debug!("open failed during access check: {e}");
                    false
                }
            };
        }
    }

    debug!("device {} is no longer attached", descriptor.label());
    false
}
