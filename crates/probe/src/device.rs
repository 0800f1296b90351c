//! Device identity
//!
//! A `DeviceDescriptor` is the OS-assigned identity of one attached USB
//! device, captured at enumeration time. It is immutable once built and
//! becomes meaningless the moment the device is unplugged; no validity check
//! happens until the next operation on it fails.

use serde::{Deserialize, Serialize};

/// Identity of a physical USB device instance as seen by the OS.
///
/// The bus number and address are the OS-level path to the device and, with
/// the vendor/product ids, form its identity for equality purposes: a
/// permission decision is matched to a pending request by comparing
/// descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
    /// Bus number on this host
    pub bus_number: u8,
    /// Device address on the bus
    pub address: u8,
    /// Product string (if the device reports one and it was readable)
    pub product: Option<String>,
}

impl DeviceDescriptor {
    /// Human-readable one-line label, hex VID/PID.
    pub fn label(&self) -> String {
        format!(
            "Vendor {:04X} Product {:04X}",
            self.vendor_id, self.product_id
        )
    }

    /// The OS-level location of the device, `bus:address`.
    pub fn location(&self) -> String {
        format!("{:03}:{:03}", self.bus_number, self.address)
    }
}

impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.label(), self.location())?;
        if let Some(product) = &self.product {
            write!(f, " ({product})")?;
        }
        Ok(())
    }
}
