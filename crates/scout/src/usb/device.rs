//! Descriptor capture
//!
//! Builds a `probe::DeviceDescriptor` from a live `rusb::Device`. The product
//! string needs the device opened; on hosts where that is not permitted the
//! descriptor simply carries no product string.

use probe::DeviceDescriptor;
use rusb::{Device, UsbContext};

/// Capture the identity of one attached device.
pub fn build_descriptor<T: UsbContext>(
    device: &Device<T>,
    raw: &rusb::DeviceDescriptor,
) -> DeviceDescriptor {
    DeviceDescriptor {
        vendor_id: raw.vendor_id(),
        product_id: raw.product_id(),
        bus_number: device.bus_number(),
        address: device.address(),
        product: read_product_string(device, raw),
    }
}

/// Best-effort read of the product string descriptor.
fn read_product_string<T: UsbContext>(
    device: &Device<T>,
    raw: &rusb::DeviceDescriptor,
) -> Option<String> {
    let handle = device.open().ok()?;
    raw.product_string_index()
        .and_then(|index| handle.read_string_descriptor_ascii(index).ok())
}
