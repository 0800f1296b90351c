//! Driver matching
//!
//! The prober answers one question: given a raw device identity, which driver
//! families can speak to it? Matching is a pure lookup over static capability
//! tables (vendor/product rows, optionally wildcarded by vendor alone), so it
//! can run on any thread. An unmatched device is not an error; the empty
//! result is the normal "detected, unsupported" outcome.

use crate::device::DeviceDescriptor;
use crate::driver::{DriverBinding, DriverKind};

/// One row of a capability table.
///
/// `product_id: None` matches every product from the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeEntry {
    pub vendor_id: u16,
    pub product_id: Option<u16>,
    pub kind: DriverKind,
}

impl ProbeEntry {
    const fn product(vendor_id: u16, product_id: u16, kind: DriverKind) -> Self {
        Self {
            vendor_id,
            product_id: Some(product_id),
            kind,
        }
    }

    const fn vendor(vendor_id: u16, kind: DriverKind) -> Self {
        Self {
            vendor_id,
            product_id: None,
            kind,
        }
    }

    fn matches(&self, descriptor: &DeviceDescriptor) -> bool {
        self.vendor_id == descriptor.vendor_id
            && self
                .product_id
                .is_none_or(|pid| pid == descriptor.product_id)
    }
}

/// Built-in capability table covering the common USB-serial families.
const DEFAULT_TABLE: &[ProbeEntry] = &[
    // FTDI
    ProbeEntry::product(0x0403, 0x6001, DriverKind::Ftdi), // FT232R
    ProbeEntry::product(0x0403, 0x6010, DriverKind::Ftdi), // FT2232H
    ProbeEntry::product(0x0403, 0x6011, DriverKind::Ftdi), // FT4232H
    ProbeEntry::product(0x0403, 0x6014, DriverKind::Ftdi), // FT232H
    ProbeEntry::product(0x0403, 0x6015, DriverKind::Ftdi), // FT231X
    // Silicon Labs
    ProbeEntry::product(0x10C4, 0xEA60, DriverKind::Cp210x), // CP2102
    ProbeEntry::product(0x10C4, 0xEA70, DriverKind::Cp210x), // CP2105
    ProbeEntry::product(0x10C4, 0xEA71, DriverKind::Cp210x), // CP2108
    // WCH
    ProbeEntry::product(0x1A86, 0x7523, DriverKind::Ch34x), // CH340
    ProbeEntry::product(0x1A86, 0x5523, DriverKind::Ch34x), // CH341A
    ProbeEntry::product(0x1A86, 0x0445, DriverKind::Ch34x), // CH9102
    // Prolific
    ProbeEntry::product(0x067B, 0x2303, DriverKind::Prolific), // PL2303
    ProbeEntry::product(0x067B, 0x23A3, DriverKind::Prolific), // PL2303GC
    // CDC-ACM boards
    ProbeEntry::vendor(0x2341, DriverKind::CdcAcm), // Arduino
    ProbeEntry::vendor(0x1B4F, DriverKind::CdcAcm), // SparkFun
    ProbeEntry::product(0x2E8A, 0x000A, DriverKind::CdcAcm), // Raspberry Pi Pico
    ProbeEntry::product(0x0483, 0x5740, DriverKind::CdcAcm), // ST virtual COM port
];

/// Matches device identities against driver capability tables.
///
/// Holds the built-in table plus any extra rows appended from configuration.
/// Stateless apart from the tables; `probe` is deterministic and side-effect
/// free.
#[derive(Debug, Clone)]
pub struct Prober {
    entries: Vec<ProbeEntry>,
}

impl Default for Prober {
    fn default() -> Self {
        Self {
            entries: DEFAULT_TABLE.to_vec(),
        }
    }
}

impl Prober {
    /// Built-in table plus `extra` rows, appended after the defaults so
    /// built-in matches keep precedence in the binding order.
    pub fn with_extra_entries(extra: impl IntoIterator<Item = ProbeEntry>) -> Self {
        let mut prober = Self::default();
        prober.entries.extend(extra);
        prober
    }

    /// The built-in capability table.
    pub fn default_table() -> &'static [ProbeEntry] {
        DEFAULT_TABLE
    }

    /// All driver bindings able to speak to `descriptor`, in table order.
    ///
    /// A kind matched by several rows (say an exact row plus a vendor
    /// wildcard) is reported once, at its first match position. The empty
    /// vector means no known driver, not a failure.
    pub fn probe(&self, descriptor: &DeviceDescriptor) -> Vec<DriverBinding> {
        let mut bindings: Vec<DriverBinding> = Vec::new();
        for entry in &self.entries {
            if entry.matches(descriptor) && !bindings.iter().any(|b| b.kind == entry.kind) {
                bindings.push(DriverBinding::new(entry.kind));
            }
        }
        bindings
    }
}
