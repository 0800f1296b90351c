//! Enumeration snapshots
//!
//! One enumeration pass produces one `EntrySnapshot`: an ordered, immutable
//! list of `DeviceEntry` values, stamped with the sequence number of the pass
//! that produced it. Snapshots replace each other wholesale; observers see
//! either the old list or the new one, never a mix.

use crate::device::DeviceDescriptor;
use crate::driver::DriverBinding;
use serde::{Deserialize, Serialize};

/// One discovered device paired with at most one driver binding.
///
/// `driver: None` marks a detected-but-unsupported device; those stay in the
/// list so the user can see the hardware was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub descriptor: DeviceDescriptor,
    pub driver: Option<DriverBinding>,
}

impl DeviceEntry {
    pub fn supported(&self) -> bool {
        self.driver.is_some()
    }
}

/// Immutable result of one enumeration pass, in registry order.
///
/// The sequence number is assigned when the pass is requested; a snapshot
/// with a lower sequence than the one currently visible is stale and must not
/// replace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    seq: u64,
    entries: Vec<DeviceEntry>,
}

impl EntrySnapshot {
    pub fn new(seq: u64, entries: Vec<DeviceEntry>) -> Self {
        Self { seq, entries }
    }

    pub fn empty(seq: u64) -> Self {
        Self::new(seq, Vec::new())
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn entries(&self) -> &[DeviceEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&DeviceEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }
}

/// Expand one discovered device into its snapshot entries.
///
/// Zero bindings yield exactly one driverless entry; k bindings yield k
/// entries in binding order, so one physical device may appear several times
/// under different driver kinds.
pub fn expand_device(
    descriptor: DeviceDescriptor,
    bindings: Vec<DriverBinding>,
) -> Vec<DeviceEntry> {
    if bindings.is_empty() {
        return vec![DeviceEntry {
            descriptor,
            driver: None,
        }];
    }

    bindings
        .into_iter()
        .map(|binding| DeviceEntry {
            descriptor: descriptor.clone(),
            driver: Some(binding),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverKind;

    fn descriptor(vid: u16, pid: u16) -> DeviceDescriptor {
        DeviceDescriptor {
            vendor_id: vid,
            product_id: pid,
            bus_number: 3,
            address: 2,
            product: None,
        }
    }

    #[test]
    fn test_unmatched_device_yields_one_driverless_entry() {
        let entries = expand_device(descriptor(0xDEAD, 0xBEEF), vec![]);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].driver.is_none());
        assert!(!entries[0].supported());
    }

    #[test]
    fn test_k_bindings_yield_k_entries_in_order() {
        let bindings = vec![
            DriverBinding::new(DriverKind::Ftdi),
            DriverBinding::new(DriverKind::CdcAcm),
        ];
        let entries = expand_device(descriptor(0x0403, 0x6001), bindings);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].driver, Some(DriverBinding::new(DriverKind::Ftdi)));
        assert_eq!(
            entries[1].driver,
            Some(DriverBinding::new(DriverKind::CdcAcm))
        );
        assert_eq!(entries[0].descriptor, entries[1].descriptor);
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut entries = expand_device(descriptor(1, 1), vec![]);
        entries.extend(expand_device(
            descriptor(2, 2),
            vec![DriverBinding::new(DriverKind::Ch34x)],
        ));
        let snapshot = EntrySnapshot::new(5, entries);

        assert_eq!(snapshot.seq(), 5);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(0).unwrap().descriptor.vendor_id, 1);
        assert_eq!(snapshot.get(1).unwrap().descriptor.vendor_id, 2);
        assert!(snapshot.get(2).is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = EntrySnapshot::empty(1);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
    }
}
