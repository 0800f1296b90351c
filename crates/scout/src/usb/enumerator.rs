//! Device enumeration
//!
//! One `scan` call is one synchronous pass over the libusb device registry,
//! in registry order, producing a sequence-stamped `EntrySnapshot`. The query
//! can block on a slow bus, which is why the enumerator only ever runs on the
//! `usb-scan` thread.
//!
//! A host where the device registry is unreachable is reported as an empty
//! snapshot, not an error: at this layer "no registry" and "no devices" are
//! deliberately indistinguishable, and the condition is only visible in the
//! logs.

use crate::usb::device::build_descriptor;
use probe::{EntrySnapshot, Prober, expand_device};
use rusb::constants::LIBUSB_CLASS_HUB;
use rusb::{Context, UsbContext};
use tracing::{debug, warn};

/// Runs enumeration passes against the host's USB registry.
pub struct Enumerator {
    /// Lazily (re)created so a registry outage at startup degrades to empty
    /// snapshots instead of killing the scan thread.
    context: Option<Context>,
    prober: Prober,
}

impl Enumerator {
    pub fn new(prober: Prober) -> Self {
        let context = match Context::new() {
            Ok(context) => Some(context),
            Err(e) => {
                warn!("USB context unavailable, scans will report no devices: {e}");
                None
            }
        };

        Self { context, prober }
    }

    /// Run one enumeration pass, stamping the snapshot with `seq`.
    pub fn scan(&mut self, seq: u64) -> EntrySnapshot {
        if self.context.is_none() {
            self.context = Context::new().ok();
        }
        let Some(context) = self.context.as_ref() else {
            warn!("device registry unreachable, reporting no devices");
            return EntrySnapshot::empty(seq);
        };

        let devices = match context.devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("device registry query failed, reporting no devices: {e}");
                return EntrySnapshot::empty(seq);
            }
        };

        let mut entries = Vec::new();
        for device in devices.iter() {
            let raw = match device.device_descriptor() {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        "unreadable descriptor at {:03}:{:03}, skipping: {e}",
                        device.bus_number(),
                        device.address()
                    );
                    continue;
                }
            };

            // Hubs are bus infrastructure, not attachable devices.
            if raw.class_code() == LIBUSB_CLASS_HUB {
                debug!(
                    "skipping hub at {:03}:{:03}",
                    device.bus_number(),
                    device.address()
                );
                continue;
            }

            let descriptor = build_descriptor(&device, &raw);
            let bindings = self.prober.probe(&descriptor);
            if bindings.is_empty() {
                debug!("found {descriptor}, no driver available");
            } else {
                for binding in &bindings {
                    debug!("found {descriptor}, driver {}", binding.kind);
                }
            }

            entries.extend(expand_device(descriptor, bindings));
        }

        debug!("enumeration pass {seq} produced {} entries", entries.len());
        EntrySnapshot::new(seq, entries)
    }
}
