//! Device probing library for serial-scout
//!
//! This crate holds the pure, I/O-free half of the scout: device identities as
//! reported by the OS, the serial driver families the scout knows how to hand
//! a device to, the capability tables matching one to the other, and the
//! snapshot types an enumeration pass produces. Everything here is
//! deterministic and safe to call from any thread.
//!
//! # Example
//!
//! ```
//! use probe::{DeviceDescriptor, Prober};
//!
//! let prober = Prober::default();
//! let descriptor = DeviceDescriptor {
//!     vendor_id: 0x0403,
//!     product_id: 0x6001,
//!     bus_number: 1,
//!     address: 4,
//!     product: None,
//! };
//!
//! let bindings = prober.probe(&descriptor);
//! assert_eq!(bindings.len(), 1);
//! ```

pub mod device;
pub mod driver;
pub mod prober;
pub mod snapshot;

pub use device::DeviceDescriptor;
pub use driver::{DriverBinding, DriverKind, UnknownDriverError};
pub use prober::{ProbeEntry, Prober};
pub use snapshot::{DeviceEntry, EntrySnapshot, expand_device};
