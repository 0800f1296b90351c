//! Driver kinds and capability bindings
//!
//! A `DriverKind` names a serial-protocol driver family; a `DriverBinding`
//! records that a particular device can be spoken to by one of them. Bindings
//! are stateless values and carry no open resource.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Serial driver families the scout can bind a device to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// FTDI FT232/FT2232 family
    Ftdi,
    /// Silicon Labs CP210x family
    Cp210x,
    /// WCH CH340/CH341 family
    Ch34x,
    /// Prolific PL2303 family
    Prolific,
    /// USB CDC-ACM class devices (Arduinos and friends)
    CdcAcm,
}

impl DriverKind {
    /// Short stable name, matching the config/serde spelling.
    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Ftdi => "ftdi",
            DriverKind::Cp210x => "cp210x",
            DriverKind::Ch34x => "ch34x",
            DriverKind::Prolific => "prolific",
            DriverKind::CdcAcm => "cdc-acm",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown driver name in a config entry or CLI argument.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown driver kind '{0}', expected one of: ftdi, cp210x, ch34x, prolific, cdc-acm")]
pub struct UnknownDriverError(pub String);

impl FromStr for DriverKind {
    type Err = UnknownDriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ftdi" => Ok(DriverKind::Ftdi),
            "cp210x" => Ok(DriverKind::Cp210x),
            "ch34x" => Ok(DriverKind::Ch34x),
            "prolific" => Ok(DriverKind::Prolific),
            "cdc-acm" => Ok(DriverKind::CdcAcm),
            other => Err(UnknownDriverError(other.to_string())),
        }
    }
}

/// Capability binding from a device to a driver kind able to speak to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverBinding {
    /// The driver family this binding selects
    pub kind: DriverKind,
}

impl DriverBinding {
    pub fn new(kind: DriverKind) -> Self {
        Self { kind }
    }
}
