//! Permission coordinator
//!
//! Ties one selected device to one eventual authorization outcome. The whole
//! protocol hangs off a single in-flight slot: selecting a bound entry fills
//! it and fires a permission request, the host's decision empties it, and a
//! second selection made while a decision is still outstanding simply
//! overwrites the slot (last writer wins). Decisions are matched to the slot
//! by descriptor identity, so the superseded request's eventual decision no
//! longer has an addressee and is dropped without ceremony.
//!
//! The coordinator is not thread-safe by itself; the session actor is its
//! single owner and runs every transition on the interactive context.

use crate::console::Console;
use crate::permission::{CorrelationToken, PermissionDecision, PermissionService};
use probe::{DeviceDescriptor, DeviceEntry, DriverBinding};
use tracing::{debug, info, warn};

/// The at-most-one in-flight authorization.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub descriptor: DeviceDescriptor,
    pub binding: DriverBinding,
    pub token: CorrelationToken,
}

/// What `select` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A permission request was issued for the entry's device.
    Requested,
    /// The entry has no driver; selecting it is a no-op, not an error.
    NoDriver,
}

/// What a decision amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Matched the pending device and was granted; the hand-off fired.
    Granted,
    /// Matched the pending device and was denied; no hand-off.
    Denied,
    /// Addressed to a device that is no longer pending; discarded.
    Stale,
}

pub struct PermissionCoordinator {
    pending: Option<PendingAuthorization>,
    permissions: Box<dyn PermissionService>,
    console: Box<dyn Console>,
}

impl PermissionCoordinator {
    pub fn new(permissions: Box<dyn PermissionService>, console: Box<dyn Console>) -> Self {
        Self {
            pending: None,
            permissions,
            console,
        }
    }

    /// True while a decision is outstanding.
    pub fn is_awaiting_decision(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingAuthorization> {
        self.pending.as_ref()
    }

    /// Handle a user selection.
    ///
    /// A driverless entry changes nothing. A bound entry becomes the pending
    /// authorization, replacing any previous one, and a fresh-token
    /// permission request goes out for its device. The superseded request, if
    /// any, is left to resolve naturally; its decision will arrive for a
    /// device that is no longer pending.
    pub fn select(&mut self, entry: &DeviceEntry) -> SelectOutcome {
        let Some(binding) = entry.driver else {
            debug!("selected {} has no driver", entry.descriptor.label());
            return SelectOutcome::NoDriver;
        };

        if let Some(previous) = &self.pending {
            debug!(
                "superseding pending authorization for {} (token {})",
                previous.descriptor.label(),
                previous.token
            );
        }

        let token = CorrelationToken::fresh();
        self.pending = Some(PendingAuthorization {
            descriptor: entry.descriptor.clone(),
            binding,
            token,
        });

        self.permissions.request_permission(&entry.descriptor, token);
        info!(
            "requested permission for {} ({} driver, token {token})",
            entry.descriptor.label(),
            binding.kind
        );

        SelectOutcome::Requested
    }

    /// Handle a host decision.
    ///
    /// Only a decision for the currently pending device counts: granted hands
    /// the device off to the console exactly once, denied reports the denial;
    /// both clear the slot. Anything else is a late decision for an
    /// overwritten request and is discarded silently.
    pub fn on_decision(&mut self, decision: PermissionDecision) -> DecisionOutcome {
        match self.pending.take() {
            Some(pending) if pending.descriptor == decision.descriptor => {
                if decision.granted {
                    info!("permission granted for {}", pending.descriptor.label());
                    self.console.open(&pending.descriptor, pending.binding);
                    DecisionOutcome::Granted
                } else {
                    warn!("permission denied for {}", pending.descriptor.label());
                    DecisionOutcome::Denied
                }
            }
            other => {
                self.pending = other;
                debug!(
                    "discarding stale decision for {} (token {})",
                    decision.descriptor.label(),
                    decision.token
                );
                DecisionOutcome::Stale
            }
        }
    }

    /// Drop the pending authorization, if any.
    ///
    /// Called on deactivation so a decision arriving afterwards has no
    /// addressee; the outstanding OS request itself cannot be recalled.
    pub fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(
                "releasing pending authorization for {} (token {})",
                pending.descriptor.label(),
                pending.token
            );
        }
    }
}
