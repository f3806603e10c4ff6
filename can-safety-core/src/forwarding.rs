//! Steering-control forwarding automaton
//!
//! Tracks whether the vehicle's own computer is issuing steering-control
//! frames on the primary bus. While it is, relaying between the primary and
//! secondary bus is suppressed so two sources never compete for the actuator.
//! Relaying is restored only after the secondary bus has carried more than
//! [`HOLDOFF_REFILL`] steering-control frames with none on the primary bus in
//! between.

use crate::types::{Message, PRIMARY_BUS, SECONDARY_BUS};
use serde::Serialize;
use std::fmt;

/// Holdoff counter value loaded whenever steering control is seen on the primary bus
pub const HOLDOFF_REFILL: u32 = 10;

/// Edge reported by [`ForwardingState::observe`] when relaying changes state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForwardingTransition {
    /// Steering control appeared on the primary bus
    Disabled,
    /// Steering control is only present on the secondary bus again
    Enabled,
}

impl fmt::Display for ForwardingTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardingTransition::Disabled => write!(f, "LKAS on bus0: forwarding disabled"),
            ForwardingTransition::Enabled => {
                write!(f, "LKAS on bus2 & not on bus0: forwarding enabled")
            }
        }
    }
}

/// Mutable relay state owned by the active safety mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForwardingState {
    secondary_bus_forward_enabled: bool,
    primary_bus_holdoff_count: u32,
}

impl Default for ForwardingState {
    fn default() -> Self {
        Self {
            secondary_bus_forward_enabled: true,
            primary_bus_holdoff_count: 0,
        }
    }
}

impl ForwardingState {
    /// Create the power-on state: relaying enabled, no holdoff pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether relaying between the primary and secondary bus is permitted
    pub fn secondary_bus_forward_enabled(&self) -> bool {
        self.secondary_bus_forward_enabled
    }

    /// Remaining secondary-bus steering frames before relaying may resume
    pub fn primary_bus_holdoff_count(&self) -> u32 {
        self.primary_bus_holdoff_count
    }

    /// Feed one received frame through the automaton
    ///
    /// Returns the transition, if any, so the caller can emit exactly one
    /// notice per edge.
    pub fn observe(&mut self, msg: &Message) -> Option<ForwardingTransition> {
        if !msg.is_steering_control() {
            return None;
        }

        match msg.bus {
            PRIMARY_BUS => {
                self.primary_bus_holdoff_count = HOLDOFF_REFILL;
                if self.secondary_bus_forward_enabled {
                    self.secondary_bus_forward_enabled = false;
                    return Some(ForwardingTransition::Disabled);
                }
                None
            }
            SECONDARY_BUS => {
                if self.primary_bus_holdoff_count > 0 {
                    self.primary_bus_holdoff_count -= 1;
                    None
                } else if !self.secondary_bus_forward_enabled {
                    self.secondary_bus_forward_enabled = true;
                    Some(ForwardingTransition::Enabled)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
