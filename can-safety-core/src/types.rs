//! Core types for the CAN safety gatekeeper
//!
//! This module defines the message value every hook inspects, the bus and
//! address constants the safety modes key on, and the error type raised when
//! parsing mode or policy names. Hooks themselves never fail.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The vehicle's main internal CAN bus
pub const PRIMARY_BUS: u8 = 0;

/// Auxiliary bus relayed to [`AUX_SINK_BUS`] by the static forwarding policy
pub const AUX_BUS: u8 = 1;

/// Camera/ADAS-facing bus on which steering-control echoes may appear
pub const SECONDARY_BUS: u8 = 2;

/// Destination of auxiliary bus traffic under the static forwarding policy
pub const AUX_SINK_BUS: u8 = 20;

/// Lane-keeping actuation command (LKAS11)
pub const STEERING_CONTROL_ADDR: u32 = 832;

/// Display/HUD companion of the steering-control message (LFAHDA_MFC)
pub const ADVISORY_ADDR: u32 = 1157;

/// Highest standard (11-bit) identifier
const MAX_STANDARD_ID: u32 = 0x7FF;

/// A single CAN frame as seen by the safety hooks
///
/// The payload is carried for length validation and for the transport
/// layer; no hook inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Physical CAN bus the frame was received on (or is destined for)
    pub bus: u8,
    /// CAN message ID (11-bit or 29-bit)
    pub address: u32,
    /// Frame data bytes (0-8 bytes for classic CAN, up to 64 for CAN-FD)
    pub data: Vec<u8>,
}

impl Message {
    /// Create a new message
    pub fn new(bus: u8, address: u32, data: Vec<u8>) -> Self {
        Self { bus, address, data }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the frame carries no payload
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True if the address only fits a 29-bit identifier
    pub fn is_extended(&self) -> bool {
        self.address > MAX_STANDARD_ID
    }

    /// True if this is the steering-control message
    pub fn is_steering_control(&self) -> bool {
        self.address == STEERING_CONTROL_ADDR
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus {} 0x{:03X} [{}]", self.bus, self.address, self.data.len())
    }
}

/// Errors that can occur while parsing a safety configuration
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    #[error("Unknown safety mode: {0}")]
    UnknownMode(String),

    #[error("Unknown forward policy: {0}")]
    UnknownForwardPolicy(String),
}
