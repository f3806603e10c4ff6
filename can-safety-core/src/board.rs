//! Collaborators owned by the surrounding firmware
//!
//! The hooks only trigger these: board capability queries, the transceiver
//! routing switch, and the relay-malfunction detector reset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical CAN transceiver routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanMode {
    /// Regular bus routing
    #[default]
    Normal,
    /// Second CAN controller routed to the on-board diagnostics connector
    ObdCan2,
}

impl fmt::Display for CanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanMode::Normal => write!(f, "normal"),
            CanMode::ObdCan2 => write!(f, "obd-can2"),
        }
    }
}

/// Hardware capabilities consulted by `init`
pub trait Board {
    /// True if the board has an on-board diagnostics line
    fn has_obd(&self) -> bool;

    /// Switch the transceiver routing
    fn set_can_mode(&mut self, mode: CanMode);
}

/// In-memory board used for bench replay and tests
#[derive(Debug, Clone, Default)]
pub struct SimulatedBoard {
    has_obd: bool,
    can_mode: CanMode,
}

impl SimulatedBoard {
    /// Create a board with or without a diagnostics line
    pub fn new(has_obd: bool) -> Self {
        Self {
            has_obd,
            can_mode: CanMode::Normal,
        }
    }

    /// Current transceiver routing
    pub fn can_mode(&self) -> CanMode {
        self.can_mode
    }
}

impl Board for SimulatedBoard {
    fn has_obd(&self) -> bool {
        self.has_obd
    }

    fn set_can_mode(&mut self, mode: CanMode) {
        self.can_mode = mode;
    }
}

/// Relay-malfunction fault flag
///
/// Detection lives with the relay supervisor; the safety modes only reset it
/// on activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RelayMalfunction {
    active: bool,
}

impl RelayMalfunction {
    /// Latch the fault
    pub fn set(&mut self) {
        if !self.active {
            log::warn!("Relay malfunction detected");
        }
        self.active = true;
    }

    /// Return to the healthy state
    pub fn reset(&mut self) {
        self.active = false;
    }

    /// True while the fault is latched
    pub fn is_active(&self) -> bool {
        self.active
    }
}
