//! Safety modes and their hooks
//!
//! Every mode exposes the same five decisions: `init`, `rx`, `tx`, `tx_lin`
//! and `forward`. The mode selects the transmit policy and the value of
//! `controls_allowed`; the forward policy selects how traffic is relayed
//! between buses and whether the steering-control automaton runs.

use crate::addr_check::AddressCheckTable;
use crate::board::{Board, CanMode, RelayMalfunction};
use crate::forwarding::ForwardingState;
use crate::types::{
    Message, SafetyError, ADVISORY_ADDR, AUX_BUS, AUX_SINK_BUS, PRIMARY_BUS, SECONDARY_BUS,
    STEERING_CONTROL_ADDR,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selectable safety mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyMode {
    /// Blocks every outbound CAN and LIN frame
    #[default]
    NoOutput,
    /// Diagnostic/bench mode: allows every outbound frame
    AllOutput,
}

impl SafetyMode {
    /// Value `init` writes to `controls_allowed`
    pub fn controls_allowed(self) -> bool {
        match self {
            SafetyMode::NoOutput => false,
            SafetyMode::AllOutput => true,
        }
    }

    /// Transmit gate for outbound CAN frames
    pub fn tx(self, _msg: &Message) -> bool {
        match self {
            SafetyMode::NoOutput => false,
            SafetyMode::AllOutput => true,
        }
    }

    /// Transmit gate for outbound LIN frames
    pub fn tx_lin(self, _lin_num: u8, _data: &[u8]) -> bool {
        match self {
            SafetyMode::NoOutput => false,
            SafetyMode::AllOutput => true,
        }
    }
}

impl fmt::Display for SafetyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyMode::NoOutput => write!(f, "no-output"),
            SafetyMode::AllOutput => write!(f, "all-output"),
        }
    }
}

impl FromStr for SafetyMode {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "nooutput" => Ok(SafetyMode::NoOutput),
            "alloutput" => Ok(SafetyMode::AllOutput),
            _ => Err(SafetyError::UnknownMode(s.to_string())),
        }
    }
}

/// How received traffic is relayed between buses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForwardPolicy {
    /// Primary and secondary bus bridged while the steering-control
    /// automaton permits it
    #[default]
    Hysteresis,
    /// Fixed routing; steering-control and advisory frames never return to
    /// the primary bus
    Static,
}

impl ForwardPolicy {
    /// Destination bus for a frame received on `bus_num`, or `None`
    pub fn forward(self, forwarding: &ForwardingState, bus_num: u8, msg: &Message) -> Option<u8> {
        match self {
            ForwardPolicy::Hysteresis => {
                if !forwarding.secondary_bus_forward_enabled() {
                    return None;
                }
                // Excluding STEERING_CONTROL_ADDR and ADVISORY_ADDR on the
                // 2 -> 0 path is a known alternative here; it is not enabled.
                match bus_num {
                    PRIMARY_BUS => Some(SECONDARY_BUS),
                    SECONDARY_BUS => Some(PRIMARY_BUS),
                    _ => None,
                }
            }
            ForwardPolicy::Static => match bus_num {
                PRIMARY_BUS => Some(SECONDARY_BUS),
                AUX_BUS => Some(AUX_SINK_BUS),
                SECONDARY_BUS if !is_camera_owned(msg.address) => Some(PRIMARY_BUS),
                _ => None,
            },
        }
    }

    /// True if the steering-control automaton drives this policy
    pub fn uses_automaton(self) -> bool {
        matches!(self, ForwardPolicy::Hysteresis)
    }
}

impl fmt::Display for ForwardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardPolicy::Hysteresis => write!(f, "hysteresis"),
            ForwardPolicy::Static => write!(f, "static"),
        }
    }
}

impl FromStr for ForwardPolicy {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "hysteresis" => Ok(ForwardPolicy::Hysteresis),
            "static" => Ok(ForwardPolicy::Static),
            _ => Err(SafetyError::UnknownForwardPolicy(s.to_string())),
        }
    }
}

/// Frames that originate on the camera side and must stay there
fn is_camera_owned(address: u32) -> bool {
    address == STEERING_CONTROL_ADDR || address == ADVISORY_ADDR
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// State the hooks read and write, passed explicitly into every call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SafetyContext {
    /// Whether actuation is currently authorized
    pub controls_allowed: bool,
    /// Relay fault flag, reset on mode activation
    pub relay_malfunction: RelayMalfunction,
    /// Steering-control relay automaton
    pub forwarding: ForwardingState,
}

impl SafetyContext {
    /// Create a context in the power-on state
    pub fn new() -> Self {
        Self::default()
    }
}

/// The active hook set: a safety mode paired with a forward policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SafetyHooks {
    pub mode: SafetyMode,
    pub policy: ForwardPolicy,
}

impl SafetyHooks {
    pub fn new(mode: SafetyMode, policy: ForwardPolicy) -> Self {
        Self { mode, policy }
    }

    /// Activate the mode
    ///
    /// Sets `controls_allowed`, resets the relay fault and the forwarding
    /// automaton, and returns the address-check table for subsequent `rx`
    /// validation. With the static policy the no-output mode routes an
    /// OBD-capable board's second controller to the diagnostics connector.
    /// `param` is accepted for interface parity and unused by these modes.
    pub fn init(
        &self,
        ctx: &mut SafetyContext,
        board: &mut dyn Board,
        _param: i16,
    ) -> AddressCheckTable {
        ctx.controls_allowed = self.mode.controls_allowed();
        ctx.relay_malfunction.reset();
        ctx.forwarding.reset();

        if self.mode == SafetyMode::NoOutput
            && self.policy == ForwardPolicy::Static
            && board.has_obd()
        {
            board.set_can_mode(CanMode::ObdCan2);
            log::info!("setting can mode obd");
        }

        log::debug!(
            "Safety mode {} ({} forwarding) initialized, controls_allowed={}",
            self.mode,
            self.policy,
            ctx.controls_allowed
        );
        AddressCheckTable::empty()
    }

    /// Observe a received frame; never rejects
    pub fn rx(&self, ctx: &mut SafetyContext, msg: &Message) -> bool {
        if self.policy.uses_automaton() {
            if let Some(transition) = ctx.forwarding.observe(msg) {
                log::info!("{}", transition);
            }
        }
        true
    }

    /// Gate an outbound CAN frame
    pub fn tx(&self, msg: &Message) -> bool {
        self.mode.tx(msg)
    }

    /// Gate an outbound LIN frame
    pub fn tx_lin(&self, lin_num: u8, data: &[u8]) -> bool {
        self.mode.tx_lin(lin_num, data)
    }

    /// Destination bus for a received frame, or `None` to drop it
    pub fn forward(&self, ctx: &SafetyContext, bus_num: u8, msg: &Message) -> Option<u8> {
        self.policy.forward(&ctx.forwarding, bus_num, msg)
    }
}
