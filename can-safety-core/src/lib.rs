//! CAN Safety Gatekeeper Library
//!
//! Safety hooks for a controller sitting between a driving-assistance
//! computer and a car's internal CAN buses. For every frame the hooks decide
//! whether an application frame may be transmitted, whether a received frame
//! is relayed to another bus, and whether steering-control traffic already
//! present from the vehicle suppresses relaying.
//!
//! # Architecture
//!
//! - [`SafetyHooks`] pairs a [`SafetyMode`] (transmit policy) with a
//!   [`ForwardPolicy`] (relay policy) and exposes `init`, `rx`, `tx`,
//!   `tx_lin` and `forward`
//! - [`SafetyContext`] carries all mutable hook state explicitly
//! - [`ForwardingState`] is the steering-control hysteresis automaton
//! - [`Gatekeeper`] owns a context, a board and the active hooks
//!
//! The library does NOT:
//! - Frame or address CAN packets on hardware
//! - Detect relay malfunctions (it only resets the flag)
//! - Authenticate message contents
//!
//! # Example Usage
//!
//! ```
//! use can_safety_core::{Gatekeeper, Message, SafetyConfig, SimulatedBoard};
//!
//! let mut gatekeeper = Gatekeeper::new(SimulatedBoard::new(false), SafetyConfig::new());
//!
//! // No-output mode blocks everything the application tries to send
//! assert!(!gatekeeper.tx(&Message::new(0, 832, vec![0; 8])));
//!
//! // Received traffic is relayed between the primary and secondary bus
//! let frame = Message::new(0, 999, vec![0; 8]);
//! assert!(gatekeeper.rx(&frame));
//! assert_eq!(gatekeeper.forward(frame.bus, &frame), Some(2));
//! ```

// Public modules
pub mod addr_check;
pub mod board;
pub mod config;
pub mod forwarding;
pub mod gatekeeper;
pub mod hooks;
pub mod types;

// Re-export main types for convenience
pub use addr_check::{AddrCheck, AddressCheckTable};
pub use board::{Board, CanMode, RelayMalfunction, SimulatedBoard};
pub use config::SafetyConfig;
pub use forwarding::{ForwardingState, ForwardingTransition, HOLDOFF_REFILL};
pub use gatekeeper::{Gatekeeper, GatekeeperStats};
pub use hooks::{ForwardPolicy, SafetyContext, SafetyHooks, SafetyMode};
pub use types::{
    Message, SafetyError, ADVISORY_ADDR, AUX_BUS, AUX_SINK_BUS, PRIMARY_BUS,
    SECONDARY_BUS, STEERING_CONTROL_ADDR,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: default gatekeeper relays with forwarding enabled
        let gatekeeper = Gatekeeper::new(SimulatedBoard::default(), SafetyConfig::default());
        assert!(gatekeeper.context().forwarding.secondary_bus_forward_enabled());
        assert_eq!(gatekeeper.context().forwarding.primary_bus_holdoff_count(), 0);
    }
}
