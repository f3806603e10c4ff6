//! Main gatekeeper API
//!
//! The [`Gatekeeper`] owns one safety context, the active hook set, the
//! address-check table returned by `init`, and the board. Frames must be
//! offered in the order the transport delivered them; the forwarding
//! automaton depends on it.

use crate::addr_check::AddressCheckTable;
use crate::board::Board;
use crate::config::SafetyConfig;
use crate::hooks::{SafetyContext, SafetyHooks};
use crate::types::Message;
use serde::Serialize;

/// Running decision counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatekeeperStats {
    pub rx_accepted: u64,
    pub rx_rejected: u64,
    pub tx_allowed: u64,
    pub tx_blocked: u64,
    pub lin_allowed: u64,
    pub lin_blocked: u64,
    pub forwarded: u64,
    pub dropped: u64,
}

/// Entry point for all gating decisions
pub struct Gatekeeper<B: Board> {
    hooks: SafetyHooks,
    ctx: SafetyContext,
    rx_checks: AddressCheckTable,
    board: B,
    stats: GatekeeperStats,
}

impl<B: Board> Gatekeeper<B> {
    /// Create a gatekeeper and activate the configured mode
    pub fn new(board: B, config: SafetyConfig) -> Self {
        let mut gatekeeper = Self {
            hooks: config.hooks(),
            ctx: SafetyContext::new(),
            rx_checks: AddressCheckTable::empty(),
            board,
            stats: GatekeeperStats::default(),
        };
        gatekeeper.select_mode(config);
        gatekeeper
    }

    /// Switch to another mode; all hook state is reset
    pub fn select_mode(&mut self, config: SafetyConfig) {
        log::info!(
            "Selecting safety mode {} with {} forwarding",
            config.mode,
            config.forward_policy
        );
        self.hooks = config.hooks();
        self.rx_checks = self.hooks.init(&mut self.ctx, &mut self.board, config.param);
    }

    /// Validate and observe a received frame
    pub fn rx(&mut self, msg: &Message) -> bool {
        let accepted = self.rx_checks.validate(msg) && self.hooks.rx(&mut self.ctx, msg);
        if accepted {
            self.stats.rx_accepted += 1;
        } else {
            self.stats.rx_rejected += 1;
        }
        log::trace!("rx {} -> {}", msg, accepted);
        accepted
    }

    /// Gate an outbound CAN frame
    pub fn tx(&mut self, msg: &Message) -> bool {
        let allowed = self.hooks.tx(msg);
        if allowed {
            self.stats.tx_allowed += 1;
        } else {
            self.stats.tx_blocked += 1;
        }
        log::debug!("tx {} -> {}", msg, if allowed { "allowed" } else { "blocked" });
        allowed
    }

    /// Gate an outbound LIN frame
    pub fn tx_lin(&mut self, lin_num: u8, data: &[u8]) -> bool {
        let allowed = self.hooks.tx_lin(lin_num, data);
        if allowed {
            self.stats.lin_allowed += 1;
        } else {
            self.stats.lin_blocked += 1;
        }
        allowed
    }

    /// Destination bus for a frame received on `bus_num`
    pub fn forward(&mut self, bus_num: u8, msg: &Message) -> Option<u8> {
        let destination = self.hooks.forward(&self.ctx, bus_num, msg);
        match destination {
            Some(bus) => {
                self.stats.forwarded += 1;
                log::trace!("fwd {} -> bus {}", msg, bus);
            }
            None => self.stats.dropped += 1,
        }
        destination
    }

    /// Run `rx` then `forward` for a frame on its own bus
    pub fn route(&mut self, msg: &Message) -> (bool, Option<u8>) {
        let accepted = self.rx(msg);
        let destination = self.forward(msg.bus, msg);
        (accepted, destination)
    }

    /// Active hook set
    pub fn hooks(&self) -> SafetyHooks {
        self.hooks
    }

    /// Current hook state
    pub fn context(&self) -> &SafetyContext {
        &self.ctx
    }

    /// Mutable hook state, for collaborators such as the relay supervisor
    pub fn context_mut(&mut self) -> &mut SafetyContext {
        &mut self.ctx
    }

    /// Table returned by the last `init`
    pub fn rx_checks(&self) -> &AddressCheckTable {
        &self.rx_checks
    }

    /// Whether actuation is currently authorized
    pub fn controls_allowed(&self) -> bool {
        self.ctx.controls_allowed
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn stats(&self) -> GatekeeperStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CanMode, SimulatedBoard};
    use crate::hooks::{ForwardPolicy, SafetyMode};
    use crate::types::STEERING_CONTROL_ADDR;

    #[test]
    fn test_gatekeeper_creation() {
        let gatekeeper = Gatekeeper::new(SimulatedBoard::new(false), SafetyConfig::new());
        assert!(!gatekeeper.controls_allowed());
        assert!(gatekeeper.rx_checks().is_empty());
        assert_eq!(gatekeeper.stats(), GatekeeperStats::default());
    }

    #[test]
    fn test_select_mode_resets_state() {
        let mut gatekeeper = Gatekeeper::new(SimulatedBoard::new(false), SafetyConfig::new());
        gatekeeper.rx(&Message::new(0, STEERING_CONTROL_ADDR, vec![0; 8]));
        gatekeeper.context_mut().relay_malfunction.set();
        assert!(!gatekeeper.context().forwarding.secondary_bus_forward_enabled());

        gatekeeper.select_mode(SafetyConfig::new().with_mode(SafetyMode::AllOutput));
        assert!(gatekeeper.controls_allowed());
        assert!(gatekeeper.context().forwarding.secondary_bus_forward_enabled());
        assert!(!gatekeeper.context().relay_malfunction.is_active());
    }

    #[test]
    fn test_stats_counting() {
        let mut gatekeeper = Gatekeeper::new(SimulatedBoard::new(false), SafetyConfig::new());
        let frame = Message::new(0, 0x100, vec![1, 2]);

        assert!(!gatekeeper.tx(&frame));
        assert!(!gatekeeper.tx_lin(0, &[0x01]));
        assert_eq!(gatekeeper.route(&frame), (true, Some(2)));
        assert_eq!(gatekeeper.forward(1, &frame), None);

        let stats = gatekeeper.stats();
        assert_eq!(stats.tx_blocked, 1);
        assert_eq!(stats.lin_blocked, 1);
        assert_eq!(stats.rx_accepted, 1);
        assert_eq!(stats.forwarded, 1);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_obd_board_switched_on_static_no_output() {
        let config = SafetyConfig::new().with_forward_policy(ForwardPolicy::Static);
        let gatekeeper = Gatekeeper::new(SimulatedBoard::new(true), config);
        assert_eq!(gatekeeper.board().can_mode(), CanMode::ObdCan2);
    }
}
