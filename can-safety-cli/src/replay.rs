//! Trace replay through a gatekeeper
//!
//! Each trace gets its own gatekeeper, so files never share automaton state.
//! Within a file, records are replayed strictly in recorded order.

use crate::trace::{Direction, TraceRecord};
use can_safety_core::{Gatekeeper, GatekeeperStats, SafetyConfig, SimulatedBoard};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of offering one trace record to the hooks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub bus: u8,
    pub address: u32,
    pub len: usize,
    /// `rx` result for received frames, `tx` result for outbound ones
    pub allowed: bool,
    /// Destination bus for received frames; always `None` for outbound ones
    pub forward_to: Option<u8>,
    /// Automaton state after the record was processed
    pub forwarding_enabled: bool,
    pub holdoff: u32,
}

impl Decision {
    /// True if the frame was blocked or (for received frames) not relayed
    pub fn is_blocked(&self) -> bool {
        match self.direction {
            Direction::Rx => !self.allowed || self.forward_to.is_none(),
            Direction::Tx => !self.allowed,
        }
    }
}

/// All decisions for one trace file
#[derive(Debug, Clone, Serialize)]
pub struct ReplayResult {
    pub source: PathBuf,
    pub decisions: Vec<Decision>,
    pub stats: GatekeeperStats,
    pub controls_allowed: bool,
}

/// Replay records through a freshly initialized gatekeeper
pub fn replay(
    source: PathBuf,
    records: &[TraceRecord],
    config: SafetyConfig,
    has_obd: bool,
) -> ReplayResult {
    let mut gatekeeper = Gatekeeper::new(SimulatedBoard::new(has_obd), config);
    log::debug!(
        "Replaying {} records from {:?} (can mode {})",
        records.len(),
        source,
        gatekeeper.board().can_mode()
    );

    let decisions = records
        .iter()
        .map(|record| {
            let msg = &record.message;
            let (allowed, forward_to) = match record.direction {
                Direction::Rx => gatekeeper.route(msg),
                Direction::Tx => (gatekeeper.tx(msg), None),
            };
            let forwarding = &gatekeeper.context().forwarding;

            Decision {
                timestamp: record.timestamp,
                direction: record.direction,
                bus: msg.bus,
                address: msg.address,
                len: msg.len(),
                allowed,
                forward_to,
                forwarding_enabled: forwarding.secondary_bus_forward_enabled(),
                holdoff: forwarding.primary_bus_holdoff_count(),
            }
        })
        .collect();

    ReplayResult {
        source,
        decisions,
        stats: gatekeeper.stats(),
        controls_allowed: gatekeeper.controls_allowed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::parse_trace;
    use can_safety_core::{ForwardPolicy, SafetyMode};

    const HANDOVER: &str = "\
(1.00) can0 340#0000000000000000
(1.01) can0 064#00
(1.02) can2 340#0000000000000000
(1.03) can0 340#0000000000000000 T
";

    #[test]
    fn test_replay_hysteresis_no_output() {
        let records = parse_trace(HANDOVER).unwrap();
        let result = replay(PathBuf::from("handover.log"), &records, SafetyConfig::new(), false);

        assert!(!result.controls_allowed);
        assert_eq!(result.decisions.len(), 4);

        let first = &result.decisions[0];
        assert!(first.allowed);
        assert_eq!(first.forward_to, None);
        assert!(!first.forwarding_enabled);
        assert_eq!(first.holdoff, 10);

        assert_eq!(result.decisions[1].forward_to, None);
        assert_eq!(result.decisions[2].holdoff, 9);

        let tx = &result.decisions[3];
        assert_eq!(tx.direction, Direction::Tx);
        assert!(!tx.allowed);
        assert!(tx.is_blocked());

        assert_eq!(result.stats.rx_accepted, 3);
        assert_eq!(result.stats.tx_blocked, 1);
        assert_eq!(result.stats.dropped, 3);
    }

    #[test]
    fn test_replay_static_all_output() {
        let records = parse_trace(HANDOVER).unwrap();
        let config = SafetyConfig::new()
            .with_mode(SafetyMode::AllOutput)
            .with_forward_policy(ForwardPolicy::Static);
        let result = replay(PathBuf::from("handover.log"), &records, config, true);

        assert!(result.controls_allowed);
        assert_eq!(result.decisions[0].forward_to, Some(2));
        assert_eq!(result.decisions[1].forward_to, Some(2));
        // Camera-owned steering frame stays off the primary bus
        assert_eq!(result.decisions[2].forward_to, None);
        assert!(result.decisions[2].is_blocked());
        assert!(result.decisions[3].allowed);
        assert!(!result.decisions[3].is_blocked());
        // Static policy leaves the automaton untouched
        assert!(result.decisions.iter().all(|d| d.forwarding_enabled && d.holdoff == 0));
    }
}
