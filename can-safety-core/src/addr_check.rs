//! Receive-side address validation
//!
//! An [`AddressCheckTable`] is returned by every safety mode's `init` hook and
//! consulted before the `rx` hook. Both modes shipped here use the empty
//! table, so nothing is rejected on content grounds.

use crate::types::Message;
use serde::{Deserialize, Serialize};

/// A single validation rule: frames with this address on this bus must
/// carry exactly `expected_len` payload bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddrCheck {
    /// CAN message ID the rule applies to
    pub address: u32,
    /// Bus the rule applies to
    pub bus: u8,
    /// Required payload length in bytes
    pub expected_len: usize,
}

impl AddrCheck {
    /// Create a new rule
    pub fn new(address: u32, bus: u8, expected_len: usize) -> Self {
        Self {
            address,
            bus,
            expected_len,
        }
    }

    fn matches(&self, msg: &Message) -> bool {
        self.address == msg.address && self.bus == msg.bus
    }
}

/// Ordered set of address validation rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCheckTable {
    checks: Vec<AddrCheck>,
}

impl AddressCheckTable {
    /// The table that accepts every message
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder method: append a rule
    pub fn with_check(mut self, check: AddrCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Number of rules in the table
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// True if the table holds no rules
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Rules in table order
    pub fn checks(&self) -> &[AddrCheck] {
        &self.checks
    }

    /// Check a received message against the table
    ///
    /// The first rule matching the message's (address, bus) decides; a
    /// message no rule matches is accepted.
    pub fn validate(&self, msg: &Message) -> bool {
        match self.checks.iter().find(|check| check.matches(msg)) {
            Some(check) if check.expected_len != msg.len() => {
                log::debug!(
                    "Address check failed for {}: expected {} bytes",
                    msg,
                    check.expected_len
                );
                false
            }
            _ => true,
        }
    }
}
