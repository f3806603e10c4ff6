//! Gatekeeper configuration types
//!
//! This module defines which hook set a [`Gatekeeper`](crate::Gatekeeper)
//! activates. Everything else about the hooks is fixed policy.

use crate::hooks::{ForwardPolicy, SafetyHooks, SafetyMode};
use serde::{Deserialize, Serialize};

/// Configuration selecting the active safety mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Transmit policy and `controls_allowed` value
    #[serde(default)]
    pub mode: SafetyMode,

    /// Relay policy between buses
    #[serde(default)]
    pub forward_policy: ForwardPolicy,

    /// Opaque per-mode parameter handed to `init`
    #[serde(default)]
    pub param: i16,
}

impl SafetyConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the safety mode
    pub fn with_mode(mut self, mode: SafetyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method: set the forward policy
    pub fn with_forward_policy(mut self, policy: ForwardPolicy) -> Self {
        self.forward_policy = policy;
        self
    }

    /// Builder method: set the init parameter
    pub fn with_param(mut self, param: i16) -> Self {
        self.param = param;
        self
    }

    /// Hook set described by this configuration
    pub fn hooks(&self) -> SafetyHooks {
        SafetyHooks::new(self.mode, self.forward_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_config_builder() {
        let config = SafetyConfig::new()
            .with_mode(SafetyMode::AllOutput)
            .with_forward_policy(ForwardPolicy::Static)
            .with_param(3);

        assert_eq!(config.mode, SafetyMode::AllOutput);
        assert_eq!(config.forward_policy, ForwardPolicy::Static);
        assert_eq!(config.param, 3);
        assert_eq!(
            config.hooks(),
            SafetyHooks::new(SafetyMode::AllOutput, ForwardPolicy::Static)
        );
    }

    #[test]
    fn test_defaults() {
        let config = SafetyConfig::new();
        assert_eq!(config.mode, SafetyMode::NoOutput);
        assert_eq!(config.forward_policy, ForwardPolicy::Hysteresis);
        assert_eq!(config.param, 0);
    }

    #[test]
    fn test_deserialization() {
        let config: SafetyConfig = toml::from_str(
            r#"
            mode = "all-output"
            forward_policy = "static"
        "#,
        )
        .unwrap();
        assert_eq!(config.mode, SafetyMode::AllOutput);
        assert_eq!(config.forward_policy, ForwardPolicy::Static);

        let empty: SafetyConfig = toml::from_str("").unwrap();
        assert_eq!(empty, SafetyConfig::default());

        assert!(toml::from_str::<SafetyConfig>("mode = \"silent\"").is_err());
    }
}
