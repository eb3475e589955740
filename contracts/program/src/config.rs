//! Engine configuration.

use serde::Deserialize;

use crate::error::WardenError;

/// Limits and toggles applied by the authorization core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WardenConfig {
    /// Deepest nesting accepted in a rule tree
    pub max_predicate_depth: usize,
    /// Most nodes (rules and literals) accepted in a rule tree
    pub max_predicate_nodes: usize,
    /// Most calls accepted in one batch
    pub max_batch_length: usize,
    /// Upper bound applied to registry pages
    pub max_page_size: usize,
    /// Also accept signatures over the `eth_sign` prefixed digest
    pub accept_prefixed_signatures: bool,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            max_predicate_depth: 8,
            max_predicate_nodes: 128,
            max_batch_length: 32,
            max_page_size: 64,
            accept_prefixed_signatures: true,
        }
    }
}

impl WardenConfig {
    pub fn from_json_str(json: &str) -> Result<Self, WardenError> {
        let config: WardenConfig = serde_json::from_str(json).map_err(|e| {
            tracing::warn!(error = %e, "rejecting warden config");
            WardenError::InvalidConfig
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WardenError> {
        if self.max_predicate_depth == 0
            || self.max_predicate_nodes == 0
            || self.max_batch_length == 0
            || self.max_page_size == 0
        {
            return Err(WardenError::InvalidConfig);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WardenConfig::from_json_str(r#"{ "max_predicate_depth": 4 }"#).unwrap();
        assert_eq!(config.max_predicate_depth, 4);
        assert_eq!(config.max_batch_length, 32);
        assert!(config.accept_prefixed_signatures);
    }

    #[test]
    fn test_rejects_unknown_and_zero_fields() {
        assert_eq!(
            WardenConfig::from_json_str(r#"{ "max_depth": 4 }"#),
            Err(WardenError::InvalidConfig)
        );
        assert_eq!(
            WardenConfig::from_json_str(r#"{ "max_batch_length": 0 }"#),
            Err(WardenError::InvalidConfig)
        );
    }
}
