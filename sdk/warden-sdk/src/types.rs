use serde::{Deserialize, Serialize};
use warden_program::ValidatorClass;
use warden_state::{Address, OperatorPermission, B256};

use crate::error::{Result, SdkError};

/// Operator grant as written by wallet tooling, minus the session root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionGrant {
    /// 0x-prefixed fee sponsor; absent means no sponsor is allowed
    #[serde(default)]
    pub paymaster: Option<String>,
    #[serde(default)]
    pub valid_after: u64,
    /// 0 means unbounded
    #[serde(default)]
    pub valid_until: u64,
    pub gas_budget: u128,
    pub time_budget: u64,
}

impl PermissionGrant {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_permission(&self, session_root: B256) -> Result<OperatorPermission> {
        let allowed_paymaster = match &self.paymaster {
            Some(text) => parse_address(text)?,
            None => Address::ZERO,
        };
        let permission = OperatorPermission {
            session_root,
            allowed_paymaster,
            valid_until: self.valid_until,
            valid_after: self.valid_after,
            gas_remaining: self.gas_budget,
            time_remaining: self.time_budget,
        };
        permission
            .validate()
            .map_err(|e| SdkError::InvalidGrant(e.to_string()))?;
        Ok(permission)
    }
}

/// One enabled validator of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorInfo {
    pub id: String,
    pub class: String,
}

impl ValidatorInfo {
    pub fn new(id: &Address, class: ValidatorClass) -> Self {
        Self {
            id: id.to_string(),
            class: format!("{class:?}").to_lowercase(),
        }
    }
}

pub fn parse_address(text: &str) -> Result<Address> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(digits).map_err(|e| SdkError::InvalidGrant(e.to_string()))?;
    Address::from_slice(&bytes)
        .ok_or_else(|| SdkError::InvalidGrant(format!("address must be 20 bytes: {text}")))
}
