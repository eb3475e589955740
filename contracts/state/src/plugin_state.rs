//! Per-wallet initialization flag embedded by every plugin.

use std::collections::HashSet;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{Address, StateError};

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PluginState {
    initialized: HashSet<Address>,
}

impl PluginState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self, wallet: &Address) -> bool {
        self.initialized.contains(wallet)
    }

    /// Marks `wallet` initialized; fails if it already is.
    pub fn initialize(&mut self, wallet: Address) -> Result<(), StateError> {
        if !self.initialized.insert(wallet) {
            return Err(StateError::AlreadyInitialized);
        }
        Ok(())
    }

    /// Clears the flag for `wallet`; fails if it was never set.
    pub fn clear(&mut self, wallet: &Address) -> Result<(), StateError> {
        if !self.initialized.remove(wallet) {
            return Err(StateError::NotInitialized);
        }
        Ok(())
    }

    pub fn require_initialized(&self, wallet: &Address) -> Result<(), StateError> {
        if self.is_initialized(wallet) {
            Ok(())
        } else {
            Err(StateError::NotInitialized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_once() {
        let wallet = Address([7; 20]);
        let mut state = PluginState::new();
        state.initialize(wallet).unwrap();
        assert_eq!(state.initialize(wallet), Err(StateError::AlreadyInitialized));
        assert!(state.is_initialized(&wallet));
    }

    #[test]
    fn test_clear_requires_initialized() {
        let wallet = Address([7; 20]);
        let mut state = PluginState::new();
        assert_eq!(state.clear(&wallet), Err(StateError::NotInitialized));
        state.initialize(wallet).unwrap();
        state.clear(&wallet).unwrap();
        assert!(!state.is_initialized(&wallet));
        state.initialize(wallet).unwrap();
    }
}
