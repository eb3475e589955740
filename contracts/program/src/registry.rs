//! Generic plugin registry.
//!
//! Plugin instances are deployed once and shared by every wallet; each
//! wallet keeps its own [`OrderedIdentifierSet`] of enabled plugins. Enabling
//! probes the candidate and runs its enable hook before the identifier is
//! linked. Disabling unlinks first and then runs the clear hook, whose
//! failure is reported but never blocks the removal.

use std::collections::HashMap;

use warden_interface::{Capability, Plugin, PluginError, PLUGIN_INTERFACE_ID};
use warden_state::{Address, OrderedIdentifierSet, Page, StateError, SENTINEL};

use crate::error::WardenError;
use crate::governance::GovernanceContext;

/// Outcome of a disable call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisableReport {
    pub plugin: Address,
    /// Clear-hook failure, if the plugin's own cleanup failed
    pub clear_error: Option<PluginError>,
}

impl DisableReport {
    pub fn cleared(&self) -> bool {
        self.clear_error.is_none()
    }
}

pub struct PluginRegistry<P: ?Sized + Plugin> {
    capability: Capability,
    max_page_size: usize,
    deployed: HashMap<Address, Box<P>>,
    enabled: HashMap<Address, OrderedIdentifierSet>,
}

impl<P: ?Sized + Plugin> PluginRegistry<P> {
    pub fn new(capability: Capability, max_page_size: usize) -> Self {
        Self {
            capability,
            max_page_size,
            deployed: HashMap::new(),
            enabled: HashMap::new(),
        }
    }

    /// Makes a plugin instance addressable by its identifier.
    pub fn deploy(&mut self, plugin: Box<P>) -> Result<Address, WardenError> {
        let id = plugin.id();
        if id.is_zero() || id == SENTINEL {
            return Err(StateError::InvalidIdentifier.into());
        }
        if self.deployed.contains_key(&id) {
            return Err(StateError::AlreadyExists.into());
        }
        self.deployed.insert(id, plugin);
        tracing::debug!(plugin = %id, "plugin deployed");
        Ok(id)
    }

    pub fn is_deployed(&self, id: &Address) -> bool {
        self.deployed.contains_key(id)
    }

    pub fn plugin(&self, id: &Address) -> Option<&P> {
        self.deployed.get(id).map(|p| &**p)
    }

    pub fn plugin_mut(&mut self, id: &Address) -> Option<&mut P> {
        self.deployed.get_mut(id).map(|p| &mut **p)
    }

    fn probe(&self, id: &Address) -> Result<(), WardenError> {
        let plugin = self
            .deployed
            .get(id)
            .ok_or(WardenError::State(StateError::NotFound))?;
        let conforms = plugin.id() == *id
            && plugin.supports_interface(PLUGIN_INTERFACE_ID)
            && plugin.supports_interface(self.capability.interface_id());
        if !conforms {
            tracing::warn!(plugin = %id, capability = ?self.capability, "capability probe failed");
            return Err(WardenError::ProbeFailed);
        }
        Ok(())
    }

    pub fn enable(
        &mut self,
        ctx: &GovernanceContext,
        id: Address,
        init_data: &[u8],
    ) -> Result<(), WardenError> {
        ctx.require_self()?;
        self.probe(&id)?;
        if self.is_enabled(&ctx.wallet, &id) {
            return Err(StateError::AlreadyExists.into());
        }
        let plugin = self
            .deployed
            .get_mut(&id)
            .ok_or(WardenError::State(StateError::NotFound))?;
        plugin.on_enable(ctx.wallet, init_data)?;
        self.enabled.entry(ctx.wallet).or_default().add(id)?;
        tracing::debug!(wallet = %ctx.wallet, plugin = %id, "plugin enabled");
        Ok(())
    }

    /// Unlinks `id` (whose predecessor must be `prev`) and clears its state.
    pub fn disable(
        &mut self,
        ctx: &GovernanceContext,
        prev: Address,
        id: Address,
    ) -> Result<DisableReport, WardenError> {
        ctx.require_self()?;
        let set = self
            .enabled
            .get_mut(&ctx.wallet)
            .ok_or(WardenError::State(StateError::NotFound))?;
        set.remove(prev, id)?;
        if set.is_empty() {
            self.enabled.remove(&ctx.wallet);
        }

        let clear_error = match self.deployed.get_mut(&id) {
            Some(plugin) => plugin.on_disable(&ctx.wallet).err(),
            None => Some(PluginError::NotInitialized),
        };
        if let Some(error) = clear_error {
            tracing::warn!(
                wallet = %ctx.wallet,
                plugin = %id,
                %error,
                "plugin clear hook failed; plugin disabled anyway"
            );
        } else {
            tracing::debug!(wallet = %ctx.wallet, plugin = %id, "plugin disabled");
        }
        Ok(DisableReport {
            plugin: id,
            clear_error,
        })
    }

    /// [`Self::disable`] with the predecessor derived by enumeration.
    pub fn disable_auto(
        &mut self,
        ctx: &GovernanceContext,
        id: Address,
    ) -> Result<DisableReport, WardenError> {
        ctx.require_self()?;
        let prev = self.predecessor_of(&ctx.wallet, &id)?;
        self.disable(ctx, prev, id)
    }

    pub fn predecessor_of(&self, wallet: &Address, id: &Address) -> Result<Address, WardenError> {
        let set = self
            .enabled
            .get(wallet)
            .ok_or(WardenError::State(StateError::NotFound))?;
        Ok(set.find_predecessor(id)?)
    }

    pub fn is_enabled(&self, wallet: &Address, id: &Address) -> bool {
        self.enabled
            .get(wallet)
            .map_or(false, |set| set.contains(id))
    }

    pub fn enabled_count(&self, wallet: &Address) -> usize {
        self.enabled.get(wallet).map_or(0, OrderedIdentifierSet::size)
    }

    /// One page of the wallet's enabled plugins, most recent first.
    pub fn list(&self, wallet: &Address, from: Address, limit: usize) -> Result<Page, WardenError> {
        let limit = limit.min(self.max_page_size);
        match self.enabled.get(wallet) {
            Some(set) => Ok(set.list(from, limit)?),
            None => Ok(OrderedIdentifierSet::new().list(from, limit)?),
        }
    }

    /// Every enabled plugin of `wallet`.
    pub fn enabled_ids(&self, wallet: &Address) -> Vec<Address> {
        self.enabled
            .get(wallet)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashSet;
    use warden_interface::{InterfaceId, VALIDATOR_INTERFACE_ID};

    struct Counter {
        id: Address,
        compliant: bool,
        fail_clear: bool,
        initialized: HashSet<Address>,
    }

    impl Counter {
        fn new(byte: u8) -> Box<dyn Plugin> {
            Box::new(Counter {
                id: Address([byte; 20]),
                compliant: true,
                fail_clear: false,
                initialized: HashSet::new(),
            })
        }
    }

    impl Plugin for Counter {
        fn id(&self) -> Address {
            self.id
        }

        fn supports_interface(&self, interface_id: InterfaceId) -> bool {
            self.compliant && interface_id == PLUGIN_INTERFACE_ID
        }

        fn on_enable(&mut self, wallet: Address, init_data: &[u8]) -> Result<(), PluginError> {
            if init_data == b"reject" {
                return Err(PluginError::InvalidInitData);
            }
            if !self.initialized.insert(wallet) {
                return Err(PluginError::AlreadyInitialized);
            }
            Ok(())
        }

        fn on_disable(&mut self, wallet: &Address) -> Result<(), PluginError> {
            if self.fail_clear {
                return Err(PluginError::Rejected);
            }
            if !self.initialized.remove(wallet) {
                return Err(PluginError::NotInitialized);
            }
            Ok(())
        }

        fn is_initialized(&self, wallet: &Address) -> bool {
            self.initialized.contains(wallet)
        }
    }

    const WALLET: Address = Address([0xee; 20]);

    fn registry() -> PluginRegistry<dyn Plugin> {
        let mut registry = PluginRegistry::new(Capability::Plugin, 16);
        for byte in [0xa, 0xb, 0xc] {
            registry.deploy(Counter::new(byte)).unwrap();
        }
        registry
    }

    fn ctx() -> GovernanceContext {
        GovernanceContext::self_call(WALLET)
    }

    #[test]
    fn test_enable_requires_self_governance() {
        let mut registry = registry();
        let outsider = GovernanceContext::new(WALLET, Address([1; 20]));
        assert_eq!(
            registry.enable(&outsider, Address([0xa; 20]), &[]),
            Err(WardenError::Unauthorized)
        );
        assert!(!registry.is_enabled(&WALLET, &Address([0xa; 20])));
    }

    #[test]
    fn test_enable_twice_fails() {
        let mut registry = registry();
        let id = Address([0xa; 20]);
        registry.enable(&ctx(), id, &[]).unwrap();
        assert_eq!(
            registry.enable(&ctx(), id, &[]),
            Err(WardenError::State(StateError::AlreadyExists))
        );
        assert!(registry.plugin(&id).unwrap().is_initialized(&WALLET));
    }

    #[test]
    fn test_probe_failure_aborts() {
        let mut registry = PluginRegistry::<dyn Plugin>::new(Capability::Validator, 16);
        let id = registry.deploy(Counter::new(0xa)).unwrap();
        assert_eq!(registry.enable(&ctx(), id, &[]), Err(WardenError::ProbeFailed));
        assert!(!registry.plugin(&id).unwrap().is_initialized(&WALLET));
        assert!(!registry.plugin(&id).unwrap().supports_interface(VALIDATOR_INTERFACE_ID));
    }

    #[test]
    fn test_failed_enable_hook_links_nothing() {
        let mut registry = registry();
        let id = Address([0xa; 20]);
        assert_eq!(
            registry.enable(&ctx(), id, b"reject"),
            Err(WardenError::Plugin(PluginError::InvalidInitData))
        );
        assert_eq!(registry.enabled_count(&WALLET), 0);
    }

    #[test]
    fn test_disable_requires_correct_predecessor() {
        let mut registry = registry();
        let (a, b, c) = (Address([0xa; 20]), Address([0xb; 20]), Address([0xc; 20]));
        for id in [a, b, c] {
            registry.enable(&ctx(), id, &[]).unwrap();
        }
        assert_eq!(
            registry.disable(&ctx(), SENTINEL, b),
            Err(WardenError::State(StateError::StalePredecessor))
        );
        let report = registry.disable(&ctx(), c, b).unwrap();
        assert!(report.cleared());
        assert_eq!(registry.enabled_ids(&WALLET), vec![c, a]);
        assert_eq!(registry.predecessor_of(&WALLET, &a), Ok(c));
    }

    #[test]
    fn test_reenable_after_disable_resets_state() {
        let mut registry = registry();
        let id = Address([0xa; 20]);
        registry.enable(&ctx(), id, &[]).unwrap();
        registry.disable_auto(&ctx(), id).unwrap();
        assert!(!registry.plugin(&id).unwrap().is_initialized(&WALLET));
        registry.enable(&ctx(), id, &[]).unwrap();
        assert!(registry.is_enabled(&WALLET, &id));
    }

    #[test]
    fn test_broken_clear_hook_never_blocks_disable() {
        let mut registry = PluginRegistry::<dyn Plugin>::new(Capability::Plugin, 16);
        let id = registry
            .deploy(Box::new(Counter {
                id: Address([0xd; 20]),
                compliant: true,
                fail_clear: true,
                initialized: HashSet::new(),
            }))
            .unwrap();
        registry.enable(&ctx(), id, &[]).unwrap();
        let report = registry.disable_auto(&ctx(), id).unwrap();
        assert_eq!(report.clear_error, Some(PluginError::Rejected));
        assert!(!registry.is_enabled(&WALLET, &id));
    }

    #[test]
    fn test_list_is_paged_and_capped() {
        let mut registry = PluginRegistry::<dyn Plugin>::new(Capability::Plugin, 2);
        for byte in 1..=5u8 {
            let id = registry.deploy(Counter::new(byte + 0x10)).unwrap();
            registry.enable(&ctx(), id, &[]).unwrap();
        }
        let page = registry.list(&WALLET, SENTINEL, 10).unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0], Address([0x15; 20]));
        let rest = registry.list(&WALLET, page.next, 10).unwrap();
        assert_eq!(rest.entries, vec![Address([0x13; 20]), Address([0x12; 20])]);
        assert_matches!(registry.list(&Address([9; 20]), SENTINEL, 10), Ok(p) if p.entries.is_empty());
    }

    #[test]
    fn test_wallets_are_isolated() {
        let mut registry = registry();
        let id = Address([0xa; 20]);
        registry.enable(&ctx(), id, &[]).unwrap();
        let other = Address([0xdd; 20]);
        assert!(!registry.is_enabled(&other, &id));
        registry.enable(&GovernanceContext::self_call(other), id, &[]).unwrap();
        registry.disable_auto(&ctx(), id).unwrap();
        assert!(registry.is_enabled(&other, &id));
    }
}
