//! Validator registry with Sudo / Normal classes.
//!
//! Once a wallet has enabled any validator it keeps at least one Sudo
//! validator forever: the first validator must be Sudo, and no disable or
//! reclassification may take the last one away.

use std::collections::HashMap;

use borsh::{BorshDeserialize, BorshSerialize};
use warden_interface::{Capability, SudoSignerLookup};
use warden_state::{Address, Page};

use crate::error::WardenError;
use crate::governance::GovernanceContext;
use crate::registry::{DisableReport, PluginRegistry};
use crate::validators::Validator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ValidatorClass {
    #[default]
    Disabled,
    /// Unrestricted, including governance of the wallet itself
    Sudo,
    Normal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub sudo: u32,
    pub normal: u32,
}

impl ClassCounts {
    fn add(&mut self, class: ValidatorClass) {
        match class {
            ValidatorClass::Sudo => self.sudo += 1,
            ValidatorClass::Normal => self.normal += 1,
            ValidatorClass::Disabled => {},
        }
    }

    fn sub(&mut self, class: ValidatorClass) {
        match class {
            ValidatorClass::Sudo => self.sudo = self.sudo.saturating_sub(1),
            ValidatorClass::Normal => self.normal = self.normal.saturating_sub(1),
            ValidatorClass::Disabled => {},
        }
    }
}

pub struct ValidatorRegistry {
    plugins: PluginRegistry<dyn Validator>,
    classes: HashMap<(Address, Address), ValidatorClass>,
    counts: HashMap<Address, ClassCounts>,
}

impl ValidatorRegistry {
    pub fn new(max_page_size: usize) -> Self {
        Self {
            plugins: PluginRegistry::new(Capability::Validator, max_page_size),
            classes: HashMap::new(),
            counts: HashMap::new(),
        }
    }

    pub fn deploy(&mut self, validator: Box<dyn Validator>) -> Result<Address, WardenError> {
        self.plugins.deploy(validator)
    }

    pub fn validator(&self, id: &Address) -> Option<&dyn Validator> {
        self.plugins.plugin(id)
    }

    pub fn validator_mut(&mut self, id: &Address) -> Option<&mut (dyn Validator + 'static)> {
        self.plugins.plugin_mut(id)
    }

    pub fn class_of(&self, wallet: &Address, id: &Address) -> ValidatorClass {
        self.classes
            .get(&(*wallet, *id))
            .copied()
            .unwrap_or_default()
    }

    pub fn counts(&self, wallet: &Address) -> ClassCounts {
        self.counts.get(wallet).copied().unwrap_or_default()
    }

    pub fn sudo_count(&self, wallet: &Address) -> u32 {
        self.counts(wallet).sudo
    }

    pub fn normal_count(&self, wallet: &Address) -> u32 {
        self.counts(wallet).normal
    }

    pub fn enable(
        &mut self,
        ctx: &GovernanceContext,
        id: Address,
        class: ValidatorClass,
        init_data: &[u8],
    ) -> Result<(), WardenError> {
        ctx.require_self()?;
        if class == ValidatorClass::Disabled {
            return Err(WardenError::Unsupported);
        }
        if !self.plugins.is_deployed(&id) {
            return Err(WardenError::ValidatorNotFound);
        }
        if self.sudo_count(&ctx.wallet) == 0 && class != ValidatorClass::Sudo {
            return Err(WardenError::LastSudoGuard);
        }
        self.plugins.enable(ctx, id, init_data)?;
        self.classes.insert((ctx.wallet, id), class);
        self.counts.entry(ctx.wallet).or_default().add(class);
        tracing::debug!(wallet = %ctx.wallet, validator = %id, ?class, "validator enabled");
        Ok(())
    }

    fn guard_last_sudo(&self, wallet: &Address, id: &Address) -> Result<(), WardenError> {
        if self.class_of(wallet, id) == ValidatorClass::Sudo && self.sudo_count(wallet) <= 1 {
            tracing::warn!(wallet = %wallet, validator = %id, "refusing to drop the last sudo validator");
            return Err(WardenError::LastSudoGuard);
        }
        Ok(())
    }

    pub fn disable(
        &mut self,
        ctx: &GovernanceContext,
        prev: Address,
        id: Address,
    ) -> Result<DisableReport, WardenError> {
        ctx.require_self()?;
        self.guard_last_sudo(&ctx.wallet, &id)?;
        let report = self.plugins.disable(ctx, prev, id)?;
        self.forget(&ctx.wallet, &id);
        Ok(report)
    }

    pub fn disable_auto(
        &mut self,
        ctx: &GovernanceContext,
        id: Address,
    ) -> Result<DisableReport, WardenError> {
        ctx.require_self()?;
        self.guard_last_sudo(&ctx.wallet, &id)?;
        let report = self.plugins.disable_auto(ctx, id)?;
        self.forget(&ctx.wallet, &id);
        Ok(report)
    }

    fn forget(&mut self, wallet: &Address, id: &Address) {
        if let Some(class) = self.classes.remove(&(*wallet, *id)) {
            self.counts.entry(*wallet).or_default().sub(class);
        }
    }

    /// Moves an enabled validator between Sudo and Normal.
    pub fn reclassify(
        &mut self,
        ctx: &GovernanceContext,
        id: Address,
        class: ValidatorClass,
    ) -> Result<(), WardenError> {
        ctx.require_self()?;
        if class == ValidatorClass::Disabled {
            return Err(WardenError::Unsupported);
        }
        let current = self.class_of(&ctx.wallet, &id);
        if current == ValidatorClass::Disabled {
            return Err(WardenError::ValidatorNotFound);
        }
        if current == class {
            return Ok(());
        }
        self.guard_last_sudo(&ctx.wallet, &id)?;
        self.classes.insert((ctx.wallet, id), class);
        let counts = self.counts.entry(ctx.wallet).or_default();
        counts.sub(current);
        counts.add(class);
        tracing::debug!(wallet = %ctx.wallet, validator = %id, from = ?current, to = ?class, "validator reclassified");
        Ok(())
    }

    pub fn is_enabled(&self, wallet: &Address, id: &Address) -> bool {
        self.plugins.is_enabled(wallet, id)
    }

    pub fn list(&self, wallet: &Address, from: Address, limit: usize) -> Result<Page, WardenError> {
        self.plugins.list(wallet, from, limit)
    }

    pub fn enabled_ids(&self, wallet: &Address) -> Vec<Address> {
        self.plugins.enabled_ids(wallet)
    }
}

impl SudoSignerLookup for ValidatorRegistry {
    /// Signer of the most recently enabled Sudo validator that has one.
    fn sudo_signer(&self, wallet: &Address) -> Option<Address> {
        self.enabled_ids(wallet)
            .into_iter()
            .filter(|id| self.class_of(wallet, id) == ValidatorClass::Sudo)
            .find_map(|id| self.validator(&id).and_then(|v| v.signer_of(wallet)))
    }
}
