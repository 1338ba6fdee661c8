//! Ownership, provider authorization, and the pause switch.

use std::collections::BTreeSet;

use cvcp_core::error::RegistryError;
use cvcp_core::types::Address;

/// Owner plus the set of authorized data providers.
///
/// The owner is implicitly authorized and cannot be revoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    owner: Address,
    providers: BTreeSet<Address>,
}

impl AccessControl {
    /// Owner starts as the only authorized identity.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidInput`] if `owner` is the null address.
    pub fn new(owner: Address) -> Result<Self, RegistryError> {
        if owner.is_zero() {
            return Err(RegistryError::InvalidInput("owner must not be null".into()));
        }
        let mut providers = BTreeSet::new();
        providers.insert(owner);
        Ok(Self { owner, providers })
    }

    /// Rebuild from persisted parts. The owner is re-added to the provider set.
    pub(crate) fn from_parts(owner: Address, mut providers: BTreeSet<Address>) -> Self {
        providers.insert(owner);
        Self { owner, providers }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_authorized(&self, who: &Address) -> bool {
        *who == self.owner || self.providers.contains(who)
    }

    pub fn providers(&self) -> &BTreeSet<Address> {
        &self.providers
    }

    pub fn require_owner(&self, caller: &Address) -> Result<(), RegistryError> {
        if *caller != self.owner {
            return Err(RegistryError::Unauthorized(*caller));
        }
        Ok(())
    }

    pub fn require_authorized(&self, caller: &Address) -> Result<(), RegistryError> {
        if !self.is_authorized(caller) {
            return Err(RegistryError::Unauthorized(*caller));
        }
        Ok(())
    }

    /// Add a provider. Returns `false` if it was already authorized.
    pub fn authorize(&mut self, provider: Address) -> Result<bool, RegistryError> {
        if provider.is_zero() {
            return Err(RegistryError::InvalidInput("provider must not be null".into()));
        }
        Ok(self.providers.insert(provider))
    }

    /// Remove a provider. Returns `false` if it was not authorized.
    pub fn revoke(&mut self, provider: &Address) -> Result<bool, RegistryError> {
        if *provider == self.owner {
            return Err(RegistryError::InvalidInput("cannot revoke the owner".into()));
        }
        Ok(self.providers.remove(provider))
    }

    /// Hand ownership to `new_owner`, who becomes authorized. The previous
    /// owner stays an authorized provider. Returns the previous owner.
    pub fn transfer(&mut self, new_owner: Address) -> Result<Address, RegistryError> {
        if new_owner.is_zero() {
            return Err(RegistryError::InvalidInput("new owner must not be null".into()));
        }
        let previous = self.owner;
        self.owner = new_owner;
        self.providers.insert(new_owner);
        Ok(previous)
    }
}

/// Emergency stop for every mutating entry point except `unpause`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    pub fn new(paused: bool) -> Self {
        Self { paused }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn require_not_paused(&self) -> Result<(), RegistryError> {
        if self.paused {
            return Err(RegistryError::OperationPaused);
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), RegistryError> {
        self.require_not_paused()?;
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<(), RegistryError> {
        if !self.paused {
            return Err(RegistryError::InvalidInput("registry is not paused".into()));
        }
        self.paused = false;
        Ok(())
    }
}
