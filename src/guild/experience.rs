//! Experience: the reference reward accumulator.
//!
//! Balances only ever grow, and only through the registry this module was bound
//! to. Binding is a one-time operator action; rebinding means building a new module.
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use log::{debug, info, warn};

use crate::guild::accumulator::RewardAccumulator;
use crate::guild::errors::GuildError;
use crate::guild::leveling::level_for_experience;
use crate::identity::{Address, PlayerKey};

pub struct Experience {
    address: Address,
    name: String,
    operator: Address,
    bound_registry: OnceLock<Address>,
    balances: RwLock<HashMap<PlayerKey, u64>>,
}

impl Experience {
    pub fn new(address: Address, name: impl Into<String>, operator: Address) -> Self {
        Self {
            address,
            name: name.into(),
            operator,
            bound_registry: OnceLock::new(),
            balances: RwLock::new(HashMap::new()),
        }
    }

    /// Authorize `registry` as the only caller allowed to accrue. Operator-only, one shot.
    pub fn bind_registry(&self, caller: Address, registry: Address) -> Result<(), GuildError> {
        if caller != self.operator {
            return Err(GuildError::Unauthorized(format!(
                "{} may not bind {}",
                caller, self.name
            )));
        }
        if registry.is_zero() {
            return Err(GuildError::NotAModule(registry));
        }
        self.bound_registry
            .set(registry)
            .map_err(|_| GuildError::AlreadyBound(self.bound_registry().unwrap_or(registry)))?;
        info!("{} bound to registry {}", self.name, registry);
        Ok(())
    }

    pub fn bound_registry(&self) -> Option<Address> {
        self.bound_registry.get().copied()
    }

    pub fn level_of(&self, player: &PlayerKey) -> u8 {
        level_for_experience(self.balance_of(player))
    }
}

impl RewardAccumulator for Experience {
    fn address(&self) -> Address {
        self.address
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn accrue(&self, caller: Address, player: &PlayerKey, amount: u64) -> Result<(), GuildError> {
        match self.bound_registry() {
            Some(registry) if registry == caller => {}
            _ => {
                return Err(GuildError::Unauthorized(format!(
                    "{} is not the registry bound to {}",
                    caller, self.name
                )))
            }
        }
        let mut balances = self
            .balances
            .write()
            .map_err(|_| GuildError::poisoned("experience"))?;
        let balance = balances.entry(*player).or_insert(0);
        *balance = balance.saturating_add(amount);
        debug!("{}: {} +{} => {}", self.name, player, amount, *balance);
        Ok(())
    }

    fn balance_of(&self, player: &PlayerKey) -> u64 {
        match self.balances.read() {
            Ok(balances) => balances.get(player).copied().unwrap_or(0),
            Err(poisoned) => {
                warn!("{} balance lock poisoned; reading last written state", self.name);
                poisoned.into_inner().get(player).copied().unwrap_or(0)
            }
        }
    }
}
