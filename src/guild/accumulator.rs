use crate::guild::errors::GuildError;
use crate::identity::{Address, PlayerKey};

/// A module that receives settled reward amounts and keeps a running balance per player.
///
/// The registry resolves accumulators by [`RewardAccumulator::address`]. Implementations
/// must reject `accrue` calls from anyone but the registry they were bound to.
pub trait RewardAccumulator: Send + Sync {
    fn address(&self) -> Address;

    fn display_name(&self) -> String;

    /// Add `amount` to `player`'s balance on behalf of `caller`.
    fn accrue(&self, caller: Address, player: &PlayerKey, amount: u64) -> Result<(), GuildError>;

    fn balance_of(&self, player: &PlayerKey) -> u64;
}
