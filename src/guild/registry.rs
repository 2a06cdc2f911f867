//! Adventure registry: per-player pending rewards and the settle-then-start state machine.
//!
//! Per player key the registry is either *idle* (no pending reward) or *pending*
//! (a reward recorded with an unlock time). Readiness is not stored; it is the
//! comparison `unlock_time <= now`.
//!
//! Every operation runs under one registry mutex from its first check to its
//! last write, including the settlement nested inside [`TaskRegistry::start_task`].
//! All fallible checks run before the first effect, and notifications are only
//! appended once the state change is in place, so a rejected call leaves nothing
//! behind.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use crate::guild::accumulator::RewardAccumulator;
use crate::guild::clock::Clock;
use crate::guild::draw::{DrawSeed, RewardDraw};
use crate::guild::errors::GuildError;
use crate::guild::events::{EventLog, LoggedEvent, RegistryEvent};
use crate::guild::policy::TaskPolicy;
use crate::guild::types::{ModuleKind, PendingReward};
use crate::identity::{Address, Player, PlayerIdentity, PlayerKey};
use crate::logutil::{short_address, single_line};
use crate::metrics;

#[derive(Default)]
struct RegistryState {
    pending: HashMap<PlayerKey, PendingReward>,
    policies: BTreeMap<Address, Arc<dyn TaskPolicy>>,
    accumulators: BTreeMap<Address, Arc<dyn RewardAccumulator>>,
    levelable: BTreeSet<Address>,
    events: EventLog,
}

/// Result of a successful collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub accumulator: Address,
    pub amount: u64,
}

pub struct TaskRegistry {
    address: Address,
    operator: Address,
    identity: PlayerIdentity,
    clock: Arc<dyn Clock>,
    draw: Box<dyn RewardDraw>,
    state: Mutex<RegistryState>,
}

impl TaskRegistry {
    /// `address` is the registry's own identity: accumulators must be bound to it.
    pub fn new(
        address: Address,
        operator: Address,
        identity: PlayerIdentity,
        clock: Arc<dyn Clock>,
        draw: Box<dyn RewardDraw>,
    ) -> Self {
        Self {
            address,
            operator,
            identity,
            clock,
            draw,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    pub fn identity(&self) -> &PlayerIdentity {
        &self.identity
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>, GuildError> {
        self.state.lock().map_err(|_| GuildError::poisoned("registry"))
    }

    fn require_operator(&self, caller: Address, action: &str) -> Result<(), GuildError> {
        if caller == self.operator {
            Ok(())
        } else {
            warn!(target: "security", "{} attempted {} without operator rights", caller, action);
            Err(GuildError::Unauthorized(format!("{} requires the operator", action)))
        }
    }

    // ------------------------------------------------------------------
    // Administrative surface
    // ------------------------------------------------------------------

    /// Approve an adventure policy. Returns false if it was already approved.
    pub fn register_policy(
        &self,
        caller: Address,
        policy: Arc<dyn TaskPolicy>,
    ) -> Result<bool, GuildError> {
        self.require_operator(caller, "register_policy")?;
        let address = policy.address();
        if address.is_zero() {
            return Err(GuildError::NotAModule(address));
        }
        let mut state = self.lock()?;
        if state.policies.contains_key(&address) {
            return Ok(false);
        }
        info!(
            "policy approved: {} ({})",
            single_line(&policy.display_name()),
            address
        );
        state.policies.insert(address, policy);
        Ok(true)
    }

    pub fn unregister_policy(&self, caller: Address, address: Address) -> Result<bool, GuildError> {
        self.require_operator(caller, "unregister_policy")?;
        let removed = self.lock()?.policies.remove(&address).is_some();
        if removed {
            info!("policy withdrawn: {}", address);
        }
        Ok(removed)
    }

    pub fn register_accumulator(
        &self,
        caller: Address,
        accumulator: Arc<dyn RewardAccumulator>,
    ) -> Result<bool, GuildError> {
        self.require_operator(caller, "register_accumulator")?;
        let address = accumulator.address();
        if address.is_zero() {
            return Err(GuildError::NotAModule(address));
        }
        let mut state = self.lock()?;
        if state.accumulators.contains_key(&address) {
            return Ok(false);
        }
        info!(
            "accumulator approved: {} ({})",
            single_line(&accumulator.display_name()),
            address
        );
        state.accumulators.insert(address, accumulator);
        Ok(true)
    }

    pub fn unregister_accumulator(
        &self,
        caller: Address,
        address: Address,
    ) -> Result<bool, GuildError> {
        self.require_operator(caller, "unregister_accumulator")?;
        let removed = self.lock()?.accumulators.remove(&address).is_some();
        if removed {
            info!("accumulator withdrawn: {}", address);
        }
        Ok(removed)
    }

    /// Mark an asset class as eligible for progression. The address must be a deployed asset contract.
    pub fn register_levelable(&self, caller: Address, contract: Address) -> Result<bool, GuildError> {
        self.require_operator(caller, "register_levelable")?;
        if !self.identity.is_asset_contract(contract) {
            return Err(GuildError::NotAContract(contract));
        }
        let added = self.lock()?.levelable.insert(contract);
        if added {
            info!("asset class levelable: {}", contract);
        }
        Ok(added)
    }

    pub fn unregister_levelable(
        &self,
        caller: Address,
        contract: Address,
    ) -> Result<bool, GuildError> {
        self.require_operator(caller, "unregister_levelable")?;
        let removed = self.lock()?.levelable.remove(&contract);
        if removed {
            info!("asset class no longer levelable: {}", contract);
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn registered_policies(&self) -> Result<Vec<Address>, GuildError> {
        Ok(self.lock()?.policies.keys().copied().collect())
    }

    pub fn policy(&self, address: Address) -> Result<Option<Arc<dyn TaskPolicy>>, GuildError> {
        Ok(self.lock()?.policies.get(&address).cloned())
    }

    pub fn registered_accumulators(&self) -> Result<Vec<Address>, GuildError> {
        Ok(self.lock()?.accumulators.keys().copied().collect())
    }

    pub fn levelable_contracts(&self) -> Result<Vec<Address>, GuildError> {
        Ok(self.lock()?.levelable.iter().copied().collect())
    }

    pub fn is_levelable(&self, contract: Address) -> Result<bool, GuildError> {
        Ok(self.lock()?.levelable.contains(&contract))
    }

    pub fn has_pending(&self, player: &Player) -> Result<bool, GuildError> {
        Ok(self.lock()?.pending.contains_key(&player.compact_key()))
    }

    /// Whether the pending reward's unlock time has passed. With nothing pending the
    /// unlock time reads as the epoch, so this is `true`; check [`Self::has_pending`] too.
    pub fn is_ready(&self, player: &Player) -> Result<bool, GuildError> {
        let now = self.clock.now();
        Ok(self
            .lock()?
            .pending
            .get(&player.compact_key())
            .map_or(true, |pending| pending.is_ready(now)))
    }

    pub fn pending_reward(&self, player: &Player) -> Result<Option<PendingReward>, GuildError> {
        Ok(self.lock()?.pending.get(&player.compact_key()).cloned())
    }

    /// Time left before collection is allowed; `None` when nothing is pending.
    pub fn time_until_ready(&self, player: &Player) -> Result<Option<Duration>, GuildError> {
        let now = self.clock.now();
        Ok(self
            .lock()?
            .pending
            .get(&player.compact_key())
            .map(|pending| pending.remaining(now)))
    }

    pub fn events_since(&self, sequence: u64) -> Result<Vec<LoggedEvent>, GuildError> {
        Ok(self.lock()?.events.since(sequence))
    }

    pub fn event_head(&self) -> Result<[u8; 32], GuildError> {
        Ok(self.lock()?.events.head())
    }

    // ------------------------------------------------------------------
    // Player surface
    // ------------------------------------------------------------------

    /// Settle `player`'s ready reward into its accumulator. Anyone may call this for any player.
    pub fn collect_pending_reward(
        &self,
        caller: Address,
        player: &Player,
    ) -> Result<Settlement, GuildError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let result = self.collect_locked(&mut state, now, caller, player, false);
        if let Err(ref e) = result {
            metrics::record_rejection(e.kind());
            debug!(
                "collect for {} by {} rejected: {}",
                player.compact_key(),
                short_address(&caller),
                single_line(&e.to_string())
            );
        }
        result
    }

    /// Enroll `player` in the adventure run by `policy`, settling a ready reward first.
    ///
    /// The policy's [`TaskPolicy::build_reward`] draft is taken and validated before
    /// that settlement, so a policy sees the player's pre-settlement balance.
    pub fn start_task(
        &self,
        caller: Address,
        player: &Player,
        policy: Address,
    ) -> Result<PendingReward, GuildError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let result = self.start_locked(&mut state, now, caller, player, policy);
        if let Err(ref e) = result {
            metrics::record_rejection(e.kind());
            warn!(
                "start_task for {} via {} rejected: {}",
                player.compact_key(),
                short_address(&policy),
                single_line(&e.to_string())
            );
        }
        result
    }

    fn start_locked(
        &self,
        state: &mut RegistryState,
        now: DateTime<Utc>,
        caller: Address,
        player: &Player,
        policy_address: Address,
    ) -> Result<PendingReward, GuildError> {
        let policy = state
            .policies
            .get(&policy_address)
            .cloned()
            .ok_or(GuildError::NotApproved {
                kind: ModuleKind::Policy,
                address: policy_address,
            })?;

        let entry = policy.check_entry(player);
        if !entry.allowed {
            return Err(GuildError::EntryDenied(entry.reason));
        }

        if !self.identity.is_valid(player) {
            return Err(GuildError::InvalidPlayer);
        }

        let owner = self.identity.resolve_owner(player);
        if owner != Some(caller) {
            return Err(GuildError::NotOwner { caller, owner });
        }

        let key = player.compact_key();
        if let Some(contract) = key.asset_contract() {
            if !state.levelable.contains(&contract) {
                return Err(GuildError::NotApproved {
                    kind: ModuleKind::AssetClass,
                    address: contract,
                });
            }
        }

        let draft = policy.build_reward(player);
        if draft.min_amount > draft.max_amount {
            return Err(GuildError::InvalidRewardBounds {
                min: draft.min_amount,
                max: draft.max_amount,
            });
        }
        let duration = policy.expected_duration();
        if draft.duration != duration {
            return Err(GuildError::InvalidDuration(format!(
                "draft runs {} but the policy expects {}",
                draft.duration, duration
            )));
        }
        let unlock_time = now.checked_add_signed(duration).ok_or_else(|| {
            GuildError::InvalidDuration(format!("{} from {} overflows", duration, now))
        })?;
        if !state.accumulators.contains_key(&draft.accumulator) {
            return Err(GuildError::NotApproved {
                kind: ModuleKind::Accumulator,
                address: draft.accumulator,
            });
        }

        let existing = state
            .pending
            .get(&key)
            .map(|pending| (pending.is_ready(now), pending.unlock_time));
        match existing {
            Some((false, unlock_time)) => {
                return Err(GuildError::AlreadyPending { unlock_time });
            }
            Some((true, _)) => {
                self.collect_locked(state, now, caller, player, true)?;
                metrics::inc_implicit_settlements();
            }
            None => {}
        }

        if state.pending.contains_key(&key) {
            return Err(GuildError::InvariantViolation(format!(
                "{} still pending after settlement",
                key
            )));
        }

        let pending = PendingReward {
            unlock_time,
            accumulator: draft.accumulator,
            min_amount: draft.min_amount,
            max_amount: draft.max_amount,
        };
        state.pending.insert(key, pending.clone());
        state.events.append(
            now,
            RegistryEvent::TaskStarted {
                starter: caller,
                player: player.clone(),
                policy: policy_address,
                pending: pending.clone(),
            },
        );
        metrics::inc_tasks_started();
        Ok(pending)
    }

    fn collect_locked(
        &self,
        state: &mut RegistryState,
        now: DateTime<Utc>,
        caller: Address,
        player: &Player,
        implicit: bool,
    ) -> Result<Settlement, GuildError> {
        let key = player.compact_key();
        let pending = state
            .pending
            .get(&key)
            .cloned()
            .ok_or(GuildError::NoPendingReward)?;
        if !pending.is_ready(now) {
            return Err(GuildError::NotReady {
                unlock_time: pending.unlock_time,
            });
        }
        let accumulator = state
            .accumulators
            .get(&pending.accumulator)
            .cloned()
            .ok_or(GuildError::NotApproved {
                kind: ModuleKind::Accumulator,
                address: pending.accumulator,
            })?;

        let seed = DrawSeed {
            now,
            caller,
            previous_head: state.events.head(),
        };
        let amount = self
            .draw
            .draw(&seed, pending.min_amount, pending.max_amount);

        accumulator.accrue(self.address, &key, amount)?;
        state.pending.remove(&key);
        state.events.append(
            now,
            RegistryEvent::RewardCollected {
                collector: caller,
                player: player.clone(),
                accumulator: pending.accumulator,
                amount,
                implicit,
            },
        );
        metrics::record_settlement(amount);
        Ok(Settlement {
            accumulator: pending.accumulator,
            amount,
        })
    }
}
