use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::guild::types::ModuleKind;
use crate::identity::Address;

/// Errors that can arise while enrolling players in adventures or settling their rewards.
///
/// Every variant is a synchronous rejection: the operation that returned it left no
/// partial state behind.
#[derive(Debug, Error)]
pub enum GuildError {
    /// Policy, accumulator or asset class is not on the registry's allow-list.
    #[error("{kind} not approved: {address}")]
    NotApproved { kind: ModuleKind, address: Address },

    /// The adventure policy refused entry; carries the policy's own reason.
    #[error("entry denied: {0}")]
    EntryDenied(String),

    /// Claimed owner does not currently hold the backing asset.
    #[error("invalid player: ownership check failed")]
    InvalidPlayer,

    /// Caller is not the resolved owner of the player.
    #[error("caller {caller} is not the owner of this player")]
    NotOwner {
        caller: Address,
        owner: Option<Address>,
    },

    /// A reward is pending and its unlock time has not passed yet.
    #[error("adventure already in progress until {unlock_time}")]
    AlreadyPending { unlock_time: DateTime<Utc> },

    #[error("no pending reward")]
    NoPendingReward,

    #[error("reward not yet ready (unlocks at {unlock_time})")]
    NotReady { unlock_time: DateTime<Utc> },

    /// Caller lacks the capability the operation requires (operator, bound registry).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Admin mutation targeted an address that is not a module.
    #[error("not a module: {0}")]
    NotAModule(Address),

    /// Levelable registration targeted an address that is not a deployed asset class.
    #[error("not an asset contract: {0}")]
    NotAContract(Address),

    /// Accumulator binding is one-shot.
    #[error("accumulator already bound to registry {0}")]
    AlreadyBound(Address),

    #[error("invalid reward bounds: min {min} > max {max}")]
    InvalidRewardBounds { min: u64, max: u64 },

    /// The policy's duration cannot produce an unlock time, or its draft disagrees with it.
    #[error("invalid adventure duration: {0}")]
    InvalidDuration(String),

    /// Post-settlement state check failed. Unreachable unless the registry is corrupted.
    #[error("registry invariant violated: {0}")]
    InvariantViolation(String),

    /// Internal error (poisoned locks, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

impl GuildError {
    /// Stable short label used for metrics and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            GuildError::NotApproved { .. } => "not_approved",
            GuildError::EntryDenied(_) => "entry_denied",
            GuildError::InvalidPlayer => "invalid_player",
            GuildError::NotOwner { .. } => "not_owner",
            GuildError::AlreadyPending { .. } => "already_pending",
            GuildError::NoPendingReward => "no_pending_reward",
            GuildError::NotReady { .. } => "not_ready",
            GuildError::Unauthorized(_) => "unauthorized",
            GuildError::NotAModule(_) => "not_a_module",
            GuildError::NotAContract(_) => "not_a_contract",
            GuildError::AlreadyBound(_) => "already_bound",
            GuildError::InvalidRewardBounds { .. } => "invalid_reward_bounds",
            GuildError::InvalidDuration(_) => "invalid_duration",
            GuildError::InvariantViolation(_) => "invariant_violation",
            GuildError::Internal(_) => "internal",
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        GuildError::Internal(format!("{} lock poisoned", what))
    }
}
