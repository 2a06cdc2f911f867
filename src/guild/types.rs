//! Plain data shared by the registry, its policies and accumulators.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Address;

/// The three allow-lists the registry keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Policy,
    Accumulator,
    AssetClass,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModuleKind::Policy => "adventure policy",
            ModuleKind::Accumulator => "reward accumulator",
            ModuleKind::AssetClass => "asset class",
        };
        f.write_str(label)
    }
}

/// One outstanding, uncollected reward. At most one exists per player key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReward {
    /// Collection is permitted at or after this instant.
    pub unlock_time: DateTime<Utc>,
    pub accumulator: Address,
    pub min_amount: u64,
    pub max_amount: u64,
}

impl PendingReward {
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.unlock_time <= now
    }

    /// Time left until unlock, zero once ready.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.is_ready(now) {
            Duration::zero()
        } else {
            self.unlock_time - now
        }
    }
}

/// Reward terms a policy proposes for a player. The registry turns the
/// relative `duration` into an absolute unlock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardDraft {
    pub duration: Duration,
    pub accumulator: Address,
    pub min_amount: u64,
    pub max_amount: u64,
}

/// Outcome of a policy's admission rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCheck {
    pub allowed: bool,
    pub reason: String,
}

impl EntryCheck {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_is_inclusive_of_unlock_instant() {
        let now = Utc::now();
        let pending = PendingReward {
            unlock_time: now,
            accumulator: Address::from_low_u64(1),
            min_amount: 1,
            max_amount: 2,
        };
        assert!(pending.is_ready(now));
        assert!(!pending.is_ready(now - Duration::seconds(1)));
        assert_eq!(pending.remaining(now - Duration::seconds(90)), Duration::seconds(90));
        assert_eq!(pending.remaining(now + Duration::seconds(5)), Duration::zero());
    }
}
