//! Adventure policies: pluggable modules deciding who may enter an adventure,
//! how long it runs and what it pays out.
//!
//! Two variants ship with the crate:
//!
//! - [`OpenEntryPolicy`] admits everyone.
//! - [`LevelGatedPolicy`] admits players whose experience level is strictly
//!   above a threshold.

use std::sync::Arc;

use chrono::Duration;

use crate::guild::accumulator::RewardAccumulator;
use crate::guild::experience::Experience;
use crate::guild::types::{EntryCheck, RewardDraft};
use crate::identity::{Address, Player};

pub trait TaskPolicy: Send + Sync {
    /// Registry handle for this policy.
    fn address(&self) -> Address;

    fn display_name(&self) -> String;

    fn check_entry(&self, player: &Player) -> EntryCheck;

    fn expected_duration(&self) -> Duration;

    fn build_reward(&self, player: &Player) -> RewardDraft;
}

/// Fixed duration, target accumulator and amount bounds shared by the reference policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTerms {
    pub duration: Duration,
    pub accumulator: Address,
    pub min_amount: u64,
    pub max_amount: u64,
}

impl RewardTerms {
    pub fn new(duration: Duration, accumulator: Address, min_amount: u64, max_amount: u64) -> Self {
        Self {
            duration,
            accumulator,
            min_amount,
            max_amount,
        }
    }

    fn draft(&self) -> RewardDraft {
        RewardDraft {
            duration: self.duration,
            accumulator: self.accumulator,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        }
    }
}

pub struct OpenEntryPolicy {
    address: Address,
    name: String,
    terms: RewardTerms,
}

impl OpenEntryPolicy {
    pub fn new(address: Address, name: impl Into<String>, terms: RewardTerms) -> Self {
        Self {
            address,
            name: name.into(),
            terms,
        }
    }

    /// No requirements; 20 minutes; 100..=200 into `accumulator`.
    pub fn reference(address: Address, accumulator: Address) -> Self {
        Self::new(
            address,
            "Sewer Sweep",
            RewardTerms::new(Duration::minutes(20), accumulator, 100, 200),
        )
    }
}

impl TaskPolicy for OpenEntryPolicy {
    fn address(&self) -> Address {
        self.address
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn check_entry(&self, _player: &Player) -> EntryCheck {
        EntryCheck::allow()
    }

    fn expected_duration(&self) -> Duration {
        self.terms.duration
    }

    fn build_reward(&self, _player: &Player) -> RewardDraft {
        self.terms.draft()
    }
}

/// Admits a player only when their level in `experience` is strictly greater than `level_above`.
pub struct LevelGatedPolicy {
    address: Address,
    name: String,
    terms: RewardTerms,
    experience: Arc<Experience>,
    level_above: u8,
}

impl LevelGatedPolicy {
    pub fn new(
        address: Address,
        name: impl Into<String>,
        terms: RewardTerms,
        experience: Arc<Experience>,
        level_above: u8,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            terms,
            experience,
            level_above,
        }
    }

    /// Level 3 or higher; 30 minutes; 150..=400 experience.
    pub fn reference(address: Address, experience: Arc<Experience>) -> Self {
        let accumulator = experience.address();
        Self::new(
            address,
            "Crypt Delve",
            RewardTerms::new(Duration::minutes(30), accumulator, 150, 400),
            experience,
            2,
        )
    }

    pub fn level_above(&self) -> u8 {
        self.level_above
    }
}

impl TaskPolicy for LevelGatedPolicy {
    fn address(&self) -> Address {
        self.address
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn check_entry(&self, player: &Player) -> EntryCheck {
        let level = self.experience.level_of(&player.compact_key());
        if level > self.level_above {
            EntryCheck::allow()
        } else {
            EntryCheck::deny(format!(
                "requires level {} (current level {})",
                self.level_above.saturating_add(1),
                level
            ))
        }
    }

    fn expected_duration(&self) -> Duration {
        self.terms.duration
    }

    fn build_reward(&self, _player: &Player) -> RewardDraft {
        self.terms.draft()
    }
}
