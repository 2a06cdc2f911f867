//! Reward amount draws.
//!
//! [`BlockSeededDraw`] is the default. Its seed is built from values a caller can
//! observe and partly influence: the current time, the caller identity and the
//! head of the notification hash chain. It is **not** cryptographically secure.
//! A caller who can pick when to collect inside the unlock window, or who can
//! shape the preceding notifications, has some influence over the result.
//!
//! [`ThreadRngDraw`] replaces that with the thread-local CSPRNG. Switching to it
//! changes the trust model and has to be chosen explicitly in configuration.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identity::Address;

/// Inputs available to a draw at collection time.
#[derive(Debug, Clone, Copy)]
pub struct DrawSeed {
    pub now: DateTime<Utc>,
    pub caller: Address,
    pub previous_head: [u8; 32],
}

pub trait RewardDraw: Send + Sync {
    /// Pick an amount in `min..=max`. Callers guarantee `min <= max`.
    fn draw(&self, seed: &DrawSeed, min: u64, max: u64) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BlockSeededDraw;

impl BlockSeededDraw {
    fn seed_word(seed: &DrawSeed) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(seed.now.timestamp().to_be_bytes());
        hasher.update(seed.caller.as_bytes());
        hasher.update(seed.previous_head);
        let digest = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(word)
    }
}

impl RewardDraw for BlockSeededDraw {
    fn draw(&self, seed: &DrawSeed, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        let word = Self::seed_word(seed);
        match (max - min).checked_add(1) {
            Some(span) => min + word % span,
            // Full u64 range.
            None => word,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngDraw;

impl RewardDraw for ThreadRngDraw {
    fn draw(&self, _seed: &DrawSeed, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Draw source selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawMode {
    #[default]
    BlockSeeded,
    ThreadRng,
}

impl DrawMode {
    pub fn build(self) -> Box<dyn RewardDraw> {
        match self {
            DrawMode::BlockSeeded => Box::new(BlockSeededDraw),
            DrawMode::ThreadRng => Box::new(ThreadRngDraw),
        }
    }
}
