//! # Guildhall - Adventure Registry
//!
//! Guildhall tracks which adventure each player is currently on and settles the
//! rewards those adventures pay out. A player may be enrolled in exactly one
//! timed adventure at a time; once its unlock time passes, anyone may collect
//! the reward, and starting the next adventure settles a ready reward
//! automatically.
//!
//! ## Features
//!
//! - **Single active adventure**: the registry refuses a new enrollment while a
//!   reward is still locked, and settles a ready one before recording the next.
//! - **Pluggable policies**: adventures decide entry rules, duration and reward
//!   bounds behind the [`guild::TaskPolicy`] trait. Open-entry and level-gated
//!   variants ship with the crate.
//! - **Pluggable accumulators**: settled amounts go to a
//!   [`guild::RewardAccumulator`]; [`guild::Experience`] is the reference one,
//!   with a fixed 20-level tier table.
//! - **Synthetic and asset-backed players**: ownership of asset-backed players
//!   is re-checked against an [`identity::AssetAuthority`] on every enrollment.
//! - **Append-only notifications**: every start and settlement lands in a
//!   hash-chained event log for external indexers.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use guildhall::config::Config;
//! use guildhall::guild::{ManualClock, RewardAccumulator};
//! use guildhall::hall::Guildhall;
//! use guildhall::identity::{Address, InMemoryAssetAuthority, Player};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let clock = ManualClock::new(Utc::now());
//! let hall = Guildhall::from_config(
//!     &config,
//!     Arc::new(InMemoryAssetAuthority::new()),
//!     Arc::new(clock.clone()),
//! )?;
//!
//! let owner = Address::from_low_u64(42);
//! let player = Player::synthetic(owner);
//! let sewer = hall.policy_address("Sewer Sweep").expect("configured");
//!
//! hall.registry.start_task(owner, &player, sewer)?;
//! clock.advance(Duration::minutes(20));
//! let settled = hall.registry.collect_pending_reward(owner, &player)?;
//! assert_eq!(hall.experience.balance_of(&player.compact_key()), settled.amount);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`guild`] - registry, policies, accumulators, reward draw and notifications
//! - [`identity`] - addresses, players, compact keys and ownership queries
//! - [`hall`] - assembles a registry from configuration
//! - [`config`] - configuration loading and validation
//! - [`metrics`] - process-wide counters
//! - [`logutil`] - single-line log helpers

pub mod config;
pub mod guild;
pub mod hall;
pub mod identity;
pub mod logutil;
pub mod metrics;
