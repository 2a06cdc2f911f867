//! Adventure core: policies, reward accumulators and the registry that ties them together.
//!
//! A player holds at most one pending reward at a time. Starting an adventure
//! records one; collecting it (explicitly, or implicitly by starting the next
//! adventure) settles it into an accumulator such as [`Experience`].

pub mod accumulator;
pub mod clock;
pub mod draw;
pub mod errors;
pub mod events;
pub mod experience;
pub mod leveling;
pub mod policy;
pub mod registry;
pub mod types;

pub use accumulator::RewardAccumulator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use draw::{BlockSeededDraw, DrawMode, DrawSeed, RewardDraw, ThreadRngDraw};
pub use errors::GuildError;
pub use events::{EventLog, LoggedEvent, RegistryEvent};
pub use experience::Experience;
pub use leveling::{level_floor, level_for_experience, LEVEL_THRESHOLDS, MAX_LEVEL};
pub use policy::{LevelGatedPolicy, OpenEntryPolicy, RewardTerms, TaskPolicy};
pub use registry::{Settlement, TaskRegistry};
pub use types::{EntryCheck, ModuleKind, PendingReward, RewardDraft};
