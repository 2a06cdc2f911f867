//! Append-only notification log consumed by external indexers.
//!
//! Each entry is chained to the previous one with SHA-256, so the current
//! [`EventLog::head`] commits to the full history. The head also seeds the
//! weak reward draw, standing in for a previous block hash.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::guild::types::PendingReward;
use crate::identity::{Address, Player};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    TaskStarted {
        starter: Address,
        player: Player,
        policy: Address,
        pending: PendingReward,
    },
    RewardCollected {
        collector: Address,
        player: Player,
        accumulator: Address,
        amount: u64,
        /// True when the settlement happened inside a new `start_task`.
        implicit: bool,
    },
}

impl RegistryEvent {
    /// One-line rendering for log output.
    pub fn summary(&self) -> String {
        match self {
            RegistryEvent::TaskStarted {
                starter,
                player,
                policy,
                pending,
            } => format!(
                "TaskStarted starter={} player={} policy={} unlock={} bounds={}..={}",
                starter,
                player.compact_key(),
                policy,
                pending.unlock_time.to_rfc3339(),
                pending.min_amount,
                pending.max_amount
            ),
            RegistryEvent::RewardCollected {
                collector,
                player,
                accumulator,
                amount,
                implicit,
            } => format!(
                "RewardCollected collector={} player={} accumulator={} amount={} implicit={}",
                collector,
                player.compact_key(),
                accumulator,
                amount,
                implicit
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub sequence: u64,
    pub at: DateTime<Utc>,
    pub event: RegistryEvent,
    #[serde(with = "hex_digest")]
    pub digest: [u8; 32],
}

#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LoggedEvent>,
    head: [u8; 32],
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest of the newest entry; all zeroes while the log is empty.
    pub fn head(&self) -> [u8; 32] {
        self.head
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, at: DateTime<Utc>, event: RegistryEvent) -> &LoggedEvent {
        let sequence = self.entries.len() as u64;
        let digest = Self::chain(&self.head, sequence, &event);
        info!("event #{} {}", sequence, event.summary());
        self.head = digest;
        self.entries.push(LoggedEvent {
            sequence,
            at,
            event,
            digest,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Entries with `sequence >= from`, oldest first.
    pub fn since(&self, from: u64) -> Vec<LoggedEvent> {
        self.entries
            .iter()
            .skip(usize::try_from(from).unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Recompute the chain from genesis and compare it with the stored digests.
    pub fn verify(&self) -> bool {
        let mut head = [0u8; 32];
        for entry in &self.entries {
            let expected = Self::chain(&head, entry.sequence, &entry.event);
            if expected != entry.digest {
                return false;
            }
            head = expected;
        }
        head == self.head
    }

    fn chain(previous: &[u8; 32], sequence: u64, event: &RegistryEvent) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(previous);
        // Fall back to the summary if serialization ever fails.
        match serde_json::to_vec(event) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => hasher.update(event.summary().as_bytes()),
        }
        hasher.update(sequence.to_be_bytes());
        hasher.finalize().into()
    }
}

mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = hex::decode(&raw).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("digest must be 32 bytes"))
    }
}
