//! # Configuration Management Module
//!
//! Loads and validates the TOML file describing one guildhall: the registry's
//! own identity and operator, the experience module, the adventure catalog and
//! which asset classes may level up.
//!
//! ## Configuration Structure
//!
//! - [`RegistryConfig`] - registry identity, operator and reward draw source
//! - [`ExperienceConfig`] - the experience accumulator module
//! - [`PolicyConfig`] - one entry per adventure policy
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use guildhall::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("Operator: {}", config.registry.operator);
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! levelable_contracts = []
//!
//! [registry]
//! address = "0x00000000000000000000000000000000000a0001"
//! operator = "0x00000000000000000000000000000000000a0002"
//! reward_draw = "block-seeded"
//!
//! [experience]
//! address = "0x00000000000000000000000000000000000e0001"
//! name = "Experience"
//!
//! [[policies]]
//! name = "Sewer Sweep"
//! address = "0x00000000000000000000000000000000000b0001"
//! duration_minutes = 20
//! min_reward = 100
//! max_reward = 200
//!
//! [logging]
//! level = "info"
//! ```
//!
//! `reward_draw = "thread-rng"` swaps the default time/caller/log-head seeded
//! draw for the thread-local CSPRNG. That is a trust-model change, not a tweak.

use std::collections::HashSet;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::guild::draw::DrawMode;
use crate::identity::Address;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Asset classes whose players may enroll. Synthetic players never need one.
    #[serde(default)]
    pub levelable_contracts: Vec<Address>,
    pub registry: RegistryConfig,
    pub experience: ExperienceConfig,
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub address: Address,
    pub operator: Address,
    #[serde(default)]
    pub reward_draw: DrawMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceConfig {
    pub address: Address,
    #[serde(default = "default_experience_name")]
    pub name: String,
}

fn default_experience_name() -> String {
    "Experience".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub name: String,
    pub address: Address,
    pub duration_minutes: u32,
    pub min_reward: u64,
    pub max_reward: u64,
    /// Entry requires an experience level strictly above this. Absent means open entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level_above: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject configurations the registry would refuse piecemeal at startup.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let modules = [
            ("registry", self.registry.address),
            ("experience", self.experience.address),
        ]
        .into_iter()
        .chain(self.policies.iter().map(|p| (p.name.as_str(), p.address)));

        for (label, address) in modules {
            if address.is_zero() {
                bail!("{} uses the zero address", label);
            }
            if !seen.insert(address) {
                bail!("{} reuses address {}", label, address);
            }
        }
        if self.registry.operator.is_zero() {
            bail!("registry operator uses the zero address");
        }

        let mut names = HashSet::new();
        for policy in &self.policies {
            if policy.name.trim().is_empty() {
                bail!("policy {} has an empty name", policy.address);
            }
            if !names.insert(policy.name.to_ascii_lowercase()) {
                bail!("duplicate policy name '{}'", policy.name);
            }
            if policy.min_reward > policy.max_reward {
                bail!(
                    "policy '{}' has min_reward {} above max_reward {}",
                    policy.name,
                    policy.min_reward,
                    policy.max_reward
                );
            }
        }

        for contract in &self.levelable_contracts {
            if contract.is_zero() {
                bail!("levelable_contracts contains the zero address");
            }
        }
        Ok(())
    }

    pub fn find_policy(&self, name: &str) -> Option<&PolicyConfig> {
        self.policies
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }
}

impl Default for Config {
    fn default() -> Self {
        let experience = Address::from_low_u64(0x000e_0001);
        Config {
            levelable_contracts: Vec::new(),
            registry: RegistryConfig {
                address: Address::from_low_u64(0x000a_0001),
                operator: Address::from_low_u64(0x000a_0002),
                reward_draw: DrawMode::BlockSeeded,
            },
            experience: ExperienceConfig {
                address: experience,
                name: default_experience_name(),
            },
            policies: vec![
                PolicyConfig {
                    name: "Sewer Sweep".to_string(),
                    address: Address::from_low_u64(0x000b_0001),
                    duration_minutes: 20,
                    min_reward: 100,
                    max_reward: 200,
                    min_level_above: None,
                },
                PolicyConfig {
                    name: "Crypt Delve".to_string(),
                    address: Address::from_low_u64(0x000b_0002),
                    duration_minutes: 30,
                    min_reward: 150,
                    max_reward: 400,
                    min_level_above: Some(2),
                },
            ],
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("guildhall.log".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_round_trips() {
        let config = Config::default();
        config.validate().expect("default validates");
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.policies.len(), 2);
        assert_eq!(parsed.registry.reward_draw, DrawMode::BlockSeeded);
        assert_eq!(parsed.find_policy("crypt delve").unwrap().min_level_above, Some(2));
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = Config::default();
        config.policies[0].min_reward = 500;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_reward"));
    }

    #[test]
    fn validate_rejects_shared_addresses() {
        let mut config = Config::default();
        config.policies[1].address = config.experience.address;
        assert!(config.validate().is_err());
    }

    #[test]
    fn logging_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "chatty".to_string(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }
}
