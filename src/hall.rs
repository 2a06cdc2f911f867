//! Assembles a ready-to-use registry from [`Config`]: builds the experience
//! module, binds it to the registry, and approves the configured policies and
//! asset classes.

use std::sync::Arc;

use chrono::Duration;
use log::{info, warn};

use crate::config::{Config, PolicyConfig};
use crate::guild::{
    Clock, DrawMode, Experience, GuildError, LevelGatedPolicy, OpenEntryPolicy, RewardAccumulator,
    RewardTerms, TaskPolicy, TaskRegistry,
};
use crate::identity::{Address, AssetAuthority, PlayerIdentity};

pub struct Guildhall {
    pub registry: Arc<TaskRegistry>,
    pub experience: Arc<Experience>,
    catalog: Vec<(String, Address)>,
}

impl Guildhall {
    pub fn from_config(
        config: &Config,
        authority: Arc<dyn AssetAuthority>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GuildError> {
        let operator = config.registry.operator;
        if config.registry.reward_draw == DrawMode::ThreadRng {
            warn!("reward draw uses thread-rng: settlements are no longer reproducible from the event log");
        }

        let registry = Arc::new(TaskRegistry::new(
            config.registry.address,
            operator,
            PlayerIdentity::new(authority),
            clock,
            config.registry.reward_draw.build(),
        ));

        let experience = Arc::new(Experience::new(
            config.experience.address,
            config.experience.name.clone(),
            operator,
        ));
        experience.bind_registry(operator, registry.address())?;
        registry.register_accumulator(operator, experience.clone())?;

        let mut catalog = Vec::with_capacity(config.policies.len());
        for entry in &config.policies {
            let policy = build_policy(entry, &experience);
            registry.register_policy(operator, policy)?;
            catalog.push((entry.name.clone(), entry.address));
        }

        for contract in &config.levelable_contracts {
            registry.register_levelable(operator, *contract)?;
        }

        info!(
            "guildhall ready: registry {} with {} adventure(s)",
            registry.address(),
            catalog.len()
        );
        Ok(Self {
            registry,
            experience,
            catalog,
        })
    }

    /// Resolve a configured adventure by name (case-insensitive).
    pub fn policy_address(&self, name: &str) -> Option<Address> {
        self.catalog
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, address)| *address)
    }

    pub fn catalog(&self) -> &[(String, Address)] {
        &self.catalog
    }
}

fn build_policy(entry: &PolicyConfig, experience: &Arc<Experience>) -> Arc<dyn TaskPolicy> {
    let terms = RewardTerms::new(
        Duration::minutes(i64::from(entry.duration_minutes)),
        experience.address(),
        entry.min_reward,
        entry.max_reward,
    );
    match entry.min_level_above {
        None => Arc::new(OpenEntryPolicy::new(entry.address, entry.name.clone(), terms)),
        Some(level) => Arc::new(LevelGatedPolicy::new(
            entry.address,
            entry.name.clone(),
            terms,
            experience.clone(),
            level,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::SystemClock;
    use crate::identity::InMemoryAssetAuthority;

    #[test]
    fn default_config_builds_both_reference_policies() {
        let config = Config::default();
        let hall = Guildhall::from_config(
            &config,
            Arc::new(InMemoryAssetAuthority::new()),
            Arc::new(SystemClock),
        )
        .expect("hall");
        assert_eq!(hall.registry.registered_policies().unwrap().len(), 2);
        assert_eq!(
            hall.registry.registered_accumulators().unwrap(),
            vec![config.experience.address]
        );
        assert_eq!(hall.experience.bound_registry(), Some(config.registry.address));
        assert_eq!(
            hall.policy_address("SEWER SWEEP"),
            Some(config.policies[0].address)
        );
    }

    #[test]
    fn unknown_levelable_contract_fails_assembly() {
        let mut config = Config::default();
        config.levelable_contracts.push(Address::from_low_u64(0xFACE));
        let result = Guildhall::from_config(
            &config,
            Arc::new(InMemoryAssetAuthority::new()),
            Arc::new(SystemClock),
        );
        assert!(matches!(result, Err(GuildError::NotAContract(_))));
    }
}
