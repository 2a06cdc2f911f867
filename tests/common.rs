//! Shared fixtures for the integration suites.
//! Builds a registry on a manual clock with the two reference adventures approved.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use guildhall::guild::{
    BlockSeededDraw, Clock, Experience, LevelGatedPolicy, ManualClock, OpenEntryPolicy, RewardAccumulator,
    TaskRegistry,
};
use guildhall::identity::{Address, InMemoryAssetAuthority, PlayerIdentity};

pub const OPERATOR: u64 = 0xAD;
pub const REGISTRY: u64 = 0x77;
pub const EXPERIENCE: u64 = 0xE0;
pub const OPEN_POLICY: u64 = 0xA1;
pub const GATED_POLICY: u64 = 0xA2;
pub const HEROES: u64 = 0xC0;

#[allow(dead_code)]
pub struct World {
    pub registry: Arc<TaskRegistry>,
    pub experience: Arc<Experience>,
    pub authority: Arc<InMemoryAssetAuthority>,
    pub clock: ManualClock,
}

#[allow(dead_code)] // Not every suite needs every helper.
impl World {
    pub fn operator(&self) -> Address {
        Address::from_low_u64(OPERATOR)
    }

    pub fn open_policy(&self) -> Address {
        Address::from_low_u64(OPEN_POLICY)
    }

    pub fn gated_policy(&self) -> Address {
        Address::from_low_u64(GATED_POLICY)
    }

    pub fn heroes(&self) -> Address {
        Address::from_low_u64(HEROES)
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Credit experience directly, as the bound registry would.
    pub fn grant_experience(&self, player: &guildhall::identity::Player, amount: u64) {
        self.experience
            .accrue(self.registry.address(), &player.compact_key(), amount)
            .expect("registry may accrue");
    }
}

pub fn world() -> World {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
    let authority = Arc::new(InMemoryAssetAuthority::new());
    authority.deploy_contract(Address::from_low_u64(HEROES));

    let operator = Address::from_low_u64(OPERATOR);
    let registry = Arc::new(TaskRegistry::new(
        Address::from_low_u64(REGISTRY),
        operator,
        PlayerIdentity::new(authority.clone()),
        Arc::new(clock.clone()),
        Box::new(BlockSeededDraw),
    ));

    let experience = Arc::new(Experience::new(
        Address::from_low_u64(EXPERIENCE),
        "Experience",
        operator,
    ));
    experience
        .bind_registry(operator, registry.address())
        .expect("bind experience");
    registry
        .register_accumulator(operator, experience.clone())
        .expect("approve experience");
    registry
        .register_policy(
            operator,
            Arc::new(OpenEntryPolicy::reference(
                Address::from_low_u64(OPEN_POLICY),
                experience.address(),
            )),
        )
        .expect("approve open policy");
    registry
        .register_policy(
            operator,
            Arc::new(LevelGatedPolicy::reference(
                Address::from_low_u64(GATED_POLICY),
                experience.clone(),
            )),
        )
        .expect("approve gated policy");
    registry
        .register_levelable(operator, Address::from_low_u64(HEROES))
        .expect("approve hero contract");

    World {
        registry,
        experience,
        authority,
        clock,
    }
}
