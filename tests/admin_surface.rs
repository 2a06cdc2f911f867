/// Operator-only registration and accumulator binding.
mod common;

use std::sync::Arc;

use guildhall::guild::{Experience, GuildError, OpenEntryPolicy, RewardAccumulator};
use guildhall::identity::{Address, PlayerKey};

#[test]
fn non_operator_cannot_mutate_allow_lists() {
    let world = common::world();
    let intruder = Address::from_low_u64(0x666);

    let policy = Arc::new(OpenEntryPolicy::reference(
        Address::from_low_u64(0xB5),
        world.experience.address(),
    ));
    assert!(matches!(
        world.registry.register_policy(intruder, policy),
        Err(GuildError::Unauthorized(_))
    ));
    assert!(matches!(
        world.registry.unregister_policy(intruder, world.open_policy()),
        Err(GuildError::Unauthorized(_))
    ));
    assert!(matches!(
        world
            .registry
            .unregister_accumulator(intruder, world.experience.address()),
        Err(GuildError::Unauthorized(_))
    ));
    assert!(matches!(
        world.registry.register_levelable(intruder, world.heroes()),
        Err(GuildError::Unauthorized(_))
    ));
    assert_eq!(world.registry.registered_policies().unwrap().len(), 2);
}

#[test]
fn registrations_report_whether_anything_changed() {
    let world = common::world();
    let operator = world.operator();

    assert!(!world
        .registry
        .register_accumulator(operator, world.experience.clone())
        .unwrap());
    assert!(!world
        .registry
        .register_levelable(operator, world.heroes())
        .unwrap());
    assert!(world
        .registry
        .unregister_levelable(operator, world.heroes())
        .unwrap());
    assert!(!world
        .registry
        .unregister_levelable(operator, world.heroes())
        .unwrap());
    assert!(!world.registry.is_levelable(world.heroes()).unwrap());
}

#[test]
fn plain_accounts_cannot_be_registered() {
    let world = common::world();
    let operator = world.operator();

    assert!(matches!(
        world
            .registry
            .register_levelable(operator, Address::from_low_u64(0x1234)),
        Err(GuildError::NotAContract(_))
    ));
    let zero = Arc::new(OpenEntryPolicy::reference(
        Address::ZERO,
        world.experience.address(),
    ));
    assert!(matches!(
        world.registry.register_policy(operator, zero),
        Err(GuildError::NotAModule(_))
    ));
}

#[test]
fn unbound_experience_rejects_registry_settlements() {
    let world = common::world();
    let operator = world.operator();
    let player_key = PlayerKey::Synthetic(Address::from_low_u64(1));

    // A second experience module that was never bound to this registry.
    let unbound = Arc::new(Experience::new(
        Address::from_low_u64(0xE1),
        "Renown",
        operator,
    ));
    assert!(matches!(
        unbound.accrue(world.registry.address(), &player_key, 10),
        Err(GuildError::Unauthorized(_))
    ));

    // Direct accrual by anyone other than the bound registry fails too.
    assert!(matches!(
        world.experience.accrue(operator, &player_key, 10),
        Err(GuildError::Unauthorized(_))
    ));
    assert!(matches!(
        world
            .experience
            .bind_registry(operator, Address::from_low_u64(0x99)),
        Err(GuildError::AlreadyBound(_))
    ));
    assert_eq!(world.experience.balance_of(&player_key), 0);
}
