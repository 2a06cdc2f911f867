/// Integration tests for the start -> wait -> collect cycle.
mod common;

use chrono::Duration;
use guildhall::guild::{GuildError, RegistryEvent, RewardAccumulator};
use guildhall::identity::{Address, Player};

#[test]
fn open_adventure_twenty_minute_scenario() {
    let world = common::world();
    let owner = Address::from_low_u64(1);
    let player = Player::synthetic(owner);
    let key = player.compact_key();

    let pending = world
        .registry
        .start_task(owner, &player, world.open_policy())
        .expect("start");
    assert_eq!((pending.min_amount, pending.max_amount), (100, 200));
    assert!(world.registry.has_pending(&player).unwrap());

    // 19:59 in: still locked.
    world.clock.advance(Duration::minutes(19) + Duration::seconds(59));
    let err = world
        .registry
        .collect_pending_reward(owner, &player)
        .unwrap_err();
    assert!(matches!(err, GuildError::NotReady { .. }));
    assert_eq!(world.experience.balance_of(&key), 0);

    // 20:00 exactly: ready.
    world.clock.advance(Duration::seconds(1));
    assert!(world.registry.is_ready(&player).unwrap());
    let settled = world
        .registry
        .collect_pending_reward(owner, &player)
        .expect("collect");
    assert!((100..=200).contains(&settled.amount));
    assert_eq!(world.experience.balance_of(&key), settled.amount);
    assert!(!world.registry.has_pending(&player).unwrap());

    let again = world
        .registry
        .collect_pending_reward(owner, &player)
        .unwrap_err();
    assert!(matches!(again, GuildError::NoPendingReward));
    assert_eq!(world.experience.balance_of(&key), settled.amount);
}

#[test]
fn anyone_may_collect_for_a_player() {
    let world = common::world();
    let owner = Address::from_low_u64(1);
    let helper = Address::from_low_u64(99);
    let player = Player::synthetic(owner);

    world
        .registry
        .start_task(owner, &player, world.open_policy())
        .unwrap();
    world.clock.advance(Duration::minutes(20));
    let settled = world
        .registry
        .collect_pending_reward(helper, &player)
        .expect("helper collects");

    // Credit goes to the player, not the collector.
    assert_eq!(
        world.experience.balance_of(&player.compact_key()),
        settled.amount
    );
    assert_eq!(
        world
            .experience
            .balance_of(&Player::synthetic(helper).compact_key()),
        0
    );

    let events = world.registry.events_since(0).unwrap();
    match &events.last().unwrap().event {
        RegistryEvent::RewardCollected {
            collector,
            implicit,
            amount,
            ..
        } => {
            assert_eq!(*collector, helper);
            assert!(!implicit);
            assert_eq!(*amount, settled.amount);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn started_notification_carries_unlock_time() {
    let world = common::world();
    let owner = Address::from_low_u64(1);
    let player = Player::synthetic(owner);
    let before = world.registry.event_head().unwrap();

    let pending = world
        .registry
        .start_task(owner, &player, world.open_policy())
        .unwrap();

    let events = world.registry.events_since(0).unwrap();
    assert_eq!(events.len(), 1);
    match &events[0].event {
        RegistryEvent::TaskStarted {
            starter,
            policy,
            pending: recorded,
            player: p,
        } => {
            assert_eq!(*starter, owner);
            assert_eq!(*policy, world.open_policy());
            assert_eq!(recorded, &pending);
            assert_eq!(p, &player);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_ne!(world.registry.event_head().unwrap(), before);
}

#[test]
fn reentering_with_a_different_policy_after_collection() {
    let world = common::world();
    let owner = Address::from_low_u64(1);
    let player = Player::synthetic(owner);

    world
        .registry
        .start_task(owner, &player, world.open_policy())
        .unwrap();
    world.clock.advance(Duration::minutes(20));
    world.registry.collect_pending_reward(owner, &player).unwrap();

    world.grant_experience(&player, 1_000);
    let pending = world
        .registry
        .start_task(owner, &player, world.gated_policy())
        .expect("gated entry after leveling");
    assert_eq!((pending.min_amount, pending.max_amount), (150, 400));
    assert_eq!(
        world.registry.time_until_ready(&player).unwrap(),
        Some(Duration::minutes(30))
    );
}

#[test]
fn settled_amounts_stay_in_bounds_across_many_runs() {
    let world = common::world();
    for i in 0..200u64 {
        let owner = Address::from_low_u64(1_000 + i);
        let player = Player::synthetic(owner);
        world
            .registry
            .start_task(owner, &player, world.open_policy())
            .unwrap();
        world.clock.advance(Duration::minutes(20) + Duration::seconds(i as i64));
        let settled = world.registry.collect_pending_reward(owner, &player).unwrap();
        assert!(
            (100..=200).contains(&settled.amount),
            "run {} settled {}",
            i,
            settled.amount
        );
    }
}
