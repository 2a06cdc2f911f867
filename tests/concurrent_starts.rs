/// Many threads racing to enroll or settle the same player.
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use chrono::Duration;
use guildhall::guild::{GuildError, RegistryEvent, RewardAccumulator};
use guildhall::identity::{Address, Player};

#[test]
fn only_one_concurrent_start_wins() {
    let world = common::world();
    let owner = Address::from_low_u64(1);
    let player = Player::synthetic(owner);
    let wins = AtomicUsize::new(0);
    let already_pending = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..16 {
            scope.spawn(|| {
                match world
                    .registry
                    .start_task(owner, &player, world.open_policy())
                {
                    Ok(_) => {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(GuildError::AlreadyPending { .. }) => {
                        already_pending.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(other) => panic!("unexpected error {:?}", other),
                }
            });
        }
    });

    assert_eq!(wins.load(Ordering::SeqCst), 1);
    assert_eq!(already_pending.load(Ordering::SeqCst), 15);
    assert_eq!(world.registry.events_since(0).unwrap().len(), 1);
}

#[test]
fn concurrent_collectors_settle_exactly_once() {
    let world = common::world();
    let owner = Address::from_low_u64(1);
    let player = Player::synthetic(owner);
    world
        .registry
        .start_task(owner, &player, world.open_policy())
        .unwrap();
    world.clock.advance(Duration::minutes(20));

    let settled = AtomicUsize::new(0);
    thread::scope(|scope| {
        for i in 0..16u64 {
            let settled = &settled;
            let world = &world;
            let player = &player;
            scope.spawn(move || {
                let helper = Address::from_low_u64(100 + i);
                match world.registry.collect_pending_reward(helper, player) {
                    Ok(_) => {
                        settled.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(GuildError::NoPendingReward) => {}
                    Err(other) => panic!("unexpected error {:?}", other),
                }
            });
        }
    });

    assert_eq!(settled.load(Ordering::SeqCst), 1);
    let events = world.registry.events_since(0).unwrap();
    let amount = events
        .iter()
        .find_map(|e| match e.event {
            RegistryEvent::RewardCollected { amount, .. } => Some(amount),
            _ => None,
        })
        .expect("one collection");
    assert_eq!(
        world.experience.balance_of(&player.compact_key()),
        amount
    );
}

#[test]
fn distinct_players_progress_independently_under_contention() {
    let world = common::world();
    thread::scope(|scope| {
        for i in 0..8u64 {
            let world = &world;
            scope.spawn(move || {
                let owner = Address::from_low_u64(500 + i);
                let player = Player::synthetic(owner);
                world
                    .registry
                    .start_task(owner, &player, world.open_policy())
                    .expect("independent players never block each other");
            });
        }
    });
    for i in 0..8u64 {
        let player = Player::synthetic(Address::from_low_u64(500 + i));
        assert!(world.registry.has_pending(&player).unwrap());
    }
}
