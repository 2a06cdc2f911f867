//! Process-wide registry counters.
//! Cheap atomics updated on every committed transition, plus a per-kind rejection map.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static TASKS_STARTED: AtomicU64 = AtomicU64::new(0);
static REWARDS_COLLECTED: AtomicU64 = AtomicU64::new(0);
static IMPLICIT_SETTLEMENTS: AtomicU64 = AtomicU64::new(0);
static AMOUNT_SETTLED: AtomicU64 = AtomicU64::new(0);

static REJECTIONS: OnceLock<Mutex<HashMap<&'static str, u64>>> = OnceLock::new();

pub fn inc_tasks_started() {
    TASKS_STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_implicit_settlements() {
    IMPLICIT_SETTLEMENTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_settlement(amount: u64) {
    REWARDS_COLLECTED.fetch_add(1, Ordering::Relaxed);
    // fetch_add wraps; saturate instead.
    let _ = AMOUNT_SETTLED.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
        Some(total.saturating_add(amount))
    });
}

fn rejection_lock() -> &'static Mutex<HashMap<&'static str, u64>> {
    REJECTIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn record_rejection(kind: &'static str) {
    let mut guard = match rejection_lock().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let count = guard.entry(kind).or_default();
    *count = count.saturating_add(1);
}

pub fn rejections_snapshot() -> HashMap<&'static str, u64> {
    match rejection_lock().lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks_started: u64,
    pub rewards_collected: u64,
    pub implicit_settlements: u64,
    pub amount_settled: u64,
    pub rejections: HashMap<&'static str, u64>,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        tasks_started: TASKS_STARTED.load(Ordering::Relaxed),
        rewards_collected: REWARDS_COLLECTED.load(Ordering::Relaxed),
        implicit_settlements: IMPLICIT_SETTLEMENTS.load(Ordering::Relaxed),
        amount_settled: AMOUNT_SETTLED.load(Ordering::Relaxed),
        rejections: rejections_snapshot(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are global and other tests run in parallel, so assert on deltas.
    #[test]
    fn settlement_updates_counters() {
        let before = snapshot();
        inc_tasks_started();
        record_settlement(150);
        record_rejection("metrics_test_kind");
        let after = snapshot();
        assert!(after.tasks_started > before.tasks_started);
        assert!(after.rewards_collected > before.rewards_collected);
        assert!(after.amount_settled >= before.amount_settled + 150);
        assert_eq!(after.rejections.get("metrics_test_kind"), Some(&1));
    }
}
