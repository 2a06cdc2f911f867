//! Experience tier table.
//!
//! A balance at or below `LEVEL_THRESHOLDS[0]` is level 1; each threshold the
//! balance strictly exceeds adds one level, up to level 20.

pub const MAX_LEVEL: u8 = 20;

/// Upper bound (inclusive) of levels 1 through 19.
pub const LEVEL_THRESHOLDS: [u64; 19] = [
    400, 675, 1_125, 1_900, 3_175, 5_325, 8_925, 14_950, 25_100, 42_100, 70_600, 118_450,
    198_700, 333_325, 559_200, 938_075, 1_573_675, 2_639_950, 4_428_675,
];

/// Map an experience balance to its level.
pub fn level_for_experience(experience: u64) -> u8 {
    let exceeded = LEVEL_THRESHOLDS
        .iter()
        .take_while(|threshold| experience > **threshold)
        .count();
    1 + exceeded as u8
}

/// Smallest balance that reaches `level`, or `None` outside 1..=20.
pub fn level_floor(level: u8) -> Option<u64> {
    match level {
        1 => Some(0),
        2..=MAX_LEVEL => Some(LEVEL_THRESHOLDS[(level - 2) as usize] + 1),
        _ => None,
    }
}
