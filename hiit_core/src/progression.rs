//! Level and badge progression derived from cumulative training minutes.
//!
//! Levels follow a threshold table where each level needs more new minutes
//! than the last:
//! - Level 1 after 10 minutes
//! - Level 2 after 60 more
//! - From level 3 the increment doubles every level, up to level 20
//!
//! Everything here is pure: the only input is the total minute count.

use once_cell::sync::Lazy;
use serde::Serialize;

/// Highest reachable level
pub const MAX_LEVEL: u32 = 20;

const FIRST_INCREMENT: i64 = 10;
const SECOND_INCREMENT: i64 = 60;

static THRESHOLDS: Lazy<[i64; MAX_LEVEL as usize + 1]> = Lazy::new(generate_thresholds);

fn generate_thresholds() -> [i64; MAX_LEVEL as usize + 1] {
    let mut thresholds = [0i64; MAX_LEVEL as usize + 1];
    let mut increment = 0;
    for level in 1..thresholds.len() {
        increment = match level {
            1 => FIRST_INCREMENT,
            2 => SECOND_INCREMENT,
            _ => increment * 2,
        };
        thresholds[level] = thresholds[level - 1] + increment;
    }
    thresholds
}

/// Cumulative minutes needed to reach each level, indexed by level
pub fn thresholds() -> &'static [i64] {
    &THRESHOLDS[..]
}

/// Level reached with `minutes` of training. Negative input is level 0.
pub fn calculate_level(minutes: i64) -> u32 {
    if minutes < 0 {
        return 0;
    }
    // Thresholds are strictly increasing and start at 0, so the partition
    // point is at least 1.
    let reached = THRESHOLDS.partition_point(|&t| t <= minutes);
    (reached - 1) as u32
}

/// Where a minute total sits within its level
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressionSnapshot {
    pub level: u32,
    pub current_level_floor: i64,
    pub next_level_floor: i64,
    pub progress_percent: f64,
    pub minutes_to_next_level: i64,
}

impl ProgressionSnapshot {
    /// Snapshot for a possibly-missing minute total (missing counts as 0)
    pub fn from_minutes(minutes: Option<i64>) -> Self {
        calculate_next_level_progress(minutes.unwrap_or(0))
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_LEVEL
    }
}

/// Progress toward the next level. Capped at the top level.
pub fn calculate_next_level_progress(minutes: i64) -> ProgressionSnapshot {
    let minutes = minutes.max(0);
    let level = calculate_level(minutes);
    let floor = THRESHOLDS[level as usize];

    if level >= MAX_LEVEL {
        return ProgressionSnapshot {
            level,
            current_level_floor: floor,
            next_level_floor: floor,
            progress_percent: 100.0,
            minutes_to_next_level: 0,
        };
    }

    let next = THRESHOLDS[level as usize + 1];
    let range = (next - floor) as f64;
    let into_level = (minutes - floor).max(0) as f64;

    ProgressionSnapshot {
        level,
        current_level_floor: floor,
        next_level_floor: next,
        progress_percent: (into_level / range * 100.0).clamp(0.0, 100.0),
        minutes_to_next_level: (next - minutes).max(0),
    }
}

// ============================================================================
// Badges
// ============================================================================

/// A badge awarded on reaching a level
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BadgeDefinition {
    pub level: u32,
    pub name: &'static str,
    pub description: &'static str,
}

/// Badge table, ascending by level. Changing a level here changes what
/// existing users have unlocked.
pub static BADGES: &[BadgeDefinition] = &[
    BadgeDefinition {
        level: 1,
        name: "First Sweat",
        description: "Finish your first 10 minutes of HIIT",
    },
    BadgeDefinition {
        level: 2,
        name: "Warmed Up",
        description: "Log 70 minutes of training",
    },
    BadgeDefinition {
        level: 3,
        name: "Habit Forming",
        description: "Reach level 3",
    },
    BadgeDefinition {
        level: 5,
        name: "Interval Regular",
        description: "Reach level 5",
    },
    BadgeDefinition {
        level: 7,
        name: "Engine Builder",
        description: "Reach level 7",
    },
    BadgeDefinition {
        level: 10,
        name: "Iron Lungs",
        description: "Reach level 10",
    },
    BadgeDefinition {
        level: 12,
        name: "Relentless",
        description: "Reach level 12",
    },
    BadgeDefinition {
        level: 15,
        name: "Tabata Titan",
        description: "Reach level 15",
    },
    BadgeDefinition {
        level: 18,
        name: "Unbreakable",
        description: "Reach level 18",
    },
    BadgeDefinition {
        level: 20,
        name: "Legend",
        description: "Reach the top level",
    },
];

/// Whether a badge is unlocked for a minute total
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BadgeStatus {
    pub badge: &'static BadgeDefinition,
    pub unlocked: bool,
}

/// Badges unlocked at this minute total, in table order
pub fn unlocked_badges(minutes: i64) -> Vec<&'static BadgeDefinition> {
    let level = calculate_level(minutes);
    BADGES.iter().filter(|b| b.level <= level).collect()
}

/// Every badge with its locked/unlocked flag
pub fn badge_statuses(minutes: i64) -> Vec<BadgeStatus> {
    let level = calculate_level(minutes);
    BADGES
        .iter()
        .map(|badge| BadgeStatus {
            badge,
            unlocked: badge.level <= level,
        })
        .collect()
}

/// The lowest badge not yet unlocked
pub fn next_badge(minutes: i64) -> Option<&'static BadgeDefinition> {
    let level = calculate_level(minutes);
    BADGES.iter().find(|b| b.level > level)
}

/// Cosmetic tier used when rendering a level or badge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl BadgeTier {
    pub fn for_level(level: u32) -> Self {
        match level {
            0..=4 => BadgeTier::Bronze,
            5..=9 => BadgeTier::Silver,
            10..=14 => BadgeTier::Gold,
            15..=19 => BadgeTier::Platinum,
            _ => BadgeTier::Diamond,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BadgeTier::Bronze => "Bronze",
            BadgeTier::Silver => "Silver",
            BadgeTier::Gold => "Gold",
            BadgeTier::Platinum => "Platinum",
            BadgeTier::Diamond => "Diamond",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: [i64; 21] = [
        0, 10, 70, 190, 430, 910, 1870, 3790, 7630, 15310, 30670, 61390, 122830, 245710, 491470,
        983030, 1966150, 3932390, 7864870, 15729830, 31459750,
    ];

    #[test]
    fn test_threshold_table() {
        assert_eq!(thresholds(), &EXPECTED[..]);
    }

    #[test]
    fn test_threshold_exactness() {
        for (i, &t) in EXPECTED.iter().enumerate().skip(1) {
            assert_eq!(calculate_level(t), i as u32, "at threshold {}", t);
            assert_eq!(calculate_level(t - 1), i as u32 - 1, "just below {}", t);
        }
    }

    #[test]
    fn test_negative_and_missing_minutes() {
        assert_eq!(calculate_level(-5), 0);
        assert_eq!(calculate_level(i64::MIN), 0);
        let snapshot = ProgressionSnapshot::from_minutes(None);
        assert_eq!(snapshot.level, 0);
        assert_eq!(snapshot.progress_percent, 0.0);
        assert_eq!(snapshot.minutes_to_next_level, 10);
        assert_eq!(calculate_next_level_progress(-100), snapshot);
    }

    #[test]
    fn test_level_is_monotonic() {
        let mut previous = 0;
        for minutes in (0..20_000).chain([1_000_000, 40_000_000, i64::MAX]) {
            let level = calculate_level(minutes);
            assert!(level >= previous, "level dropped at {} minutes", minutes);
            previous = level;
        }
    }

    #[test]
    fn test_progress_mid_level() {
        // Level 2 spans 70..190
        let snapshot = calculate_next_level_progress(100);
        assert_eq!(snapshot.level, 2);
        assert_eq!(snapshot.current_level_floor, 70);
        assert_eq!(snapshot.next_level_floor, 190);
        assert!((snapshot.progress_percent - 25.0).abs() < 1e-9);
        assert_eq!(snapshot.minutes_to_next_level, 90);
    }

    #[test]
    fn test_progress_bounds() {
        for minutes in (0..5_000).step_by(7).chain(EXPECTED.iter().copied()) {
            let p = calculate_next_level_progress(minutes).progress_percent;
            assert!((0.0..=100.0).contains(&p), "{} minutes gave {}%", minutes, p);
            assert_eq!(p == 100.0, minutes >= EXPECTED[20], "at {} minutes", minutes);
        }
    }

    #[test]
    fn test_max_level_clamps() {
        let snapshot = calculate_next_level_progress(EXPECTED[20] + 12345);
        assert_eq!(snapshot.level, MAX_LEVEL);
        assert!(snapshot.is_max_level());
        assert_eq!(snapshot.progress_percent, 100.0);
        assert_eq!(snapshot.minutes_to_next_level, 0);
        assert_eq!(snapshot.current_level_floor, EXPECTED[20]);
        assert_eq!(snapshot.next_level_floor, EXPECTED[20]);
    }

    #[test]
    fn test_badges_unlock_by_level() {
        assert!(unlocked_badges(9).is_empty());
        let names: Vec<_> = unlocked_badges(70).iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["First Sweat", "Warmed Up"]);
        assert_eq!(unlocked_badges(EXPECTED[20]).len(), BADGES.len());
    }

    #[test]
    fn test_badge_table_sorted() {
        assert!(BADGES.windows(2).all(|w| w[0].level < w[1].level));
        assert!(BADGES.iter().all(|b| b.level <= MAX_LEVEL));
    }

    #[test]
    fn test_badge_statuses_and_next() {
        let statuses = badge_statuses(200);
        assert_eq!(statuses.len(), BADGES.len());
        assert_eq!(statuses.iter().filter(|s| s.unlocked).count(), 3);
        assert_eq!(next_badge(200).unwrap().name, "Interval Regular");
        assert!(next_badge(EXPECTED[20]).is_none());
    }

    #[test]
    fn test_tiers() {
        assert_eq!(BadgeTier::for_level(0), BadgeTier::Bronze);
        assert_eq!(BadgeTier::for_level(5), BadgeTier::Silver);
        assert_eq!(BadgeTier::for_level(14), BadgeTier::Gold);
        assert_eq!(BadgeTier::for_level(19), BadgeTier::Platinum);
        assert_eq!(BadgeTier::for_level(20), BadgeTier::Diamond);
    }
}
