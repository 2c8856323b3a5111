//! Level curves and experience
//!
//! Pure functions only. The tick calls into this module on kills, never on
//! every frame.

use serde::{Deserialize, Serialize};

/// Stats a level curve produces
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelStats {
    pub hp: f32,
    pub sp: f32,
    pub attack: f32,
    pub defense: f32,
    pub speed: f32,
}

/// Growth curve for an archetype or the controlled character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelCurve {
    /// Stats at level 1
    pub base: LevelStats,
    /// Added per level above 1
    pub per_level: LevelStats,
    /// Experience needed to leave level 1
    pub exp_base: u64,
    /// Multiplier on the requirement for each further level
    pub exp_growth: f32,
    pub max_level: u32,
}

/// Level and experience carried by an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    /// Experience banked toward the next level
    pub experience: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self { level: 1, experience: 0 }
    }
}

/// Result of `add_experience`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceGain {
    pub progress: Progression,
    pub leveled_up: bool,
    pub levels_gained: u32,
}

/// Stats for a level (clamped to [1, max_level])
pub fn stats_for_level(curve: &LevelCurve, level: u32) -> LevelStats {
    let level = level.clamp(1, curve.max_level.max(1));
    let steps = (level - 1) as f32;
    let b = curve.base;
    let g = curve.per_level;
    LevelStats {
        hp: (b.hp + g.hp * steps).max(1.0),
        sp: (b.sp + g.sp * steps).max(0.0),
        attack: (b.attack + g.attack * steps).max(0.0),
        defense: (b.defense + g.defense * steps).max(0.0),
        speed: (b.speed + g.speed * steps).max(0.0),
    }
}

/// Experience needed to advance from `level` to `level + 1`
pub fn exp_to_next(curve: &LevelCurve, level: u32) -> u64 {
    let growth = if curve.exp_growth.is_finite() { curve.exp_growth.max(1.0) } else { 1.0 };
    let needed = curve.exp_base as f64 * (growth as f64).powi(level.saturating_sub(1) as i32);
    (needed.round() as u64).max(1)
}

/// Bank experience, rolling over as many levels as it pays for
pub fn add_experience(curve: &LevelCurve, progress: Progression, amount: u64) -> ExperienceGain {
    let max_level = curve.max_level.max(1);
    let mut next = progress;
    next.level = next.level.clamp(1, max_level);
    let start_level = next.level;

    if next.level >= max_level {
        let progress = Progression { level: max_level, experience: 0 };
        return ExperienceGain { progress, leveled_up: false, levels_gained: 0 };
    }

    next.experience = next.experience.saturating_add(amount);
    while next.level < max_level {
        let needed = exp_to_next(curve, next.level);
        if next.experience < needed {
            break;
        }
        next.experience -= needed;
        next.level += 1;
    }
    if next.level >= max_level {
        next.experience = 0;
    }

    let levels_gained = next.level - start_level;
    ExperienceGain { progress: next, leveled_up: levels_gained > 0, levels_gained }
}
