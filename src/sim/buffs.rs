//! Buff/debuff ledger
//!
//! Time-limited stat modifiers layered over an entity's base stats. The
//! ledger never touches base stats; effective stats are recomputed on read.

use serde::{Deserialize, Serialize};

use super::resources::tick_cooldown;
use super::state::CombatStats;
use crate::catalog::{BuffSpec, ItemId, SkillId};

/// What granted a buff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuffSource {
    Skill(SkillId),
    Item(ItemId),
}

/// A live modifier on one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuffInstance {
    pub source: BuffSource,
    pub remaining_ms: f32,
    pub deltas: BuffSpec,
}

/// Ordered list of active buffs (oldest first)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuffLedger {
    active: Vec<BuffInstance>,
}

impl BuffLedger {
    /// Add a buff, refreshing an existing one from the same source.
    /// Returns false when the spec has no duration.
    pub fn apply(&mut self, source: BuffSource, deltas: BuffSpec) -> bool {
        if !deltas.duration_ms.is_finite() || deltas.duration_ms <= 0.0 {
            return false;
        }
        let instance = BuffInstance { source, remaining_ms: deltas.duration_ms, deltas };
        match self.active.iter_mut().find(|b| b.source == source) {
            Some(existing) => *existing = instance,
            None => self.active.push(instance),
        }
        true
    }

    /// Count down every buff, returning the sources that expired
    pub fn tick(&mut self, dt_ms: f32) -> Vec<BuffSource> {
        let mut expired = Vec::new();
        for buff in &mut self.active {
            buff.remaining_ms = tick_cooldown(buff.remaining_ms, dt_ms);
        }
        self.active.retain(|buff| {
            if buff.remaining_ms <= 0.0 {
                expired.push(buff.source);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn active(&self) -> &[BuffInstance] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Effective stats: percentage deltas scale the base value, crit deltas
    /// add percentage points
    pub fn apply_to(&self, base: &CombatStats) -> CombatStats {
        if self.active.is_empty() {
            return *base;
        }
        let (mut attack, mut defense, mut speed, mut crit) = (0.0, 0.0, 0.0, 0.0);
        for buff in &self.active {
            attack += buff.deltas.attack_pct;
            defense += buff.deltas.defense_pct;
            speed += buff.deltas.speed_pct;
            crit += buff.deltas.crit_rate_pct;
        }
        CombatStats {
            attack: (base.attack + base.attack * attack / 100.0).max(0.0),
            defense: (base.defense + base.defense * defense / 100.0).max(0.0),
            move_speed: (base.move_speed + base.move_speed * speed / 100.0).max(0.0),
            crit_rate: (base.crit_rate + crit / 100.0).clamp(0.0, 1.0),
            ..*base
        }
    }
}
