//! Skill definitions
//!
//! Skills are immutable, externally authored records. The effect is a sum
//! type so each kind carries only the fields it needs.

use serde::{Deserialize, Serialize};

/// Skill identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub u32);

/// Whether a skill occupies the basic-attack slot or a skill slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    BasicAttack,
    Skill,
}

/// Caster stat a damage formula reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKind {
    Attack,
    Defense,
    MaxHp,
    MaxSp,
    MoveSpeed,
}

/// Operator combining a stat with a coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaOp {
    Add,
    Mul,
}

/// Authored damage base: `stat <op> coefficient`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageFormula {
    pub stat: StatKind,
    pub op: FormulaOp,
    pub coefficient: f32,
}

/// Time-limited stat deltas granted by a buff/debuff skill or item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffSpec {
    /// Percent of base attack (50 = +50%)
    pub attack_pct: f32,
    /// Percent of base defense
    pub defense_pct: f32,
    /// Percent of base move speed
    pub speed_pct: f32,
    /// Additive crit rate in percentage points (10 = +0.10)
    pub crit_rate_pct: f32,
    pub duration_ms: f32,
}

impl BuffSpec {
    /// Same deltas, sign flipped (authored debuffs may use either sign)
    pub fn as_debuff(&self) -> Self {
        Self {
            attack_pct: -self.attack_pct.abs(),
            defense_pct: -self.defense_pct.abs(),
            speed_pct: -self.speed_pct.abs(),
            crit_rate_pct: -self.crit_rate_pct.abs(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Moving hazard spawned by a ranged skill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub speed: f32,
    /// Collision radius
    pub size: f32,
    pub piercing: bool,
    pub homing: bool,
}

/// What a skill does when its Execution phase begins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Hits every opposing entity within range and inside the arc
    Melee {
        /// Full arc width in degrees; `None` hits all around
        arc_width_deg: Option<f32>,
        multiplier: f32,
        formula: Option<DamageFormula>,
    },
    /// Launches a hazard toward the aim
    Ranged {
        multiplier: f32,
        formula: Option<DamageFormula>,
        projectile: ProjectileSpec,
    },
    /// Hits every opposing entity within range of the caster
    AreaDamage {
        multiplier: f32,
        formula: Option<DamageFormula>,
    },
    /// Restores the caster's hp
    Heal { amount: f32 },
    /// Grants the caster a buff
    Buff(BuffSpec),
    /// Weakens every opposing entity within range
    Debuff(BuffSpec),
}

impl SkillEffect {
    /// Damage multiplier and formula for damaging effects
    pub fn damage_terms(&self) -> Option<(f32, Option<DamageFormula>)> {
        match self {
            SkillEffect::Melee { multiplier, formula, .. }
            | SkillEffect::Ranged { multiplier, formula, .. }
            | SkillEffect::AreaDamage { multiplier, formula } => Some((*multiplier, *formula)),
            SkillEffect::Heal { .. } | SkillEffect::Buff(_) | SkillEffect::Debuff(_) => None,
        }
    }
}

/// A skill or basic attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: String,
    pub category: SkillCategory,
    /// Reach in world units (melee radius, projectile travel, area radius)
    pub range: f32,
    /// SP paid when the cast begins
    pub cost: f32,
    pub cooldown_ms: f32,
    /// Windup length before the effect lands
    pub cast_time_ms: f32,
    /// Impulse applied to entities this skill damages
    #[serde(default)]
    pub knockback: f32,
    pub effect: SkillEffect,
}

impl SkillDef {
    /// Reach the AI uses when judging whether it can attack
    pub fn effective_range(&self) -> f32 {
        match &self.effect {
            SkillEffect::Heal { .. } | SkillEffect::Buff(_) => f32::INFINITY,
            _ => self.range.max(0.0),
        }
    }

    pub fn is_basic_attack(&self) -> bool {
        self.category == SkillCategory::BasicAttack
    }
}
