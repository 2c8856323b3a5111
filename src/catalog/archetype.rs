//! Character archetypes and AI behavior patterns

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::item::ItemStack;
use super::skill::SkillId;
use crate::sim::leveling::LevelCurve;

/// Stats not covered by the level curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatProfile {
    /// Chance in [0, 1] for a damaging hit to crit
    pub crit_rate: f32,
    /// Damage multiplier on a crit
    pub crit_damage: f32,
    pub accuracy: f32,
    pub evasion: f32,
}

impl Default for CombatProfile {
    fn default() -> Self {
        Self { crit_rate: 0.05, crit_damage: 1.5, accuracy: 1.0, evasion: 0.0 }
    }
}

/// What a rule condition measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    /// hp / maxHp, expressed as a percentage (0-100)
    HpPercent,
    /// Distance to the current target
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Comparison {
    pub fn holds(&self, lhs: f32, rhs: f32) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Eq => (lhs - rhs).abs() <= f32::EPSILON * lhs.abs().max(1.0),
        }
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    Value(f32),
    /// The entity's own effective attack range for the bound skill
    AttackRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub op: Comparison,
    pub threshold: Threshold,
}

/// Action a matched rule requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    Chase,
    Attack,
    Flee,
    Defend,
    /// Translate along the rule's fixed vector
    Move,
}

/// One entry in a behavior pattern; evaluated top to bottom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorRule {
    /// All must hold; an empty list always matches
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub action: RuleAction,
    /// Skill to invoke on Attack (basic attack when absent)
    #[serde(default)]
    pub skill: Option<SkillId>,
    /// Direction for `Move`
    #[serde(default)]
    pub move_vector: Option<Vec2>,
}

/// Template used to materialize a hostile entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeDef {
    pub name: String,
    /// RGB tint for presentation layers
    pub color: [u8; 3],
    pub spawn_weight: f32,
    pub curve: LevelCurve,
    #[serde(default)]
    pub combat: CombatProfile,
    /// Fractional stat jitter per spawn (0.1 = ±10%)
    #[serde(default)]
    pub stat_variance: f32,
    pub basic_attack: SkillId,
    #[serde(default)]
    pub skills: Vec<SkillId>,
    #[serde(default)]
    pub behavior: Vec<BehaviorRule>,
    pub exp_reward: u64,
}

/// The controlled character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDef {
    pub name: String,
    pub curve: LevelCurve,
    #[serde(default)]
    pub combat: CombatProfile,
    pub basic_attack: SkillId,
    #[serde(default)]
    pub skills: Vec<SkillId>,
    #[serde(default)]
    pub inventory: Vec<ItemStack>,
}
