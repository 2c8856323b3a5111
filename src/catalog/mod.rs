//! Authored definitions
//!
//! The catalog is the engine's read-only view of everything a designer
//! authored: skills, items, the controlled character and hostile archetypes.
//! It is passed by reference into `step` and `issue_command`; the engine
//! never owns or mutates it.

pub mod archetype;
pub mod item;
pub mod skill;

pub use archetype::{
    ArchetypeDef, BehaviorRule, CharacterDef, CombatProfile, Comparison, Condition, ConditionKind,
    RuleAction, Threshold,
};
pub use item::{ItemDef, ItemEffect, ItemId, ItemStack};
pub use skill::{
    BuffSpec, DamageFormula, FormulaOp, ProjectileSpec, SkillCategory, SkillDef, SkillEffect,
    SkillId, StatKind,
};

use serde::{Deserialize, Serialize};

use crate::consts::SKILL_SLOTS;
use crate::error::CatalogError;
use crate::sim::leveling::{LevelCurve, LevelStats};

/// Every authored definition the engine reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub skills: Vec<SkillDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    pub player: CharacterDef,
    pub archetypes: Vec<ArchetypeDef>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get skill by ID
    pub fn skill(&self, id: SkillId) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Get item by ID
    pub fn item(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn archetype(&self, index: usize) -> Option<&ArchetypeDef> {
        self.archetypes.get(index)
    }

    /// Check cross references, slot kinds, stack sizes and spawn weights
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.archetypes.is_empty() {
            return Err(CatalogError::EmptyArchetypePool);
        }

        let check = |owner: &str, id: SkillId| -> Result<&SkillDef, CatalogError> {
            self.skill(id).ok_or_else(|| CatalogError::MissingSkill { owner: owner.to_string(), skill: id })
        };
        // Basic attacks only in the basic slot, skills only in skill slots
        let check_loadout = |owner: &str, basic: SkillId, skills: &[SkillId]| -> Result<(), CatalogError> {
            if skills.len() > SKILL_SLOTS {
                return Err(CatalogError::TooManySkills { owner: owner.to_string(), count: skills.len() });
            }
            if !check(owner, basic)?.is_basic_attack() {
                return Err(CatalogError::MisplacedSkill { owner: owner.to_string(), skill: basic });
            }
            for &id in skills {
                if check(owner, id)?.is_basic_attack() {
                    return Err(CatalogError::MisplacedSkill { owner: owner.to_string(), skill: id });
                }
            }
            Ok(())
        };

        check_loadout(&self.player.name, self.player.basic_attack, &self.player.skills)?;
        for stack in &self.player.inventory {
            let item = self.item(stack.item).ok_or(CatalogError::MissingItem { item: stack.item })?;
            if stack.quantity > item.max_stack {
                return Err(CatalogError::StackTooLarge {
                    item: stack.item,
                    quantity: stack.quantity,
                    max_stack: item.max_stack,
                });
            }
        }

        for archetype in &self.archetypes {
            if !archetype.spawn_weight.is_finite() || archetype.spawn_weight < 0.0 {
                return Err(CatalogError::InvalidWeight { archetype: archetype.name.clone() });
            }
            check_loadout(&archetype.name, archetype.basic_attack, &archetype.skills)?;
            for rule in &archetype.behavior {
                if let Some(id) = rule.skill {
                    check(&archetype.name, id)?;
                }
            }
        }

        Ok(())
    }

    /// Built-in catalog for the headless harness and tests
    pub fn demo() -> Self {
        use archetype::{Comparison::*, ConditionKind::*};

        let skills = vec![
            SkillDef {
                id: SkillId(1),
                name: "Slash".into(),
                category: SkillCategory::BasicAttack,
                range: 60.0,
                cost: 0.0,
                cooldown_ms: 600.0,
                cast_time_ms: 150.0,
                knockback: 0.0,
                effect: SkillEffect::Melee { arc_width_deg: Some(100.0), multiplier: 1.0, formula: None },
            },
            SkillDef {
                id: SkillId(2),
                name: "Cleave".into(),
                category: SkillCategory::Skill,
                range: 80.0,
                cost: 15.0,
                cooldown_ms: 4000.0,
                cast_time_ms: 300.0,
                knockback: 300.0,
                effect: SkillEffect::Melee {
                    arc_width_deg: Some(180.0),
                    multiplier: 1.6,
                    formula: Some(DamageFormula { stat: StatKind::Attack, op: FormulaOp::Add, coefficient: 5.0 }),
                },
            },
            SkillDef {
                id: SkillId(3),
                name: "Arcane Bolt".into(),
                category: SkillCategory::Skill,
                range: 500.0,
                cost: 10.0,
                cooldown_ms: 1500.0,
                cast_time_ms: 250.0,
                knockback: 0.0,
                effect: SkillEffect::Ranged {
                    multiplier: 1.2,
                    formula: None,
                    projectile: ProjectileSpec { speed: 420.0, size: 8.0, piercing: false, homing: true },
                },
            },
            SkillDef {
                id: SkillId(4),
                name: "Second Wind".into(),
                category: SkillCategory::Skill,
                range: 0.0,
                cost: 20.0,
                cooldown_ms: 12000.0,
                cast_time_ms: 400.0,
                knockback: 0.0,
                effect: SkillEffect::Heal { amount: 40.0 },
            },
            SkillDef {
                id: SkillId(5),
                name: "Battle Cry".into(),
                category: SkillCategory::Skill,
                range: 0.0,
                cost: 25.0,
                cooldown_ms: 20000.0,
                cast_time_ms: 200.0,
                knockback: 0.0,
                effect: SkillEffect::Buff(BuffSpec {
                    attack_pct: 30.0,
                    speed_pct: 10.0,
                    duration_ms: 8000.0,
                    ..Default::default()
                }),
            },
            SkillDef {
                id: SkillId(10),
                name: "Bite".into(),
                category: SkillCategory::BasicAttack,
                range: 45.0,
                cost: 0.0,
                cooldown_ms: 1000.0,
                cast_time_ms: 300.0,
                knockback: 0.0,
                effect: SkillEffect::Melee { arc_width_deg: Some(90.0), multiplier: 1.0, formula: None },
            },
            SkillDef {
                id: SkillId(11),
                name: "Spit".into(),
                category: SkillCategory::BasicAttack,
                range: 320.0,
                cost: 0.0,
                cooldown_ms: 1800.0,
                cast_time_ms: 400.0,
                knockback: 0.0,
                effect: SkillEffect::Ranged {
                    multiplier: 0.9,
                    formula: None,
                    projectile: ProjectileSpec { speed: 260.0, size: 6.0, piercing: false, homing: false },
                },
            },
            SkillDef {
                id: SkillId(12),
                name: "Howl".into(),
                category: SkillCategory::Skill,
                range: 150.0,
                cost: 10.0,
                cooldown_ms: 10000.0,
                cast_time_ms: 500.0,
                knockback: 0.0,
                effect: SkillEffect::Debuff(BuffSpec { defense_pct: 25.0, duration_ms: 4000.0, ..Default::default() }),
            },
            SkillDef {
                id: SkillId(13),
                name: "Ground Slam".into(),
                category: SkillCategory::Skill,
                range: 90.0,
                cost: 20.0,
                cooldown_ms: 6000.0,
                cast_time_ms: 700.0,
                knockback: 250.0,
                effect: SkillEffect::AreaDamage {
                    multiplier: 1.0,
                    formula: Some(DamageFormula { stat: StatKind::MaxHp, op: FormulaOp::Mul, coefficient: 0.15 }),
                },
            },
        ];

        let items = vec![
            ItemDef { id: ItemId(1), name: "Health Potion".into(), max_stack: 10, effect: ItemEffect::RestoreHp(50.0) },
            ItemDef { id: ItemId(2), name: "Ether".into(), max_stack: 10, effect: ItemEffect::RestoreSp(30.0) },
            ItemDef {
                id: ItemId(3),
                name: "Iron Tonic".into(),
                max_stack: 5,
                effect: ItemEffect::Buff(BuffSpec { defense_pct: 40.0, duration_ms: 10000.0, ..Default::default() }),
            },
        ];

        let player = CharacterDef {
            name: "Warden".into(),
            curve: LevelCurve {
                base: LevelStats { hp: 200.0, sp: 80.0, attack: 24.0, defense: 8.0, speed: 180.0 },
                per_level: LevelStats { hp: 25.0, sp: 8.0, attack: 4.0, defense: 2.0, speed: 2.0 },
                exp_base: 60,
                exp_growth: 1.4,
                max_level: 20,
            },
            combat: CombatProfile { crit_rate: 0.1, crit_damage: 1.75, accuracy: 1.0, evasion: 0.05 },
            basic_attack: SkillId(1),
            skills: vec![SkillId(2), SkillId(3), SkillId(4), SkillId(5)],
            inventory: vec![ItemStack { item: ItemId(1), quantity: 3 }, ItemStack { item: ItemId(2), quantity: 2 }],
        };

        let chase_or_bite = |flee_below: Option<f32>| {
            let mut rules = Vec::new();
            if let Some(pct) = flee_below {
                rules.push(BehaviorRule {
                    conditions: vec![Condition { kind: HpPercent, op: Lt, threshold: Threshold::Value(pct) }],
                    action: RuleAction::Flee,
                    skill: None,
                    move_vector: None,
                });
            }
            rules.push(BehaviorRule {
                conditions: vec![Condition { kind: Distance, op: Le, threshold: Threshold::AttackRange }],
                action: RuleAction::Attack,
                skill: None,
                move_vector: None,
            });
            rules
        };

        let archetypes = vec![
            ArchetypeDef {
                name: "Ghoul".into(),
                color: [120, 170, 90],
                spawn_weight: 3.0,
                curve: LevelCurve {
                    base: LevelStats { hp: 90.0, sp: 20.0, attack: 14.0, defense: 4.0, speed: 110.0 },
                    per_level: LevelStats { hp: 12.0, sp: 2.0, attack: 2.0, defense: 1.0, speed: 1.0 },
                    exp_base: 0,
                    exp_growth: 1.0,
                    max_level: 20,
                },
                combat: CombatProfile { crit_rate: 0.05, crit_damage: 1.5, accuracy: 0.95, evasion: 0.05 },
                stat_variance: 0.1,
                basic_attack: SkillId(10),
                skills: vec![],
                behavior: chase_or_bite(Some(15.0)),
                exp_reward: 25,
            },
            ArchetypeDef {
                name: "Spitter".into(),
                color: [200, 180, 60],
                spawn_weight: 1.0,
                curve: LevelCurve {
                    base: LevelStats { hp: 60.0, sp: 40.0, attack: 12.0, defense: 2.0, speed: 90.0 },
                    per_level: LevelStats { hp: 8.0, sp: 4.0, attack: 2.0, defense: 0.5, speed: 0.5 },
                    exp_base: 0,
                    exp_growth: 1.0,
                    max_level: 20,
                },
                combat: CombatProfile { crit_rate: 0.08, crit_damage: 1.5, accuracy: 0.9, evasion: 0.1 },
                stat_variance: 0.1,
                basic_attack: SkillId(11),
                skills: vec![],
                behavior: vec![
                    BehaviorRule {
                        conditions: vec![Condition { kind: Distance, op: Lt, threshold: Threshold::Value(120.0) }],
                        action: RuleAction::Flee,
                        skill: None,
                        move_vector: None,
                    },
                    BehaviorRule {
                        conditions: vec![Condition { kind: Distance, op: Le, threshold: Threshold::AttackRange }],
                        action: RuleAction::Attack,
                        skill: None,
                        move_vector: None,
                    },
                ],
                exp_reward: 30,
            },
            ArchetypeDef {
                name: "Brute".into(),
                color: [170, 60, 60],
                spawn_weight: 1.0,
                curve: LevelCurve {
                    base: LevelStats { hp: 220.0, sp: 60.0, attack: 20.0, defense: 10.0, speed: 70.0 },
                    per_level: LevelStats { hp: 30.0, sp: 5.0, attack: 3.0, defense: 2.0, speed: 0.5 },
                    exp_base: 0,
                    exp_growth: 1.0,
                    max_level: 20,
                },
                combat: CombatProfile { crit_rate: 0.02, crit_damage: 2.0, accuracy: 0.85, evasion: 0.0 },
                stat_variance: 0.05,
                basic_attack: SkillId(10),
                skills: vec![SkillId(12), SkillId(13)],
                behavior: vec![
                    BehaviorRule {
                        conditions: vec![Condition { kind: HpPercent, op: Lt, threshold: Threshold::Value(25.0) }],
                        action: RuleAction::Defend,
                        skill: None,
                        move_vector: None,
                    },
                    BehaviorRule {
                        conditions: vec![
                            Condition { kind: Distance, op: Gt, threshold: Threshold::Value(90.0) },
                            Condition { kind: Distance, op: Le, threshold: Threshold::AttackRange },
                        ],
                        action: RuleAction::Attack,
                        skill: Some(SkillId(12)),
                        move_vector: None,
                    },
                    BehaviorRule {
                        conditions: vec![Condition { kind: Distance, op: Le, threshold: Threshold::Value(70.0) }],
                        action: RuleAction::Attack,
                        skill: Some(SkillId(13)),
                        move_vector: None,
                    },
                ],
                exp_reward: 60,
            },
        ];

        Self { skills, items, player, archetypes }
    }
}
