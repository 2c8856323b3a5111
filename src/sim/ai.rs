//! Hostile decision making
//!
//! Each idle hostile walks its behavior rules top to bottom; the first rule
//! whose conditions all hold picks the action. With no match the default is
//! "attack if in range, else chase". Choosing Attack and actually casting are
//! separate: a failed cast leaves the entity in Attack doing nothing.

use glam::Vec2;

use super::skills::begin_cast;
use super::state::{Aim, Engagement, EntityId, Hostile, World};
use crate::angle_of;
use crate::catalog::{BehaviorRule, Catalog, Condition, ConditionKind, RuleAction, SkillId, Threshold};

/// What a hostile decided to do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Chase,
    Attack(SkillId),
    Flee,
    Defend,
    /// Translate along a fixed direction
    Move(Vec2),
}

impl Intent {
    pub fn engagement(&self) -> Engagement {
        match self {
            Intent::Chase => Engagement::Chase,
            Intent::Attack(_) => Engagement::Attack,
            Intent::Flee => Engagement::Flee,
            Intent::Defend => Engagement::Defend,
            Intent::Move(_) => Engagement::Idle,
        }
    }
}

/// Snapshot of what the rules can see
#[derive(Debug, Clone, Copy)]
pub struct Perception {
    /// hp / maxHp as a percentage
    pub hp_percent: f32,
    pub distance: f32,
}

/// Range a bound skill reaches (0 if the skill is unknown)
pub fn attack_range(catalog: &Catalog, skill: SkillId) -> f32 {
    catalog.skill(skill).map(|s| s.effective_range()).unwrap_or(0.0)
}

fn condition_holds(condition: &Condition, seen: &Perception, attack_range: f32) -> bool {
    let lhs = match condition.kind {
        ConditionKind::HpPercent => seen.hp_percent,
        ConditionKind::Distance => seen.distance,
    };
    let rhs = match condition.threshold {
        Threshold::Value(v) => v,
        Threshold::AttackRange => attack_range,
    };
    condition.op.holds(lhs, rhs)
}

/// Pick an intent from the behavior rules
pub fn decide(hostile: &Hostile, catalog: &Catalog, seen: &Perception, hysteresis: f32) -> Intent {
    let basic = hostile.archetype.basic_attack;
    // Staying in Attack uses a wider range than entering it, but only for
    // the skill that is already being used
    let held = if hostile.engagement == Engagement::Attack { hostile.attack_skill } else { None };
    let widen = |skill: SkillId| if held == Some(skill) { hysteresis.max(1.0) } else { 1.0 };

    for rule in &hostile.archetype.behavior {
        let skill = rule.skill.unwrap_or(basic);
        let range = attack_range(catalog, skill) * widen(skill);
        if rule.conditions.iter().all(|c| condition_holds(c, seen, range)) {
            return intent_for(rule, skill);
        }
    }

    if seen.distance <= attack_range(catalog, basic) * widen(basic) {
        Intent::Attack(basic)
    } else {
        Intent::Chase
    }
}

fn intent_for(rule: &BehaviorRule, skill: SkillId) -> Intent {
    match rule.action {
        RuleAction::Chase => Intent::Chase,
        RuleAction::Attack => Intent::Attack(skill),
        RuleAction::Flee => Intent::Flee,
        RuleAction::Defend => Intent::Defend,
        RuleAction::Move => Intent::Move(rule.move_vector.unwrap_or(Vec2::ZERO)),
    }
}

/// Evaluate and act for one hostile
pub(crate) fn think(world: &mut World, catalog: &Catalog, id: EntityId, dt: f32) {
    let hysteresis = world.tuning.attack_hysteresis;
    let target = world.controlled_alive().map(|t| (t.id, t.position));

    let Some(entity) = world.entity(id) else {
        return;
    };
    // Mid-action or knocked back: no re-evaluation, no movement
    if !entity.alive || entity.is_busy() || entity.is_knocked_back() {
        return;
    }
    let Some(hostile) = entity.hostile() else {
        return;
    };

    let Some((target_id, target_pos)) = target else {
        if let Some(h) = world.entity_mut(id).and_then(|e| e.hostile_mut()) {
            h.engagement = Engagement::Idle;
        }
        return;
    };

    let position = entity.position;
    let speed = entity.stats().move_speed;
    let seen = Perception { hp_percent: entity.hp.ratio() * 100.0, distance: position.distance(target_pos) };
    let intent = decide(hostile, catalog, &seen, hysteresis);

    let to_target = target_pos - position;
    let step = speed * dt;
    let (heading, travel) = match intent {
        Intent::Chase => (to_target.normalize_or_zero(), step.min(seen.distance)),
        Intent::Flee => (-to_target.normalize_or_zero(), step),
        Intent::Move(vector) => (vector.normalize_or_zero(), step),
        Intent::Attack(_) => (to_target.normalize_or_zero(), 0.0),
        Intent::Defend => (Vec2::ZERO, 0.0),
    };
    let next_position = world.tuning.clamp_to_arena(position + heading * travel);

    if let Some(entity) = world.entity_mut(id) {
        entity.position = next_position;
        if heading.length_squared() > 1e-8 {
            entity.facing = angle_of(heading);
        }
        if let Some(h) = entity.hostile_mut() {
            h.engagement = intent.engagement();
            h.attack_skill = match intent {
                Intent::Attack(skill) => Some(skill),
                _ => None,
            };
        }
    }

    if let Intent::Attack(skill) = intent {
        if let Err(reason) = begin_cast(world, catalog, id, skill, Aim::Entity(target_id)) {
            log::debug!("{:?} holds Attack without casting {:?}: {}", id, skill, reason);
        }
    }
}
