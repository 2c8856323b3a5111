//! Skill/attack resolution
//!
//! A cast runs through Windup -> Execution -> Recovery -> Idle. The phase is
//! always derived from time elapsed since `phase_start_ms`, never from a
//! separate timer, and the effect lands exactly once when Windup ends.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::buffs::BuffSource;
use super::geometry::{Cone, distance};
use super::hazards::Hazard;
use super::state::{ActiveCast, Aim, Entity, EntityId, Event, Knockback, Phase, World};
use crate::angle_of;
use crate::catalog::{Catalog, DamageFormula, FormulaOp, SkillDef, SkillEffect, SkillId};
use crate::error::UseRejection;

/// Damage carried from a caster to whatever it hits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamagePayload {
    /// Pre-mitigation damage (base * multiplier * crit)
    pub raw: f32,
    pub critical: bool,
    pub accuracy: f32,
    /// Initial knockback speed applied on hit
    pub knockback: f32,
}

/// Check whether `entity` could start `skill` right now
pub fn can_use<'a>(entity: &Entity, catalog: &'a Catalog, skill: SkillId) -> Result<&'a SkillDef, UseRejection> {
    if !entity.loadout.contains(skill) {
        return Err(UseRejection::InvalidSkill);
    }
    let def = catalog.skill(skill).ok_or(UseRejection::InvalidSkill)?;

    let remaining_ms = entity.cooldowns.remaining(skill);
    if remaining_ms > 0.0 {
        return Err(UseRejection::OnCooldown { remaining_ms });
    }
    // Pool::consume reports the same reason; checked here so nothing is spent
    let cost = def.cost.max(0.0);
    if cost > entity.sp.current {
        return Err(UseRejection::InsufficientResource { needed: cost, available: entity.sp.current });
    }
    Ok(def)
}

/// Start a cast: pay the cost, start the cooldown, enter Windup
pub fn begin_use(
    entity: &mut Entity,
    catalog: &Catalog,
    skill: SkillId,
    aim: Aim,
    now_ms: f64,
) -> Result<(), UseRejection> {
    let def = can_use(entity, catalog, skill)?;
    entity.sp = entity.sp.consume(def.cost)?;
    entity.cooldowns.start(skill, def.cooldown_ms);
    entity.cast = Some(ActiveCast {
        skill,
        aim,
        cast_time_ms: if def.cast_time_ms.is_finite() { def.cast_time_ms.max(0.0) } else { 0.0 },
        effect_applied: false,
    });
    entity.phase = Phase::Windup;
    entity.phase_start_ms = now_ms;
    if let Aim::Point(point) = aim {
        face_toward(entity, point);
    }
    Ok(())
}

/// `begin_use` for an entity in the world, emitting `SkillUsed`
pub(crate) fn begin_cast(
    world: &mut World,
    catalog: &Catalog,
    id: EntityId,
    skill: SkillId,
    aim: Aim,
) -> Result<(), UseRejection> {
    let now_ms = world.time_ms;
    let aim_point = match aim {
        Aim::Entity(target) => world.entity(target).map(|t| t.position),
        Aim::Point(point) => Some(point),
    };
    let entity = world.entity_mut(id).ok_or(UseRejection::InvalidSkill)?;
    begin_use(entity, catalog, skill, aim, now_ms)?;
    if let Some(point) = aim_point {
        face_toward(entity, point);
    }
    world.push_event(Event::SkillUsed { entity_id: id, skill_id: skill });
    Ok(())
}

/// Phase for a cast `elapsed_ms` after it started
pub fn phase_at(elapsed_ms: f32, cast_time_ms: f32, execution_ms: f32, recovery_ms: f32) -> Phase {
    if elapsed_ms < cast_time_ms {
        Phase::Windup
    } else if elapsed_ms < cast_time_ms + execution_ms {
        Phase::Execution
    } else if elapsed_ms < cast_time_ms + execution_ms + recovery_ms {
        Phase::Recovery
    } else {
        Phase::Idle
    }
}

/// `stat <op> coefficient`, or plain attack without a formula
pub fn base_damage(caster: &Entity, formula: Option<DamageFormula>) -> f32 {
    match formula {
        None => caster.stats().attack,
        Some(f) => {
            let stat = caster.stat_value(f.stat);
            match f.op {
                FormulaOp::Add => stat + f.coefficient,
                FormulaOp::Mul => stat * f.coefficient,
            }
        }
    }
}

/// Final damage after defense; malformed values degrade to the 1 damage floor
pub fn mitigate(raw: f32, defense: f32) -> u32 {
    let amount = (raw - defense.max(0.0)).round();
    if amount.is_finite() && amount >= 1.0 { amount as u32 } else { 1 }
}

/// Chance for an attack to land
pub fn hit_chance(accuracy: f32, evasion: f32, min_hit_chance: f32) -> f32 {
    let chance = accuracy - evasion;
    if chance.is_nan() {
        return 1.0;
    }
    chance.clamp(min_hit_chance.clamp(0.0, 1.0), 1.0)
}

/// Roll crit and build the payload a damaging effect carries
pub(crate) fn roll_payload(world: &mut World, caster: EntityId, def: &SkillDef) -> Option<DamagePayload> {
    let (multiplier, formula) = def.effect.damage_terms()?;
    let entity = world.entity(caster)?;
    let stats = entity.stats();
    let base = base_damage(entity, formula);

    let critical = world.roll() < stats.crit_rate;
    let crit_multiplier = if critical { stats.crit_damage } else { 1.0 };
    Some(DamagePayload {
        raw: base * multiplier * crit_multiplier,
        critical,
        accuracy: stats.accuracy,
        knockback: def.knockback.max(0.0),
    })
}

/// Resolve one hit: accuracy roll, mitigation, knockback, damage.
/// Returns false on a miss or an invalid target.
pub(crate) fn strike(
    world: &mut World,
    catalog: &Catalog,
    source: EntityId,
    target: EntityId,
    payload: &DamagePayload,
    from: Vec2,
) -> bool {
    let Some(victim) = world.entity(target).filter(|e| e.alive) else {
        return false;
    };
    let stats = victim.stats();
    let chance = hit_chance(payload.accuracy, stats.evasion, world.tuning.min_hit_chance);
    if chance < 1.0 && world.roll() >= chance {
        world.push_event(Event::AttackMissed { source, target });
        return false;
    }

    let amount = mitigate(payload.raw, stats.defense);
    if payload.knockback > 0.0 {
        let duration_ms = world.tuning.knockback_duration_ms;
        if let Some(victim) = world.entity_mut(target) {
            let push = victim.position - from;
            let dir = if push.length_squared() > 1e-8 { push.normalize() } else { -victim.facing_dir() };
            victim.knockback = Some(Knockback { velocity: dir * payload.knockback, remaining_ms: duration_ms });
            victim.cancel_action();
        }
    }
    world.deal_damage(catalog, source, target, amount, payload.critical);
    true
}

/// Advance every in-flight cast and fire effects at the Windup boundary
pub(crate) fn resolve_phases(world: &mut World, catalog: &Catalog) {
    let execution_ms = world.tuning.execution_ms.max(0.0);
    let recovery_ms = world.tuning.recovery_ms.max(0.0);
    let casting: Vec<EntityId> = world.entities.iter().filter(|e| e.alive && e.cast.is_some()).map(|e| e.id).collect();

    for id in casting {
        let now_ms = world.time_ms;
        let Some(entity) = world.entity(id) else {
            continue;
        };
        let Some(cast) = entity.cast else {
            continue;
        };
        let elapsed_ms = (now_ms - entity.phase_start_ms).max(0.0) as f32;

        if !cast.effect_applied && elapsed_ms >= cast.cast_time_ms {
            if let Some(active) = world.entity_mut(id).and_then(|e| e.cast.as_mut()) {
                active.effect_applied = true;
            }
            execute(world, catalog, id, cast);
        }

        let phase = phase_at(elapsed_ms, cast.cast_time_ms, execution_ms, recovery_ms);
        if let Some(entity) = world.entity_mut(id).filter(|e| e.cast.is_some()) {
            entity.phase = phase;
            if phase == Phase::Idle {
                entity.cast = None;
            }
        }
    }
}

fn face_toward(entity: &mut Entity, point: Vec2) {
    let dir = point - entity.position;
    if dir.length_squared() > 1e-8 && dir.is_finite() {
        entity.facing = angle_of(dir);
    }
}

/// Apply a cast's effect
fn execute(world: &mut World, catalog: &Catalog, caster_id: EntityId, cast: ActiveCast) {
    let Some(def) = catalog.skill(cast.skill) else {
        log::warn!("cast references unknown skill {:?}", cast.skill);
        return;
    };
    let aim_point = match cast.aim {
        Aim::Entity(target) => world.entity(target).filter(|t| t.alive).map(|t| t.position),
        Aim::Point(point) => Some(point),
    };
    let Some(caster) = world.entity_mut(caster_id) else {
        return;
    };
    // Facing is re-derived from caster -> target at the moment of impact
    if let Some(point) = aim_point {
        face_toward(caster, point);
    }
    let origin = caster.position;
    let facing = caster.facing_dir();
    let side = caster.side();
    let radius = caster.radius;

    let targets_within = |world: &World, reach: f32| -> Vec<EntityId> {
        world
            .entities
            .iter()
            .filter(|e| e.alive && e.side() == side.opposing() && distance(origin, e.position) <= reach)
            .map(|e| e.id)
            .collect()
    };

    match &def.effect {
        SkillEffect::Melee { arc_width_deg, .. } => {
            let cone = Cone::from_arc_deg(origin, facing, *arc_width_deg, def.range.max(0.0));
            let targets: Vec<EntityId> = world
                .entities
                .iter()
                .filter(|e| e.alive && e.side() == side.opposing() && cone.contains_point(e.position))
                .map(|e| e.id)
                .collect();
            for target in targets {
                if let Some(payload) = roll_payload(world, caster_id, def) {
                    strike(world, catalog, caster_id, target, &payload, origin);
                }
            }
        }
        SkillEffect::AreaDamage { .. } => {
            for target in targets_within(&*world, def.range.max(0.0)) {
                if let Some(payload) = roll_payload(world, caster_id, def) {
                    strike(world, catalog, caster_id, target, &payload, origin);
                }
            }
        }
        SkillEffect::Ranged { projectile, .. } => {
            let Some(payload) = roll_payload(world, caster_id, def) else {
                return;
            };
            let homing_target = match cast.aim {
                Aim::Entity(target) if projectile.homing && aim_point.is_some() => Some(target),
                _ => None,
            };
            let hazard_id = world.next_hazard_id();
            let start = origin + facing * (radius + projectile.size);
            world.hazards.push(Hazard {
                id: hazard_id,
                owner: caster_id,
                side,
                skill: def.id,
                position: start,
                velocity: facing * projectile.speed.max(0.0),
                radius: projectile.size.max(0.0),
                payload,
                travelled: 0.0,
                max_travel: def.range.max(0.0),
                homing_target,
                piercing: projectile.piercing,
                hits: Vec::new(),
                spent: false,
            });
            world.push_event(Event::HazardSpawned { owner: caster_id, hazard_id });
        }
        SkillEffect::Heal { amount } => {
            if let Some(caster) = world.entity_mut(caster_id) {
                let before = caster.hp.current;
                caster.hp = caster.hp.restore(*amount);
                let healed = caster.hp.current - before;
                world.push_event(Event::Healed { entity_id: caster_id, amount: healed });
            }
        }
        SkillEffect::Buff(spec) => {
            let source = BuffSource::Skill(def.id);
            let applied = world.entity_mut(caster_id).is_some_and(|c| c.buffs.apply(source, *spec));
            if applied {
                world.push_event(Event::BuffApplied { entity_id: caster_id, buff_id: source });
            }
        }
        SkillEffect::Debuff(spec) => {
            let source = BuffSource::Skill(def.id);
            let debuff = spec.as_debuff();
            for target in targets_within(&*world, def.range.max(0.0)) {
                let applied = world.entity_mut(target).is_some_and(|v| v.buffs.apply(source, debuff));
                if applied {
                    world.push_event(Event::BuffApplied { entity_id: target, buff_id: source });
                }
            }
        }
    }
}
