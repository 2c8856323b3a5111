//! Projectile/hazard pipeline
//!
//! Hazards move independently of whoever launched them. Each tick they
//! steer (if homing), advance, expire when out of bounds or past their
//! travel budget, and then collide with live entities of the opposing side.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{circles_overlap, steer_toward};
use super::skills::{DamagePayload, strike};
use super::state::{EntityId, Side, World};
use crate::catalog::{Catalog, SkillId};

/// A moving damage-carrying object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub owner: EntityId,
    /// Side of the owner; only the opposing side can be hit
    pub side: Side,
    pub skill: SkillId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub payload: DamagePayload,
    pub travelled: f32,
    pub max_travel: f32,
    pub homing_target: Option<EntityId>,
    pub piercing: bool,
    /// Entities already hit (each at most once)
    pub hits: Vec<EntityId>,
    pub spent: bool,
}

/// Advance and collide every hazard
pub(crate) fn advance(world: &mut World, catalog: &Catalog, dt: f32) {
    let mut hazards = std::mem::take(&mut world.hazards);
    let max_turn = world.tuning.homing_turn_rate.max(0.0) * dt;

    for hazard in &mut hazards {
        if let Some(target) = hazard.homing_target {
            match world.entity(target).filter(|e| e.alive) {
                Some(entity) => {
                    hazard.velocity = steer_toward(hazard.velocity, entity.position - hazard.position, max_turn);
                }
                None => {
                    log::debug!("hazard {} lost homing target {:?}", hazard.id, target);
                    hazard.homing_target = None;
                }
            }
        }

        let delta = hazard.velocity * dt;
        hazard.position += delta;
        hazard.travelled += delta.length();
        if !world.tuning.in_bounds(hazard.position) || hazard.travelled > hazard.max_travel {
            log::debug!("hazard {} expired at {:?}", hazard.id, hazard.position);
            hazard.spent = true;
            continue;
        }

        let victims: Vec<EntityId> = world
            .entities
            .iter()
            .filter(|e| {
                e.alive
                    && e.side() == hazard.side.opposing()
                    && !hazard.hits.contains(&e.id)
                    && circles_overlap(hazard.position, hazard.radius, e.position, e.radius)
            })
            .map(|e| e.id)
            .collect();

        for victim in victims {
            hazard.hits.push(victim);
            strike(world, catalog, hazard.owner, victim, &hazard.payload, hazard.position - hazard.velocity * dt);
            if !hazard.piercing {
                hazard.spent = true;
                break;
            }
        }
    }

    hazards.retain(|h| !h.spent);
    // Anything launched while the list was taken goes after the survivors
    hazards.append(&mut world.hazards);
    world.hazards = hazards;
}
