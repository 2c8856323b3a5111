//! Spawn/respawn controller
//!
//! Initial hostiles are drawn from the archetype pool by spawn weight. Dead
//! hostiles come back from their own archetype snapshot once their timer
//! runs out, but only while the live population is under the cap.

use glam::Vec2;
use rand::Rng;

use super::buffs::BuffLedger;
use super::leveling::{LevelStats, stats_for_level};
use super::resources::{Cooldowns, Pool, tick_cooldown};
use super::state::{CombatStats, Engagement, Entity, EntityId, Event, Hostile, Loadout, Phase, Role, World};
use crate::catalog::{ArchetypeDef, Catalog};
use crate::polar_to_cartesian;

/// Pick an index with probability proportional to its weight.
///
/// Draws `u * total`, then walks the pool subtracting weights until the
/// remainder is <= 0. Non-positive or non-finite weights are never picked
/// unless every weight is; the last candidate is the fallback.
pub fn select_weighted<T, R: Rng>(candidates: &[T], weight: impl Fn(&T) -> f32, rng: &mut R) -> Option<usize> {
    let last = candidates.len().checked_sub(1)?;
    let clean = |c: &T| {
        let w = weight(c);
        if w.is_finite() && w > 0.0 { w } else { 0.0 }
    };
    let total: f32 = candidates.iter().map(clean).sum();
    if total <= 0.0 {
        return Some(last);
    }

    let mut remainder = rng.random::<f32>() * total;
    for (index, candidate) in candidates.iter().enumerate() {
        let w = clean(candidate);
        if w <= 0.0 {
            continue;
        }
        remainder -= w;
        if remainder <= 0.0 {
            return Some(index);
        }
    }
    Some(last)
}

/// Fill the world with `tuning.initial_hostiles` weighted picks
pub fn populate_initial(world: &mut World, catalog: &Catalog) {
    for _ in 0..world.tuning.initial_hostiles {
        let Some(index) = select_weighted(&catalog.archetypes, |a| a.spawn_weight, world.rng_mut()) else {
            log::warn!("no archetypes to spawn");
            return;
        };
        spawn_hostile(world, catalog, index);
    }
}

/// Materialize a new hostile from the archetype at `index`
pub fn spawn_hostile(world: &mut World, catalog: &Catalog, index: usize) -> Option<EntityId> {
    let archetype = catalog.archetype(index)?.clone();
    let id = world.next_entity_id();
    let position = spawn_position(world);
    let level = spawn_level(world);
    let stats = varied_stats(world, &archetype, level);

    log::info!("Spawned {} ({:?}) at level {}", archetype.name, id, level);
    world.entities.push(Entity {
        id,
        name: archetype.name.clone(),
        position,
        facing: 0.0,
        radius: world.tuning.entity_radius,
        hp: Pool::full(stats.hp),
        sp: Pool::full(stats.sp),
        base: CombatStats::new(&stats, &archetype.combat),
        alive: true,
        level,
        buffs: BuffLedger::default(),
        loadout: Loadout::new(archetype.basic_attack, &archetype.skills),
        cooldowns: Cooldowns::default(),
        phase: Phase::Idle,
        phase_start_ms: world.time_ms,
        cast: None,
        knockback: None,
        role: Role::Hostile(Box::new(Hostile {
            archetype,
            engagement: Engagement::Chase,
            attack_skill: None,
            respawn_timer_ms: None,
        })),
    });
    Some(id)
}

/// Count down respawn timers and bring back hostiles under the cap
pub(crate) fn process_respawns(world: &mut World, dt_ms: f32) {
    let respawn = world.tuning.respawn.clone();
    if !respawn.enabled {
        return;
    }

    for index in 0..world.entities.len() {
        let Some(remaining) = world.entities[index].hostile().and_then(|h| h.respawn_timer_ms) else {
            continue;
        };
        if world.entities[index].alive {
            continue;
        }
        // Paused while the population is full
        if world.live_hostile_count() >= respawn.population_cap {
            continue;
        }

        let remaining = tick_cooldown(remaining, dt_ms);
        if remaining > 0.0 {
            if let Some(hostile) = world.entities[index].hostile_mut() {
                hostile.respawn_timer_ms = Some(remaining);
            }
            continue;
        }
        respawn_at(world, index);
    }
}

/// Rebuild a dead hostile in place from its archetype snapshot
fn respawn_at(world: &mut World, index: usize) {
    let Some(archetype) = world.entities[index].hostile().map(|h| h.archetype.clone()) else {
        return;
    };
    let position = spawn_position(world);
    let level = spawn_level(world);
    let stats = varied_stats(world, &archetype, level);
    let now_ms = world.time_ms;

    let entity = &mut world.entities[index];
    entity.position = position;
    entity.facing = 0.0;
    entity.base = CombatStats::new(&stats, &archetype.combat);
    entity.set_level_stats(&stats, true);
    entity.level = level;
    entity.alive = true;
    entity.buffs.clear();
    entity.cooldowns.clear();
    entity.cancel_action();
    entity.phase_start_ms = now_ms;
    entity.knockback = None;
    if let Some(hostile) = entity.hostile_mut() {
        hostile.engagement = Engagement::Chase;
        hostile.attack_skill = None;
        hostile.respawn_timer_ms = None;
    }
    let id = entity.id;
    log::info!("{} ({:?}) respawned at level {}", archetype.name, id, level);
    world.push_event(Event::EntityRespawned { id });
}

/// Hostiles track the controlled entity's level
fn spawn_level(world: &World) -> u32 {
    world.entity(world.controlled).map(|e| e.level).unwrap_or(1)
}

/// A random point on the spawn ring around the controlled entity
fn spawn_position(world: &mut World) -> Vec2 {
    let center = world.entity(world.controlled).map(|e| e.position).unwrap_or(world.tuning.arena_center());
    let min = world.tuning.spawn_min_distance.max(0.0);
    let max = world.tuning.spawn_max_distance.max(min);
    let theta = world.roll() * std::f32::consts::TAU;
    let r = min + world.roll() * (max - min);
    world.tuning.clamp_to_arena(center + polar_to_cartesian(r, theta))
}

/// Level stats scaled by `1 +/- stat_variance`
fn varied_stats(world: &mut World, archetype: &ArchetypeDef, level: u32) -> LevelStats {
    let mut stats = stats_for_level(&archetype.curve, level);
    let variance = if archetype.stat_variance.is_finite() { archetype.stat_variance.clamp(0.0, 0.9) } else { 0.0 };
    let factor = 1.0 + (world.roll() * 2.0 - 1.0) * variance;
    stats.hp = (stats.hp * factor).max(1.0);
    stats.attack *= factor;
    stats.defense *= factor;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::testing::quiet_tuning;
    use crate::sim::tick::step;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_weighted_selection_frequency() {
        let mut rng = Pcg32::seed_from_u64(42);
        let weights = [1.0f32, 3.0];
        let trials = 10_000;
        let picks = (0..trials)
            .filter(|_| select_weighted(&weights, |w| *w, &mut rng) == Some(1))
            .count();
        let freq = picks as f32 / trials as f32;
        assert!((freq - 0.75).abs() <= 0.02, "second candidate picked {freq}");
    }

    #[test]
    fn test_weighted_selection_edges() {
        let mut rng = Pcg32::seed_from_u64(1);
        let empty: [f32; 0] = [];
        assert_eq!(select_weighted(&empty, |w| *w, &mut rng), None);
        // Zero weights are skipped; all-zero falls back to the last
        for _ in 0..100 {
            assert_eq!(select_weighted(&[0.0f32, 2.0, 0.0], |w| *w, &mut rng), Some(1));
        }
        assert_eq!(select_weighted(&[0.0f32, f32::NAN], |w| *w, &mut rng), Some(1));
    }

    #[test]
    fn test_spawn_on_ring_at_player_level() {
        let catalog = Catalog::demo();
        let mut world = World::empty(3, &catalog, quiet_tuning());
        world.entity_mut(world.controlled).expect("player").level = 4;
        let id = spawn_hostile(&mut world, &catalog, 2).expect("spawned");

        let center = world.tuning.arena_center();
        let hostile = world.entity(id).expect("hostile");
        let d = hostile.position.distance(center);
        assert!(d >= world.tuning.spawn_min_distance - 1e-3 && d <= world.tuning.spawn_max_distance + 1e-3);
        assert_eq!(hostile.level, 4);
        assert_eq!(hostile.name, "Brute");
        assert!(hostile.hp.is_full());
        assert_eq!(hostile.hostile().map(|h| h.engagement), Some(Engagement::Chase));
    }

    #[test]
    fn test_respawn_waits_for_population_cap() {
        let catalog = Catalog::demo();
        let mut tuning = quiet_tuning();
        tuning.respawn.enabled = true;
        tuning.respawn.population_cap = 3;
        tuning.respawn.delay_ms = 500.0;
        let mut world = World::empty(11, &catalog, tuning);
        let ids: Vec<EntityId> = (0..4).filter_map(|_| spawn_hostile(&mut world, &catalog, 0)).collect();
        for &id in &ids {
            crate::sim::testing::pacify(&mut world, id);
        }
        let player = world.controlled;

        // Four alive, one dies: three remain, which is the cap
        world.deal_damage(&catalog, player, ids[0], 100_000, false);
        for _ in 0..120 {
            let events = step(&mut world, &catalog, SIM_DT);
            assert!(!events.iter().any(|e| matches!(e, Event::EntityRespawned { .. })));
        }
        assert_eq!(world.live_hostile_count(), 3);
        let timer = world.entity(ids[0]).and_then(|e| e.hostile()).and_then(|h| h.respawn_timer_ms);
        assert_eq!(timer, Some(500.0));

        // A second death drops below the cap and the first timer starts running
        world.deal_damage(&catalog, player, ids[1], 100_000, false);
        let mut respawned = Vec::new();
        for _ in 0..60 {
            for event in step(&mut world, &catalog, SIM_DT) {
                if let Event::EntityRespawned { id } = event {
                    respawned.push(id);
                }
            }
        }
        // Only one comes back; that refills the cap and pauses the other
        assert_eq!(respawned.len(), 1);
        assert_eq!(world.live_hostile_count(), 3);
        let back = world.entity(respawned[0]).expect("respawned");
        assert!(back.alive && back.hp.is_full());
        assert_eq!(back.hostile().map(|h| h.engagement), Some(Engagement::Chase));
    }

    #[test]
    fn test_respawn_disabled() {
        let catalog = Catalog::demo();
        let mut world = World::empty(5, &catalog, quiet_tuning());
        let id = spawn_hostile(&mut world, &catalog, 1).expect("spawned");
        let player = world.controlled;
        world.deal_damage(&catalog, player, id, 100_000, false);
        for _ in 0..600 {
            step(&mut world, &catalog, SIM_DT);
        }
        assert!(!world.entity(id).expect("hostile").alive);
    }
}
