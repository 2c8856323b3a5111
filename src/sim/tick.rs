//! Fixed timestep simulation tick
//!
//! One call to `step` runs the whole pipeline in a fixed order:
//! 1. controlled entity: resources, buffs, knockback, movement
//! 2. hostiles: resources, buffs, knockback, AI decisions and movement
//! 3. hazards: steering, travel, collision
//! 4. skill phases: Windup/Execution/Recovery transitions and effects
//! 5. respawns
//! 6. drain the tick's events

use super::ai;
use super::hazards;
use super::skills::resolve_phases;
use super::spawn::process_respawns;
use super::state::{Entity, EntityId, Event, Side, World};
use crate::angle_of;
use crate::catalog::Catalog;
use crate::consts::{MAX_STEP_DT, MAX_SUBSTEPS, SIM_DT};
use crate::tuning::Tuning;

/// Advance the world by `dt` seconds and return what happened
pub fn step(world: &mut World, catalog: &Catalog, dt: f32) -> Vec<Event> {
    if !dt.is_finite() || dt < 0.0 {
        log::warn!("ignoring non-finite or negative dt {dt}");
        return world.take_events();
    }
    let dt = dt.min(MAX_STEP_DT);
    let dt_ms = dt * 1000.0;
    world.time_ms += f64::from(dt_ms);
    world.tick += 1;

    // 1. Controlled entity
    let controlled = world.controlled;
    advance_entity(world, controlled, dt);
    move_controlled(world, dt);

    // 2. Hostiles, in id order
    let hostiles: Vec<EntityId> = world.entities.iter().filter(|e| e.side() == Side::Hostile).map(|e| e.id).collect();
    for id in hostiles {
        advance_entity(world, id, dt);
        ai::think(world, catalog, id, dt);
    }

    // 3. Hazards
    hazards::advance(world, catalog, dt);

    // 4. Phase transitions and queued effects
    resolve_phases(world, catalog);

    // 5. Respawns
    process_respawns(world, dt_ms);

    // 6. Events
    world.take_events()
}

/// Regenerate, count down timers, and apply knockback for one entity
fn advance_entity(world: &mut World, id: EntityId, dt: f32) {
    let tuning = &world.tuning;
    let Some(index) = world.index_of(id) else {
        return;
    };
    let entity = &mut world.entities[index];
    if !entity.alive {
        return;
    }
    let expired = tick_vitals(entity, tuning, dt);
    for source in expired {
        log::debug!("{:?} buff {:?} expired", id, source);
        world.push_event(Event::BuffExpired { entity_id: id, buff_id: source });
    }
}

fn tick_vitals(entity: &mut Entity, tuning: &Tuning, dt: f32) -> Vec<super::buffs::BuffSource> {
    let dt_ms = dt * 1000.0;
    entity.hp = entity.hp.regenerate(tuning.hp_regen_per_sec, dt);
    entity.sp = entity.sp.regenerate(tuning.sp_regen_per_sec, dt);
    entity.cooldowns.tick(dt_ms);
    let expired = entity.buffs.tick(dt_ms);

    if let Some(mut knockback) = entity.knockback {
        entity.position = tuning.clamp_to_arena(entity.position + knockback.velocity * dt);
        knockback.velocity *= tuning.knockback_friction.clamp(0.0, 1.0);
        knockback.remaining_ms -= dt_ms;
        entity.knockback = (knockback.remaining_ms > 0.0).then_some(knockback);
    }
    expired
}

/// Walk the controlled entity along its movement input
fn move_controlled(world: &mut World, dt: f32) {
    let controlled = world.controlled;
    let Some(index) = world.index_of(controlled) else {
        return;
    };
    let tuning = &world.tuning;
    let entity = &mut world.entities[index];
    if !entity.alive || entity.is_rooted() || entity.is_knocked_back() {
        return;
    }
    let Some(dir) = entity.controller().map(|c| c.move_dir) else {
        return;
    };
    if dir.length_squared() < 1e-8 {
        return;
    }
    let speed = entity.stats().move_speed;
    entity.position = tuning.clamp_to_arena(entity.position + dir * speed * dt);
    entity.facing = angle_of(dir);
}

/// Accumulates variable frame time into fixed `SIM_DT` steps
#[derive(Debug, Clone, Default)]
pub struct Stepper {
    accumulator: f32,
}

impl Stepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many fixed steps as `frame_dt` pays for (capped at
    /// `MAX_SUBSTEPS`) and return every event they emitted
    pub fn advance(&mut self, world: &mut World, catalog: &Catalog, frame_dt: f32) -> Vec<Event> {
        if !frame_dt.is_finite() || frame_dt < 0.0 {
            return Vec::new();
        }
        self.accumulator += frame_dt.min(0.1);

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            events.extend(step(world, catalog, SIM_DT));
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop time we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        events
    }

    /// Leftover time not yet simulated (seconds)
    pub fn pending(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::command::{Command, issue_command};
    use crate::sim::state::{Knockback, Phase};
    use crate::sim::testing::{pacify, quiet_tuning, test_world};
    use glam::Vec2;
    use proptest::prelude::*;

    #[test]
    fn test_time_advances_and_bad_dt_is_ignored() {
        let catalog = Catalog::demo();
        let (mut world, _, _) = test_world(&catalog);
        step(&mut world, &catalog, 0.1);
        assert!((world.time_ms - 100.0).abs() < 1e-3);
        assert_eq!(world.tick, 1);

        step(&mut world, &catalog, f32::NAN);
        step(&mut world, &catalog, -1.0);
        assert_eq!(world.tick, 1);

        // Oversized steps are clamped
        step(&mut world, &catalog, 10.0);
        assert!((world.time_ms - 350.0).abs() < 1e-3);
    }

    #[test]
    fn test_regen_respects_max() {
        let catalog = Catalog::demo();
        let mut tuning = quiet_tuning();
        tuning.hp_regen_per_sec = 30.0;
        let mut world = World::empty(1, &catalog, tuning);
        let player = world.controlled;
        {
            let entity = world.entity_mut(player).expect("player");
            entity.hp = entity.hp.deplete(20.0);
        }
        step(&mut world, &catalog, 0.5);
        assert_eq!(world.entity(player).expect("player").hp.current, 195.0);
        step(&mut world, &catalog, 0.25);
        assert_eq!(world.entity(player).expect("player").hp.current, 200.0);
    }

    #[test]
    fn test_knockback_suppresses_ai_and_decays() {
        let catalog = Catalog::demo();
        let (mut world, player, hostile) = test_world(&catalog);
        let origin = world.entity(player).expect("player").position;
        {
            let entity = world.entity_mut(hostile).expect("hostile");
            entity.position = origin + Vec2::new(200.0, 0.0);
            entity.knockback = Some(Knockback { velocity: Vec2::new(120.0, 0.0), remaining_ms: 200.0 });
        }

        step(&mut world, &catalog, SIM_DT);
        let entity = world.entity(hostile).expect("hostile");
        // Pushed away instead of chasing
        assert!(entity.position.x > origin.x + 200.0);
        let kb = entity.knockback.expect("still active");
        assert!((kb.velocity.x - 120.0 * world.tuning.knockback_friction).abs() < 1e-3);

        for _ in 0..12 {
            step(&mut world, &catalog, SIM_DT);
        }
        assert!(world.entity(hostile).expect("hostile").knockback.is_none());
    }

    #[test]
    fn test_rooted_while_casting() {
        let catalog = Catalog::demo();
        let (mut world, player, hostile) = test_world(&catalog);
        pacify(&mut world, hostile);
        issue_command(&mut world, &catalog, player, Command::MoveInput(Vec2::Y)).expect("valid");
        issue_command(&mut world, &catalog, player, Command::UseBasicAttack(Vec2::ZERO)).expect("ready");
        let start = world.entity(player).expect("player").position;

        step(&mut world, &catalog, SIM_DT);
        let entity = world.entity(player).expect("player");
        assert_eq!(entity.phase, Phase::Windup);
        assert_eq!(entity.position, start);
    }

    #[test]
    fn test_stepper_runs_fixed_substeps() {
        let catalog = Catalog::demo();
        let (mut world, _, _) = test_world(&catalog);
        let mut stepper = Stepper::new();

        stepper.advance(&mut world, &catalog, SIM_DT * 0.5);
        assert_eq!(world.tick, 0);
        stepper.advance(&mut world, &catalog, SIM_DT * 2.0);
        assert_eq!(world.tick, 2);
        assert!(stepper.pending() < SIM_DT);

        // A long hitch is clamped to 0.1s of catch-up
        stepper.advance(&mut world, &catalog, 5.0);
        assert_eq!(world.tick, 8);
        assert!(world.tick - 2 <= u64::from(MAX_SUBSTEPS));
    }

    #[test]
    fn test_determinism() {
        let catalog = Catalog::demo();
        let script = |world: &mut World, i: usize| {
            let player = world.controlled;
            let _ = match i % 4 {
                0 => issue_command(world, &catalog, player, Command::MoveInput(Vec2::new(1.0, 0.3))),
                1 => issue_command(world, &catalog, player, Command::UseSkill(i % 3)),
                2 => issue_command(world, &catalog, player, Command::UseBasicAttack(Vec2::new(900.0, 500.0))),
                _ => issue_command(world, &catalog, player, Command::MoveInput(Vec2::new(-0.5, 1.0))),
            };
        };

        let mut a = World::new(99_999, &catalog, Tuning::default());
        let mut b = World::new(99_999, &catalog, Tuning::default());
        let mut events_a = Vec::new();
        let mut events_b = Vec::new();
        for i in 0..600 {
            if i % 15 == 0 {
                script(&mut a, i / 15);
                script(&mut b, i / 15);
            }
            events_a.extend(step(&mut a, &catalog, SIM_DT));
            events_b.extend(step(&mut b, &catalog, SIM_DT));
        }

        assert_eq!(events_a, events_b);
        assert_eq!(a.entities, b.entities);
        assert_eq!(a.hazards, b.hazards);
        assert!(!events_a.is_empty());
    }

    fn command_strategy() -> impl Strategy<Value = Command> {
        prop_oneof![
            (-1.0f32..1.0, -1.0f32..1.0).prop_map(|(x, y)| Command::MoveInput(Vec2::new(x, y))),
            (0usize..5).prop_map(Command::UseSkill),
            (0usize..7).prop_map(Command::UseItem),
            (0.0f32..1600.0, 0.0f32..1200.0).prop_map(|(x, y)| Command::UseBasicAttack(Vec2::new(x, y))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_pools_stay_in_range(
            seed in any::<u64>(),
            script in prop::collection::vec((prop::option::of(command_strategy()), 0.0f32..0.1), 1..200),
        ) {
            let catalog = Catalog::demo();
            let mut world = World::new(seed, &catalog, Tuning::default());
            for (command, dt) in script {
                if let Some(command) = command {
                    let player = world.controlled;
                    let _ = issue_command(&mut world, &catalog, player, command);
                }
                step(&mut world, &catalog, dt);
                for entity in &world.entities {
                    prop_assert!(entity.hp.current >= 0.0 && entity.hp.current <= entity.hp.max);
                    prop_assert!(entity.sp.current >= 0.0 && entity.sp.current <= entity.sp.max);
                    prop_assert_eq!(entity.alive, entity.hp.current > 0.0);
                }
            }
        }
    }
}
