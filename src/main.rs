//! Skirmish entry point
//!
//! Runs a headless scripted fight: the controlled entity walks toward the
//! nearest hostile, swings, casts, and drinks potions when hurt. Frames are
//! fed through the same fixed-step accumulator an interactive host would use.
//!
//! Usage: `skirmish [easy|normal|hard|<tuning.json>] [catalog.json]`
//! Set `SKIRMISH_SEED` to replay a run.

use glam::Vec2;

use skirmish::sim::{Command, Event, Side, Stepper, World, issue_command};
use skirmish::{Catalog, Difficulty, Tuning};

/// Simulated run length (seconds)
const RUN_SECONDS: f32 = 60.0;
/// Host frame time; deliberately not a multiple of `SIM_DT`
const FRAME_DT: f32 = 1.0 / 50.0;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Skirmish (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = load_tuning(args.next());
    let catalog = load_catalog(args.next());
    let seed = std::env::var("SKIRMISH_SEED").ok().and_then(|s| s.parse().ok()).unwrap_or_else(clock_seed);

    let mut world = World::new(seed, &catalog, tuning);
    log::info!("World initialized with seed: {} ({} hostiles)", seed, world.live_hostile_count());

    let mut stepper = Stepper::new();
    let mut tally = Tally::default();
    let frames = (RUN_SECONDS / FRAME_DT) as u32;
    for _ in 0..frames {
        drive(&mut world, &catalog);
        for event in stepper.advance(&mut world, &catalog, FRAME_DT) {
            tally.record(&world, &event);
        }
    }

    let level = world.controlled_alive().map(|e| e.level);
    log::info!(
        "Finished after {:.1}s ({} ticks): {} kills, {} deaths, {} damage dealt, {} taken, level {:?}",
        world.time_ms / 1000.0,
        world.tick,
        tally.kills,
        tally.deaths,
        tally.dealt,
        tally.taken,
        level
    );
    println!(
        "seed={} ticks={} kills={} deaths={} dealt={} taken={}",
        seed, world.tick, tally.kills, tally.deaths, tally.dealt, tally.taken
    );
}

fn load_tuning(arg: Option<String>) -> Tuning {
    let Some(arg) = arg else {
        return Tuning::default();
    };
    if let Some(difficulty) = Difficulty::from_str(&arg) {
        log::info!("Using {} difficulty", difficulty.as_str());
        return Tuning::from_difficulty(difficulty);
    }
    match std::fs::read_to_string(&arg) {
        Ok(json) => match Tuning::from_json(&json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Invalid tuning file {}: {}", arg, e);
                Tuning::default()
            }
        },
        Err(e) => {
            log::warn!("Could not read tuning file {}: {}", arg, e);
            Tuning::default()
        }
    }
}

fn load_catalog(arg: Option<String>) -> Catalog {
    let Some(path) = arg else {
        return Catalog::demo();
    };
    let loaded = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| Catalog::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(catalog) => catalog,
        Err(e) => {
            log::warn!("Falling back to the demo catalog ({}): {}", path, e);
            Catalog::demo()
        }
    }
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Scripted input for the controlled entity
fn drive(world: &mut World, catalog: &Catalog) {
    let Some(player) = world.controlled_alive() else {
        return;
    };
    let id = player.id;
    let position = player.position;
    let hurt = player.hp.ratio() < 0.4;
    let target = world.nearest_live(position, Side::Hostile).map(|e| e.position);

    let mut commands = Vec::new();
    if hurt {
        commands.push(Command::UseItem(0));
    }
    match target {
        Some(target) if position.distance(target) > 50.0 => {
            commands.push(Command::MoveInput(target - position));
            commands.push(Command::UseSkill(1));
        }
        Some(target) => {
            commands.push(Command::MoveInput(Vec2::ZERO));
            commands.push(Command::UseSkill(3));
            commands.push(Command::UseSkill(0));
            commands.push(Command::UseBasicAttack(target));
        }
        None => commands.push(Command::MoveInput(Vec2::ZERO)),
    }
    if hurt {
        commands.push(Command::UseSkill(2));
    }

    for command in commands {
        // Rejections (cooldown, busy, empty slot) are routine here
        if let Err(e) = issue_command(world, catalog, id, command) {
            log::trace!("{:?} rejected: {}", command, e);
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    kills: u32,
    deaths: u32,
    dealt: u64,
    taken: u64,
}

impl Tally {
    fn record(&mut self, world: &World, event: &Event) {
        let player = world.controlled;
        match *event {
            Event::DamageDealt { source, amount, .. } if source == player => self.dealt += u64::from(amount),
            Event::DamageDealt { target, amount, .. } if target == player => self.taken += u64::from(amount),
            Event::EntityDied { id } if id == player => {
                self.deaths += 1;
                log::info!("Controlled entity fell at {:.1}s", world.time_ms / 1000.0);
            }
            Event::EntityDied { .. } => self.kills += 1,
            Event::LevelUp { new_level, .. } => log::info!("Reached level {}", new_level),
            _ => log::debug!("{:?}", event),
        }
    }
}
