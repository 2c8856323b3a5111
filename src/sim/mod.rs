//! Deterministic simulation module
//!
//! All combat logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (one `Pcg32` per world)
//! - Stable iteration order (by entity ID)
//! - No rendering, platform, or wall-clock dependencies

pub mod ai;
pub mod buffs;
pub mod command;
pub mod geometry;
pub mod hazards;
pub mod leveling;
pub mod resources;
pub mod skills;
pub mod spawn;
pub mod state;
pub mod tick;

pub use ai::{Intent, Perception, decide};
pub use buffs::{BuffInstance, BuffLedger, BuffSource};
pub use command::{Command, issue_command};
pub use hazards::Hazard;
pub use leveling::{ExperienceGain, LevelStats, Progression, add_experience, exp_to_next, stats_for_level};
pub use resources::{Cooldowns, Pool};
pub use skills::{DamagePayload, begin_use, can_use, hit_chance, mitigate, phase_at};
pub use spawn::{select_weighted, spawn_hostile};
pub use state::{
    ActiveCast, Aim, CombatStats, Controller, Engagement, Entity, EntityId, Event, Hostile, Knockback, Loadout, Phase,
    Role, Side, World,
};
pub use tick::{Stepper, step};
