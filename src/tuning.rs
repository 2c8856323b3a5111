//! Balance tuning
//!
//! Every empirically chosen constant the engine uses lives here as a named,
//! overridable field. Tuning is plain data: load it from JSON, tweak it, and
//! hand it to `World::new`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Encounter difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Maximum live hostiles for this preset
    pub fn population_cap(&self) -> usize {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Normal => 3,
            Difficulty::Hard => 5,
        }
    }

    /// Delay before a dead hostile returns (ms)
    pub fn respawn_delay_ms(&self) -> f32 {
        match self {
            Difficulty::Easy => 8000.0,
            Difficulty::Normal => 5000.0,
            Difficulty::Hard => 3000.0,
        }
    }
}

/// Respawn gating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnTuning {
    /// Whether dead hostiles come back at all
    pub enabled: bool,
    /// Countdown started at death (ms)
    pub delay_ms: f32,
    /// Respawn only while fewer than this many hostiles are alive
    pub population_cap: usize,
}

impl Default for RespawnTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: Difficulty::Normal.respawn_delay_ms(),
            population_cap: Difficulty::Normal.population_cap(),
        }
    }
}

/// Engine-wide tuning values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Resources ===
    /// HP regenerated per second by every live entity
    pub hp_regen_per_sec: f32,
    /// SP regenerated per second by every live entity
    pub sp_regen_per_sec: f32,

    // === Skill timing ===
    /// Length of the Execution phase (ms)
    pub execution_ms: f32,
    /// Post-action Recovery window (ms)
    pub recovery_ms: f32,

    // === AI ===
    /// Range multiplier for staying in Attack once entered
    pub attack_hysteresis: f32,

    // === Knockback ===
    /// How long a knockback suppresses movement and AI (ms)
    pub knockback_duration_ms: f32,
    /// Velocity multiplier applied every tick while knocked back
    pub knockback_friction: f32,

    // === Hazards ===
    /// Maximum steering rate for homing hazards (radians/sec)
    pub homing_turn_rate: f32,

    // === Arena ===
    /// Arena size; valid positions are [0, size.x] x [0, size.y]
    pub arena_size: Vec2,
    /// Collision radius for entities
    pub entity_radius: f32,

    // === Combat ===
    /// Floor for accuracy-vs-evasion hit chance
    pub min_hit_chance: f32,

    // === Spawning ===
    /// Hostiles created when the world starts
    pub initial_hostiles: usize,
    /// Closest a hostile may spawn to the controlled entity
    pub spawn_min_distance: f32,
    /// Farthest a hostile may spawn from the controlled entity
    pub spawn_max_distance: f32,
    pub respawn: RespawnTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            hp_regen_per_sec: 1.0,
            sp_regen_per_sec: 5.0,

            execution_ms: 100.0,
            recovery_ms: 250.0,

            attack_hysteresis: 1.3,

            knockback_duration_ms: 200.0,
            knockback_friction: 0.85,

            homing_turn_rate: 4.0,

            arena_size: Vec2::new(1600.0, 1200.0),
            entity_radius: crate::consts::ENTITY_RADIUS,

            min_hit_chance: 0.05,

            initial_hostiles: 3,
            spawn_min_distance: 250.0,
            spawn_max_distance: 450.0,
            respawn: RespawnTuning::default(),
        }
    }
}

impl Tuning {
    /// Create tuning from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut tuning = Self::default();
        tuning.apply_difficulty(difficulty);
        tuning
    }

    /// Apply a difficulty preset (updates encounter-size settings)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.respawn.population_cap = difficulty.population_cap();
        self.respawn.delay_ms = difficulty.respawn_delay_ms();
        self.initial_hostiles = difficulty.population_cap();
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Arena center point
    pub fn arena_center(&self) -> Vec2 {
        self.arena_size * 0.5
    }

    /// Check if a position lies inside the arena
    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.is_finite()
            && pos.x >= 0.0
            && pos.y >= 0.0
            && pos.x <= self.arena_size.x
            && pos.y <= self.arena_size.y
    }

    /// Clamp a position into the arena
    pub fn clamp_to_arena(&self, pos: Vec2) -> Vec2 {
        if !pos.is_finite() {
            return self.arena_center();
        }
        pos.clamp(Vec2::ZERO, self.arena_size)
    }
}
