//! Resource pools and cooldown timers
//!
//! Pools are value types: every operation returns a new pool and never
//! leaves `current` outside [0, max].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::SkillId;
use crate::error::UseRejection;

/// A regenerating/depleting numeric pool (hp or sp)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub current: f32,
    pub max: f32,
}

impl Pool {
    /// A pool filled to `max`
    pub fn full(max: f32) -> Self {
        let max = sanitize(max);
        Self { current: max, max }
    }

    pub fn new(current: f32, max: f32) -> Self {
        let max = sanitize(max);
        Self { current: sanitize(current).min(max), max }
    }

    /// Fraction of max currently held (0 for an empty-capacity pool)
    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 { 0.0 } else { self.current / self.max }
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Move toward max at `rate_per_sec`
    pub fn regenerate(self, rate_per_sec: f32, dt: f32) -> Self {
        self.restore(sanitize(rate_per_sec) * sanitize(dt))
    }

    /// Spend `amount`, failing without change if not enough is held
    pub fn consume(self, amount: f32) -> Result<Self, UseRejection> {
        let amount = sanitize(amount);
        if amount > self.current {
            return Err(UseRejection::InsufficientResource { needed: amount, available: self.current });
        }
        Ok(Self { current: (self.current - amount).max(0.0), max: self.max })
    }

    /// Add up to max
    pub fn restore(self, amount: f32) -> Self {
        Self { current: (self.current + sanitize(amount)).min(self.max), max: self.max }
    }

    /// Remove down to zero
    pub fn deplete(self, amount: f32) -> Self {
        Self { current: (self.current - sanitize(amount)).max(0.0), max: self.max }
    }

    /// Change capacity, keeping the current/max ratio
    pub fn rescale(self, new_max: f32) -> Self {
        let new_max = sanitize(new_max);
        Self { current: (self.ratio() * new_max).clamp(0.0, new_max), max: new_max }
    }
}

/// Non-finite and negative inputs count as zero
#[inline]
fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Decrease a countdown toward zero
#[inline]
pub fn tick_cooldown(remaining_ms: f32, dt_ms: f32) -> f32 {
    (remaining_ms - sanitize(dt_ms)).max(0.0)
}

/// Per-skill cooldown timers (ms remaining)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    timers: BTreeMap<SkillId, f32>,
}

impl Cooldowns {
    /// Remaining time for a skill (0 when ready)
    pub fn remaining(&self, skill: SkillId) -> f32 {
        self.timers.get(&skill).copied().unwrap_or(0.0)
    }

    pub fn is_ready(&self, skill: SkillId) -> bool {
        self.remaining(skill) <= 0.0
    }

    /// Reset a skill's timer to its full cooldown
    pub fn start(&mut self, skill: SkillId, cooldown_ms: f32) {
        let cooldown_ms = sanitize(cooldown_ms);
        if cooldown_ms > 0.0 {
            self.timers.insert(skill, cooldown_ms);
        } else {
            self.timers.remove(&skill);
        }
    }

    /// Advance every timer; finished timers are dropped
    pub fn tick(&mut self, dt_ms: f32) {
        for remaining in self.timers.values_mut() {
            *remaining = tick_cooldown(*remaining, dt_ms);
        }
        self.timers.retain(|_, remaining| *remaining > 0.0);
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}
