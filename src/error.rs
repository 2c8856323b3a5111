//! Error taxonomy
//!
//! Every failure here is recoverable by the caller. Commands that fail leave
//! the world untouched; the engine rejects bad input rather than panicking.

use thiserror::Error;

use crate::catalog::{ItemId, SkillId};
use crate::sim::state::EntityId;

/// Why a skill cannot be used right now
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum UseRejection {
    #[error("skill on cooldown: {remaining_ms:.0}ms remaining")]
    OnCooldown { remaining_ms: f32 },
    #[error("insufficient resource: need {needed}, have {available}")]
    InsufficientResource { needed: f32, available: f32 },
    #[error("skill is not in the loadout or catalog")]
    InvalidSkill,
}

/// Failure returned by `issue_command`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("insufficient resource: need {needed}, have {available}")]
    InsufficientResource { needed: f32, available: f32 },
    #[error("on cooldown: {remaining_ms:.0}ms remaining")]
    OnCooldown { remaining_ms: f32 },
    #[error("skill slot {slot} does not reference a known skill")]
    InvalidSkillReference { slot: usize },
    #[error("item slot {slot} does not hold a known item")]
    InvalidItemReference { slot: usize },
    #[error("entity {0:?} is unknown, dead, or not commandable")]
    InvalidEntityReference(EntityId),
    #[error("position or direction is not finite")]
    OutOfBounds,
    #[error("entity is mid-action")]
    ActionInProgress,
}

impl CommandError {
    /// Map a usage rejection for the skill bound to `slot`
    pub fn from_rejection(rejection: UseRejection, slot: usize) -> Self {
        match rejection {
            UseRejection::OnCooldown { remaining_ms } => CommandError::OnCooldown { remaining_ms },
            UseRejection::InsufficientResource { needed, available } => {
                CommandError::InsufficientResource { needed, available }
            }
            UseRejection::InvalidSkill => CommandError::InvalidSkillReference { slot },
        }
    }
}

/// Catalog loading and validation failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{owner} references unknown skill {skill:?}")]
    MissingSkill { owner: String, skill: SkillId },
    #[error("{owner} has {skill:?} in the wrong kind of slot")]
    MisplacedSkill { owner: String, skill: SkillId },
    #[error("{owner} lists {count} skills, more than the loadout holds")]
    TooManySkills { owner: String, count: usize },
    #[error("inventory references unknown item {item:?}")]
    MissingItem { item: ItemId },
    #[error("stack of {quantity} {item:?} exceeds its max stack of {max_stack}")]
    StackTooLarge { item: ItemId, quantity: u32, max_stack: u32 },
    #[error("catalog has no hostile archetypes")]
    EmptyArchetypePool,
    #[error("archetype {archetype} has a negative or non-finite spawn weight")]
    InvalidWeight { archetype: String },
}
