//! World state and core simulation types
//!
//! Everything a tick reads or writes lives in `World`: entities in id order,
//! live hazards, the simulated clock, and the single RNG stream.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::buffs::{BuffLedger, BuffSource};
use super::hazards::Hazard;
use super::leveling::{LevelStats, Progression, add_experience, stats_for_level};
use super::resources::{Cooldowns, Pool};
use crate::catalog::{ArchetypeDef, Catalog, CombatProfile, ItemId, ItemStack, SkillId, StatKind};
use crate::consts::{ITEM_SLOTS, SKILL_SLOTS};
use crate::tuning::Tuning;

/// Stable entity identifier (allocation order == iteration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

/// Which team an entity fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Controlled,
    Hostile,
}

impl Side {
    pub fn opposing(self) -> Self {
        match self {
            Side::Controlled => Side::Hostile,
            Side::Hostile => Side::Controlled,
        }
    }
}

/// Combat stats outside the hp/sp pools
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub attack: f32,
    pub defense: f32,
    pub move_speed: f32,
    pub crit_rate: f32,
    pub crit_damage: f32,
    pub accuracy: f32,
    pub evasion: f32,
}

impl CombatStats {
    pub fn new(level: &LevelStats, profile: &CombatProfile) -> Self {
        Self {
            attack: level.attack,
            defense: level.defense,
            move_speed: level.speed,
            crit_rate: profile.crit_rate.clamp(0.0, 1.0),
            crit_damage: profile.crit_damage.max(1.0),
            accuracy: profile.accuracy,
            evasion: profile.evasion,
        }
    }
}

/// Progress through a skill's timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Windup,
    Execution,
    Recovery,
}

/// Where a cast is directed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Aim {
    Entity(EntityId),
    Point(Vec2),
}

/// The skill an entity is currently performing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveCast {
    pub skill: SkillId,
    pub aim: Aim,
    pub cast_time_ms: f32,
    /// Set once the effect has landed at the Windup->Execution boundary
    pub effect_applied: bool,
}

/// Decaying displacement that overrides movement and AI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    pub velocity: Vec2,
    pub remaining_ms: f32,
}

/// Basic attack plus up to `SKILL_SLOTS` skills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub basic_attack: SkillId,
    pub slots: [Option<SkillId>; SKILL_SLOTS],
}

impl Loadout {
    /// Fill slots in order. `Catalog::validate` rejects lists longer than the slots.
    pub fn new(basic_attack: SkillId, skills: &[SkillId]) -> Self {
        let mut slots = [None; SKILL_SLOTS];
        for (slot, &id) in slots.iter_mut().zip(skills) {
            *slot = Some(id);
        }
        Self { basic_attack, slots }
    }

    pub fn slot(&self, index: usize) -> Option<SkillId> {
        self.slots.get(index).copied().flatten()
    }

    pub fn contains(&self, skill: SkillId) -> bool {
        self.basic_attack == skill || self.slots.contains(&Some(skill))
    }
}

/// Hostile behavioral mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Engagement {
    #[default]
    Chase,
    Attack,
    Flee,
    Defend,
    Idle,
}

/// State only the controlled entity carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub progress: Progression,
    /// Normalized movement input (zero = stand still)
    pub move_dir: Vec2,
    pub inventory: Vec<Option<ItemStack>>,
}

/// State only hostile entities carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hostile {
    /// Snapshot used to rebuild the entity on respawn
    pub archetype: ArchetypeDef,
    pub engagement: Engagement,
    /// Skill bound by the rule that put this hostile in Attack
    pub attack_skill: Option<SkillId>,
    /// Counts down only while dead
    pub respawn_timer_ms: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Controlled(Controller),
    Hostile(Box<Hostile>),
}

/// A combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub position: Vec2,
    /// Facing angle (radians)
    pub facing: f32,
    pub radius: f32,
    pub hp: Pool,
    pub sp: Pool,
    /// Stats before buffs
    pub base: CombatStats,
    pub alive: bool,
    pub level: u32,
    pub buffs: BuffLedger,
    pub loadout: Loadout,
    pub cooldowns: Cooldowns,
    pub phase: Phase,
    pub phase_start_ms: f64,
    pub cast: Option<ActiveCast>,
    pub knockback: Option<Knockback>,
    pub role: Role,
}

impl Entity {
    pub fn side(&self) -> Side {
        match self.role {
            Role::Controlled(_) => Side::Controlled,
            Role::Hostile(_) => Side::Hostile,
        }
    }

    /// Stats with active buffs applied
    pub fn stats(&self) -> CombatStats {
        self.buffs.apply_to(&self.base)
    }

    /// Value a damage formula reads
    pub fn stat_value(&self, stat: StatKind) -> f32 {
        let stats = self.stats();
        match stat {
            StatKind::Attack => stats.attack,
            StatKind::Defense => stats.defense,
            StatKind::MaxHp => self.hp.max,
            StatKind::MaxSp => self.sp.max,
            StatKind::MoveSpeed => stats.move_speed,
        }
    }

    /// Mid-way through Windup, Execution or Recovery
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Windup and Execution root the entity in place
    pub fn is_rooted(&self) -> bool {
        matches!(self.phase, Phase::Windup | Phase::Execution)
    }

    pub fn is_knocked_back(&self) -> bool {
        self.knockback.is_some()
    }

    pub fn facing_dir(&self) -> Vec2 {
        Vec2::new(self.facing.cos(), self.facing.sin())
    }

    pub fn controller(&self) -> Option<&Controller> {
        match &self.role {
            Role::Controlled(c) => Some(c),
            Role::Hostile(_) => None,
        }
    }

    pub fn controller_mut(&mut self) -> Option<&mut Controller> {
        match &mut self.role {
            Role::Controlled(c) => Some(c),
            Role::Hostile(_) => None,
        }
    }

    pub fn hostile(&self) -> Option<&Hostile> {
        match &self.role {
            Role::Hostile(h) => Some(&**h),
            Role::Controlled(_) => None,
        }
    }

    pub fn hostile_mut(&mut self) -> Option<&mut Hostile> {
        match &mut self.role {
            Role::Hostile(h) => Some(&mut **h),
            Role::Controlled(_) => None,
        }
    }

    /// Drop any in-flight action
    pub fn cancel_action(&mut self) {
        self.cast = None;
        self.phase = Phase::Idle;
    }

    /// Overwrite level-derived stats. Pools are rescaled when `refill` is
    /// false and topped up otherwise.
    pub fn set_level_stats(&mut self, stats: &LevelStats, refill: bool) {
        if refill {
            self.hp = Pool::full(stats.hp);
            self.sp = Pool::full(stats.sp);
        } else {
            self.hp = self.hp.rescale(stats.hp);
            self.sp = self.sp.rescale(stats.sp);
        }
        self.base.attack = stats.attack;
        self.base.defense = stats.defense;
        self.base.move_speed = stats.speed;
    }
}

/// Discrete things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Event {
    DamageDealt { source: EntityId, target: EntityId, amount: u32, critical: bool },
    AttackMissed { source: EntityId, target: EntityId },
    Healed { entity_id: EntityId, amount: f32 },
    EntityDied { id: EntityId },
    EntityRespawned { id: EntityId },
    LevelUp { entity_id: EntityId, new_level: u32 },
    BuffApplied { entity_id: EntityId, buff_id: BuffSource },
    BuffExpired { entity_id: EntityId, buff_id: BuffSource },
    SkillUsed { entity_id: EntityId, skill_id: SkillId },
    ItemUsed { entity_id: EntityId, item_id: ItemId },
    HazardSpawned { owner: EntityId, hazard_id: u32 },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    /// Seed for reproducibility
    pub seed: u64,
    /// Simulated clock (ms since start)
    pub time_ms: f64,
    /// Steps taken so far
    pub tick: u64,
    /// Entities sorted by id
    pub entities: Vec<Entity>,
    pub hazards: Vec<Hazard>,
    pub tuning: Tuning,
    /// The entity that accepts commands
    pub controlled: EntityId,
    rng: Pcg32,
    next_id: u32,
    events: Vec<Event>,
}

impl World {
    /// Create a world with the controlled character at the arena center and
    /// the initial hostile population around it
    pub fn new(seed: u64, catalog: &Catalog, tuning: Tuning) -> Self {
        let mut world = Self::empty(seed, catalog, tuning);
        super::spawn::populate_initial(&mut world, catalog);
        world
    }

    /// A world holding only the controlled character
    pub fn empty(seed: u64, catalog: &Catalog, tuning: Tuning) -> Self {
        let mut world = Self {
            seed,
            time_ms: 0.0,
            tick: 0,
            entities: Vec::new(),
            hazards: Vec::new(),
            tuning,
            controlled: EntityId(0),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            events: Vec::new(),
        };

        let player = &catalog.player;
        let progress = Progression::default();
        let level = stats_for_level(&player.curve, progress.level);
        let mut inventory: Vec<Option<ItemStack>> =
            player.inventory.iter().take(ITEM_SLOTS).map(|s| Some(*s)).collect();
        inventory.resize(ITEM_SLOTS, None);

        let id = world.next_entity_id();
        world.controlled = id;
        world.entities.push(Entity {
            id,
            name: player.name.clone(),
            position: world.tuning.arena_center(),
            facing: 0.0,
            radius: world.tuning.entity_radius,
            hp: Pool::full(level.hp),
            sp: Pool::full(level.sp),
            base: CombatStats::new(&level, &player.combat),
            alive: true,
            level: progress.level,
            buffs: BuffLedger::default(),
            loadout: Loadout::new(player.basic_attack, &player.skills),
            cooldowns: Cooldowns::default(),
            phase: Phase::Idle,
            phase_start_ms: 0.0,
            cast: None,
            knockback: None,
            role: Role::Controlled(Controller { progress, move_dir: Vec2::ZERO, inventory }),
        });

        world
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Allocate a new hazard ID (shares the entity counter)
    pub(crate) fn next_hazard_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(|i| &mut self.entities[i])
    }

    /// The controlled entity if it is still alive
    pub fn controlled_alive(&self) -> Option<&Entity> {
        self.entity(self.controlled).filter(|e| e.alive)
    }

    pub fn live_hostile_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alive && e.side() == Side::Hostile).count()
    }

    /// Closest live entity on `side` to `point`
    pub fn nearest_live(&self, point: Vec2, side: Side) -> Option<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.alive && e.side() == side)
            .min_by(|a, b| {
                a.position
                    .distance_squared(point)
                    .partial_cmp(&b.position.distance_squared(point))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Uniform draw in [0, 1) from the world stream
    pub fn roll(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Drain everything emitted since the last drain
    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Apply already-mitigated damage and handle death
    pub(crate) fn deal_damage(
        &mut self,
        catalog: &Catalog,
        source: EntityId,
        target: EntityId,
        amount: u32,
        critical: bool,
    ) {
        let Some(entity) = self.entity_mut(target) else {
            return;
        };
        if !entity.alive {
            return;
        }
        entity.hp = entity.hp.deplete(amount as f32);
        let died = entity.hp.is_empty();
        self.push_event(Event::DamageDealt { source, target, amount, critical });
        if died {
            self.kill(catalog, source, target);
        }
    }

    fn kill(&mut self, catalog: &Catalog, killer: EntityId, id: EntityId) {
        let delay_ms = self.tuning.respawn.delay_ms;
        let Some(entity) = self.entity_mut(id) else {
            return;
        };
        entity.alive = false;
        entity.hp = Pool::new(0.0, entity.hp.max);
        entity.cancel_action();
        entity.knockback = None;
        entity.buffs.clear();

        let mut reward = 0;
        if let Some(hostile) = entity.hostile_mut() {
            hostile.engagement = Engagement::Idle;
            hostile.attack_skill = None;
            hostile.respawn_timer_ms = Some(delay_ms.max(0.0));
            reward = hostile.archetype.exp_reward;
        }
        log::info!("{} ({:?}) died", entity.name, id);
        self.push_event(Event::EntityDied { id });

        if killer == self.controlled && reward > 0 {
            self.grant_experience(catalog, reward);
        }
    }

    /// Bank experience on the controlled entity, applying any level-ups
    pub fn grant_experience(&mut self, catalog: &Catalog, amount: u64) {
        let curve = &catalog.player.curve;
        let controlled = self.controlled;
        let Some(entity) = self.entity_mut(controlled).filter(|e| e.alive) else {
            return;
        };
        let Some(progress) = entity.controller().map(|c| c.progress) else {
            return;
        };

        let gain = add_experience(curve, progress, amount);
        if let Some(controller) = entity.controller_mut() {
            controller.progress = gain.progress;
        }
        if !gain.leveled_up {
            return;
        }

        let stats = stats_for_level(curve, gain.progress.level);
        entity.set_level_stats(&stats, false);
        entity.level = gain.progress.level;
        log::info!("{} reached level {}", entity.name, entity.level);
        self.push_event(Event::LevelUp { entity_id: controlled, new_level: gain.progress.level });
    }
}
