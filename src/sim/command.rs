//! Commands for the controlled entity
//!
//! Every command is validated in full before anything is written, so a
//! rejected command leaves the world exactly as it was.

use glam::Vec2;

use super::buffs::BuffSource;
use super::skills::{begin_cast, can_use};
use super::state::{Aim, Entity, EntityId, Event, Side, World};
use crate::catalog::{Catalog, ItemEffect, ItemStack};
use crate::error::CommandError;

/// Input accepted by `issue_command`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Movement direction; normalized, zero stops
    MoveInput(Vec2),
    /// Cast the skill in a loadout slot at the nearest hostile
    UseSkill(usize),
    /// Consume one item from an inventory slot
    UseItem(usize),
    /// Basic attack toward a world point
    UseBasicAttack(Vec2),
}

/// Apply a command to the controlled entity
pub fn issue_command(world: &mut World, catalog: &Catalog, id: EntityId, command: Command) -> Result<(), CommandError> {
    let entity = commandable(world, id)?;

    match command {
        Command::MoveInput(dir) => {
            if !dir.is_finite() {
                return Err(CommandError::OutOfBounds);
            }
            if let Some(controller) = world.entity_mut(id).and_then(|e| e.controller_mut()) {
                controller.move_dir = dir.normalize_or_zero();
            }
            Ok(())
        }
        Command::UseSkill(slot) => {
            let skill = entity.loadout.slot(slot).ok_or(CommandError::InvalidSkillReference { slot })?;
            if entity.is_busy() {
                return Err(CommandError::ActionInProgress);
            }
            let def = can_use(entity, catalog, skill).map_err(|r| CommandError::from_rejection(r, slot))?;
            // Auto-aim at the nearest live hostile, else straight ahead
            let aim = match world.nearest_live(entity.position, Side::Hostile) {
                Some(target) => Aim::Entity(target.id),
                None => Aim::Point(entity.position + entity.facing_dir() * def.range.max(1.0)),
            };
            begin_cast(world, catalog, id, skill, aim).map_err(|r| CommandError::from_rejection(r, slot))
        }
        Command::UseBasicAttack(point) => {
            if !point.is_finite() {
                return Err(CommandError::OutOfBounds);
            }
            if entity.is_busy() {
                return Err(CommandError::ActionInProgress);
            }
            let skill = entity.loadout.basic_attack;
            can_use(entity, catalog, skill).map_err(|r| CommandError::from_rejection(r, 0))?;
            begin_cast(world, catalog, id, skill, Aim::Point(point)).map_err(|r| CommandError::from_rejection(r, 0))
        }
        Command::UseItem(slot) => use_item(world, catalog, id, slot),
    }
}

/// Only the live controlled entity takes commands
fn commandable(world: &World, id: EntityId) -> Result<&Entity, CommandError> {
    world
        .entity(id)
        .filter(|e| e.alive && e.side() == Side::Controlled && id == world.controlled)
        .ok_or(CommandError::InvalidEntityReference(id))
}

fn use_item(world: &mut World, catalog: &Catalog, id: EntityId, slot: usize) -> Result<(), CommandError> {
    let invalid = CommandError::InvalidItemReference { slot };
    let entity = world.entity_mut(id).ok_or(CommandError::InvalidEntityReference(id))?;
    let Some(controller) = entity.controller_mut() else {
        return Err(CommandError::InvalidEntityReference(id));
    };
    let Some(stack) = controller.inventory.get(slot).copied().flatten().filter(|s| s.quantity > 0) else {
        return Err(invalid);
    };
    let def = catalog.item(stack.item).ok_or(invalid)?;

    // Validated; from here on the command succeeds
    let remaining = stack.quantity - 1;
    controller.inventory[slot] = (remaining > 0).then_some(ItemStack { quantity: remaining, ..stack });

    let mut events = vec![Event::ItemUsed { entity_id: id, item_id: def.id }];
    match def.effect {
        ItemEffect::RestoreHp(amount) => {
            let before = entity.hp.current;
            entity.hp = entity.hp.restore(amount);
            events.push(Event::Healed { entity_id: id, amount: entity.hp.current - before });
        }
        ItemEffect::RestoreSp(amount) => {
            entity.sp = entity.sp.restore(amount);
        }
        ItemEffect::Buff(spec) => {
            let source = BuffSource::Item(def.id);
            if entity.buffs.apply(source, spec) {
                events.push(Event::BuffApplied { entity_id: id, buff_id: source });
            }
        }
    }
    log::debug!("{:?} used {}", id, def.name);
    for event in events {
        world.push_event(event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemId;
    use crate::consts::SIM_DT;
    use crate::sim::state::Phase;
    use crate::sim::testing::{pacify, test_world};
    use crate::sim::tick::step;

    #[test]
    fn test_move_input_moves_and_clamps() {
        let catalog = Catalog::demo();
        let (mut world, player, hostile) = test_world(&catalog);
        pacify(&mut world, hostile);
        issue_command(&mut world, &catalog, player, Command::MoveInput(Vec2::new(10.0, 0.0))).expect("valid");
        let start = world.entity(player).expect("player").position;
        step(&mut world, &catalog, SIM_DT);
        let entity = world.entity(player).expect("player");
        let expected = entity.stats().move_speed * SIM_DT;
        assert!((entity.position.x - start.x - expected).abs() < 1e-3);

        for _ in 0..1000 {
            step(&mut world, &catalog, SIM_DT);
        }
        assert_eq!(world.entity(player).expect("player").position.x, world.tuning.arena_size.x);
    }

    #[test]
    fn test_non_finite_input_is_out_of_bounds() {
        let catalog = Catalog::demo();
        let (mut world, player, _) = test_world(&catalog);
        let before = world.entities.clone();
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::MoveInput(Vec2::new(f32::NAN, 0.0))),
            Err(CommandError::OutOfBounds)
        );
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::UseBasicAttack(Vec2::new(0.0, f32::INFINITY))),
            Err(CommandError::OutOfBounds)
        );
        assert_eq!(world.entities, before);
    }

    #[test]
    fn test_hostiles_and_dead_entities_reject_commands() {
        let catalog = Catalog::demo();
        let (mut world, player, hostile) = test_world(&catalog);
        assert_eq!(
            issue_command(&mut world, &catalog, hostile, Command::UseSkill(0)),
            Err(CommandError::InvalidEntityReference(hostile))
        );
        assert_eq!(
            issue_command(&mut world, &catalog, EntityId(999), Command::UseItem(0)),
            Err(CommandError::InvalidEntityReference(EntityId(999)))
        );
        world.entity_mut(player).expect("player").alive = false;
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::MoveInput(Vec2::X)),
            Err(CommandError::InvalidEntityReference(player))
        );
    }

    #[test]
    fn test_use_skill_errors_leave_world_unchanged() {
        let catalog = Catalog::demo();
        let (mut world, player, _) = test_world(&catalog);

        // Empty slot
        world.entity_mut(player).expect("player").loadout.slots[3] = None;
        let before = world.entities.clone();
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::UseSkill(3)),
            Err(CommandError::InvalidSkillReference { slot: 3 })
        );
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::UseSkill(17)),
            Err(CommandError::InvalidSkillReference { slot: 17 })
        );

        // Not enough SP for Cleave (15)
        {
            let entity = world.entity_mut(player).expect("player");
            entity.sp = entity.sp.deplete(entity.sp.max - 3.0);
        }
        let before_sp = world.entities.clone();
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::UseSkill(0)),
            Err(CommandError::InsufficientResource { needed: 15.0, available: 3.0 })
        );
        assert_eq!(world.entities, before_sp);
        assert_ne!(world.entities, before);
    }

    #[test]
    fn test_use_skill_twice_reports_busy_then_cooldown() {
        let catalog = Catalog::demo();
        let (mut world, player, hostile) = test_world(&catalog);
        pacify(&mut world, hostile);

        issue_command(&mut world, &catalog, player, Command::UseSkill(1)).expect("bolt is ready");
        let entity = world.entity(player).expect("player");
        assert_eq!(entity.phase, Phase::Windup);
        assert_eq!(entity.cast.map(|c| c.aim), Some(Aim::Entity(hostile)));
        let result = issue_command(&mut world, &catalog, player, Command::UseSkill(1));
        assert_eq!(result, Err(CommandError::ActionInProgress));

        // Arcane Bolt: 250 cast + 100 execution + 250 recovery, 1500 cooldown
        for _ in 0..45 {
            step(&mut world, &catalog, SIM_DT);
        }
        assert!(matches!(
            issue_command(&mut world, &catalog, player, Command::UseSkill(1)),
            Err(CommandError::OnCooldown { .. })
        ));
    }

    #[test]
    fn test_use_item_consumes_stack() {
        let catalog = Catalog::demo();
        let (mut world, player, _) = test_world(&catalog);
        {
            let entity = world.entity_mut(player).expect("player");
            entity.hp = entity.hp.deplete(120.0);
        }

        issue_command(&mut world, &catalog, player, Command::UseItem(0)).expect("potion");
        let entity = world.entity(player).expect("player");
        assert_eq!(entity.hp.current, 130.0);
        let inventory = &entity.controller().expect("controlled").inventory;
        assert_eq!(inventory[0], Some(ItemStack { item: ItemId(1), quantity: 2 }));

        let events = step(&mut world, &catalog, SIM_DT);
        assert!(events.contains(&Event::ItemUsed { entity_id: player, item_id: ItemId(1) }));
        assert!(events.contains(&Event::Healed { entity_id: player, amount: 50.0 }));
    }

    #[test]
    fn test_last_item_clears_slot() {
        let catalog = Catalog::demo();
        let (mut world, player, _) = test_world(&catalog);
        world.entity_mut(player).and_then(|e| e.controller_mut()).expect("controlled").inventory[5] =
            Some(ItemStack { item: ItemId(3), quantity: 1 });

        issue_command(&mut world, &catalog, player, Command::UseItem(5)).expect("tonic");
        let entity = world.entity(player).expect("player");
        assert_eq!(entity.controller().expect("controlled").inventory[5], None);
        assert!(entity.stats().defense > entity.base.defense);
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::UseItem(5)),
            Err(CommandError::InvalidItemReference { slot: 5 })
        );
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::UseItem(40)),
            Err(CommandError::InvalidItemReference { slot: 40 })
        );
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let catalog = Catalog::demo();
        let (mut world, player, _) = test_world(&catalog);
        world.entity_mut(player).and_then(|e| e.controller_mut()).expect("controlled").inventory[4] =
            Some(ItemStack { item: ItemId(77), quantity: 2 });
        let before = world.entities.clone();
        assert_eq!(
            issue_command(&mut world, &catalog, player, Command::UseItem(4)),
            Err(CommandError::InvalidItemReference { slot: 4 })
        );
        assert_eq!(world.entities, before);
    }
}
