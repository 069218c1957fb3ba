//! Collaborator interface to the host game
//!
//! The engine never applies combat math or touches rendering; it reads
//! board/entity/counter state and issues commands through this trait. The
//! host owns the entities and hands out cloned snapshots, so the engine
//! cannot observe or cause partial mutation.

use crate::core::{CardData, Entity, EntityId, Phase, Side};
use crate::error::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// Concrete target of a spell or attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    Unit(EntityId),
    /// A side's health icon; legal only when that side's board is empty
    HealthIcon(Side),
}

/// Everything the engine consumes from or commands in the host game
pub trait GameWorld {
    // --- board layout provider ---

    /// Whether the room/board layout has finished initializing
    fn board_ready(&self) -> bool;

    /// Number of board slots on a side
    fn slot_count(&self, side: Side) -> usize;

    /// Entity occupying a slot, if any
    fn entity_in_slot(&self, side: Side, slot: usize) -> Option<EntityId>;

    /// Snapshot of an entity by ID
    fn entity(&self, id: EntityId) -> Option<Entity>;

    /// The health icon entity for a side
    fn health_icon(&self, side: Side) -> Option<EntityId>;

    // --- counters and phase source ---

    fn mana(&self, side: Side) -> i32;
    fn phase(&self) -> Phase;
    fn turn_number(&self) -> u32;
    /// Which side acts first next turn
    fn acts_first_next_turn(&self) -> Side;

    // --- command surface ---

    /// Spawn a monster card into a slot on the enemy side
    fn spawn_card(&mut self, name: &str, data: &CardData, slot: usize) -> bool;

    /// Apply a spell card's effects to the given target
    fn apply_spell_effects(&mut self, target: ActionTarget, data: &CardData) -> Result<()>;

    /// Resolve an attack; damage application is owned by the host
    fn attack(&mut self, attacker: EntityId, target: ActionTarget) -> Result<()>;

    /// Deduct mana from a side's pool
    fn spend_mana(&mut self, side: Side, amount: i32) -> Result<()>;

    /// Record that an entity has acted this combat phase (fallback used
    /// when no attack limiter service is registered)
    fn mark_attacked(&mut self, id: EntityId);

    /// Clear every per-entity attack flag; called at combat boundaries
    /// when the flag fallback is in use
    fn clear_attack_flags(&mut self);
}

/// Shared handle to the host world; the engine's single cooperative task
/// never holds a borrow across a suspension point.
pub type SharedWorld = Rc<RefCell<dyn GameWorld>>;
