//! Cached per-side entity lists
//!
//! The authoritative board layout lives in the host; this cache keeps the
//! engine's view of who is currently on the field, rebuilt from the board
//! slots and refreshed incrementally after each play or attack.

use crate::core::{Entity, EntityId, Side};
use crate::engine::strategy::AttackLimiter;
use crate::engine::world::GameWorld;
use rustc_hash::FxHashMap;

/// How attack history filters a side snapshot.
///
/// Board scoring counts every placed unit and must ignore history;
/// attacker selection excludes units that already acted this phase,
/// through the limiter service or the per-entity flag fallback.
#[derive(Debug, Clone, Copy, Default)]
pub enum AttackHistory<'a> {
    #[default]
    Ignore,
    Limiter(&'a AttackLimiter),
    EntityFlags,
}

#[derive(Debug, Default)]
pub struct EntityCache {
    friendly: Vec<EntityId>,
    enemy: Vec<EntityId>,
    slots: FxHashMap<(Side, usize), EntityId>,
    built: bool,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full rebuild from the current board slots. O(slots).
    ///
    /// A board that has not finished initializing leaves the cache empty;
    /// callers must treat empty results as "not ready", not "no entities".
    pub fn build_cache(&mut self, world: &dyn GameWorld) {
        self.friendly.clear();
        self.enemy.clear();
        self.slots.clear();
        self.built = false;

        if !world.board_ready() {
            return;
        }

        for side in [Side::Friendly, Side::Enemy] {
            for slot in 0..world.slot_count(side) {
                if let Some(id) = world.entity_in_slot(side, slot) {
                    self.side_list_mut(side).push(id);
                    self.slots.insert((side, slot), id);
                }
            }
        }
        self.built = true;
    }

    /// Lightweight refresh of one side after a single play or attack.
    pub fn refresh_after_action(&mut self, world: &dyn GameWorld, side: Side) {
        if !world.board_ready() {
            return;
        }
        self.side_list_mut(side).clear();
        self.slots.retain(|(s, _), _| *s != side);

        for slot in 0..world.slot_count(side) {
            if let Some(id) = world.entity_in_slot(side, slot) {
                self.side_list_mut(side).push(id);
                self.slots.insert((side, slot), id);
            }
        }
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn clear(&mut self) {
        self.friendly.clear();
        self.enemy.clear();
        self.slots.clear();
        self.built = false;
    }

    pub fn side_entities(&self, side: Side) -> &[EntityId] {
        match side {
            Side::Friendly => &self.friendly,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn entity_in_slot(&self, side: Side, slot: usize) -> Option<EntityId> {
        self.slots.get(&(side, slot)).copied()
    }

    /// Snapshot the live entities of a side, excluding dead and fading-out
    /// entries, filtered by attack history as requested.
    pub fn get_valid_entities(
        &self,
        world: &dyn GameWorld,
        side: Side,
        history: AttackHistory,
    ) -> Vec<Entity> {
        self.side_entities(side)
            .iter()
            .filter_map(|&id| world.entity(id))
            .filter(|e| e.is_active_on_board())
            .filter(|e| match history {
                AttackHistory::Ignore => true,
                AttackHistory::Limiter(lim) => !lim.has_attacked(e.id),
                AttackHistory::EntityFlags => !e.has_attacked,
            })
            .collect()
    }
}

impl EntityCache {
    fn side_list_mut(&mut self, side: Side) -> &mut Vec<EntityId> {
        match side {
            Side::Friendly => &mut self.friendly,
            Side::Enemy => &mut self.enemy,
        }
    }
}
