//! Combat entities with simple integer IDs
//!
//! Entities are owned by the host's combat collaborator; the engine works
//! on cloned snapshots obtained through the world interface. Health icons
//! are ordinary entities with `EntityKind::HealthIcon`, so targeting logic
//! never needs type inspection to recognize them.

use crate::core::keyword::{Keyword, KeywordSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple integer ID for combat entities
///
/// IDs are stable for the lifetime of a game session; defeated entities
/// keep their ID until the host removes them after the exit animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(id: u32) -> Self {
        EntityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the board an entity fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Friendly,
    Enemy,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Friendly => Side::Enemy,
            Side::Enemy => Side::Friendly,
        }
    }
}

/// What kind of thing an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A monster placed from a card
    Monster,
    /// A side's health icon; attackable only when its board is empty
    HealthIcon,
}

/// Snapshot of a combat participant
///
/// Mutation (damage, healing, buffs) is owned by the host's combat
/// collaborator; the engine only reads these snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub side: Side,
    pub name: String,

    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    /// Active attack multiplier from buffs (1.0 when unbuffed)
    pub attack_multiplier: f32,

    pub keywords: KeywordSet,

    /// Entity occupies a board slot
    pub placed: bool,
    pub dead: bool,
    /// Transient removal state; must not be targeted or overwritten
    pub fading_out: bool,
    /// Set when the entity has acted this combat phase (limiter fallback)
    pub has_attacked: bool,

    /// Board position index; unique among placed entities on a side
    pub slot: Option<usize>,
}

impl Entity {
    pub fn monster(id: EntityId, side: Side, name: impl Into<String>) -> Self {
        Entity {
            id,
            kind: EntityKind::Monster,
            side,
            name: name.into(),
            health: 1,
            max_health: 1,
            attack: 0,
            attack_multiplier: 1.0,
            keywords: KeywordSet::new(),
            placed: false,
            dead: false,
            fading_out: false,
            has_attacked: false,
            slot: None,
        }
    }

    pub fn health_icon(id: EntityId, side: Side, health: i32, max_health: i32) -> Self {
        Entity {
            id,
            kind: EntityKind::HealthIcon,
            side,
            name: match side {
                Side::Friendly => "Player".to_string(),
                Side::Enemy => "Enemy".to_string(),
            },
            health,
            max_health,
            attack: 0,
            attack_multiplier: 1.0,
            keywords: KeywordSet::new(),
            placed: false,
            dead: false,
            fading_out: false,
            has_attacked: false,
            slot: None,
        }
    }

    pub fn with_stats(mut self, attack: i32, health: i32) -> Self {
        self.attack = attack;
        self.health = health;
        self.max_health = health;
        self
    }

    pub fn with_keywords(mut self, tags: &[Keyword]) -> Self {
        self.keywords = KeywordSet::with(tags);
        self
    }

    /// Attack power with the active multiplier applied
    pub fn effective_attack(&self) -> i32 {
        (self.attack as f32 * self.attack_multiplier).round() as i32
    }

    pub fn has_keyword(&self, tag: Keyword) -> bool {
        self.keywords.contains(tag)
    }

    /// Fraction of max health remaining, in [0, 1]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.health.max(0) as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }

    pub fn is_full_health(&self) -> bool {
        self.health >= self.max_health
    }

    /// A live, placed, non-fading board presence
    pub fn is_active_on_board(&self) -> bool {
        self.kind == EntityKind::Monster && self.placed && !self.dead && !self.fading_out
    }

    /// Whether this entity may be chosen as an attack or spell target.
    /// Dead or fading entities are never valid targets.
    pub fn is_valid_target(&self) -> bool {
        !self.dead && !self.fading_out
    }
}
