//! Card templates and per-copy instances
//!
//! `CardData` is the static template shared by every copy of a card;
//! `Card` is the mutable per-copy wrapper held in a hand. Ownership of a
//! card transfers to the board entity it spawns, or the copy is discarded
//! after a spell resolves.

use crate::core::keyword::{Keyword, KeywordSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Per-copy card instance ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(u32);

impl CardId {
    pub fn new(id: u32) -> Self {
        CardId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One effect carried by a spell card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpellEffect {
    /// Deal damage to an opposing target
    Damage { amount: i32 },
    /// Restore health to a friendly target
    Heal { amount: i32 },
    /// Multiply a friendly target's attack for a number of turns
    AttackBuff { multiplier: f32, turns: u32 },
    /// Draw cards; needs no entity target
    Draw { count: u32 },
    /// Pay life to draw; needs no entity target
    PayLifeDraw { life: i32, count: u32 },
}

/// Effect category used for typed tendency tallies and legality checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellEffectKind {
    Damage,
    Heal,
    AttackBuff,
    Draw,
    PayLifeDraw,
}

impl SpellEffect {
    pub fn kind(&self) -> SpellEffectKind {
        match self {
            SpellEffect::Damage { .. } => SpellEffectKind::Damage,
            SpellEffect::Heal { .. } => SpellEffectKind::Heal,
            SpellEffect::AttackBuff { .. } => SpellEffectKind::AttackBuff,
            SpellEffect::Draw { .. } => SpellEffectKind::Draw,
            SpellEffect::PayLifeDraw { .. } => SpellEffectKind::PayLifeDraw,
        }
    }

    /// Utility effects resolve without an entity target
    pub fn needs_target(&self) -> bool {
        match self {
            SpellEffect::Damage { .. } | SpellEffect::Heal { .. } | SpellEffect::AttackBuff { .. } => true,
            SpellEffect::Draw { .. } | SpellEffect::PayLifeDraw { .. } => false,
        }
    }

    /// Effects that help their own side (target own side only)
    pub fn is_beneficial(&self) -> bool {
        !matches!(self, SpellEffect::Damage { .. })
    }
}

/// Monster stats or spell effect list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CardKind {
    Monster { attack: i32, health: i32 },
    Spell { effects: SmallVec<[SpellEffect; 2]> },
}

/// Static card template shared by all copies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub name: String,
    pub mana_cost: i32,
    pub kind: CardKind,
    pub keywords: KeywordSet,
}

impl CardData {
    pub fn monster(name: impl Into<String>, mana_cost: i32, attack: i32, health: i32) -> Self {
        CardData {
            name: name.into(),
            mana_cost,
            kind: CardKind::Monster { attack, health },
            keywords: KeywordSet::new(),
        }
    }

    pub fn spell(name: impl Into<String>, mana_cost: i32, effects: &[SpellEffect]) -> Self {
        CardData {
            name: name.into(),
            mana_cost,
            kind: CardKind::Spell {
                effects: effects.iter().copied().collect(),
            },
            keywords: KeywordSet::new(),
        }
    }

    pub fn with_keywords(mut self, tags: &[Keyword]) -> Self {
        self.keywords = KeywordSet::with(tags);
        self
    }

    pub fn is_monster(&self) -> bool {
        matches!(self.kind, CardKind::Monster { .. })
    }

    pub fn is_spell(&self) -> bool {
        matches!(self.kind, CardKind::Spell { .. })
    }

    /// Monster stat total; zero for spells
    pub fn stat_total(&self) -> i32 {
        match self.kind {
            CardKind::Monster { attack, health } => attack + health,
            CardKind::Spell { .. } => 0,
        }
    }

    pub fn spell_effects(&self) -> &[SpellEffect] {
        match &self.kind {
            CardKind::Spell { effects } => effects,
            CardKind::Monster { .. } => &[],
        }
    }

    /// A spell whose effects all resolve without an entity target
    pub fn is_utility_spell(&self) -> bool {
        match &self.kind {
            CardKind::Spell { effects } => effects.iter().all(|e| !e.needs_target()),
            CardKind::Monster { .. } => false,
        }
    }

    pub fn has_effect(&self, kind: SpellEffectKind) -> bool {
        self.spell_effects().iter().any(|e| e.kind() == kind)
    }
}

/// Mutable per-copy wrapper held in a hand or deck collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub data: CardData,
}

impl Card {
    pub fn new(id: CardId, data: CardData) -> Self {
        Card { id, data }
    }
}

/// The enemy's hand; cards leave it for the board or the discard pile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Hand { cards: Vec::new() }
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn remove(&mut self, id: CardId) -> Option<Card> {
        let idx = self.cards.iter().position(|c| c.id == id)?;
        Some(self.cards.remove(idx))
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
