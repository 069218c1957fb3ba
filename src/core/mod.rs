//! Data model: entities, keywords, cards, phases

pub mod card;
pub mod entity;
pub mod keyword;
pub mod phase;

pub use card::{Card, CardData, CardId, CardKind, Hand, SpellEffect, SpellEffectKind};
pub use entity::{Entity, EntityId, EntityKind, Side};
pub use keyword::{Keyword, KeywordSet};
pub use phase::Phase;
