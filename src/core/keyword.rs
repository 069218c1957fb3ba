//! Capability tags ("keywords") carried by entities and cards

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Capability tag on an entity or card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    /// Attackers must prefer this entity as a target over other entities
    Taunt,
    /// Prefers the backline; attacks without exposure to melee
    Ranged,
    /// Durable; prefers the frontline
    Tough,
    /// Forward aggression; values clearing blockers
    Overwhelm,
}

impl Keyword {
    pub const ALL: [Keyword; 4] = [
        Keyword::Taunt,
        Keyword::Ranged,
        Keyword::Tough,
        Keyword::Overwhelm,
    ];
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Keyword::Taunt => "Taunt",
            Keyword::Ranged => "Ranged",
            Keyword::Tough => "Tough",
            Keyword::Overwhelm => "Overwhelm",
        };
        write!(f, "{}", s)
    }
}

/// Small set of keywords; entities rarely carry more than two
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSet {
    tags: SmallVec<[Keyword; 2]>,
}

impl KeywordSet {
    pub fn new() -> Self {
        KeywordSet {
            tags: SmallVec::new(),
        }
    }

    pub fn with(tags: &[Keyword]) -> Self {
        let mut set = KeywordSet::new();
        for &tag in tags {
            set.add(tag);
        }
        set
    }

    pub fn add(&mut self, tag: Keyword) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn contains(&self, tag: Keyword) -> bool {
        self.tags.contains(&tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Keyword> + '_ {
        self.tags.iter().copied()
    }
}
