//! Combat round phases

use crate::core::entity::Side;
use serde::{Deserialize, Serialize};

/// Phases of one combat round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    PlayerPrep,
    PlayerCombat,
    EnemyPrep,
    EnemyCombat,
    CleanUp,
}

impl Phase {
    /// Next phase in round order; CleanUp wraps to the next round
    pub fn next(&self) -> Phase {
        match self {
            Phase::PlayerPrep => Phase::PlayerCombat,
            Phase::PlayerCombat => Phase::EnemyPrep,
            Phase::EnemyPrep => Phase::EnemyCombat,
            Phase::EnemyCombat => Phase::CleanUp,
            Phase::CleanUp => Phase::PlayerPrep,
        }
    }

    /// Preparation phase for the given side; monsters may only be placed here
    pub fn is_prep(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (Phase::PlayerPrep, Side::Friendly) | (Phase::EnemyPrep, Side::Enemy)
        )
    }

    /// Combat phase for the given side
    pub fn is_combat(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (Phase::PlayerCombat, Side::Friendly) | (Phase::EnemyCombat, Side::Enemy)
        )
    }

    /// Which side the phase belongs to, if any
    pub fn acting_side(&self) -> Option<Side> {
        match self {
            Phase::PlayerPrep | Phase::PlayerCombat => Some(Side::Friendly),
            Phase::EnemyPrep | Phase::EnemyCombat => Some(Side::Enemy),
            Phase::CleanUp => None,
        }
    }

    /// Boundary at which per-phase combat records (attack limiter) reset
    pub fn is_combat_boundary(&self) -> bool {
        matches!(self, Phase::PlayerCombat | Phase::EnemyCombat)
    }
}
