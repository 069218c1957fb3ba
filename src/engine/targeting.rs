//! Board slot and target selection
//!
//! `PositionSelector` picks the best empty slot for a new monster;
//! `TargetSelector` picks the best entity (or health icon) for a spell.
//! The health-icon rule is shared with attack targeting through
//! [`side_board_is_open`] so both paths evaluate it identically.

use crate::config::AiConfig;
use crate::core::{CardData, CardKind, Entity, Keyword, Side, SpellEffect};
use crate::engine::board_state::BoardState;
use crate::engine::world::ActionTarget;
use std::rc::Rc;

/// True when a side has no living, placed, non-fading entity on the field.
/// Only then may that side's health icon be targeted directly.
pub fn side_board_is_open(side_entities: &[Entity]) -> bool {
    !side_entities.iter().any(|e| e.is_active_on_board())
}

/// Picks the best empty board slot for a new monster
pub struct PositionSelector {
    config: Rc<AiConfig>,
}

impl PositionSelector {
    pub fn new(config: Rc<AiConfig>) -> Self {
        PositionSelector { config }
    }

    /// Highest-scoring empty slot for the card, or `None` when the board
    /// is full. Exactly one empty slot is returned directly, without
    /// scoring.
    ///
    /// Slot 0 is the frontmost position; higher indices are further back.
    pub fn find_monster_position(
        &self,
        card: &CardData,
        state: &BoardState,
        empty_slots: &[usize],
        slot_count: usize,
    ) -> Option<usize> {
        match empty_slots {
            [] => None,
            [only] => Some(*only),
            _ => empty_slots
                .iter()
                .copied()
                .map(|slot| (slot, self.score_slot(card, state, slot, slot_count)))
                .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(slot, _)| slot),
        }
    }

    fn score_slot(&self, card: &CardData, state: &BoardState, slot: usize, slot_count: usize) -> f32 {
        let (attack, health) = match card.kind {
            CardKind::Monster { attack, health } => (attack, health),
            CardKind::Spell { .. } => (0, 0),
        };

        let center = (slot_count.saturating_sub(1)) as f32 / 2.0;
        let spread = center.max(1.0);
        let centrality = 1.0 - (slot as f32 - center).abs() / spread;
        let front = (slot_count.saturating_sub(1) - slot) as f32 / spread;
        let back = slot as f32 / spread;

        // Generic high-attack units want the middle of the line
        let mut score = centrality * attack as f32 * 0.5;

        if card.keywords.contains(Keyword::Ranged) {
            score += back * self.config.ranged_multiplier * 4.0;
        }
        if card.keywords.contains(Keyword::Tough) || health >= attack * 2 {
            score += front * self.config.tough_multiplier * 3.0;
        }
        if card.keywords.contains(Keyword::Taunt) {
            // Taunt anchors the frontline, more so when under pressure
            let pressure = 1.0 + state.player_board_count as f32 * 0.25;
            score += front * self.config.taunt_multiplier * 3.0 * pressure;
        }
        if card.keywords.contains(Keyword::Overwhelm) {
            // Forward-middle: central but never the backline
            let forward_middle = if (slot as f32) <= center {
                centrality * 1.5
            } else {
                0.0
            };
            score += forward_middle * self.config.overwhelm_multiplier * 3.0;
        }

        score
    }
}

/// Picks the best target entity for a spell
pub struct TargetSelector;

impl TargetSelector {
    pub fn new() -> Self {
        TargetSelector
    }

    /// Best target per the effect's allegiance rule, or `None` when no
    /// target qualifies (the executor skips the card in that case).
    ///
    /// Damaging effects target the opposing side, falling back to its
    /// health icon only when its board is empty. Healing and buff effects
    /// target the enemy's own side only; a heal never targets a full-health
    /// entity.
    pub fn best_spell_target(
        &self,
        card: &CardData,
        friendly_units: &[Entity],
        enemy_units: &[Entity],
        enemy_icon: Option<&Entity>,
    ) -> Option<ActionTarget> {
        let effect = card.spell_effects().iter().find(|e| e.needs_target())?;

        match *effect {
            SpellEffect::Damage { .. } => {
                let best = friendly_units
                    .iter()
                    .filter(|e| e.is_active_on_board())
                    .max_by(|a, b| threat(a).total_cmp(&threat(b)).then(b.id.cmp(&a.id)));
                match best {
                    Some(unit) => Some(ActionTarget::Unit(unit.id)),
                    None if side_board_is_open(friendly_units) => {
                        Some(ActionTarget::HealthIcon(Side::Friendly))
                    }
                    None => None,
                }
            }
            SpellEffect::Heal { .. } => {
                let unit = enemy_units
                    .iter()
                    .filter(|e| e.is_active_on_board() && !e.is_full_health())
                    .min_by(|a, b| {
                        a.health_fraction()
                            .total_cmp(&b.health_fraction())
                            .then(a.id.cmp(&b.id))
                    });
                if let Some(unit) = unit {
                    return Some(ActionTarget::Unit(unit.id));
                }
                // With no wounded unit, heal the enemy's own health icon
                match enemy_icon {
                    Some(icon) if !icon.is_full_health() && icon.is_valid_target() => {
                        Some(ActionTarget::HealthIcon(Side::Enemy))
                    }
                    _ => None,
                }
            }
            SpellEffect::AttackBuff { .. } => enemy_units
                .iter()
                .filter(|e| e.is_active_on_board())
                .max_by(|a, b| {
                    a.effective_attack()
                        .cmp(&b.effective_attack())
                        .then(b.id.cmp(&a.id))
                })
                .map(|unit| ActionTarget::Unit(unit.id)),
            SpellEffect::Draw { .. } | SpellEffect::PayLifeDraw { .. } => None,
        }
    }

    /// Whether a spell card can be played at all right now. Utility spells
    /// always can; targeted spells need a qualifying target.
    pub fn can_play_spell_card(
        &self,
        card: &CardData,
        friendly_units: &[Entity],
        enemy_units: &[Entity],
        enemy_icon: Option<&Entity>,
    ) -> bool {
        if !card.is_spell() {
            return false;
        }
        if card.is_utility_spell() {
            return true;
        }
        self.best_spell_target(card, friendly_units, enemy_units, enemy_icon)
            .is_some()
    }
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Threat posed by an opposing unit: damage output weighted over bulk
fn threat(e: &Entity) -> f32 {
    e.effective_attack() as f32 * 2.0 + e.health.max(0) as f32
}
