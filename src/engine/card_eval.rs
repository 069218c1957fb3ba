//! Card scoring and play ordering
//!
//! Scores the playable subset of the hand against a `BoardState` and orders
//! it for play. Scores carry bounded pseudo-random noise plus a small chance
//! of deliberately suboptimal ordering so the AI is not exploitable by
//! memorizing its choices; both knobs live in `AiConfig` and a fixed RNG
//! seed reproduces the order exactly.

use crate::config::AiConfig;
use crate::core::{Card, CardData, Hand, Phase, Side, SpellEffect, SpellEffectKind};
use crate::engine::board_state::BoardState;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Typed tally of effect categories observed from the opponent
///
/// Replaces free-text keyword history matching: recent opponent tendencies
/// are weighted by enumerated effect category, never by substring.
#[derive(Debug, Default, Clone)]
pub struct OpponentTendencies {
    counts: FxHashMap<SpellEffectKind, u32>,
    total: u32,
}

impl OpponentTendencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: SpellEffectKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
        self.total += 1;
    }

    /// Fraction of observed opponent effects in this category, in [0, 1]
    pub fn fraction(&self, kind: SpellEffectKind) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        *self.counts.get(&kind).unwrap_or(&0) as f32 / self.total as f32
    }

    pub fn observations(&self) -> u32 {
        self.total
    }
}

/// Scores playable cards and orders them for play
pub struct CardEvaluator {
    config: Rc<AiConfig>,
}

impl CardEvaluator {
    pub fn new(config: Rc<AiConfig>) -> Self {
        CardEvaluator { config }
    }

    /// Filter the hand by mana affordability and phase legality.
    ///
    /// Monsters may only be placed in the enemy prep phase; damage spells
    /// are illegal in clean-up. An empty result is a normal outcome.
    pub fn playable_cards<'h>(&self, hand: &'h Hand, state: &BoardState) -> Vec<&'h Card> {
        hand.cards()
            .iter()
            .filter(|card| card.data.mana_cost <= state.enemy_mana)
            .filter(|card| self.is_phase_legal(&card.data, state.phase))
            .collect()
    }

    fn is_phase_legal(&self, data: &CardData, phase: Phase) -> bool {
        if data.is_monster() {
            return phase.is_prep(Side::Enemy);
        }
        if phase == Phase::CleanUp && data.has_effect(SpellEffectKind::Damage) {
            return false;
        }
        matches!(phase, Phase::EnemyPrep | Phase::EnemyCombat | Phase::CleanUp)
    }

    /// Base score of playing a card against the given board state.
    pub fn evaluate_card_play(
        &self,
        data: &CardData,
        state: &BoardState,
        tendencies: &OpponentTendencies,
    ) -> f32 {
        let base = if data.is_monster() {
            self.monster_score(data, state)
        } else {
            self.spell_score(data, state, tendencies)
        };

        base * self.future_value_discount(data, state)
    }

    /// Monster value: stat total weighted up when behind on board control.
    fn monster_score(&self, data: &CardData, state: &BoardState) -> f32 {
        let deficit = (-state.control_lead(Side::Enemy)).max(0.0);
        let urgency = (deficit / self.config.control_dominance_margin).min(1.0);
        data.stat_total() as f32 * (1.0 + urgency)
    }

    fn spell_score(
        &self,
        data: &CardData,
        state: &BoardState,
        tendencies: &OpponentTendencies,
    ) -> f32 {
        data.spell_effects()
            .iter()
            .map(|effect| self.effect_score(effect, state, tendencies))
            .sum()
    }

    fn effect_score(
        &self,
        effect: &SpellEffect,
        state: &BoardState,
        tendencies: &OpponentTendencies,
    ) -> f32 {
        match *effect {
            SpellEffect::Heal { amount } => {
                let missing = 1.0 - state.health_fraction(Side::Enemy);
                // Opponent trending toward damage makes held healing better
                let pressure = tendencies.fraction(SpellEffectKind::Damage);
                amount as f32 * missing * 3.0 * (1.0 + pressure)
            }
            SpellEffect::Damage { amount } => {
                let presence = state.player_board_count as f32;
                amount as f32 * (1.0 + presence * 0.5)
            }
            SpellEffect::AttackBuff { multiplier, turns } => {
                let board = state.enemy_board_count as f32;
                (multiplier - 1.0) * 10.0 * board * (turns as f32).min(3.0)
            }
            SpellEffect::Draw { count } => {
                let early = if state.turn < self.config.late_game_turn {
                    2.0
                } else {
                    0.0
                };
                count as f32 * 4.0 + early
            }
            SpellEffect::PayLifeDraw { life, count } => {
                // Spending life is only attractive while healthy
                let health = state.health_fraction(Side::Enemy);
                (count as f32 * 4.0 - life as f32 * (1.0 - health) * 2.0).max(0.0)
            }
        }
    }

    /// Expensive cards early in the game are worth holding for a stronger
    /// future turn; discount their immediate score.
    fn future_value_discount(&self, data: &CardData, state: &BoardState) -> f32 {
        if state.turn < self.config.late_game_turn && data.mana_cost >= 6 {
            0.8
        } else {
            1.0
        }
    }

    /// Bounded noise plus a small chance of an intentionally weakened score.
    pub fn apply_decision_variance(&self, score: f32, rng: &mut ChaCha12Rng) -> f32 {
        let v = self.config.score_variance;
        let noise = if v > 0.0 {
            rng.gen_range(-v..=v)
        } else {
            0.0
        };
        let mut varied = score * (1.0 + noise);
        if self.config.suboptimal_chance > 0.0 && rng.gen_bool(self.config.suboptimal_chance) {
            varied *= 0.75;
        }
        varied
    }

    /// Stable sort by final score, descending; ties keep hand order.
    pub fn determine_card_play_order<'h>(
        &self,
        cards: Vec<&'h Card>,
        state: &BoardState,
        tendencies: &OpponentTendencies,
        rng: &mut ChaCha12Rng,
    ) -> Vec<&'h Card> {
        let mut scored: Vec<(&Card, f32)> = cards
            .into_iter()
            .map(|card| {
                let base = self.evaluate_card_play(&card.data, state, tendencies);
                (card, self.apply_decision_variance(base, rng))
            })
            .collect();

        // Vec::sort_by is stable, so equal scores preserve hand order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().map(|(card, _)| card).collect()
    }
}
