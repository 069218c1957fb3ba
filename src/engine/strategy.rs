//! Strategic posture, attack ordering and target selection
//!
//! Decides the overall aggressive/defensive posture from the board state,
//! orders the enemy's attackers, and scores candidate targets. Taunt
//! targets, when alive, are preferred exclusively; the health icon is only
//! attackable when the opposing board is open (the same rule spell
//! targeting uses).

use crate::config::AiConfig;
use crate::core::{Entity, EntityId, Keyword, Side};
use crate::engine::board_state::{BoardState, KeywordContext, KeywordEvaluator};
use crate::engine::targeting::side_board_is_open;
use crate::engine::world::ActionTarget;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::rc::Rc;

/// Overall posture derived from the board state; recomputed each evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrategicMode {
    Aggressive,
    Defensive,
    Balanced,
}

/// Per-phase record of entities that have already attacked
///
/// Reset at each combat phase boundary; an entity appears at most once per
/// phase. Registration implies the entity is placed on the board.
#[derive(Debug, Default)]
pub struct AttackLimiter {
    attacked: FxHashSet<EntityId>,
}

impl AttackLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: EntityId) {
        self.attacked.insert(id);
    }

    pub fn has_attacked(&self, id: EntityId) -> bool {
        self.attacked.contains(&id)
    }

    /// Phase boundary reset
    pub fn reset(&mut self) {
        self.attacked.clear();
    }

    pub fn len(&self) -> usize {
        self.attacked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attacked.is_empty()
    }
}

/// Decides posture and produces the ordered attack plan
pub struct AttackStrategyManager {
    config: Rc<AiConfig>,
    keywords: KeywordEvaluator,
}

impl AttackStrategyManager {
    pub fn new(config: Rc<AiConfig>) -> Self {
        AttackStrategyManager {
            keywords: KeywordEvaluator::new(Rc::clone(&config)),
            config,
        }
    }

    /// Aggressive when own health is critically low or own board control
    /// clearly dominates; Defensive when low on health and behind on board;
    /// Balanced otherwise.
    pub fn determine_strategic_mode(&self, state: &BoardState) -> StrategicMode {
        let health = state.health_fraction(Side::Enemy);
        let low_health = health < self.config.low_health_threshold;
        let lead = state.control_lead(Side::Enemy);
        let dominates = lead >= self.config.control_dominance_margin;
        let behind = lead < 0.0;

        if low_health && behind {
            StrategicMode::Defensive
        } else if low_health || dominates {
            StrategicMode::Aggressive
        } else {
            StrategicMode::Balanced
        }
    }

    /// Base attack-action weight; strictly increases as own health drops,
    /// holding everything else constant.
    pub fn aggression_weight(&self, state: &BoardState) -> f32 {
        let missing = 1.0 - state.health_fraction(Side::Enemy);
        let lead = (state.control_lead(Side::Enemy) / self.config.control_dominance_margin)
            .clamp(-1.0, 1.0);
        1.0 + missing * 2.0 + lead * 0.5
    }

    /// Order attacking entities: safe eliminations first, then raw attack
    /// power descending. Entity ID breaks remaining ties for determinism.
    pub fn get_attack_order(
        &self,
        attackers: &[Entity],
        defenders: &[Entity],
    ) -> Vec<EntityId> {
        let mut ordered: Vec<(&Entity, bool)> = attackers
            .iter()
            .filter(|a| a.is_active_on_board() && a.effective_attack() > 0)
            .map(|a| (a, self.can_safely_eliminate(a, defenders)))
            .collect();

        ordered.sort_by(|(a, a_safe), (b, b_safe)| {
            b_safe
                .cmp(a_safe)
                .then(b.effective_attack().cmp(&a.effective_attack()))
                .then(a.id.cmp(&b.id))
        });

        ordered.into_iter().map(|(a, _)| a.id).collect()
    }

    /// Can this attacker kill some defender this turn without dying to the
    /// counter-blow? Ranged attackers take no retaliation.
    fn can_safely_eliminate(&self, attacker: &Entity, defenders: &[Entity]) -> bool {
        defenders
            .iter()
            .filter(|d| d.is_active_on_board())
            .any(|d| {
                attacker.effective_attack() >= d.health
                    && (attacker.has_keyword(Keyword::Ranged)
                        || attacker.health > d.effective_attack())
            })
    }

    /// Score candidate targets and pick the best, or fall back to the
    /// health icon when the opposing board is open.
    ///
    /// A live Taunt target, if present, is preferred exclusively: other
    /// entities are only eligible when no Taunt target exists.
    pub fn select_target(
        &self,
        attacker: &Entity,
        candidates: &[Entity],
        health_icon: Option<&Entity>,
        state: &BoardState,
        mode: StrategicMode,
    ) -> Option<ActionTarget> {
        let valid: Vec<&Entity> = candidates
            .iter()
            .filter(|e| e.is_active_on_board() && e.is_valid_target())
            .collect();

        let taunts: Vec<&Entity> = valid
            .iter()
            .copied()
            .filter(|e| e.has_keyword(Keyword::Taunt))
            .collect();
        let pool = if taunts.is_empty() { &valid } else { &taunts };

        if pool.is_empty() {
            if self.should_attack_health_icon(candidates) {
                return health_icon
                    .filter(|icon| icon.is_valid_target())
                    .map(|icon| ActionTarget::HealthIcon(icon.side));
            }
            return None;
        }

        pool.iter()
            .copied()
            .map(|target| (target, self.score_target(attacker, target, state, mode)))
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.id.cmp(&a.0.id)))
            .map(|(target, _)| ActionTarget::Unit(target.id))
    }

    fn score_target(
        &self,
        attacker: &Entity,
        target: &Entity,
        state: &BoardState,
        mode: StrategicMode,
    ) -> f32 {
        let mut score = target.effective_attack() as f32 * 2.0 + target.health.max(0) as f32;

        let can_finish = attacker.effective_attack() >= target.health;
        if can_finish {
            // Removing a threat now outweighs chip damage; more so when the
            // player acts before our next combat.
            let mut finish = 6.0 + target.effective_attack() as f32;
            if !state.enemy_acts_first_next_turn {
                finish *= 1.25;
            }
            score += finish;
        }

        if attacker.has_keyword(Keyword::Overwhelm) && target.has_keyword(Keyword::Taunt) {
            let ctx = KeywordContext {
                control_lead: state.control_lead(Side::Enemy),
                own_health_fraction: state.health_fraction(Side::Enemy),
                opposing_top_attack: target.effective_attack(),
            };
            // An Overwhelm attacker values clearing the blocking Taunt
            score += self.keywords.tactical_value(Keyword::Overwhelm, &ctx) * 4.0;
        }

        match mode {
            // Push for eliminations and ignore bulk
            StrategicMode::Aggressive => {
                if can_finish {
                    score *= 1.3;
                }
            }
            // Remove the biggest incoming threat
            StrategicMode::Defensive => {
                score += target.effective_attack() as f32 * 2.0;
            }
            StrategicMode::Balanced => {}
        }

        score
    }

    /// True only when the opposing side has no valid entity targets;
    /// mirrors the allegiance rule of spell targeting exactly.
    pub fn should_attack_health_icon(&self, opposing_entities: &[Entity]) -> bool {
        side_board_is_open(opposing_entities)
    }
}
