//! Board state snapshots and the time-boxed evaluation cache
//!
//! `BoardState` is an immutable summary of the field used as the input to
//! every scoring decision. It is produced by `BoardStateEvaluator`, held in
//! `BoardStateCache` for a bounded time, and superseded (never mutated) by
//! the next evaluation.

use crate::config::AiConfig;
use crate::core::{Entity, Keyword, Phase, Side};
use crate::engine::entity_cache::{AttackHistory, EntityCache};
use crate::engine::world::GameWorld;
use crate::error::{AiError, Result};
use serde::Serialize;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Immutable snapshot of turn, phase, mana, health and board control
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardState {
    pub turn: u32,
    pub phase: Phase,

    pub player_mana: i32,
    pub enemy_mana: i32,

    pub player_health: i32,
    pub player_max_health: i32,
    pub enemy_health: i32,
    pub enemy_max_health: i32,

    pub player_control: f32,
    pub enemy_control: f32,
    /// Always enemy control minus player control
    pub control_difference: f32,

    pub player_board_count: usize,
    pub enemy_board_count: usize,

    pub enemy_acts_first_next_turn: bool,
}

impl BoardState {
    pub fn health_fraction(&self, side: Side) -> f32 {
        let (health, max) = match side {
            Side::Friendly => (self.player_health, self.player_max_health),
            Side::Enemy => (self.enemy_health, self.enemy_max_health),
        };
        if max <= 0 {
            return 0.0;
        }
        (health.max(0) as f32 / max as f32).clamp(0.0, 1.0)
    }

    pub fn mana(&self, side: Side) -> i32 {
        match side {
            Side::Friendly => self.player_mana,
            Side::Enemy => self.enemy_mana,
        }
    }

    pub fn board_count(&self, side: Side) -> usize {
        match side {
            Side::Friendly => self.player_board_count,
            Side::Enemy => self.enemy_board_count,
        }
    }

    /// Control lead from a side's perspective (positive = ahead)
    pub fn control_lead(&self, side: Side) -> f32 {
        match side {
            Side::Enemy => self.control_difference,
            Side::Friendly => -self.control_difference,
        }
    }
}

/// Holds at most one snapshot plus the instant it was produced
#[derive(Debug)]
pub struct BoardStateCache {
    entry: Option<(Rc<BoardState>, Instant)>,
    timeout: Duration,
}

impl BoardStateCache {
    pub fn new(timeout: Duration) -> Self {
        BoardStateCache {
            entry: None,
            timeout,
        }
    }

    /// Valid while `now - produced_at <= timeout`
    pub fn is_valid(&self, now: Instant) -> bool {
        match &self.entry {
            Some((_, produced)) => now.saturating_duration_since(*produced) <= self.timeout,
            None => false,
        }
    }

    pub fn get(&self) -> Option<Rc<BoardState>> {
        self.entry.as_ref().map(|(state, _)| Rc::clone(state))
    }

    pub fn store(&mut self, state: Rc<BoardState>, now: Instant) {
        self.entry = Some((state, now));
    }

    /// Explicit invalidation after any board-altering action
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Board context fed to keyword scoring
#[derive(Debug, Clone, Copy)]
pub struct KeywordContext {
    /// Control lead of the keyword holder's side (positive = ahead)
    pub control_lead: f32,
    /// Holder's side health fraction
    pub own_health_fraction: f32,
    /// Highest effective attack on the opposing side
    pub opposing_top_attack: i32,
}

/// Scores the tactical value of a capability tag; pure function of inputs
pub struct KeywordEvaluator {
    config: Rc<AiConfig>,
}

impl KeywordEvaluator {
    pub fn new(config: Rc<AiConfig>) -> Self {
        KeywordEvaluator { config }
    }

    /// Configured board-control multiplier for a tag
    pub fn multiplier(&self, keyword: Keyword) -> f32 {
        match keyword {
            Keyword::Taunt => self.config.taunt_multiplier,
            Keyword::Ranged => self.config.ranged_multiplier,
            Keyword::Tough => self.config.tough_multiplier,
            Keyword::Overwhelm => self.config.overwhelm_multiplier,
        }
    }

    /// Context-adjusted value of a tag. Taunt gains value when its side is
    /// behind or hurt, Ranged against heavy hitters, Tough when trading is
    /// likely, Overwhelm when ahead and pushing.
    pub fn tactical_value(&self, keyword: Keyword, ctx: &KeywordContext) -> f32 {
        let base = self.multiplier(keyword);
        let behind = (-ctx.control_lead).max(0.0) / self.config.control_dominance_margin;
        let ahead = ctx.control_lead.max(0.0) / self.config.control_dominance_margin;

        match keyword {
            Keyword::Taunt => {
                base * (1.0 + behind.min(1.0) * 0.5 + (1.0 - ctx.own_health_fraction) * 0.3)
            }
            Keyword::Ranged => {
                base * (1.0 + (ctx.opposing_top_attack as f32 / 20.0).min(0.5))
            }
            Keyword::Tough => base * (1.0 + behind.min(1.0) * 0.3),
            Keyword::Overwhelm => base * (1.0 + ahead.min(1.0) * 0.5),
        }
    }

    /// Combined control weight of an entity's tag set: the product of the
    /// per-tag multipliers plus a synergy bonus when tags co-occur.
    pub fn control_weight(&self, entity: &Entity) -> f32 {
        let mut weight = 1.0;
        for tag in entity.keywords.iter() {
            weight *= self.multiplier(tag);
        }
        let tags = entity.keywords.len();
        if tags >= 2 {
            weight *= 1.0 + self.config.synergy_bonus * (tags as f32 - 1.0);
        }
        weight
    }
}

/// Computes fresh `BoardState` snapshots, wrapped by the time-boxed cache
pub struct BoardStateEvaluator {
    config: Rc<AiConfig>,
    keywords: KeywordEvaluator,
    cache: BoardStateCache,
}

impl BoardStateEvaluator {
    pub fn new(config: Rc<AiConfig>) -> Self {
        let timeout = Duration::from_millis(config.board_state_cache_ms);
        BoardStateEvaluator {
            keywords: KeywordEvaluator::new(Rc::clone(&config)),
            cache: BoardStateCache::new(timeout),
            config,
        }
    }

    pub fn keyword_evaluator(&self) -> &KeywordEvaluator {
        &self.keywords
    }

    /// Returns the cached snapshot while it is still valid; otherwise
    /// recomputes, stores and returns a new one.
    ///
    /// When a dependency is not ready the previous snapshot (if any) is
    /// returned unchanged; a zeroed state is never fabricated.
    pub fn evaluate(
        &mut self,
        now: Instant,
        world: &dyn GameWorld,
        entities: &EntityCache,
    ) -> Result<Rc<BoardState>> {
        if self.cache.is_valid(now) {
            if let Some(state) = self.cache.get() {
                return Ok(state);
            }
        }

        match self.compute(world, entities) {
            Ok(state) => {
                let state = Rc::new(state);
                self.cache.store(Rc::clone(&state), now);
                Ok(state)
            }
            Err(err) => match self.cache.get() {
                // Stale beats garbage while a collaborator initializes
                Some(previous) => Ok(previous),
                None => Err(err),
            },
        }
    }

    /// Explicitly drop the cached snapshot after a board-altering action
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    fn compute(&self, world: &dyn GameWorld, entities: &EntityCache) -> Result<BoardState> {
        if !world.board_ready() {
            return Err(AiError::NotReady("board layout unavailable".into()));
        }
        if !entities.is_built() {
            return Err(AiError::NotReady("entity cache not built".into()));
        }

        let read_icon = |side: Side| -> Result<Entity> {
            world
                .health_icon(side)
                .and_then(|id| world.entity(id))
                .ok_or_else(|| AiError::NotReady(format!("health icon missing for {:?}", side)))
        };
        let player_icon = read_icon(Side::Friendly)?;
        let enemy_icon = read_icon(Side::Enemy)?;

        let turn = world.turn_number();
        // Control is a property of the standing board; attack history is
        // irrelevant here
        let player_units = entities.get_valid_entities(world, Side::Friendly, AttackHistory::Ignore);
        let enemy_units = entities.get_valid_entities(world, Side::Enemy, AttackHistory::Ignore);

        let player_frac = frac(player_icon.health, player_icon.max_health);
        let enemy_frac = frac(enemy_icon.health, enemy_icon.max_health);

        let player_control =
            self.side_control(&player_units, turn, player_frac, enemy_frac);
        let enemy_control = self.side_control(&enemy_units, turn, enemy_frac, player_frac);

        Ok(BoardState {
            turn,
            phase: world.phase(),
            player_mana: world.mana(Side::Friendly),
            enemy_mana: world.mana(Side::Enemy),
            player_health: player_icon.health,
            player_max_health: player_icon.max_health,
            enemy_health: enemy_icon.health,
            enemy_max_health: enemy_icon.max_health,
            player_control,
            enemy_control,
            control_difference: enemy_control - player_control,
            player_board_count: player_units.len(),
            enemy_board_count: enemy_units.len(),
            enemy_acts_first_next_turn: world.acts_first_next_turn() == Side::Enemy,
        })
    }

    /// Control = sum over placed units of (attack + health) scaled by the
    /// keyword multiplier table, then a late-game bonus and a fractional
    /// bonus for being the healthier side.
    fn side_control(
        &self,
        units: &[Entity],
        turn: u32,
        own_health_fraction: f32,
        opposing_health_fraction: f32,
    ) -> f32 {
        let mut control: f32 = units
            .iter()
            .map(|e| {
                (e.effective_attack() + e.health.max(0)) as f32 * self.keywords.control_weight(e)
            })
            .sum();

        if turn >= self.config.late_game_turn {
            control *= self.config.late_game_multiplier;
        }

        let health_edge = (own_health_fraction - opposing_health_fraction).max(0.0);
        control *= 1.0 + self.config.health_influence * health_edge;

        control
    }
}

fn frac(health: i32, max: i32) -> f32 {
    if max <= 0 {
        return 0.0;
    }
    (health.max(0) as f32 / max as f32).clamp(0.0, 1.0)
}
