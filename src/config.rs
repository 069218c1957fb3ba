//! Engine configuration
//!
//! Every tunable the decision engine uses is a named, bounded field here;
//! nothing numeric is hardcoded in the evaluators. Hosts construct one
//! `AiConfig` per session (possibly deserialized from data) and pass it to
//! the engine; `validated()` clamps each field to its documented range.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Board-control multiplier for Taunt entities. Range [1.0, 2.0].
    pub taunt_multiplier: f32,
    /// Board-control multiplier for Ranged entities. Range [1.0, 2.0].
    pub ranged_multiplier: f32,
    /// Board-control multiplier for Tough entities. Range [1.0, 2.0].
    pub tough_multiplier: f32,
    /// Board-control multiplier for Overwhelm entities. Range [1.0, 2.0].
    pub overwhelm_multiplier: f32,
    /// Additional bonus per extra keyword when tags co-occur on one entity.
    /// Range [0.0, 0.5].
    pub synergy_bonus: f32,

    /// Turn number at which the late game begins.
    pub late_game_turn: u32,
    /// Control multiplier applied past the late-game threshold. Range [1.0, 1.5].
    pub late_game_multiplier: f32,
    /// Linear scale of health-derived influence on board control. Range [0.05, 0.3].
    pub health_influence: f32,

    /// Bounded noise applied to card scores, as a fraction. Range [0.0, 0.25].
    pub score_variance: f32,
    /// Chance of an intentionally suboptimal card ordering. Range [0.0, 0.3].
    pub suboptimal_chance: f64,

    /// Own-health fraction below which the AI turns aggressive. Range [0.1, 0.6].
    pub low_health_threshold: f32,
    /// Board-control lead treated as clear dominance. Range [1.0, 50.0].
    pub control_dominance_margin: f32,

    /// Base pacing delay between attacks, in milliseconds.
    pub attack_delay_ms: u64,
    /// Uniform jitter applied to the pacing delay, in milliseconds.
    pub attack_delay_variance_ms: u64,

    /// Attempts to wait for the board layout during setup.
    pub init_retries: u32,
    /// Delay between readiness attempts, in milliseconds.
    pub init_retry_delay_ms: u64,

    /// Maximum time to wait for a fading entity to settle, in milliseconds.
    pub fade_wait_timeout_ms: u64,
    /// Poll interval while waiting on a transient state, in milliseconds.
    pub fade_poll_interval_ms: u64,

    /// Lifetime of a cached board-state snapshot, in milliseconds.
    pub board_state_cache_ms: u64,

    /// Cap on cards played in a single enemy turn.
    pub max_plays_per_turn: usize,

    /// Seed for the decision RNG; fixed seeds give reproducible turns.
    pub rng_seed: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            taunt_multiplier: 1.3,
            ranged_multiplier: 1.2,
            tough_multiplier: 1.25,
            overwhelm_multiplier: 1.35,
            synergy_bonus: 0.15,
            late_game_turn: 6,
            late_game_multiplier: 1.2,
            health_influence: 0.15,
            score_variance: 0.1,
            suboptimal_chance: 0.08,
            low_health_threshold: 0.35,
            control_dominance_margin: 12.0,
            attack_delay_ms: 350,
            attack_delay_variance_ms: 150,
            init_retries: 10,
            init_retry_delay_ms: 100,
            fade_wait_timeout_ms: 2000,
            fade_poll_interval_ms: 50,
            board_state_cache_ms: 1000,
            max_plays_per_turn: 6,
            rng_seed: 0,
        }
    }
}

impl AiConfig {
    /// Clamp every field to its documented range.
    pub fn validated(mut self) -> Self {
        self.taunt_multiplier = self.taunt_multiplier.clamp(1.0, 2.0);
        self.ranged_multiplier = self.ranged_multiplier.clamp(1.0, 2.0);
        self.tough_multiplier = self.tough_multiplier.clamp(1.0, 2.0);
        self.overwhelm_multiplier = self.overwhelm_multiplier.clamp(1.0, 2.0);
        self.synergy_bonus = self.synergy_bonus.clamp(0.0, 0.5);
        self.late_game_multiplier = self.late_game_multiplier.clamp(1.0, 1.5);
        self.health_influence = self.health_influence.clamp(0.05, 0.3);
        self.score_variance = self.score_variance.clamp(0.0, 0.25);
        self.suboptimal_chance = self.suboptimal_chance.clamp(0.0, 0.3);
        self.low_health_threshold = self.low_health_threshold.clamp(0.1, 0.6);
        self.control_dominance_margin = self.control_dominance_margin.clamp(1.0, 50.0);
        self.fade_poll_interval_ms = self.fade_poll_interval_ms.max(1);
        self.max_plays_per_turn = self.max_plays_per_turn.max(1);
        self
    }
}
