//! The decision engine: caching, evaluation, targeting, strategy, sequencing

pub mod board_state;
pub mod card_eval;
pub mod entity_cache;
pub mod executor;
pub mod registry;
pub mod strategy;
pub mod targeting;
pub mod turn;
pub mod world;

pub use board_state::{BoardState, BoardStateCache, BoardStateEvaluator, KeywordEvaluator};
pub use card_eval::{CardEvaluator, OpponentTendencies};
pub use entity_cache::{AttackHistory, EntityCache};
pub use executor::{AttackExecutor, CardPlayExecutor, PlayOutcome};
pub use registry::ServiceRegistry;
pub use strategy::{AttackLimiter, AttackStrategyManager, StrategicMode};
pub use targeting::{side_board_is_open, PositionSelector, TargetSelector};
pub use turn::AiEngine;
pub use world::{ActionTarget, GameWorld, SharedWorld};
