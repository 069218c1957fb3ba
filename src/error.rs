//! Error types for the Grimward AI engine
//!
//! Every failure in this crate is recovered at the smallest enclosing scope:
//! the worst user-visible outcome of any error is that the AI takes a weaker
//! action or skips one, never that the turn-phase driver crashes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    /// A required collaborator (board layout, entity cache, mana source) has
    /// not finished initializing. Recovered by bounded retry during setup.
    #[error("collaborator not ready: {0}")]
    NotReady(String),

    /// A chosen target is missing, dead, or violates an allegiance or
    /// health-icon rule. The offending action is skipped.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// A required configuration value or service is missing. The engine
    /// falls back to a degraded-but-correct default where possible.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Applying a spell or attack effect failed inside a collaborator.
    /// Caught at the point of application and treated as a skipped action.
    #[error("effect application failed: {0}")]
    EffectApplication(String),
}

pub type Result<T> = std::result::Result<T, AiError>;
