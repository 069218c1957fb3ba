//! Grimward AI - decision engine for the enemy side of a turn-based
//! card/board combat game.
//!
//! Given the current board this crate decides which cards the enemy plays,
//! where it places them, which targets it attacks and in what order, then
//! hands concrete actions to external execution collaborators. Rendering,
//! combat math and board layout are owned by the host; they are consumed
//! here through the traits in [`engine::world`].

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod logger;

pub use config::AiConfig;
pub use engine::board_state::BoardState;
pub use engine::turn::AiEngine;
pub use error::{AiError, Result};
pub use logger::{AiLogger, VerbosityLevel};
