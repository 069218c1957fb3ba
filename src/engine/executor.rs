//! Action sequencing with cooperative suspension points
//!
//! One AI turn is a single cooperative task. Long-running steps (waiting
//! for a fade-out to clear, pacing delays between actions) are explicit
//! awaits with a bounded timeout: on expiry the step proceeds and logs a
//! warning instead of blocking the turn forever.

use crate::config::AiConfig;
use crate::core::{Card, CardKind, Entity, Side};
use crate::engine::board_state::BoardState;
use crate::engine::entity_cache::EntityCache;
use crate::engine::strategy::AttackLimiter;
use crate::engine::targeting::{side_board_is_open, PositionSelector, TargetSelector};
use crate::engine::world::{ActionTarget, SharedWorld};
use crate::error::{AiError, Result};
use crate::log_verbose;
use crate::logger::AiLogger;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::Instant;

/// Result of attempting to play one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    /// The card stays unplayed; the rest of the sequence continues
    Skipped(String),
}

/// Poll `cond` until it holds or `timeout` elapses. Returns whether the
/// condition was met; a timeout logs a warning and lets the caller proceed.
async fn wait_bounded(
    logger: &AiLogger,
    label: &str,
    timeout: Duration,
    poll: Duration,
    mut cond: impl FnMut() -> bool,
) -> bool {
    let start = Instant::now();
    loop {
        if cond() {
            return true;
        }
        if start.elapsed() >= timeout {
            logger.warn(
                "wait",
                &format!("timed out waiting for {}; proceeding anyway", label),
            );
            return false;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Snapshot every entity a side has in its board slots, including dead and
/// fading ones; selectors do their own filtering.
pub(crate) fn side_snapshot(world: &SharedWorld, cache: &EntityCache, side: Side) -> Vec<Entity> {
    let world = world.borrow();
    cache
        .side_entities(side)
        .iter()
        .filter_map(|&id| world.entity(id))
        .collect()
}

pub(crate) fn icon_snapshot(world: &SharedWorld, side: Side) -> Option<Entity> {
    let world = world.borrow();
    world.health_icon(side).and_then(|id| world.entity(id))
}

/// Plays an ordered list of cards for one AI turn
pub struct CardPlayExecutor {
    config: Rc<AiConfig>,
    logger: Rc<AiLogger>,
    position: PositionSelector,
    targets: TargetSelector,
}

impl CardPlayExecutor {
    pub fn new(config: Rc<AiConfig>, logger: Rc<AiLogger>) -> Self {
        CardPlayExecutor {
            position: PositionSelector::new(Rc::clone(&config)),
            targets: TargetSelector::new(),
            config,
            logger,
        }
    }

    /// Attempt to play one card. Failures are contained: a card that cannot
    /// be played is skipped and the caller moves on to the next one.
    ///
    /// The cache cell is borrowed per step, never across an await, so
    /// snapshot reads stay possible while the turn is suspended.
    pub async fn play_card(
        &self,
        world: &SharedWorld,
        cache: &RefCell<EntityCache>,
        card: &Card,
        state: &BoardState,
    ) -> Result<PlayOutcome> {
        if world.borrow().mana(Side::Enemy) < card.data.mana_cost {
            return Ok(PlayOutcome::Skipped(format!(
                "{}: not enough mana",
                card.data.name
            )));
        }

        match card.data.kind {
            CardKind::Monster { .. } => self.play_monster(world, cache, card, state).await,
            CardKind::Spell { .. } => self.play_spell(world, cache, card).await,
        }
    }

    async fn play_monster(
        &self,
        world: &SharedWorld,
        cache: &RefCell<EntityCache>,
        card: &Card,
        state: &BoardState,
    ) -> Result<PlayOutcome> {
        // A slot whose occupant is only fading out counts as empty; we wait
        // for the removal to finish before spawning into it.
        let (slot_count, empty_slots) = {
            let w = world.borrow();
            let count = w.slot_count(Side::Enemy);
            let empty: Vec<usize> = (0..count)
                .filter(|&slot| match w.entity_in_slot(Side::Enemy, slot) {
                    None => true,
                    Some(id) => w.entity(id).map(|e| e.fading_out).unwrap_or(true),
                })
                .collect();
            (count, empty)
        };

        let Some(slot) = self
            .position
            .find_monster_position(&card.data, state, &empty_slots, slot_count)
        else {
            return Ok(PlayOutcome::Skipped(format!(
                "{}: board is full",
                card.data.name
            )));
        };

        let occupied = |world: &SharedWorld| {
            world
                .borrow()
                .entity_in_slot(Side::Enemy, slot)
                .is_some()
        };
        if occupied(world) {
            wait_bounded(
                &self.logger,
                "slot fade-out",
                Duration::from_millis(self.config.fade_wait_timeout_ms),
                Duration::from_millis(self.config.fade_poll_interval_ms),
                || !occupied(world),
            )
            .await;
        }

        let spawned = world
            .borrow_mut()
            .spawn_card(&card.data.name, &card.data, slot);
        if !spawned {
            self.logger.warn(
                "card_play",
                &format!("{}: spawn rejected at slot {}", card.data.name, slot),
            );
            return Ok(PlayOutcome::Skipped(format!(
                "{}: spawn rejected",
                card.data.name
            )));
        }

        {
            let w = world.borrow();
            cache.borrow_mut().refresh_after_action(&*w, Side::Enemy);
        }
        if let Err(err) = self.spend(world, card) {
            return Ok(PlayOutcome::Skipped(err));
        }
        self.logger.normal(
            "card_play",
            &format!("placed {} at slot {}", card.data.name, slot),
        );
        Ok(PlayOutcome::Played)
    }

    async fn play_spell(
        &self,
        world: &SharedWorld,
        cache: &RefCell<EntityCache>,
        card: &Card,
    ) -> Result<PlayOutcome> {
        let target = if card.data.is_utility_spell() {
            // Utility effects need no entity target; any valid stand-in does
            ActionTarget::HealthIcon(Side::Enemy)
        } else {
            // Never act on a target that is about to be removed: let any
            // fading candidates settle first, within the bounded wait.
            let relevant_side = if card
                .data
                .spell_effects()
                .iter()
                .any(|e| e.needs_target() && !e.is_beneficial())
            {
                Side::Friendly
            } else {
                Side::Enemy
            };
            wait_bounded(
                &self.logger,
                "target fade-out",
                Duration::from_millis(self.config.fade_wait_timeout_ms),
                Duration::from_millis(self.config.fade_poll_interval_ms),
                || {
                    !side_snapshot(world, &cache.borrow(), relevant_side)
                        .iter()
                        .any(|e| e.fading_out)
                },
            )
            .await;

            let (friendly, enemy) = {
                let cache = cache.borrow();
                (
                    side_snapshot(world, &cache, Side::Friendly),
                    side_snapshot(world, &cache, Side::Enemy),
                )
            };
            let icon = icon_snapshot(world, Side::Enemy);
            match self
                .targets
                .best_spell_target(&card.data, &friendly, &enemy, icon.as_ref())
            {
                Some(target) => target,
                None => {
                    log_verbose!(
                        self.logger,
                        "card_play",
                        "{}: no valid spell target, skipping",
                        card.data.name
                    );
                    return Ok(PlayOutcome::Skipped(format!(
                        "{}: no valid target",
                        card.data.name
                    )));
                }
            }
        };

        // An effect failure is this card's failure only; the remaining
        // sequence continues.
        let applied = world.borrow_mut().apply_spell_effects(target, &card.data);
        if let Err(err) = applied {
            self.logger.warn(
                "card_play",
                &format!("{}: effect failed ({}), card discarded as failed", card.data.name, err),
            );
            return Ok(PlayOutcome::Skipped(format!(
                "{}: effect failed",
                card.data.name
            )));
        }

        {
            let w = world.borrow();
            let mut cache = cache.borrow_mut();
            cache.refresh_after_action(&*w, Side::Friendly);
            cache.refresh_after_action(&*w, Side::Enemy);
        }
        if let Err(err) = self.spend(world, card) {
            return Ok(PlayOutcome::Skipped(err));
        }
        self.logger
            .normal("card_play", &format!("cast {}", card.data.name));
        Ok(PlayOutcome::Played)
    }

    /// Deduct the card's cost. A refused deduction is the card's failure
    /// only; the caller skips it and keeps the card in hand.
    fn spend(&self, world: &SharedWorld, card: &Card) -> std::result::Result<(), String> {
        match world
            .borrow_mut()
            .spend_mana(Side::Enemy, card.data.mana_cost)
        {
            Ok(()) => Ok(()),
            Err(err) => {
                self.logger.warn(
                    "card_play",
                    &format!("{}: mana not deducted ({}), card kept", card.data.name, err),
                );
                Err(format!("{}: mana spend failed", card.data.name))
            }
        }
    }
}

/// Executes an ordered attack plan
pub struct AttackExecutor {
    config: Rc<AiConfig>,
    logger: Rc<AiLogger>,
}

impl AttackExecutor {
    pub fn new(config: Rc<AiConfig>, logger: Rc<AiLogger>) -> Self {
        AttackExecutor { config, logger }
    }

    /// Resolve one attack. The damage application belongs to the host; this
    /// validates the pairing, registers the attacker with the limiter (or
    /// marks it directly when none is configured) and applies the pacing
    /// delay before signalling completion.
    ///
    /// Rejections (missing attacker, icon attacked through a standing
    /// board) are logged and leave the limiter untouched.
    ///
    /// Limiter and RNG cells are borrowed per step so no guard lives
    /// across the pacing sleep.
    pub async fn execute_attack(
        &self,
        world: &SharedWorld,
        attacker: &Entity,
        target: ActionTarget,
        opposing: &[Entity],
        limiter: Option<&RefCell<AttackLimiter>>,
        rng: &RefCell<ChaCha12Rng>,
    ) -> Result<()> {
        if !attacker.is_active_on_board() || attacker.effective_attack() <= 0 {
            let msg = format!("attacker {} cannot act", attacker.id);
            self.logger.warn("attack", &msg);
            return Err(AiError::InvalidTarget(msg));
        }

        match target {
            ActionTarget::HealthIcon(side) => {
                if !side_board_is_open(opposing) {
                    let msg = format!(
                        "health icon of {:?} attacked while blockers are present",
                        side
                    );
                    self.logger.warn("attack", &msg);
                    return Err(AiError::InvalidTarget(msg));
                }
            }
            ActionTarget::Unit(id) => {
                let valid = world
                    .borrow()
                    .entity(id)
                    .map(|e| e.is_valid_target())
                    .unwrap_or(false);
                if !valid {
                    let msg = format!("target {} is dead or fading", id);
                    self.logger.warn("attack", &msg);
                    return Err(AiError::InvalidTarget(msg));
                }
            }
        }

        world.borrow_mut().attack(attacker.id, target)?;

        match limiter {
            Some(limiter) => limiter.borrow_mut().register(attacker.id),
            // Degraded but correct: flag the entity itself
            None => world.borrow_mut().mark_attacked(attacker.id),
        }

        self.logger.normal(
            "attack",
            &format!("{} attacked {:?}", attacker.name, target),
        );

        // Presentation pacing only; no game-state effect
        let base = self.config.attack_delay_ms as i64;
        let var = self.config.attack_delay_variance_ms as i64;
        let jitter = if var > 0 {
            rng.borrow_mut().gen_range(-var..=var)
        } else {
            0
        };
        let delay = (base + jitter).max(0) as u64;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        Ok(())
    }
}
