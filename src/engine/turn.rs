//! Turn orchestration
//!
//! `AiEngine` wires the evaluators, selectors and executors together and
//! drives one enemy turn end to end: wait for the board, play cards in
//! scored order, then run the attack plan. The whole turn is one
//! cooperative task; a second `run_enemy_turn` call while one is in
//! flight is rejected.

use crate::config::AiConfig;
use crate::core::{Card, Entity, EntityId, Hand, Phase, Side, SpellEffectKind};
use crate::engine::board_state::{BoardState, BoardStateEvaluator};
use crate::engine::card_eval::{CardEvaluator, OpponentTendencies};
use crate::engine::entity_cache::{AttackHistory, EntityCache};
use crate::engine::executor::{icon_snapshot, side_snapshot, AttackExecutor, CardPlayExecutor, PlayOutcome};
use crate::engine::registry::ServiceRegistry;
use crate::engine::strategy::{AttackLimiter, AttackStrategyManager};
use crate::engine::world::SharedWorld;
use crate::error::Result;
use crate::log_verbose;
use crate::logger::AiLogger;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Clears the in-progress flag even when the turn exits early
struct TurnGuard<'a>(&'a Cell<bool>);

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// The enemy decision engine
pub struct AiEngine {
    world: SharedWorld,
    config: Rc<AiConfig>,
    logger: Rc<AiLogger>,

    cache: RefCell<EntityCache>,
    evaluator: RefCell<BoardStateEvaluator>,
    card_eval: CardEvaluator,
    strategy: AttackStrategyManager,
    card_play: CardPlayExecutor,
    attacks: AttackExecutor,

    /// Registered by the host; absent means falling back to per-entity flags
    limiter: Option<Rc<RefCell<AttackLimiter>>>,

    rng: RefCell<ChaCha12Rng>,
    tendencies: RefCell<OpponentTendencies>,
    hand: RefCell<Hand>,
    in_progress: Cell<bool>,
}

impl AiEngine {
    /// Resolve collaborators from the registry. The world handle is
    /// required; config, logger and limiter are optional with defaults.
    pub fn from_registry(registry: &ServiceRegistry) -> Result<AiEngine> {
        let world: SharedWorld = registry.get::<SharedWorld>()?;
        let config: Rc<AiConfig> = registry
            .try_get::<Rc<AiConfig>>()
            .map(|c| Rc::new((*c).clone().validated()))
            .unwrap_or_else(|| Rc::new(AiConfig::default()));
        let logger: Rc<AiLogger> = registry
            .try_get::<Rc<AiLogger>>()
            .unwrap_or_else(|| Rc::new(AiLogger::new()));
        let limiter: Option<Rc<RefCell<AttackLimiter>>> = registry.try_get();
        if limiter.is_none() {
            logger.warn(
                "init",
                "no attack limiter registered; using per-entity attack flags",
            );
        }

        Ok(AiEngine {
            cache: RefCell::new(EntityCache::new()),
            evaluator: RefCell::new(BoardStateEvaluator::new(Rc::clone(&config))),
            card_eval: CardEvaluator::new(Rc::clone(&config)),
            strategy: AttackStrategyManager::new(Rc::clone(&config)),
            card_play: CardPlayExecutor::new(Rc::clone(&config), Rc::clone(&logger)),
            attacks: AttackExecutor::new(Rc::clone(&config), Rc::clone(&logger)),
            rng: RefCell::new(ChaCha12Rng::seed_from_u64(config.rng_seed)),
            tendencies: RefCell::new(OpponentTendencies::new()),
            hand: RefCell::new(Hand::new()),
            in_progress: Cell::new(false),
            limiter,
            world,
            config,
            logger,
        })
    }

    pub fn logger(&self) -> &AiLogger {
        &self.logger
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn is_turn_in_progress(&self) -> bool {
        self.in_progress.get()
    }

    /// Reset the RNG stream; identical seeds replay identical decisions
    pub fn seed_rng(&self, seed: u64) {
        *self.rng.borrow_mut() = ChaCha12Rng::seed_from_u64(seed);
    }

    pub fn add_card_to_hand(&self, card: Card) {
        self.hand.borrow_mut().add(card);
    }

    pub fn hand_size(&self) -> usize {
        self.hand.borrow().len()
    }

    /// Feed an observed opponent card effect into the tendency tally
    pub fn record_opponent_spell(&self, kind: SpellEffectKind) {
        self.tendencies.borrow_mut().record(kind);
    }

    /// Phase transition hook. Combat boundaries reset the per-phase attack
    /// limiter; any transition invalidates the cached board snapshot.
    pub fn notify_phase_changed(&self, phase: Phase) {
        if phase.is_combat_boundary() {
            match &self.limiter {
                Some(limiter) => limiter.borrow_mut().reset(),
                None => self.world.borrow_mut().clear_attack_flags(),
            }
        }
        self.evaluator.borrow_mut().invalidate();
        log_verbose!(self.logger, "phase", "phase changed to {:?}", phase);
    }

    /// Rebuild the entity cache from the current board slots. Hosts call
    /// this after placing or removing entities outside the engine's turn.
    pub fn rebuild_entity_cache(&self) {
        let world = self.world.borrow();
        self.cache.borrow_mut().build_cache(&*world);
    }

    /// Current board snapshot, served from the time-boxed cache when valid
    pub fn evaluate_board_state(&self, now: Instant) -> Result<Rc<BoardState>> {
        let world = self.world.borrow();
        let cache = self.cache.borrow();
        self.evaluator.borrow_mut().evaluate(now, &*world, &cache)
    }

    /// Run one full enemy turn: board readiness, card plays, attacks.
    ///
    /// A turn already in flight makes this a logged no-op. A board that
    /// never becomes ready within the retry budget skips the turn.
    pub async fn run_enemy_turn(&self) -> Result<()> {
        if self.in_progress.replace(true) {
            self.logger
                .warn("turn", "enemy turn already in progress, ignoring request");
            return Ok(());
        }
        let _guard = TurnGuard(&self.in_progress);

        if !self.wait_for_board().await {
            self.logger
                .warn("turn", "board never became ready, skipping enemy turn");
            return Ok(());
        }
        {
            let world = self.world.borrow();
            self.cache.borrow_mut().build_cache(&*world);
        }

        self.play_cards().await?;
        self.run_attacks().await?;
        Ok(())
    }

    async fn wait_for_board(&self) -> bool {
        let delay = Duration::from_millis(self.config.init_retry_delay_ms);
        for attempt in 0..self.config.init_retries {
            if self.world.borrow().board_ready() {
                return true;
            }
            log_verbose!(
                self.logger,
                "init",
                "board not ready, retry {}/{}",
                attempt + 1,
                self.config.init_retries
            );
            tokio::time::sleep(delay).await;
        }
        self.world.borrow().board_ready()
    }

    async fn play_cards(&self) -> Result<()> {
        let state = match self.evaluate_board_state(Instant::now()) {
            Ok(state) => state,
            Err(err) => {
                self.logger
                    .warn("turn", &format!("skipping card plays: {}", err));
                return Ok(());
            }
        };

        // Order once up front; affordability is re-checked per play since
        // mana drains as cards resolve.
        let ordered: Vec<Card> = {
            let hand = self.hand.borrow();
            let playable = self.card_eval.playable_cards(&hand, &state);
            let tendencies = self.tendencies.borrow();
            let mut rng = self.rng.borrow_mut();
            self.card_eval
                .determine_card_play_order(playable, &state, &tendencies, &mut rng)
                .into_iter()
                .cloned()
                .collect()
        };

        let mut played = 0usize;
        for card in &ordered {
            if played >= self.config.max_plays_per_turn {
                log_verbose!(self.logger, "turn", "play limit reached");
                break;
            }
            if self.world.borrow().mana(Side::Enemy) < card.data.mana_cost {
                continue;
            }

            let outcome = self
                .card_play
                .play_card(&self.world, &self.cache, card, &state)
                .await?;
            match outcome {
                PlayOutcome::Played => {
                    self.hand.borrow_mut().remove(card.id);
                    self.evaluator.borrow_mut().invalidate();
                    played += 1;
                }
                PlayOutcome::Skipped(reason) => {
                    log_verbose!(self.logger, "turn", "card skipped: {}", reason);
                }
            }
        }
        Ok(())
    }

    async fn run_attacks(&self) -> Result<()> {
        let state = match self.evaluate_board_state(Instant::now()) {
            Ok(state) => state,
            Err(err) => {
                self.logger
                    .warn("turn", &format!("skipping attacks: {}", err));
                return Ok(());
            }
        };

        let mode = self.strategy.determine_strategic_mode(&state);
        self.logger.normal(
            "strategy",
            &format!(
                "mode {:?}, aggression {:.2}",
                mode,
                self.strategy.aggression_weight(&state)
            ),
        );

        let order: Vec<EntityId> = {
            let cache = self.cache.borrow();
            let world = self.world.borrow();
            let limiter = self.limiter.as_ref().map(|rc| rc.borrow());
            let history = match limiter.as_deref() {
                Some(lim) => AttackHistory::Limiter(lim),
                None => AttackHistory::EntityFlags,
            };
            let attackers = cache.get_valid_entities(&*world, Side::Enemy, history);
            let defenders =
                cache.get_valid_entities(&*world, Side::Friendly, AttackHistory::Ignore);
            self.strategy.get_attack_order(&attackers, &defenders)
        };

        for id in order {
            let Some(attacker) = self.world.borrow().entity(id) else {
                continue;
            };
            // Earlier attacks may have killed candidates, re-snapshot
            let defenders: Vec<Entity> = {
                let cache = self.cache.borrow();
                side_snapshot(&self.world, &cache, Side::Friendly)
            };
            let icon = icon_snapshot(&self.world, Side::Friendly);

            let Some(target) =
                self.strategy
                    .select_target(&attacker, &defenders, icon.as_ref(), &state, mode)
            else {
                log_verbose!(self.logger, "attack", "{} holds back", attacker.name);
                continue;
            };

            let resolved = self
                .attacks
                .execute_attack(
                    &self.world,
                    &attacker,
                    target,
                    &defenders,
                    self.limiter.as_deref(),
                    &self.rng,
                )
                .await;
            if let Err(err) = resolved {
                log_verbose!(self.logger, "attack", "attack rejected: {}", err);
                continue;
            }

            {
                let world = self.world.borrow();
                let mut cache = self.cache.borrow_mut();
                cache.refresh_after_action(&*world, Side::Friendly);
                cache.refresh_after_action(&*world, Side::Enemy);
            }
            self.evaluator.borrow_mut().invalidate();
        }
        Ok(())
    }
}
