#![allow(dead_code)]

//! Shared test harness: a scripted in-memory game world
//!
//! `SimWorld` implements just enough of the host game to drive full enemy
//! turns: board slots, entity snapshots, mana pools, health icons and a
//! recorded action log for assertions. Readiness and fade-out clearing are
//! poll counters so tests can script the timing the engine waits on.

use grimward_ai::config::AiConfig;
use grimward_ai::core::{
    Card, CardData, CardId, CardKind, Entity, EntityId, EntityKind, Phase, Side, SpellEffect,
};
use grimward_ai::engine::{
    ActionTarget, AttackLimiter, GameWorld, ServiceRegistry, SharedWorld,
};
use grimward_ai::logger::{AiLogger, OutputMode};
use grimward_ai::{AiEngine, AiError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

const PLAYER_ICON: EntityId = EntityId::new(1000);
const ENEMY_ICON: EntityId = EntityId::new(1001);

pub struct SimWorld {
    slots_per_side: usize,
    /// board_ready() polls remaining before the board reports ready
    ready_countdown: Cell<u32>,
    /// entity_in_slot() polls on a fading occupant before fades clear;
    /// u32::MAX never clears
    fade_polls: Cell<u32>,
    fades_cleared: Cell<bool>,

    entities: HashMap<EntityId, Entity>,
    slots: HashMap<(Side, usize), EntityId>,
    player_mana: i32,
    enemy_mana: i32,
    pub phase: Phase,
    pub turn_number: u32,
    pub first_next: Side,
    pub fail_spells: bool,
    /// Scripted spend_mana refusal, simulating a host-side ledger desync
    pub fail_spend: bool,
    next_id: u32,

    /// Every command the engine issued, in order
    pub actions: Vec<String>,
}

impl SimWorld {
    pub fn new(slots_per_side: usize) -> Self {
        let mut entities = HashMap::new();
        entities.insert(
            PLAYER_ICON,
            Entity::health_icon(PLAYER_ICON, Side::Friendly, 30, 30),
        );
        entities.insert(
            ENEMY_ICON,
            Entity::health_icon(ENEMY_ICON, Side::Enemy, 30, 30),
        );
        SimWorld {
            slots_per_side,
            ready_countdown: Cell::new(0),
            fade_polls: Cell::new(0),
            fades_cleared: Cell::new(false),
            entities,
            slots: HashMap::new(),
            player_mana: 10,
            enemy_mana: 10,
            phase: Phase::EnemyPrep,
            turn_number: 3,
            first_next: Side::Friendly,
            fail_spells: false,
            fail_spend: false,
            next_id: 1,
            actions: Vec::new(),
        }
    }

    pub fn shared(self) -> (Rc<RefCell<SimWorld>>, SharedWorld) {
        let rc = Rc::new(RefCell::new(self));
        let world: SharedWorld = rc.clone();
        (rc, world)
    }

    /// Board reports not-ready for the next `polls` readiness checks
    pub fn ready_after(&mut self, polls: u32) {
        self.ready_countdown.set(polls);
    }

    pub fn never_ready(&mut self) {
        self.ready_countdown.set(u32::MAX);
    }

    /// Fading occupants disappear after `polls` slot queries
    pub fn clear_fades_after(&mut self, polls: u32) {
        self.fade_polls.set(polls);
    }

    pub fn add_monster(
        &mut self,
        side: Side,
        slot: usize,
        name: &str,
        attack: i32,
        health: i32,
    ) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        let mut e = Entity::monster(id, side, name).with_stats(attack, health);
        e.placed = true;
        e.slot = Some(slot);
        self.entities.insert(id, e);
        self.slots.insert((side, slot), id);
        id
    }

    pub fn add_fading(&mut self, side: Side, slot: usize, name: &str) -> EntityId {
        let id = self.add_monster(side, slot, name, 1, 1);
        self.entities.get_mut(&id).unwrap().fading_out = true;
        id
    }

    pub fn set_mana(&mut self, side: Side, amount: i32) {
        match side {
            Side::Friendly => self.player_mana = amount,
            Side::Enemy => self.enemy_mana = amount,
        }
    }

    pub fn mana_left(&self, side: Side) -> i32 {
        match side {
            Side::Friendly => self.player_mana,
            Side::Enemy => self.enemy_mana,
        }
    }

    pub fn entity_snapshot(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).cloned()
    }

    pub fn icon_health(&self, side: Side) -> i32 {
        let id = match side {
            Side::Friendly => PLAYER_ICON,
            Side::Enemy => ENEMY_ICON,
        };
        self.entities[&id].health
    }

    pub fn monster_count(&self, side: Side) -> usize {
        self.entities
            .values()
            .filter(|e| e.side == side && e.is_active_on_board() && !self.faded(e))
            .count()
    }

    fn faded(&self, e: &Entity) -> bool {
        e.fading_out && self.fades_cleared.get()
    }

    fn icon_id(&self, side: Side) -> EntityId {
        match side {
            Side::Friendly => PLAYER_ICON,
            Side::Enemy => ENEMY_ICON,
        }
    }

    fn damage_entity(&mut self, id: EntityId, amount: i32) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.health -= amount;
            if e.health <= 0 && e.kind == EntityKind::Monster {
                e.dead = true;
                let side = e.side;
                let slot = e.slot.take();
                if let Some(slot) = slot {
                    self.slots.remove(&(side, slot));
                }
            }
        }
    }

    fn target_entity_id(&self, target: ActionTarget) -> EntityId {
        match target {
            ActionTarget::Unit(id) => id,
            ActionTarget::HealthIcon(side) => self.icon_id(side),
        }
    }
}

impl GameWorld for SimWorld {
    fn board_ready(&self) -> bool {
        let left = self.ready_countdown.get();
        if left == 0 {
            return true;
        }
        self.ready_countdown.set(left.saturating_sub(1));
        false
    }

    fn slot_count(&self, _side: Side) -> usize {
        self.slots_per_side
    }

    fn entity_in_slot(&self, side: Side, slot: usize) -> Option<EntityId> {
        let id = *self.slots.get(&(side, slot))?;
        let e = self.entities.get(&id)?;
        if e.fading_out {
            if self.fades_cleared.get() {
                return None;
            }
            let left = self.fade_polls.get();
            if left == 0 {
                self.fades_cleared.set(true);
                return None;
            }
            self.fade_polls.set(left.saturating_sub(1));
        }
        Some(id)
    }

    fn entity(&self, id: EntityId) -> Option<Entity> {
        let e = self.entities.get(&id)?;
        if self.faded(e) {
            return None;
        }
        Some(e.clone())
    }

    fn health_icon(&self, side: Side) -> Option<EntityId> {
        Some(self.icon_id(side))
    }

    fn mana(&self, side: Side) -> i32 {
        match side {
            Side::Friendly => self.player_mana,
            Side::Enemy => self.enemy_mana,
        }
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn turn_number(&self) -> u32 {
        self.turn_number
    }

    fn acts_first_next_turn(&self) -> Side {
        self.first_next
    }

    fn spawn_card(&mut self, name: &str, data: &CardData, slot: usize) -> bool {
        if self.entity_in_slot(Side::Enemy, slot).is_some() {
            return false;
        }
        let (attack, health) = match data.kind {
            CardKind::Monster { attack, health } => (attack, health),
            CardKind::Spell { .. } => return false,
        };
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        let mut e = Entity::monster(id, Side::Enemy, name).with_stats(attack, health);
        e.keywords = data.keywords.clone();
        e.placed = true;
        e.slot = Some(slot);
        self.entities.insert(id, e);
        self.slots.insert((Side::Enemy, slot), id);
        self.actions.push(format!("spawn {} slot {}", name, slot));
        true
    }

    fn apply_spell_effects(&mut self, target: ActionTarget, data: &CardData) -> Result<()> {
        if self.fail_spells {
            return Err(AiError::EffectApplication(format!(
                "{}: scripted failure",
                data.name
            )));
        }
        let id = self.target_entity_id(target);
        for effect in data.spell_effects().to_vec() {
            match effect {
                SpellEffect::Damage { amount } => self.damage_entity(id, amount),
                SpellEffect::Heal { amount } => {
                    if let Some(e) = self.entities.get_mut(&id) {
                        e.health = (e.health + amount).min(e.max_health);
                    }
                }
                SpellEffect::AttackBuff { multiplier, .. } => {
                    if let Some(e) = self.entities.get_mut(&id) {
                        e.attack_multiplier = multiplier;
                    }
                }
                SpellEffect::Draw { .. } | SpellEffect::PayLifeDraw { .. } => {}
            }
        }
        self.actions.push(format!("spell {} -> {:?}", data.name, target));
        Ok(())
    }

    fn attack(&mut self, attacker: EntityId, target: ActionTarget) -> Result<()> {
        let damage = self
            .entities
            .get(&attacker)
            .map(|e| e.effective_attack())
            .ok_or_else(|| AiError::InvalidTarget(format!("unknown attacker {}", attacker)))?;
        let id = self.target_entity_id(target);
        self.damage_entity(id, damage);
        self.actions.push(format!("attack {} -> {:?}", attacker, target));
        Ok(())
    }

    fn spend_mana(&mut self, side: Side, amount: i32) -> Result<()> {
        if self.fail_spend {
            return Err(AiError::EffectApplication("mana ledger desynced".into()));
        }
        let pool = match side {
            Side::Friendly => &mut self.player_mana,
            Side::Enemy => &mut self.enemy_mana,
        };
        if *pool < amount {
            return Err(AiError::EffectApplication(format!(
                "insufficient mana on {:?}",
                side
            )));
        }
        *pool -= amount;
        Ok(())
    }

    fn mark_attacked(&mut self, id: EntityId) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.has_attacked = true;
        }
    }

    fn clear_attack_flags(&mut self) {
        for e in self.entities.values_mut() {
            e.has_attacked = false;
        }
    }
}

/// Config with millisecond-scale waits so tests finish quickly, and with
/// decision noise disabled for predictable assertions.
pub fn test_config() -> AiConfig {
    AiConfig {
        attack_delay_ms: 1,
        attack_delay_variance_ms: 0,
        init_retries: 3,
        init_retry_delay_ms: 1,
        fade_wait_timeout_ms: 10,
        fade_poll_interval_ms: 1,
        score_variance: 0.0,
        suboptimal_chance: 0.0,
        ..AiConfig::default()
    }
}

pub struct TestRig {
    pub engine: AiEngine,
    pub logger: Rc<AiLogger>,
    pub limiter: Rc<RefCell<AttackLimiter>>,
}

pub fn build_engine(world: SharedWorld, config: AiConfig) -> TestRig {
    let mut logger = AiLogger::new();
    logger.set_output_mode(OutputMode::Memory);
    let logger = Rc::new(logger);
    let limiter = Rc::new(RefCell::new(AttackLimiter::new()));

    let mut registry = ServiceRegistry::new();
    registry.register::<SharedWorld>(world).unwrap();
    registry.register(Rc::new(config)).unwrap();
    registry.register(Rc::clone(&logger)).unwrap();
    registry.register(Rc::clone(&limiter)).unwrap();

    let engine = AiEngine::from_registry(&registry).unwrap();
    TestRig {
        engine,
        logger,
        limiter,
    }
}

/// Engine without a registered limiter, exercising the entity-flag fallback
pub fn build_engine_without_limiter(world: SharedWorld, config: AiConfig) -> (AiEngine, Rc<AiLogger>) {
    let mut logger = AiLogger::new();
    logger.set_output_mode(OutputMode::Memory);
    let logger = Rc::new(logger);

    let mut registry = ServiceRegistry::new();
    registry.register::<SharedWorld>(world).unwrap();
    registry.register(Rc::new(config)).unwrap();
    registry.register(Rc::clone(&logger)).unwrap();

    let engine = AiEngine::from_registry(&registry).unwrap();
    (engine, logger)
}

pub fn monster_card(id: u32, name: &str, cost: i32, attack: i32, health: i32) -> Card {
    Card::new(CardId::new(id), CardData::monster(name, cost, attack, health))
}

pub fn spell_card(id: u32, name: &str, cost: i32, effects: &[SpellEffect]) -> Card {
    Card::new(CardId::new(id), CardData::spell(name, cost, effects))
}
