//! Full enemy-turn sequencing against the scripted world

mod common;

use common::{build_engine, build_engine_without_limiter, monster_card, spell_card, test_config, SimWorld};
use grimward_ai::core::{Phase, Side, SpellEffect};

#[tokio::test]
async fn test_full_turn_plays_cards_then_attacks() {
    let mut sim = SimWorld::new(4);
    sim.add_monster(Side::Friendly, 0, "Knight", 2, 3);
    sim.set_mana(Side::Enemy, 8);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(monster_card(1, "Ghoul", 3, 4, 4));
    rig.engine.add_card_to_hand(spell_card(
        2,
        "Fire Bolt",
        2,
        &[SpellEffect::Damage { amount: 3 }],
    ));

    rig.engine.run_enemy_turn().await.unwrap();

    let sim = sim.borrow();
    assert!(
        sim.actions.iter().any(|a| a.starts_with("spawn Ghoul")),
        "monster was placed: {:?}",
        sim.actions
    );
    assert!(
        sim.actions.iter().any(|a| a.starts_with("spell Fire Bolt")),
        "spell was cast: {:?}",
        sim.actions
    );
    assert!(
        sim.actions.iter().any(|a| a.starts_with("attack")),
        "spawned monster attacked: {:?}",
        sim.actions
    );
    // 8 mana minus Ghoul (3) and Fire Bolt (2)
    assert_eq!(sim.mana_left(Side::Enemy), 3);
    assert!(!rig.engine.is_turn_in_progress());
    assert_eq!(rig.engine.hand_size(), 0);
}

#[tokio::test]
async fn test_card_plays_happen_before_attacks() {
    let mut sim = SimWorld::new(3);
    sim.add_monster(Side::Friendly, 0, "Peasant", 1, 2);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(monster_card(1, "Ogre", 4, 5, 5));

    rig.engine.run_enemy_turn().await.unwrap();

    let sim = sim.borrow();
    let spawn_idx = sim.actions.iter().position(|a| a.starts_with("spawn"));
    let attack_idx = sim.actions.iter().position(|a| a.starts_with("attack"));
    assert!(spawn_idx.is_some() && attack_idx.is_some());
    assert!(spawn_idx.unwrap() < attack_idx.unwrap());
}

#[tokio::test]
async fn test_board_never_ready_skips_turn() {
    let mut sim = SimWorld::new(3);
    sim.never_ready();
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(monster_card(1, "Ghoul", 3, 4, 4));

    rig.engine.run_enemy_turn().await.unwrap();

    assert!(sim.borrow().actions.is_empty());
    assert!(rig.logger.count_category("turn") >= 1);
    assert!(!rig.engine.is_turn_in_progress());
}

#[tokio::test]
async fn test_board_ready_after_retries_proceeds() {
    let mut sim = SimWorld::new(3);
    sim.ready_after(2);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(monster_card(1, "Ghoul", 3, 4, 4));

    rig.engine.run_enemy_turn().await.unwrap();

    assert!(sim
        .borrow()
        .actions
        .iter()
        .any(|a| a.starts_with("spawn Ghoul")));
}

#[tokio::test]
async fn test_reentrant_turn_is_rejected() {
    let mut sim = SimWorld::new(3);
    // An attacker on the board guarantees a pacing await for the second
    // future to poll during
    sim.add_monster(Side::Enemy, 0, "Brute", 4, 4);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    let (first, second) = tokio::join!(rig.engine.run_enemy_turn(), rig.engine.run_enemy_turn());
    first.unwrap();
    second.unwrap();

    let warnings = rig
        .logger
        .entries()
        .iter()
        .filter(|e| e.message.contains("already in progress"))
        .count();
    assert_eq!(warnings, 1);
    // Only one turn's worth of attacks happened
    let attacks = sim
        .borrow()
        .actions
        .iter()
        .filter(|a| a.starts_with("attack"))
        .count();
    assert_eq!(attacks, 1);
}

#[tokio::test]
async fn test_fade_timeout_does_not_stall_the_turn() {
    let mut sim = SimWorld::new(2);
    // Both slots blocked, one by a fading entity that never clears
    sim.add_monster(Side::Enemy, 0, "Wall", 1, 8);
    sim.add_fading(Side::Enemy, 1, "Dying Wisp");
    sim.clear_fades_after(u32::MAX);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(monster_card(1, "Ghoul", 3, 4, 4));

    rig.engine.run_enemy_turn().await.unwrap();

    // The spawn was abandoned but the turn still completed
    assert!(!sim.borrow().actions.iter().any(|a| a.starts_with("spawn")));
    assert!(rig.logger.count_category("wait") >= 1);
    assert!(!rig.engine.is_turn_in_progress());
}

#[tokio::test]
async fn test_fade_clearing_frees_the_slot() {
    let mut sim = SimWorld::new(2);
    sim.add_monster(Side::Enemy, 0, "Wall", 1, 8);
    sim.add_fading(Side::Enemy, 1, "Dying Wisp");
    sim.clear_fades_after(3);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(monster_card(1, "Ghoul", 3, 4, 4));

    rig.engine.run_enemy_turn().await.unwrap();

    assert!(sim
        .borrow()
        .actions
        .iter()
        .any(|a| a.starts_with("spawn Ghoul slot 1")));
}

#[tokio::test]
async fn test_attackers_register_with_limiter() {
    let mut sim = SimWorld::new(3);
    let brute = sim.add_monster(Side::Enemy, 0, "Brute", 4, 4);
    sim.add_monster(Side::Friendly, 0, "Knight", 2, 10);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.run_enemy_turn().await.unwrap();

    assert!(rig.limiter.borrow().has_attacked(brute));
    // Limiter path leaves the entity flag alone
    let snapshot = sim.borrow().entity_snapshot(brute).unwrap();
    assert!(!snapshot.has_attacked);
}

#[tokio::test]
async fn test_missing_limiter_falls_back_to_entity_flags() {
    let mut sim = SimWorld::new(3);
    let brute = sim.add_monster(Side::Enemy, 0, "Brute", 4, 4);
    sim.add_monster(Side::Friendly, 0, "Knight", 2, 10);
    let (sim, world) = sim.shared();

    let (engine, logger) = build_engine_without_limiter(world, test_config());
    engine.run_enemy_turn().await.unwrap();

    let snapshot = sim.borrow().entity_snapshot(brute).unwrap();
    assert!(snapshot.has_attacked);
    assert!(logger.count_category("init") >= 1);
}

#[tokio::test]
async fn test_fallback_flags_reset_between_turns() {
    let mut sim = SimWorld::new(3);
    let brute = sim.add_monster(Side::Enemy, 0, "Brute", 4, 4);
    sim.add_monster(Side::Friendly, 0, "Knight", 2, 20);
    let (sim, world) = sim.shared();

    let (engine, _logger) = build_engine_without_limiter(world, test_config());
    engine.run_enemy_turn().await.unwrap();
    assert!(sim.borrow().entity_snapshot(brute).unwrap().has_attacked);

    // The next round passes a combat boundary before the enemy acts again
    engine.notify_phase_changed(Phase::PlayerCombat);
    assert!(!sim.borrow().entity_snapshot(brute).unwrap().has_attacked);

    engine.run_enemy_turn().await.unwrap();
    let attacks = sim
        .borrow()
        .actions
        .iter()
        .filter(|a| a.starts_with("attack"))
        .count();
    assert_eq!(attacks, 2);
}

#[tokio::test]
async fn test_health_icon_attacked_only_on_open_board() {
    let mut sim = SimWorld::new(3);
    sim.add_monster(Side::Enemy, 0, "Brute", 4, 4);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.run_enemy_turn().await.unwrap();

    // No blockers: the attack goes to the player's health icon
    assert_eq!(sim.borrow().icon_health(Side::Friendly), 26);
}

#[tokio::test]
async fn test_health_icon_safe_behind_blockers() {
    let mut sim = SimWorld::new(3);
    sim.add_monster(Side::Enemy, 0, "Brute", 4, 4);
    sim.add_monster(Side::Friendly, 0, "Knight", 2, 10);
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.run_enemy_turn().await.unwrap();

    let sim = sim.borrow();
    assert_eq!(sim.icon_health(Side::Friendly), 30);
    assert!(sim
        .actions
        .iter()
        .any(|a| a.starts_with("attack") && a.contains("Unit")));
}

#[tokio::test]
async fn test_failed_spell_is_contained() {
    let mut sim = SimWorld::new(3);
    sim.add_monster(Side::Friendly, 0, "Knight", 2, 10);
    sim.fail_spells = true;
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(spell_card(
        1,
        "Fizzle",
        2,
        &[SpellEffect::Damage { amount: 3 }],
    ));
    rig.engine.add_card_to_hand(monster_card(2, "Ghoul", 3, 4, 4));

    rig.engine.run_enemy_turn().await.unwrap();

    let sim = sim.borrow();
    // Spell failed, no mana spent on it, the rest of the turn went on
    assert!(sim.actions.iter().any(|a| a.starts_with("spawn Ghoul")));
    assert!(!sim.actions.iter().any(|a| a.starts_with("spell")));
    assert_eq!(sim.mana_left(Side::Enemy), 7);
    assert!(rig.logger.count_category("card_play") >= 1);
    // The failed card stays in hand
    assert_eq!(rig.engine.hand_size(), 1);
}

#[tokio::test]
async fn test_mana_spend_failure_does_not_abort_the_turn() {
    let mut sim = SimWorld::new(3);
    sim.add_monster(Side::Friendly, 0, "Knight", 2, 10);
    sim.fail_spend = true;
    let (sim, world) = sim.shared();

    let rig = build_engine(world, test_config());
    rig.engine.add_card_to_hand(monster_card(1, "Ghoul", 3, 4, 4));
    rig.engine.add_card_to_hand(monster_card(2, "Imp", 1, 1, 1));

    rig.engine.run_enemy_turn().await.unwrap();

    let sim = sim.borrow();
    // Each refused deduction skips only that play; both spawns landed,
    // no mana moved, both cards stay in hand
    let spawns = sim.actions.iter().filter(|a| a.starts_with("spawn")).count();
    assert_eq!(spawns, 2);
    assert_eq!(sim.mana_left(Side::Enemy), 10);
    assert_eq!(rig.engine.hand_size(), 2);
    assert!(rig.logger.count_category("card_play") >= 2);
    // The turn still went on to resolve attacks
    assert!(sim.actions.iter().any(|a| a.starts_with("attack")));
}

#[tokio::test]
async fn test_play_limit_bounds_card_plays() {
    let mut sim = SimWorld::new(8);
    sim.set_mana(Side::Enemy, 50);
    let (sim, world) = sim.shared();

    let mut config = test_config();
    config.max_plays_per_turn = 2;
    let rig = build_engine(world, config);
    for i in 0..5 {
        rig.engine
            .add_card_to_hand(monster_card(i, &format!("Imp {}", i), 1, 1, 1));
    }

    rig.engine.run_enemy_turn().await.unwrap();

    let spawns = sim
        .borrow()
        .actions
        .iter()
        .filter(|a| a.starts_with("spawn"))
        .count();
    assert_eq!(spawns, 2);
    assert_eq!(rig.engine.hand_size(), 3);
}
