//! Engine integration tests.
//!
//! Event delivery in these tests is made deterministic with
//! [`EventBus::dispatch_pending`] instead of racing the pump thread.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use strafe_core::config::GameConfig;
use strafe_core::constants::{
    DRAIN_BATCH, ENEMY_HEALTH, FIXED_DT, FORMATION_SPACING, INBOUND_QUEUE_CAPACITY,
    PLAYER_HEALTH, SUBSCRIBER_QUEUE_CAPACITY,
};
use strafe_core::entity::{handle_id, EntityHandle, GameEntity};
use strafe_core::enums::{FormationKind, GameState, InputAction, Key};
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::Vec2;

use crate::bus::EventBus;
use crate::entity::{pattern_for, Boss, Bullet, Enemy, Formation, Player};
use crate::game::Game;
use crate::manager::{LevelManager, ScoreManager};
use crate::shutdown::shutdown_channel;
use crate::state::StateManager;
use crate::subsystem::{drain, Subsystem};
use crate::systems::{CollisionSystem, InputSystem, KeySource, NullKeySource, SpawnDirector};

fn delta(payload: &EventPayload) -> i64 {
    match payload {
        EventPayload::ScoreDelta(n) => *n,
        other => panic!("unexpected payload {other:?}"),
    }
}

// --- Event bus ---

#[test]
fn test_bus_preserves_publication_order() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::ScoreEvent).unwrap();
    for n in 1..=5 {
        bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(n))
            .unwrap();
    }
    assert_eq!(bus.dispatch_pending(), 5);

    let received: Vec<i64> = std::iter::from_fn(|| sub.try_recv())
        .map(|e| delta(&e.payload))
        .collect();
    assert_eq!(received, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_bus_drops_only_for_the_slow_subscriber() {
    let bus = EventBus::new();
    let fast = bus.subscribe(EventType::ScoreEvent).unwrap();
    let slow = bus.subscribe(EventType::ScoreEvent).unwrap();

    for _ in 0..SUBSCRIBER_QUEUE_CAPACITY {
        bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(1))
            .unwrap();
    }
    bus.dispatch_pending();

    // The fast subscriber frees half its queue; the slow one drains nothing.
    let mut fast_received = 0;
    for _ in 0..SUBSCRIBER_QUEUE_CAPACITY / 2 {
        assert!(fast.try_recv().is_some());
        fast_received += 1;
    }

    for _ in 0..SUBSCRIBER_QUEUE_CAPACITY / 2 {
        bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(1))
            .unwrap();
    }
    bus.dispatch_pending();

    fast_received += std::iter::from_fn(|| fast.try_recv()).count();
    let slow_received = std::iter::from_fn(|| slow.try_recv()).count();

    assert_eq!(fast_received, SUBSCRIBER_QUEUE_CAPACITY + SUBSCRIBER_QUEUE_CAPACITY / 2);
    assert_eq!(slow_received, SUBSCRIBER_QUEUE_CAPACITY);
}

#[test]
fn test_bus_inbound_queue_full_fails_fast() {
    let bus = EventBus::new();
    for _ in 0..INBOUND_QUEUE_CAPACITY {
        bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(1))
            .unwrap();
    }
    let err = bus
        .publish(EventType::ScoreEvent, EventPayload::ScoreDelta(1))
        .unwrap_err();
    assert!(matches!(err, EngineError::QueueFull { .. }));
}

#[test]
fn test_bus_rejects_after_shutdown() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::InputEvent).unwrap();
    bus.shutdown();

    assert_eq!(
        bus.publish(EventType::InputEvent, EventPayload::None),
        Err(EngineError::Cancelled)
    );
    assert!(bus.subscribe(EventType::InputEvent).is_err());
    assert!(sub.is_closed());
    // Shutdown is idempotent.
    bus.shutdown();
}

#[test]
fn test_bus_unsubscribe_is_idempotent() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::ScoreEvent).unwrap();
    assert_eq!(bus.subscriber_count(EventType::ScoreEvent), 1);

    bus.unsubscribe(&sub);
    bus.unsubscribe(&sub);
    assert_eq!(bus.subscriber_count(EventType::ScoreEvent), 0);

    bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(1))
        .unwrap();
    bus.dispatch_pending();
    assert!(sub.try_recv().is_none());
}

#[test]
fn test_is_closed_does_not_consume_pending_events() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::ScoreEvent).unwrap();
    bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(7))
        .unwrap();
    bus.dispatch_pending();
    bus.unsubscribe(&sub);

    // Closed but not yet drained: the check must leave the event in place.
    assert!(!sub.is_closed());
    assert!(!sub.is_closed());
    let event = sub.try_recv().expect("event survives the closed checks");
    assert_eq!(delta(&event.payload), 7);
    assert!(sub.is_closed());
}

#[test]
fn test_drain_is_bounded_per_call() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::ScoreEvent).unwrap();
    for _ in 0..DRAIN_BATCH * 2 + 50 {
        bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(1))
            .unwrap();
    }
    bus.dispatch_pending();

    assert_eq!(drain(&sub).len(), DRAIN_BATCH);
    assert_eq!(drain(&sub).len(), DRAIN_BATCH);
    assert_eq!(drain(&sub).len(), 50);
    assert!(drain(&sub).is_empty());
}

// --- Score manager ---

#[test]
fn test_score_high_water_mark() {
    let scores = ScoreManager::new(EventBus::new());
    scores.add_score(100);
    scores.add_score(-60);
    assert_eq!(scores.score(), 40);
    assert_eq!(scores.high_score(), 100);
}

#[test]
fn test_score_reset_preserves_high_score() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::ScoreEvent).unwrap();
    let scores = ScoreManager::new(bus.clone());
    scores.add_score(500);
    scores.reset_score();

    assert_eq!(scores.score(), 0);
    assert_eq!(scores.high_score(), 500);
    bus.dispatch_pending();
    let event = sub.try_recv().expect("reset announcement");
    assert_eq!(delta(&event.payload), 0);
}

#[test]
fn test_score_manager_applies_published_deltas() {
    let bus = EventBus::new();
    let mut scores = ScoreManager::new(bus.clone());
    let (_controller, signal) = shutdown_channel();
    scores.initialize(signal).unwrap();

    for n in [100, 1000, -50] {
        bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(n))
            .unwrap();
    }
    bus.dispatch_pending();
    scores.update(FIXED_DT).unwrap();

    assert_eq!(scores.score(), 1050);
    assert_eq!(scores.high_score(), 1100);
}

#[test]
fn test_score_concurrent_publishers() {
    let bus = EventBus::new();
    let mut scores = ScoreManager::new(bus.clone());
    let (_controller, signal) = shutdown_channel();
    scores.initialize(signal).unwrap();

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for _ in 0..125 {
                    bus.publish(EventType::ScoreEvent, EventPayload::ScoreDelta(1))
                        .unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    // 1000 events, drained at most DRAIN_BATCH per subscription per update.
    bus.dispatch_pending();
    for _ in 0..(1000 / DRAIN_BATCH) + 2 {
        scores.update(FIXED_DT).unwrap();
    }
    assert_eq!(scores.score(), 1000);
}

#[test]
fn test_score_shutdown_resets_everything() {
    let mut scores = ScoreManager::new(EventBus::new());
    scores.add_score(700);
    scores.shutdown();
    assert_eq!(scores.score(), 0);
    assert_eq!(scores.high_score(), 0);
}

// --- Level manager ---

#[test]
fn test_level_advance_arithmetic() {
    let levels = LevelManager::new(EventBus::new());
    levels.advance_level(2);
    assert_eq!(levels.level(), 3);
    assert!((levels.difficulty() - 1.2).abs() < 1e-9);
}

#[test]
fn test_level_event_advances_and_announces() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::LevelEvent).unwrap();
    let mut levels = LevelManager::new(bus.clone());
    let (_controller, signal) = shutdown_channel();
    levels.initialize(signal).unwrap();

    bus.publish(EventType::LevelEvent, EventPayload::LevelDelta(1))
        .unwrap();
    bus.dispatch_pending();
    levels.update(FIXED_DT).unwrap();
    assert_eq!(levels.level(), 2);

    bus.dispatch_pending();
    let reached: Vec<i32> = std::iter::from_fn(|| sub.try_recv())
        .filter_map(|e| match e.payload {
            EventPayload::LevelReached(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(reached, vec![2]);

    // The announcement loops back to the manager and must not re-advance.
    levels.update(FIXED_DT).unwrap();
    assert_eq!(levels.level(), 2);
}

#[test]
fn test_level_shutdown_resets() {
    let mut levels = LevelManager::new(EventBus::new());
    levels.advance_level(4);
    levels.shutdown();
    assert_eq!(levels.level(), 1);
    assert!((levels.difficulty() - 1.0).abs() < 1e-9);
}

// --- Entities ---

#[test]
fn test_player_first_collision() {
    let bus = EventBus::new();
    let damaged = bus.subscribe(EventType::PlayerDamaged).unwrap();
    let destroyed = bus.subscribe(EventType::PlayerDestroyed).unwrap();
    let mut player = Player::new(Vec2::new(100.0, 100.0), 5.0, bus.clone());

    player.on_collision();
    assert_eq!(player.health(), PLAYER_HEALTH - 10);
    assert!(player.is_alive());

    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| damaged.try_recv()).count(), 1);
    assert!(destroyed.try_recv().is_none());
}

#[test]
fn test_player_cooldown_gate() {
    let bus = EventBus::new();
    let shots = bus.subscribe(EventType::PlayerShot).unwrap();
    let mut player = Player::new(Vec2::new(0.0, 0.0), 5.0, bus.clone());

    assert!(player.can_shoot());
    player.shoot();
    assert!(!player.can_shoot());
    player.shoot(); // gated, no second event

    player.update(0.1).unwrap();
    player.update(0.1).unwrap();
    assert!(player.can_shoot());

    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| shots.try_recv()).count(), 1);
}

#[test]
fn test_enemy_destroyed_after_two_hits() {
    let bus = EventBus::new();
    let destroyed = bus.subscribe(EventType::EnemyDestroyed).unwrap();
    let mut enemy = Enemy::new(Vec2::new(0.0, 0.0), 2.0, bus.clone());
    assert_eq!(enemy.health(), ENEMY_HEALTH);

    enemy.on_collision();
    assert_eq!(enemy.health(), 10);
    bus.dispatch_pending();
    assert!(destroyed.try_recv().is_none());

    enemy.on_collision();
    assert_eq!(enemy.health(), 0);
    assert!(!enemy.is_alive());
    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| destroyed.try_recv()).count(), 1);
}

#[test]
fn test_enemy_fires_immediately_then_spaced() {
    let bus = EventBus::new();
    let shots = bus.subscribe(EventType::EnemyShot).unwrap();
    let mut enemy = Enemy::new(Vec2::new(0.0, 0.0), 2.0, bus.clone());

    enemy.update(0.001).unwrap(); // first tick of any length fires
    enemy.update(0.5).unwrap();
    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| shots.try_recv()).count(), 1);

    enemy.update(0.5).unwrap(); // cooldown (1.0 s) has run out
    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| shots.try_recv()).count(), 1);
}

#[test]
fn test_boss_phase_change_is_exact_and_single() {
    let bus = EventBus::new();
    let phases = bus.subscribe(EventType::BossPhaseChanged).unwrap();
    let mut boss = Boss::new(Vec2::new(0.0, 0.0), 1.0, bus.clone());

    // Just above the threshold: no phase event.
    while boss.health() > 510 {
        boss.on_collision();
    }
    boss.update(FIXED_DT).unwrap();
    bus.dispatch_pending();
    assert!(phases.try_recv().is_none());
    assert_eq!(boss.phase(), 1);

    // Crossing 500 flips the phase on the next update, exactly once.
    boss.on_collision();
    assert_eq!(boss.health(), 500);
    boss.update(FIXED_DT).unwrap();
    boss.update(FIXED_DT).unwrap();
    boss.on_collision();
    boss.update(FIXED_DT).unwrap();

    bus.dispatch_pending();
    let phase_events: Vec<u8> = std::iter::from_fn(|| phases.try_recv())
        .filter_map(|e| match e.payload {
            EventPayload::Phase(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(phase_events, vec![2]);
    assert_eq!(boss.phase(), 2);
}

#[test]
fn test_bullet_out_of_bounds_destroys_once() {
    let bus = EventBus::new();
    let destroyed = bus.subscribe(EventType::BulletDestroyed).unwrap();
    let mut bullet = Bullet::new(
        Vec2::new(100.0, 929.0),
        true,
        10.0,
        (640.0, 928.0),
        bus.clone(),
    );

    bullet.update(0.01).unwrap();
    assert_eq!(bullet.health(), 0);
    bullet.update(0.01).unwrap(); // already dead: no second event

    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| destroyed.try_recv()).count(), 1);
}

// --- Formations ---

fn enemy_handle(bus: &EventBus) -> EntityHandle {
    Arc::new(Mutex::new(Enemy::new(Vec2::new(0.0, 0.0), 2.0, bus.clone())))
}

#[test]
fn test_formation_membership_events() {
    let bus = EventBus::new();
    let added = bus.subscribe(EventType::EnemyAddedToFormation).unwrap();
    let removed = bus.subscribe(EventType::EnemyRemovedFromFormation).unwrap();
    let mut formation = Formation::new(
        FormationKind::Line,
        pattern_for(FormationKind::Line),
        Vec2::new(320.0, 80.0),
        bus.clone(),
    );

    let members: Vec<EntityHandle> = (0..3).map(|_| enemy_handle(&bus)).collect();
    for member in &members {
        formation.add_member(Arc::clone(member));
    }
    assert_eq!(formation.member_count(), 3);

    formation.remove_member(handle_id(&members[1]));
    assert_eq!(formation.member_count(), 2);
    formation.remove_member(handle_id(&members[1])); // already gone: no event

    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| added.try_recv()).count(), 3);
    assert_eq!(std::iter::from_fn(|| removed.try_recv()).count(), 1);
}

#[test]
fn test_formation_completion_latches_once() {
    let bus = EventBus::new();
    let removed = bus.subscribe(EventType::EnemyRemovedFromFormation).unwrap();
    let destroyed = bus.subscribe(EventType::FormationDestroyed).unwrap();
    let mut formation = Formation::new(
        FormationKind::V,
        pattern_for(FormationKind::V),
        Vec2::new(320.0, 80.0),
        bus.clone(),
    );
    let members: Vec<EntityHandle> = (0..3).map(|_| enemy_handle(&bus)).collect();
    for member in &members {
        formation.add_member(Arc::clone(member));
    }
    assert!(!formation.is_complete());

    for member in &members {
        member.lock().unwrap().take_damage(ENEMY_HEALTH);
    }
    formation.update(FIXED_DT).unwrap();
    assert!(formation.is_complete());
    assert_eq!(formation.member_count(), 0);

    formation.update(FIXED_DT).unwrap(); // latch holds, no second event
    assert!(formation.is_complete());

    bus.dispatch_pending();
    assert_eq!(std::iter::from_fn(|| removed.try_recv()).count(), 3);
    assert_eq!(std::iter::from_fn(|| destroyed.try_recv()).count(), 1);
}

#[test]
fn test_formation_pattern_positions_members() {
    let bus = EventBus::new();
    let mut formation = Formation::new(
        FormationKind::Column,
        pattern_for(FormationKind::Column),
        Vec2::new(320.0, 80.0),
        bus.clone(),
    );
    let members: Vec<EntityHandle> = (0..3).map(|_| enemy_handle(&bus)).collect();
    for member in &members {
        formation.add_member(Arc::clone(member));
    }

    formation.update(FIXED_DT).unwrap();

    // Column pattern stacks members one spacing apart below the anchor.
    let ys: Vec<f64> = members
        .iter()
        .map(|m| m.lock().unwrap().position().y)
        .collect();
    assert!((ys[1] - ys[0] - FORMATION_SPACING).abs() < 1e-9);
    assert!((ys[2] - ys[1] - FORMATION_SPACING).abs() < 1e-9);
}

// --- Collision system ---

#[test]
fn test_collision_damages_eligible_overlapping_pair() {
    let bus = EventBus::new();
    let collision = CollisionSystem::new(bus.clone());

    let player = Arc::new(Mutex::new(Player::new(
        Vec2::new(100.0, 100.0),
        5.0,
        bus.clone(),
    )));
    let bullet = Arc::new(Mutex::new(Bullet::new(
        Vec2::new(110.0, 110.0),
        true,
        10.0,
        (640.0, 928.0),
        bus.clone(),
    )));
    collision.add_collidable(Arc::clone(&player) as EntityHandle);
    collision.add_collidable(Arc::clone(&bullet) as EntityHandle);

    collision.check_collisions();
    assert_eq!(player.lock().unwrap().health(), PLAYER_HEALTH - 10);
    assert!(!bullet.lock().unwrap().is_alive());
}

#[test]
fn test_collision_skips_ineligible_pair() {
    let bus = EventBus::new();
    let collision = CollisionSystem::new(bus.clone());

    // Enemy and enemy bullet overlap but are same-faction.
    let enemy = Arc::new(Mutex::new(Enemy::new(
        Vec2::new(50.0, 50.0),
        2.0,
        bus.clone(),
    )));
    let bullet = Arc::new(Mutex::new(Bullet::new(
        Vec2::new(55.0, 55.0),
        true,
        10.0,
        (640.0, 928.0),
        bus.clone(),
    )));
    collision.add_collidable(Arc::clone(&enemy) as EntityHandle);
    collision.add_collidable(Arc::clone(&bullet) as EntityHandle);

    collision.check_collisions();
    assert_eq!(enemy.lock().unwrap().health(), ENEMY_HEALTH);
    assert!(bullet.lock().unwrap().is_alive());
}

// --- Input system ---

#[derive(Clone, Default)]
struct ScriptedKeys {
    held: Arc<Mutex<HashSet<Key>>>,
}

impl ScriptedKeys {
    fn press(&self, key: Key) {
        self.held.lock().unwrap().insert(key);
    }

    fn release(&self, key: Key) {
        self.held.lock().unwrap().remove(&key);
    }
}

impl KeySource for ScriptedKeys {
    fn is_pressed(&mut self, key: Key) -> bool {
        self.held.lock().unwrap().contains(&key)
    }
}

#[test]
fn test_input_is_edge_triggered() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventType::InputEvent).unwrap();
    let keys = ScriptedKeys::default();
    let mut input = InputSystem::new(bus.clone(), Box::new(keys.clone()));
    let (_controller, signal) = shutdown_channel();
    input.initialize(signal).unwrap();

    keys.press(Key::Space);
    input.update(FIXED_DT).unwrap();
    input.update(FIXED_DT).unwrap(); // held, not re-published
    keys.release(Key::Space);
    input.update(FIXED_DT).unwrap();
    keys.press(Key::Space);
    input.update(FIXED_DT).unwrap();

    bus.dispatch_pending();
    let actions: Vec<InputAction> = std::iter::from_fn(|| sub.try_recv())
        .filter_map(|e| match e.payload {
            EventPayload::Input(a) => Some(a),
            _ => None,
        })
        .collect();
    assert_eq!(actions, vec![InputAction::Shoot, InputAction::Shoot]);
}

// --- Spawn director ---

#[test]
fn test_director_clamps_zero_spawn_interval() {
    let bus = EventBus::new();
    let created = bus.subscribe(EventType::EnemyCreated).unwrap();
    let config = GameConfig {
        enemy_spawn_interval: 0.0,
        ..GameConfig::default()
    };

    let mut states = StateManager::new(bus.clone(), 10);
    let (controller, signal) = shutdown_channel();
    states.initialize(signal.clone()).unwrap();
    states.request_state_change(GameState::Playing);
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while states.state() != GameState::Playing && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(states.state(), GameState::Playing);

    let mut director = SpawnDirector::new(bus.clone(), config, states.clone());
    director.initialize(signal).unwrap();

    // The interval floors at one tick, so the timer drains: one wave per
    // update instead of a loop that never terminates.
    director.update(FIXED_DT).unwrap();
    director.update(FIXED_DT).unwrap();

    bus.dispatch_pending();
    assert!(std::iter::from_fn(|| created.try_recv()).count() >= 2);

    controller.cancel();
    director.shutdown();
    states.shutdown();
}

// --- Simulation driver ---

#[test]
fn test_fixed_step_tick_counts() {
    let mut game = Game::new(GameConfig::default(), Box::new(NullKeySource)).unwrap();

    // The canonical frame sequence: 0.016 → 1 tick, 0.033 → 2 ticks,
    // 0.5 clamps to 0.1 → 6 ticks. Nine ticks of exactly 1/60 s total.
    assert_eq!(game.advance(0.016).unwrap(), 1);
    assert_eq!(game.advance(0.033).unwrap(), 2);
    assert_eq!(game.advance(0.5).unwrap(), 6);

    assert_eq!(game.advance(0.0).unwrap(), 0);
    assert_eq!(game.advance(-1.0).unwrap(), 0);

    game.shutdown();
}

#[test]
fn test_game_shutdown_is_idempotent() {
    let mut game = Game::new(GameConfig::default(), Box::new(NullKeySource)).unwrap();
    game.start().unwrap();
    game.shutdown();
    game.shutdown();
    assert!(game.is_finished());
    assert_eq!(game.advance(0.016), Err(EngineError::Cancelled));
}

#[test]
fn test_game_starts_in_main_menu_and_transitions() {
    let mut game = Game::new(GameConfig::default(), Box::new(NullKeySource)).unwrap();
    assert_eq!(game.state(), GameState::MainMenu);
    game.start().unwrap();

    game.request_state_change(GameState::Playing);
    // The transition worker applies requests asynchronously.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while game.state() != GameState::Playing && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(game.state(), GameState::Playing);

    assert!(game.advance(0.033).unwrap() > 0);
    game.shutdown();
}

#[test]
fn test_snapshot_reflects_managers() {
    let game = Game::new(GameConfig::default(), Box::new(NullKeySource)).unwrap();
    let snapshot = game.snapshot();
    assert_eq!(snapshot.state, GameState::MainMenu);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.level, 1);
    assert_eq!(snapshot.bullets, 0);
    assert_eq!(snapshot.enemies, 0);
}
