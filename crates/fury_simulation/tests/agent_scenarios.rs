//! Сценарии одного врага против манекена (headless порты)
//!
//! Проверяем:
//! - Крик блокирует атаки на всё время transition
//! - Decay в Calm без урона
//! - Push-back после двух подряд ударов в Fury
//! - Прыжок и его отмена
//! - Смерть терминальна, стан замораживает часы и таймеры
//! - Урон в прыжке эскалирует ярость, но прыжок не прерывает
//! - Отсутствующие capabilities и пропавшая цель не ломают агента

use bevy::prelude::*;
use fury_simulation::ai::AgentActivity;
use fury_simulation::headless::{FlatNavigator, HeadlessRig, TrainingDummy};
use fury_simulation::*;

const DT: f32 = 1.0 / 60.0;

fn rig() -> HeadlessRig {
    HeadlessRig::new(50.0)
}

fn spawn_agent(rig: &HeadlessRig) -> EnemyAgent {
    EnemyAgent::new(AttackConfig::default(), rig.ports(), Vec3::ZERO, Vec3::Z, 42).unwrap()
}

fn run(agent: &mut EnemyAgent, ticks: usize) -> Vec<AgentNotification> {
    let mut notifications = Vec::new();
    for _ in 0..ticks {
        agent.tick(DT);
        notifications.extend(agent.drain_notifications());
    }
    notifications
}

/// Урон → тикаем до Fury
fn enrage(agent: &mut EnemyAgent, rig: &HeadlessRig) -> Vec<AgentNotification> {
    assert!(rig.health.damage(1.0));
    let mut notifications = Vec::new();
    for _ in 0..200 {
        agent.tick(DT);
        notifications.extend(agent.drain_notifications());
        if agent.aggression_phase() == (AggressionPhase::Fury { level: 1 }) {
            return notifications;
        }
    }
    panic!("agent never entered Fury");
}

fn attacks(notifications: &[AgentNotification]) -> usize {
    notifications
        .iter()
        .filter(|n| matches!(n, AgentNotification::AttackPerformed { .. }))
        .count()
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AttackConfig {
        vision_range: 0.0,
        ..AttackConfig::default()
    };
    let result = EnemyAgent::new(config, rig().ports(), Vec3::ZERO, Vec3::Z, 1);
    assert!(matches!(
        result,
        Err(ConfigError::NonPositive {
            field: "vision_range",
            ..
        })
    ));
}

#[test]
fn test_agent_subscribes_on_spawn_and_unsubscribes_on_destroy() {
    let rig = rig();
    let mut agent = spawn_agent(&rig);
    assert!(rig.health.is_subscribed());

    agent.destroy();
    assert!(!rig.health.is_subscribed());
    assert!(agent.should_despawn());

    // После destroy тик — no-op
    let position = agent.position();
    run(&mut agent, 30);
    assert_eq!(agent.position(), position);
}

#[test]
fn test_handle_event_applies_immediately() {
    let rig = rig();
    let mut agent = spawn_agent(&rig);

    agent.handle_event(AgentEvent::Damaged { amount: 3.0 });
    assert_eq!(agent.aggression_phase(), AggressionPhase::Transitioning);
}

#[test]
fn test_scream_blocks_attacks_for_transition_duration() {
    let rig = rig();
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 1.5)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);

    assert!(rig.health.damage(5.0));

    // transition_duration = 1.2с = 72 тика; смотрим первые 70
    let during = run(&mut agent, 70);
    assert_eq!(agent.aggression_phase(), AggressionPhase::Transitioning);
    assert_eq!(agent.activity(), AgentActivity::Screaming);
    assert_eq!(attacks(&during), 0);
    assert!(player.lock().unwrap().hits.is_empty());
    assert!(agent.target_detected());

    let after = run(&mut agent, 120);
    assert!(after.contains(&AgentNotification::AggressionChanged {
        from: AggressionPhase::Transitioning,
        to: AggressionPhase::Fury { level: 1 },
    }));
    assert!(attacks(&after) > 0);
    assert!(!player.lock().unwrap().hits.is_empty());
}

#[test]
fn test_calm_attack_slows_and_fury_attack_hits_harder() {
    let rig = rig();
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 1.5)).with_slow());
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);

    // Calm: обычная атака, 10 урона + замедление
    run(&mut agent, 30);
    {
        let player = player.lock().unwrap();
        assert_eq!(player.hits.len(), 1);
        assert_eq!(player.hits[0].amount, 10.0);
        assert_eq!(player.slows, vec![(-0.3, 2.0)]);
    }

    // Fury: 18 урона, без замедления
    enrage(&mut agent, &rig);
    run(&mut agent, 30);
    let player = player.lock().unwrap();
    let last = player.hits.last().unwrap();
    assert_eq!(last.amount, 18.0);
    assert_eq!(player.slows.len(), 1);
}

#[test]
fn test_fury_decays_without_damage() {
    let rig = rig();
    let mut agent = spawn_agent(&rig);
    enrage(&mut agent, &rig);

    // Цели нет → базовое окно decay 3с
    run(&mut agent, 170);
    assert!(matches!(agent.aggression_phase(), AggressionPhase::Fury { .. }));

    let notifications = run(&mut agent, 20);
    assert_eq!(agent.aggression_phase(), AggressionPhase::Calm);
    assert!(notifications.contains(&AgentNotification::AggressionChanged {
        from: AggressionPhase::Fury { level: 1 },
        to: AggressionPhase::Calm,
    }));
    assert_eq!(rig.health.speed_multiplier(), 1.0);
}

#[test]
fn test_fury_regenerates_and_speeds_up() {
    let rig = rig();
    let mut agent = spawn_agent(&rig);
    enrage(&mut agent, &rig);

    assert_eq!(rig.health.speed_multiplier(), 1.6);
    assert!((agent.current_speed() - 3.5 * 1.6).abs() < 1e-5);

    run(&mut agent, 150);
    // regen_per_second = 2, два полных пульса
    assert_eq!(rig.health.healed(), 4.0);
}

#[test]
fn test_two_consecutive_hits_push_back() {
    let rig = rig();
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 1.5)).with_knockback());
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    enrage(&mut agent, &rig);

    assert!(rig.health.damage(2.0));
    assert!(rig.health.damage(2.0));
    let notifications = run(&mut agent, 1);

    assert_eq!(agent.fury_level(), 3);
    assert!(notifications.contains(&AgentNotification::PushBack { targets_pushed: 1 }));
    assert_eq!(player.lock().unwrap().knockbacks, vec![(Vec3::Z, 4.0)]);
    assert_eq!(agent.combat().timers().since_attack, 0.0);
    assert!(!agent.combat().is_swinging());
}

#[test]
fn test_push_back_without_knockback_capability() {
    let rig = rig();
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 1.5)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    enrage(&mut agent, &rig);

    rig.health.damage(1.0);
    rig.health.damage(1.0);
    let notifications = run(&mut agent, 1);

    assert!(notifications.contains(&AgentNotification::PushBack { targets_pushed: 0 }));
    assert_eq!(player.lock().unwrap().position, Vec3::new(0.0, 0.0, 1.5));
}

#[test]
fn test_leap_closes_distance_in_fury() {
    // Заблокированная навигация: догнать пешком нельзя, только прыжком
    let rig = rig().with_navigator(FlatNavigator::new(50.0).with_blocked());
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 5.0)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    enrage(&mut agent, &rig);
    assert!(agent.target_detected());

    player.lock().unwrap().position = Vec3::new(0.0, 0.0, 12.0);

    // jump_delay = 1.5с вне радиуса
    let before = run(&mut agent, 80);
    assert_eq!(agent.position(), Vec3::ZERO);
    assert!(!before.iter().any(|n| matches!(n, AgentNotification::LeapStarted { .. })));

    let started = run(&mut agent, 20);
    assert!(started.contains(&AgentNotification::LeapStarted { distance: 6.0 }));
    assert!(agent.is_leaping());

    // windup 0.2 + полёт 0.6 + восстановление 0.3
    let landed = run(&mut agent, 80);
    assert!(landed.contains(&AgentNotification::LeapLanded));
    assert!(!agent.is_leaping());
    assert!(agent.position().distance(Vec3::new(0.0, 0.0, 6.0)) < 1e-4);
    assert!(agent.combat().timers().since_jump < 2.0);
}

#[test]
fn test_damage_mid_leap_escalates_without_cancelling() {
    let rig = rig().with_navigator(FlatNavigator::new(50.0).with_blocked());
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 5.0)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    enrage(&mut agent, &rig);
    player.lock().unwrap().position = Vec3::new(0.0, 0.0, 12.0);

    let mut ticks = 0;
    while !agent.is_leaping() {
        agent.tick(DT);
        agent.drain_notifications();
        ticks += 1;
        assert!(ticks < 120, "leap never started");
    }

    // windup 0.2с + треть полёта
    run(&mut agent, 20);
    assert!(agent.is_leaping());

    assert!(rig.health.damage(3.0));
    let hit = run(&mut agent, 1);
    assert!(agent.is_leaping());
    assert_eq!(agent.fury_level(), 2);
    assert!(hit.contains(&AgentNotification::AggressionChanged {
        from: AggressionPhase::Fury { level: 1 },
        to: AggressionPhase::Fury { level: 2 },
    }));

    let landed = run(&mut agent, 80);
    assert!(landed.contains(&AgentNotification::LeapLanded));
    assert!(agent.position().distance(Vec3::new(0.0, 0.0, 6.0)) < 1e-4);
}

#[test]
fn test_out_of_range_time_does_not_carry_into_next_fury() {
    let rig = rig().with_navigator(FlatNavigator::new(50.0).with_blocked());
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 5.0)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    enrage(&mut agent, &rig);
    player.lock().unwrap().position = Vec3::new(0.0, 0.0, 12.0);

    // 1с вне радиуса: прыжка ещё нет (jump_delay = 1.5с)
    run(&mut agent, 60);
    assert!(!agent.is_leaping());
    assert!(agent.combat().timers().time_out_of_range > 0.9);

    // Цель пропала → патруль, ярость гаснет
    agent.clear_target();
    run(&mut agent, 400);
    assert_eq!(agent.aggression_phase(), AggressionPhase::Calm);
    assert_eq!(agent.combat().timers().time_out_of_range, 0.0);

    // Новая ярость: до прыжка снова полный jump_delay
    agent.set_target(&target);
    enrage(&mut agent, &rig);
    let early = run(&mut agent, 80);
    assert!(!early.iter().any(|n| matches!(n, AgentNotification::LeapStarted { .. })));

    let late = run(&mut agent, 20);
    assert!(late.iter().any(|n| matches!(n, AgentNotification::LeapStarted { .. })));
}

#[test]
fn test_leap_cancelled_when_target_too_close() {
    let rig = rig().with_navigator(FlatNavigator::new(50.0).with_blocked());
    // 2.8м: вне fury range (2.5), но ближе jump_cancel_distance (3)
    let (_player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 2.8)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    enrage(&mut agent, &rig);

    let notifications = run(&mut agent, 120);

    assert!(notifications.contains(&AgentNotification::LeapCancelled {
        reason: LeapCancel::TargetTooClose,
    }));
    assert!(!notifications.iter().any(|n| matches!(n, AgentNotification::LeapStarted { .. })));
    assert_eq!(agent.position(), Vec3::ZERO);
    assert!(!agent.is_leaping());
}

#[test]
fn test_death_is_terminal() {
    let rig = rig();
    let (_player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 1.5)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    run(&mut agent, 10);

    assert!(rig.health.kill());
    let notifications = run(&mut agent, 1);
    assert_eq!(notifications, vec![AgentNotification::Died]);
    assert!(!agent.is_alive());
    assert!(!rig.health.is_subscribed());
    assert!(rig.presentation.animations().contains(&"death".to_string()));

    // Мёртвый агент событий не принимает и ничего не делает
    agent.handle_event(AgentEvent::Damaged { amount: 10.0 });
    agent.handle_event(AgentEvent::Stunned { duration: 2.0 });
    let position = agent.position();
    let later = run(&mut agent, 120);
    assert!(later.is_empty());
    assert_eq!(agent.position(), position);
    assert_eq!(agent.aggression_phase(), AggressionPhase::Calm);
    assert!(!agent.should_despawn());

    // death_linger = 5с
    run(&mut agent, 200);
    assert!(agent.should_despawn());
}

#[test]
fn test_stun_freezes_clock_and_movement() {
    let rig = rig();
    let mut agent = spawn_agent(&rig);

    assert!(rig.health.stun(1.0));
    run(&mut agent, 50);
    assert!(agent.is_stunned());
    assert_eq!(agent.clock(), 0.0);
    assert_eq!(agent.position(), Vec3::ZERO);
    assert_eq!(agent.activity(), AgentActivity::Stunned);

    // Урон во время стана — только bookkeeping
    assert!(rig.health.damage(5.0));
    run(&mut agent, 1);
    assert_eq!(agent.aggression_phase(), AggressionPhase::Calm);

    run(&mut agent, 60);
    assert!(!agent.is_stunned());
    assert!(agent.clock() > 0.0);
    assert_eq!(agent.activity(), AgentActivity::Patrolling);
}

#[test]
fn test_stun_preserves_transition_progress() {
    let rig = rig();
    let mut agent = spawn_agent(&rig);
    assert!(rig.health.damage(1.0));
    run(&mut agent, 30);
    let elapsed = agent.aggression().transition_elapsed();
    assert!(elapsed.is_some());

    assert!(rig.health.stun(1.0));
    run(&mut agent, 50);
    assert!(agent.is_stunned());
    assert_eq!(agent.aggression().transition_elapsed(), elapsed);

    // Стан кончился — крик доигрывается с того же места
    run(&mut agent, 20);
    assert!(agent.aggression().transition_elapsed() > elapsed);
}

#[test]
fn test_stun_preserves_decay_countdown() {
    let rig = rig();
    let mut agent = spawn_agent(&rig);
    enrage(&mut agent, &rig);
    run(&mut agent, 30);
    let remaining = agent.aggression().decay_remaining();
    assert!(remaining.is_some());

    assert!(rig.health.stun(1.0));
    run(&mut agent, 50);
    assert_eq!(agent.aggression().decay_remaining(), remaining);
    assert!(matches!(agent.aggression_phase(), AggressionPhase::Fury { .. }));

    run(&mut agent, 20);
    assert!(!agent.is_stunned());
    assert!(agent.aggression().decay_remaining() < remaining);
}

#[test]
fn test_stun_pauses_swing_in_windup() {
    let rig = rig();
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 1.5)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);

    // Замах начат, удар через 0.35с
    run(&mut agent, 10);
    let swing = agent.combat().swing().copied();
    assert!(swing.is_some_and(|swing| swing.in_windup()));

    assert!(rig.health.stun(1.0));
    run(&mut agent, 50);
    assert_eq!(agent.combat().swing().copied(), swing);
    assert!(player.lock().unwrap().hits.is_empty());

    // Стан кончился — тот же замах доходит до удара
    run(&mut agent, 40);
    assert_eq!(player.lock().unwrap().hits.len(), 1);
}

#[test]
fn test_destroyed_target_falls_back_to_patrol() {
    let rig = rig();
    let (player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, 5.0)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);
    run(&mut agent, 5);
    assert!(agent.target_detected());
    assert_eq!(agent.activity(), AgentActivity::Engaging);

    // Хост удалил игрока
    rig.entities.remove(&target);
    drop(target);
    drop(player);

    let notifications = run(&mut agent, 120);
    assert!(!agent.has_valid_target());
    assert!(agent.target_detected());
    assert_eq!(agent.activity(), AgentActivity::Patrolling);
    assert_eq!(attacks(&notifications), 0);
}

#[test]
fn test_patrols_when_target_unseen() {
    let rig = rig();
    // Игрок за спиной, вне конуса
    let (_player, target) = rig.spawn_player(TrainingDummy::new(Vec3::new(0.0, 0.0, -4.0)));
    let mut agent = spawn_agent(&rig);
    agent.set_target(&target);

    run(&mut agent, 30);
    assert!(!agent.target_detected());
    assert_eq!(agent.activity(), AgentActivity::Patrolling);
    assert!(agent.position().z > 0.5);
}
