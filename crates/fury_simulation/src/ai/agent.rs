//! EnemyAgent — композиция всех подсистем одного врага
//!
//! Порядок тика:
//! 1. мёртв → только отсчёт death linger
//! 2. inbox → handle_event (урон/смерть/стан)
//! 3. оглушён → отсчёт стана (прыжок в полёте доигрывается), выход
//! 4. часы, таймеры боя, perception
//! 5. aggression tick (вход в Fury, decay, регенерация)
//! 6. прыжок в полёте → доиграть, выход
//! 7. крик (Transitioning) → стоим, выход
//! 8. отложенный push-back → вместо атаки, выход
//! 9. цель обнаружена и жива → бой, иначе патруль

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::aggression::{AggressionChange, AggressionPhase, AggressionSettings, AggressionStateMachine, DamageResponse};
use super::events::{AgentEvent, AgentNotification, EventInbox, NotificationBuffer};
use super::patrol::{PatrolController, PatrolSettings};
use super::perception::PerceptionSensor;
use crate::combat::{CombatContext, CombatController, CombatReport};
use crate::config::AttackConfig;
use crate::error::ConfigError;
use crate::movement::NavigatorFacade;
use crate::ports::{AgentPorts, EffectKind, HealthSink, Presentation, SharedTarget, SpatialQuery, TargetRef};

/// Жизненный цикл
#[derive(Debug, Clone, Copy, PartialEq)]
enum Life {
    Alive,
    /// Терминально; `linger` — сколько ещё тело лежит до despawn
    Dead { linger: f32 },
    /// Хост уничтожил агента (отписка, ничего больше не тикает)
    Destroyed,
}

/// Чем агент занимался на прошлом тике
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentActivity {
    Idle,
    Patrolling,
    Engaging,
    Screaming,
    Leaping,
    Stunned,
    Dead,
}

pub struct EnemyAgent {
    config: AttackConfig,
    position: Vec3,
    facing: Vec3,
    target: TargetRef,

    life: Life,
    stun_remaining: f32,
    /// Время агента: стоит на месте, пока он оглушён
    clock: f32,
    activity: AgentActivity,
    speed_multiplier: f32,

    perception: PerceptionSensor,
    patrol: PatrolController,
    aggression: AggressionStateMachine,
    combat: CombatController,

    navigator: NavigatorFacade,
    spatial: Box<dyn SpatialQuery>,
    health: Box<dyn HealthSink>,
    presentation: Box<dyn Presentation>,

    inbox: EventInbox,
    notifications: NotificationBuffer,
    subscribed: bool,
    rng: ChaCha8Rng,
}

impl EnemyAgent {
    /// Собрать агента. Конфиг валидируется здесь; подписка на здоровье — сразу.
    pub fn new(
        config: AttackConfig,
        ports: AgentPorts,
        position: Vec3,
        facing: Vec3,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let facing = facing.with_y(0.0).try_normalize().unwrap_or(Vec3::Z);
        let mut agent = Self {
            perception: PerceptionSensor::new(config.vision_range, config.vision_cone_half_angle()),
            patrol: PatrolController::new(PatrolSettings::from(&config), facing, position),
            aggression: AggressionStateMachine::new(AggressionSettings::from(&config)),
            combat: CombatController::new(&config),
            config,
            position,
            facing,
            target: TargetRef::none(),
            life: Life::Alive,
            stun_remaining: 0.0,
            clock: 0.0,
            activity: AgentActivity::Idle,
            speed_multiplier: 1.0,
            navigator: NavigatorFacade::new(ports.navigator),
            spatial: ports.spatial,
            health: ports.health,
            presentation: ports.presentation,
            inbox: EventInbox::new(),
            notifications: NotificationBuffer::default(),
            subscribed: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };

        agent.subscribe();
        crate::log_info(&format!("👹 EnemyAgent spawned at {:?} (seed {})", position, seed));
        Ok(agent)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Подписаться на события здоровья (идемпотентно)
    pub fn subscribe(&mut self) {
        if self.subscribed || self.life != Life::Alive {
            return;
        }
        self.health.subscribe(self.inbox.clone());
        self.subscribed = true;
    }

    /// Отписаться (идемпотентно)
    pub fn unsubscribe(&mut self) {
        if !self.subscribed {
            return;
        }
        self.health.unsubscribe();
        self.subscribed = false;
    }

    /// Хост уничтожает агента: отписка и полная остановка
    pub fn destroy(&mut self) {
        self.unsubscribe();
        self.combat.abort();
        self.navigator.detach();
        self.life = Life::Destroyed;
        self.activity = AgentActivity::Idle;
        crate::log("👹 EnemyAgent destroyed");
    }

    pub fn set_target(&mut self, target: &SharedTarget) {
        self.target = TargetRef::new(target);
    }

    /// Цель пропала. Latch обнаружения не сбрасывается.
    pub fn clear_target(&mut self) {
        self.target = TargetRef::none();
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Handle для хоста, который доставляет события асинхронно
    pub fn inbox(&self) -> EventInbox {
        self.inbox.clone()
    }

    /// Обработать событие немедленно (переход применяется в момент доставки)
    pub fn handle_event(&mut self, event: AgentEvent) {
        if self.life != Life::Alive {
            return;
        }

        match event {
            AgentEvent::Damaged { amount } => self.on_damaged(amount),
            AgentEvent::Stunned { duration } => self.on_stunned(duration),
            AgentEvent::Death => self.die(),
        }
    }

    fn on_damaged(&mut self, amount: f32) {
        let before = self.aggression.phase();
        let response =
            self.aggression
                .on_damage_received(self.clock, self.perception.target_detected(), self.is_stunned());
        crate::log(&format!("🩸 EnemyAgent: took {:.1} damage ({:?})", amount, response));

        match response {
            DamageResponse::TransitionStarted => {
                self.navigator.stop();
                self.combat.cancel_swing();
                self.presentation.play_animation("scream");
                self.presentation.play_sound("scream");
                self.presentation
                    .spawn_effect(EffectKind::Scream, self.position, self.facing);
                self.notify_phase_change(before);
            }
            DamageResponse::Escalated { .. } => {
                self.notify_phase_change(before);
                self.apply_speed_multiplier();
            }
            DamageResponse::Absorbed => {}
        }
    }

    fn on_stunned(&mut self, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.stun_remaining = self.stun_remaining.max(duration);
        if !self.combat.is_leaping() {
            self.navigator.stop();
        }
        self.presentation.play_animation("stunned");
        crate::log(&format!("💫 EnemyAgent: stunned for {:.1}s", duration));
    }

    fn die(&mut self) {
        self.combat.abort();
        self.navigator.detach();
        self.unsubscribe();
        self.stun_remaining = 0.0;
        self.life = Life::Dead {
            linger: self.config.death_linger,
        };
        self.activity = AgentActivity::Dead;

        self.presentation.play_animation("death");
        self.presentation.play_sound("death");
        self.presentation
            .spawn_effect(EffectKind::DeathBurst, self.position, self.facing);
        self.notifications.emit(AgentNotification::Died);
        crate::log_info("💀 EnemyAgent died");
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    pub fn tick(&mut self, dt: f32) {
        // NaN / отрицательный dt → пустой тик
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        match self.life {
            Life::Destroyed => return,
            Life::Dead { linger } => {
                self.life = Life::Dead {
                    linger: (linger - dt).max(0.0),
                };
                return;
            }
            Life::Alive => {}
        }

        for event in self.inbox.drain() {
            self.handle_event(event);
        }
        if self.life != Life::Alive {
            return;
        }

        if self.stun_remaining > 0.0 {
            self.stun_remaining = (self.stun_remaining - dt).max(0.0);
            if self.combat.is_leaping() {
                self.advance_leap(dt);
            }
            self.activity = AgentActivity::Stunned;
            if self.stun_remaining <= 0.0 {
                crate::log("💫 EnemyAgent: stun ended");
            }
            return;
        }

        self.clock += dt;
        self.combat.advance_timers(dt);

        let target_position = self.target.live_position();
        if let Some(target_position) = target_position {
            self.perception.sense(self.position, self.facing, target_position);
        }
        let detected = self.perception.target_detected();

        self.tick_aggression(dt, detected);

        if self.combat.is_leaping() {
            self.advance_leap(dt);
            self.activity = AgentActivity::Leaping;
            return;
        }

        if self.aggression.is_transitioning() {
            self.navigator.stop();
            self.activity = AgentActivity::Screaming;
            return;
        }

        if self.aggression.take_pending_pushback() {
            self.navigator.stop();
            self.combat.push_back(
                self.position,
                self.facing,
                self.spatial.as_ref(),
                self.presentation.as_mut(),
                &mut self.notifications,
            );
            self.activity = AgentActivity::Engaging;
            return;
        }

        match (detected, target_position) {
            (true, Some(target_position)) => self.engage(dt, target_position, detected),
            _ => self.patrol(dt),
        }
    }

    fn tick_aggression(&mut self, dt: f32, detected: bool) {
        let before = self.aggression.phase();
        let tick = self.aggression.tick(dt, self.clock, detected);

        if tick.regen_pulses > 0 && self.config.regen_per_second > 0.0 {
            self.health
                .heal(self.config.regen_per_second * tick.regen_pulses as f32);
        }

        match tick.change {
            Some(AggressionChange::EnteredFury) => {
                self.presentation.play_animation("fury");
                self.presentation
                    .spawn_effect(EffectKind::FuryAura, self.position, self.facing);
            }
            Some(AggressionChange::Decayed) => {
                self.combat.cancel_swing();
                self.combat.reset_out_of_range();
                self.presentation.play_animation("calm");
            }
            None => {}
        }

        if tick.change.is_some() {
            self.notify_phase_change(before);
            self.apply_speed_multiplier();
        }
    }

    fn engage(&mut self, dt: f32, target_position: Vec3, detected: bool) {
        self.activity = AgentActivity::Engaging;

        let speed = self.current_speed();
        let report = self.combat.tick(CombatContext {
            dt,
            position: &mut self.position,
            facing: &mut self.facing,
            target_position,
            fury: self.aggression.in_fury(),
            speed,
            navigator: &mut self.navigator,
            spatial: self.spatial.as_ref(),
            presentation: self.presentation.as_mut(),
            notifications: &mut self.notifications,
        });
        self.record_inflicted(report, detected);
    }

    fn patrol(&mut self, dt: f32) {
        if self.activity != AgentActivity::Patrolling {
            self.combat.cancel_swing();
            self.patrol.resume(self.position);
        }
        self.activity = AgentActivity::Patrolling;

        let speed = self.current_speed() * self.config.patrol_speed_multiplier;
        self.patrol.tick(
            dt,
            &mut self.position,
            &mut self.facing,
            speed,
            &mut self.navigator,
            &mut self.rng,
        );
    }

    fn advance_leap(&mut self, dt: f32) {
        let report = self.combat.tick_leap(
            dt,
            &mut self.position,
            self.facing,
            &mut self.navigator,
            self.spatial.as_ref(),
            self.presentation.as_mut(),
            &mut self.notifications,
        );
        let detected = self.perception.target_detected();
        self.record_inflicted(report, detected);
    }

    fn record_inflicted(&mut self, report: CombatReport, detected: bool) {
        if report.damage_inflicted > 0.0 {
            self.aggression.on_damage_inflicted(self.clock, detected);
        }
    }

    fn notify_phase_change(&mut self, before: AggressionPhase) {
        let after = self.aggression.phase();
        if before != after {
            self.notifications
                .emit(AgentNotification::AggressionChanged { from: before, to: after });
        }
    }

    fn apply_speed_multiplier(&mut self) {
        let multiplier = self.aggression.speed_multiplier();
        if (multiplier - self.speed_multiplier).abs() > f32::EPSILON {
            self.speed_multiplier = multiplier;
            self.health.set_speed_multiplier(multiplier);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Забрать исходящие уведомления
    pub fn drain_notifications(&mut self) -> Vec<AgentNotification> {
        self.notifications.drain()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    pub fn is_alive(&self) -> bool {
        self.life == Life::Alive
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_remaining > 0.0
    }

    pub fn target_detected(&self) -> bool {
        self.perception.target_detected()
    }

    pub fn has_valid_target(&self) -> bool {
        self.target.is_valid()
    }

    pub fn aggression_phase(&self) -> AggressionPhase {
        self.aggression.phase()
    }

    pub fn fury_level(&self) -> u8 {
        self.aggression.level()
    }

    pub fn aggression(&self) -> &AggressionStateMachine {
        &self.aggression
    }

    pub fn combat(&self) -> &CombatController {
        &self.combat
    }

    pub fn patrol_heading(&self) -> Vec3 {
        self.patrol.heading()
    }

    pub fn activity(&self) -> AgentActivity {
        self.activity
    }

    /// Часы агента (не идут во время стана)
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// base_speed × множитель ярости
    pub fn current_speed(&self) -> f32 {
        self.config.base_speed * self.aggression.speed_multiplier()
    }

    pub fn is_leaping(&self) -> bool {
        self.combat.is_leaping()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Тело отлежало `death_linger` (или агент уничтожен) — можно удалять
    pub fn should_despawn(&self) -> bool {
        match self.life {
            Life::Alive => false,
            Life::Dead { linger } => linger <= 0.0,
            Life::Destroyed => true,
        }
    }
}

impl std::fmt::Debug for EnemyAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnemyAgent")
            .field("position", &self.position)
            .field("phase", &self.aggression.phase())
            .field("activity", &self.activity)
            .field("alive", &self.is_alive())
            .field("stunned", &self.is_stunned())
            .finish()
    }
}
