//! CombatController — поведение при обнаруженной цели
//!
//! В радиусе атаки: стоим, смотрим на цель, бьём по готовности cooldown.
//! Вне радиуса: преследуем. В Fury дополнительно копим время вне радиуса —
//! после `jump_delay` (и при готовом `jump_cooldown`) прыгаем.

use bevy::prelude::*;

use super::leap::{LeapAttack, LeapCancel, LeapProgress, LeapSettings};
use super::melee::{hit_origin, AttackKind, AttackProfile, MeleeSwing, SwingStep};
use super::pushback::push_back;
use super::resolution::strike_area;
use crate::ai::events::{AgentNotification, NotificationBuffer};
use crate::config::AttackConfig;
use crate::movement::navigator::horizontal_distance;
use crate::movement::NavigatorFacade;
use crate::ports::{EffectKind, Presentation, SpatialQuery};

/// Таймеры боя (секунды с последнего события)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatTimers {
    pub since_attack: f32,
    pub since_jump: f32,
    pub time_out_of_range: f32,
}

impl CombatTimers {
    /// Первая атака и первый прыжок доступны сразу
    fn ready(config: &AttackConfig) -> Self {
        Self {
            since_attack: config.normal_attack_cooldown.max(config.fury_attack_cooldown),
            since_jump: config.jump_cooldown,
            time_out_of_range: 0.0,
        }
    }
}

/// Всё, что нужно бою на один тик
pub struct CombatContext<'a> {
    pub dt: f32,
    pub position: &'a mut Vec3,
    pub facing: &'a mut Vec3,
    pub target_position: Vec3,
    pub fury: bool,
    pub speed: f32,
    pub navigator: &'a mut NavigatorFacade,
    pub spatial: &'a dyn SpatialQuery,
    pub presentation: &'a mut dyn Presentation,
    pub notifications: &'a mut NotificationBuffer,
}

/// Итог тика боя
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombatReport {
    /// Урон, реально нанесённый целям (после блока)
    pub damage_inflicted: f32,
}

#[derive(Debug, Clone)]
pub struct CombatController {
    config: AttackConfig,
    timers: CombatTimers,
    swing: Option<MeleeSwing>,
    leap: LeapAttack,
}

impl CombatController {
    pub fn new(config: &AttackConfig) -> Self {
        Self {
            config: config.clone(),
            timers: CombatTimers::ready(config),
            swing: None,
            leap: LeapAttack::new(LeapSettings::from(config)),
        }
    }

    /// Монотонные таймеры: тикают каждый активный (не оглушённый) тик
    pub fn advance_timers(&mut self, dt: f32) {
        self.timers.since_attack += dt;
        self.timers.since_jump += dt;
    }

    pub fn tick(&mut self, ctx: CombatContext<'_>) -> CombatReport {
        if self.swing.is_some() {
            return self.continue_swing(ctx);
        }

        let kind = if ctx.fury { AttackKind::Fury } else { AttackKind::Normal };
        let profile = AttackProfile::for_kind(kind, &self.config);
        let distance = horizontal_distance(*ctx.position, ctx.target_position);

        if distance <= profile.range {
            self.timers.time_out_of_range = 0.0;
            ctx.navigator.stop();
            face_towards(ctx.facing, *ctx.position, ctx.target_position);

            if self.timers.since_attack >= profile.cooldown {
                self.timers.since_attack = 0.0;
                self.swing = Some(MeleeSwing::start(
                    kind,
                    self.config.attack_hit_delay,
                    self.config.attack_recovery,
                ));
                ctx.presentation.play_animation(match kind {
                    AttackKind::Fury => "attack_fury",
                    _ => "attack",
                });
                crate::log(&format!("⚔️ Combat: {:?} swing at {:.1}m", kind, distance));
            }
            return CombatReport::default();
        }

        if ctx.fury {
            self.timers.time_out_of_range += ctx.dt;
            if self.timers.time_out_of_range > self.config.jump_delay
                && self.timers.since_jump >= self.config.jump_cooldown
            {
                self.timers.time_out_of_range = 0.0;
                let started = self.try_leap(
                    *ctx.position,
                    ctx.target_position,
                    ctx.navigator,
                    ctx.presentation,
                    ctx.notifications,
                );
                if started.is_ok() {
                    face_towards(ctx.facing, *ctx.position, ctx.target_position);
                    return CombatReport::default();
                }
            }
        }

        // Преследование
        ctx.navigator.chase(ctx.target_position);
        let previous = *ctx.position;
        *ctx.position = ctx.navigator.step(previous, ctx.speed, ctx.dt);
        face_towards(ctx.facing, *ctx.position, ctx.target_position);

        CombatReport::default()
    }

    fn continue_swing(&mut self, ctx: CombatContext<'_>) -> CombatReport {
        let Some(swing) = self.swing.as_mut() else {
            return CombatReport::default();
        };

        ctx.navigator.stop();
        if swing.in_windup() {
            face_towards(ctx.facing, *ctx.position, ctx.target_position);
        }

        let kind = swing.kind;
        match swing.advance(ctx.dt) {
            SwingStep::Strike => CombatReport {
                damage_inflicted: self.strike(
                    kind,
                    *ctx.position,
                    *ctx.facing,
                    ctx.spatial,
                    ctx.presentation,
                    ctx.notifications,
                ),
            },
            SwingStep::Finished => {
                self.swing = None;
                CombatReport::default()
            }
            SwingStep::Windup | SwingStep::Recovery => CombatReport::default(),
        }
    }

    /// Area-удар в hit origin. Возвращает применённый урон.
    fn strike(
        &self,
        kind: AttackKind,
        position: Vec3,
        facing: Vec3,
        spatial: &dyn SpatialQuery,
        presentation: &mut dyn Presentation,
        notifications: &mut NotificationBuffer,
    ) -> f32 {
        let profile = AttackProfile::for_kind(kind, &self.config);
        let origin = hit_origin(position, facing, self.config.hit_origin_offset);
        let report = strike_area(
            spatial,
            origin,
            profile.range,
            self.config.target_layers,
            position,
            &profile.strike(),
        );

        if report.targets_hit() > 0 {
            presentation.spawn_effect(EffectKind::MeleeImpact, origin, facing);
        }
        crate::log(&format!(
            "💥 Combat: {:?} hit {} target(s) for {:.1}",
            kind,
            report.targets_hit(),
            report.damage_applied()
        ));

        notifications.emit(AgentNotification::AttackPerformed {
            kind,
            targets_hit: report.targets_hit(),
            damage_applied: report.damage_applied(),
        });

        report.damage_applied()
    }

    /// Попробовать прыгнуть. Позицию агента не трогает: при отмене агент
    /// остаётся ровно там, где был.
    pub fn try_leap(
        &mut self,
        position: Vec3,
        target_position: Vec3,
        navigator: &mut NavigatorFacade,
        presentation: &mut dyn Presentation,
        notifications: &mut NotificationBuffer,
    ) -> Result<Vec3, LeapCancel> {
        let result = self
            .leap
            .plan(position, target_position)
            .and_then(|(direction, distance)| self.leap.execute(position, direction, distance, navigator));

        match result {
            Ok(landing) => {
                self.timers.since_jump = 0.0;
                self.timers.time_out_of_range = 0.0;
                let distance = horizontal_distance(position, landing);
                presentation.play_animation("leap");
                presentation.spawn_effect(EffectKind::LeapDust, position, landing - position);
                notifications.emit(AgentNotification::LeapStarted { distance });
                crate::log_info(&format!("🦘 Leap: {:.1}m towards target", distance));
            }
            Err(reason) => {
                notifications.emit(AgentNotification::LeapCancelled { reason });
                crate::log(&format!("🦘 Leap cancelled: {:?}", reason));
            }
        }

        result
    }

    /// Продвинуть прыжок в полёте. Возвращает урон от удара при приземлении.
    pub fn tick_leap(
        &mut self,
        dt: f32,
        position: &mut Vec3,
        facing: Vec3,
        navigator: &mut NavigatorFacade,
        spatial: &dyn SpatialQuery,
        presentation: &mut dyn Presentation,
        notifications: &mut NotificationBuffer,
    ) -> CombatReport {
        match self.leap.tick(dt, navigator) {
            LeapProgress::Airborne { position: airborne } => {
                *position = airborne;
                CombatReport::default()
            }
            LeapProgress::Landed { position: landing } => {
                *position = landing;
                presentation.play_animation("land");
                presentation.spawn_effect(EffectKind::LeapDust, landing, facing);
                notifications.emit(AgentNotification::LeapLanded);

                let damage_inflicted = if self.config.jump_landing_damage > 0.0 {
                    self.strike(AttackKind::Landing, landing, facing, spatial, presentation, notifications)
                } else {
                    0.0
                };
                CombatReport { damage_inflicted }
            }
            LeapProgress::Idle | LeapProgress::Grounded | LeapProgress::Finished => CombatReport::default(),
        }
    }

    /// Отбросить всех вокруг. Заменяет атаку этого тика.
    pub fn push_back(
        &mut self,
        position: Vec3,
        facing: Vec3,
        spatial: &dyn SpatialQuery,
        presentation: &mut dyn Presentation,
        notifications: &mut NotificationBuffer,
    ) -> usize {
        self.cancel_swing();
        self.timers.since_attack = 0.0;

        let pushed = push_back(
            spatial,
            position,
            facing,
            self.config.fury_attack_range,
            self.config.target_layers,
            self.config.consecutive_hit_push_distance,
        );

        presentation.play_animation("push_back");
        presentation.spawn_effect(EffectKind::Scream, position, facing);
        notifications.emit(AgentNotification::PushBack { targets_pushed: pushed });
        crate::log_info(&format!("💨 Push-back: {} target(s)", pushed));

        pushed
    }

    /// Отменить замах (удар не резолвится)
    pub fn cancel_swing(&mut self) {
        if self.swing.take().is_some() {
            crate::log("⚔️ Combat: swing cancelled");
        }
    }

    /// Fury погасла: накопленное время вне радиуса к следующей ярости не переносится
    pub fn reset_out_of_range(&mut self) {
        self.timers.time_out_of_range = 0.0;
    }

    /// Смерть: всё оборвать
    pub fn abort(&mut self) {
        self.swing = None;
        self.leap.abort();
        self.timers.time_out_of_range = 0.0;
    }

    pub fn timers(&self) -> &CombatTimers {
        &self.timers
    }

    pub fn is_leaping(&self) -> bool {
        self.leap.is_leaping()
    }

    pub fn is_swinging(&self) -> bool {
        self.swing.is_some()
    }

    pub fn swing(&self) -> Option<&MeleeSwing> {
        self.swing.as_ref()
    }

    pub fn leap_landing(&self) -> Option<Vec3> {
        self.leap.landing()
    }
}

/// Повернуть facing к точке (по горизонтали); совпадение позиций — без изменений
fn face_towards(facing: &mut Vec3, from: Vec3, to: Vec3) {
    if let Some(direction) = (to - from).with_y(0.0).try_normalize() {
        *facing = direction;
    }
}
