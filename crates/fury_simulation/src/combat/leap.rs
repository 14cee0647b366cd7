//! LeapAttack — прыжок к цели (только в Fury)
//!
//! plan → execute → (Windup → Active полёт по дуге → Cooldown) → attach.
//! Пока прыжок идёт, навигатор отключён и прыжок не прерывается ничем,
//! кроме смерти.

use std::f32::consts::PI;

use bevy::prelude::*;

use super::phase::{Phase, PhaseDurations, PhaseStep};
use crate::config::AttackConfig;
use crate::movement::navigator::horizontal_distance;
use crate::movement::NavigatorFacade;

/// Почему прыжок не состоялся
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeapCancel {
    /// Цель ближе `jump_cancel_distance`
    TargetTooClose,
    /// navmesh не дал точку приземления
    NoLandingPoint,
    /// Прыжок уже идёт
    AlreadyLeaping,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeapSettings {
    pub distance: f32,
    pub height: f32,
    pub duration: f32,
    pub windup: f32,
    pub recovery: f32,
    pub cancel_distance: f32,
    pub landing_offset: f32,
    pub landing_sample_radius: f32,
}

impl From<&AttackConfig> for LeapSettings {
    fn from(config: &AttackConfig) -> Self {
        Self {
            distance: config.jump_distance,
            height: config.jump_height,
            duration: config.jump_duration,
            windup: config.jump_windup,
            recovery: config.jump_recovery,
            cancel_distance: config.jump_cancel_distance,
            landing_offset: config.jump_landing_offset,
            landing_sample_radius: config.jump_landing_sample_radius,
        }
    }
}

/// Что прыжок сделал за тик
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeapProgress {
    Idle,
    /// Присед / восстановление — позиция не меняется
    Grounded,
    Airborne { position: Vec3 },
    Landed { position: Vec3 },
    /// Восстановление закончилось, навигатор снова attached
    Finished,
}

#[derive(Debug, Clone)]
pub struct LeapAttack {
    settings: LeapSettings,
    phase: Phase,
    start: Vec3,
    landing: Vec3,
}

impl LeapAttack {
    pub fn new(settings: LeapSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            start: Vec3::ZERO,
            landing: Vec3::ZERO,
        }
    }

    fn durations(&self) -> PhaseDurations {
        PhaseDurations {
            windup: self.settings.windup,
            active: Some(self.settings.duration),
            cooldown: self.settings.recovery,
        }
    }

    /// Направление и дальность прыжка (без побочных эффектов)
    ///
    /// Цель ближе номинальной дальности → прыгаем на `dist - landing_offset`,
    /// чтобы не приземлиться прямо в неё.
    pub fn plan(&self, position: Vec3, target: Vec3) -> Result<(Vec3, f32), LeapCancel> {
        let distance = horizontal_distance(position, target);
        if distance < self.settings.cancel_distance {
            return Err(LeapCancel::TargetTooClose);
        }

        let direction = (target - position).with_y(0.0).normalize_or_zero();
        let leap_distance = if distance < self.settings.distance {
            (distance - self.settings.landing_offset).max(0.0)
        } else {
            self.settings.distance
        };

        Ok((direction, leap_distance))
    }

    /// Начать прыжок. Ok — точка приземления; навигатор отключается.
    pub fn execute(
        &mut self,
        position: Vec3,
        direction: Vec3,
        distance: f32,
        navigator: &mut NavigatorFacade,
    ) -> Result<Vec3, LeapCancel> {
        if self.is_leaping() {
            return Err(LeapCancel::AlreadyLeaping);
        }

        let nominal = position + direction * distance;
        let landing = navigator
            .sample_point(nominal, self.settings.landing_sample_radius)
            .ok_or(LeapCancel::NoLandingPoint)?;

        self.start = position;
        self.landing = landing;
        self.phase = Phase::Windup(0.0);
        navigator.detach();

        Ok(landing)
    }

    pub fn tick(&mut self, dt: f32, navigator: &mut NavigatorFacade) -> LeapProgress {
        let durations = self.durations();
        match self.phase.advance(dt, durations) {
            PhaseStep::Idle => LeapProgress::Idle,
            PhaseStep::WindupFinished => LeapProgress::Airborne {
                position: self.start,
            },
            PhaseStep::Continue => match self.phase.active_progress(durations) {
                Some(t) => LeapProgress::Airborne {
                    position: self.arc_position(t),
                },
                None => LeapProgress::Grounded,
            },
            PhaseStep::ActiveFinished => {
                navigator.warp(self.landing);
                LeapProgress::Landed {
                    position: self.landing,
                }
            }
            PhaseStep::Finished => {
                navigator.attach();
                LeapProgress::Finished
            }
        }
    }

    /// Позиция на дуге: lerp по горизонтали + синусоидальная высота
    pub fn arc_position(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        self.start.lerp(self.landing, t) + Vec3::Y * (t * PI).sin() * self.settings.height
    }

    /// Оборвать прыжок (смерть). Навигатор не трогаем — владелец решает сам.
    pub fn abort(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn is_leaping(&self) -> bool {
        !self.phase.is_idle()
    }

    pub fn landing(&self) -> Option<Vec3> {
        self.is_leaping().then_some(self.landing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::FlatNavigator;

    fn leap() -> LeapAttack {
        LeapAttack::new(LeapSettings::from(&AttackConfig::default()))
    }

    fn navigator() -> NavigatorFacade {
        NavigatorFacade::new(Box::new(FlatNavigator::new(50.0)))
    }

    #[test]
    fn test_plan_cancels_when_target_too_close() {
        let leap = leap();
        // cancel distance = 3
        assert_eq!(
            leap.plan(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.9)),
            Err(LeapCancel::TargetTooClose)
        );
    }

    #[test]
    fn test_plan_shortens_leap_to_near_target() {
        let leap = leap();
        let (direction, distance) = leap.plan(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)).unwrap();
        assert_eq!(direction, Vec3::X);
        // 4 - landing_offset(1)
        assert!((distance - 3.0).abs() < 1e-6);

        let (_, far) = leap.plan(Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0)).unwrap();
        assert_eq!(far, 6.0);
    }

    #[test]
    fn test_execute_without_landing_point_leaves_agent_attached() {
        let mut leap = leap();
        let mut nav = NavigatorFacade::new(Box::new(FlatNavigator::new(50.0).with_failing_samples()));

        let result = leap.execute(Vec3::ZERO, Vec3::X, 6.0, &mut nav);
        assert_eq!(result, Err(LeapCancel::NoLandingPoint));
        assert!(!leap.is_leaping());
        assert!(nav.is_attached());
    }

    #[test]
    fn test_full_leap_lands_and_reattaches() {
        let mut leap = leap();
        let mut nav = navigator();

        let landing = leap.execute(Vec3::ZERO, Vec3::X, 6.0, &mut nav).unwrap();
        assert_eq!(landing, Vec3::new(6.0, 0.0, 0.0));
        assert!(!nav.is_attached());
        assert!(matches!(leap.execute(Vec3::ZERO, Vec3::X, 6.0, &mut nav), Err(LeapCancel::AlreadyLeaping)));

        let mut peak: f32 = 0.0;
        let mut landed = None;
        for _ in 0..200 {
            match leap.tick(1.0 / 60.0, &mut nav) {
                LeapProgress::Airborne { position } => peak = peak.max(position.y),
                LeapProgress::Landed { position } => landed = Some(position),
                LeapProgress::Finished => break,
                _ => {}
            }
        }

        assert_eq!(landed, Some(landing));
        assert!(peak > 1.5 && peak <= 2.0 + 1e-4);
        assert!(!leap.is_leaping());
        assert!(nav.is_attached());
    }

    #[test]
    fn test_arc_endpoints() {
        let mut leap = leap();
        let mut nav = navigator();
        leap.execute(Vec3::ZERO, Vec3::X, 6.0, &mut nav).unwrap();

        assert!(leap.arc_position(0.0).distance(Vec3::ZERO) < 1e-5);
        assert!(leap.arc_position(1.0).distance(Vec3::new(6.0, 0.0, 0.0)) < 1e-5);
        assert!((leap.arc_position(0.5).y - 2.0).abs() < 1e-5);
    }
}
