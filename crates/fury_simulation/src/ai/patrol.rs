//! PatrolController — блуждание, пока цель не обнаружена
//!
//! - Смена курса каждые `direction_change_interval` секунд по взвешенной политике
//!   (40% мягкий подворот, 40% резкий уход 90°–180°, 20% случайный курс)
//! - Stuck detection: смещение за `stuck_check_interval` меньше порога →
//!   немедленный новый курс + сброс пути
//! - Выбор точки: до N попыток, отбрасываем точки с путём длиннее
//!   `max_detour_ratio × прямая`

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use bevy::prelude::*;
use rand::Rng;

use crate::config::AttackConfig;
use crate::movement::navigator::horizontal_distance;
use crate::movement::NavigatorFacade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatrolSettings {
    pub direction_change_interval: f32,
    /// Радианы
    pub direction_change_angle: f32,
    pub stuck_check_interval: f32,
    pub stuck_distance_threshold: f32,
    pub search_radius: f32,
    pub sample_attempts: u32,
    pub max_detour_ratio: f32,
    pub destination_tolerance: f32,
}

impl From<&AttackConfig> for PatrolSettings {
    fn from(config: &AttackConfig) -> Self {
        Self {
            direction_change_interval: config.direction_change_interval,
            direction_change_angle: config.patrol_direction_change_angle(),
            stuck_check_interval: config.stuck_check_interval,
            stuck_distance_threshold: config.stuck_distance_threshold,
            search_radius: config.search_radius,
            sample_attempts: config.patrol_sample_attempts,
            max_detour_ratio: config.max_detour_ratio,
            destination_tolerance: config.destination_tolerance,
        }
    }
}

/// Состояние патруля
///
/// Инвариант: `current_direction` — единичный горизонтальный вектор.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolState {
    pub current_direction: Vec3,
    pub direction_timer: f32,
    pub stuck_check_timer: f32,
    pub last_sampled_position: Vec3,
}

/// Какая ветка политики сработала
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingChange {
    Nudge,
    EscapeTurn,
    Random,
}

#[derive(Debug, Clone)]
pub struct PatrolController {
    settings: PatrolSettings,
    state: PatrolState,
    /// Навигация отказала — меняем курс на следующем тике
    force_direction_change: bool,
}

impl PatrolController {
    pub fn new(settings: PatrolSettings, facing: Vec3, position: Vec3) -> Self {
        Self {
            settings,
            state: PatrolState {
                current_direction: flat_unit(facing),
                direction_timer: 0.0,
                stuck_check_timer: 0.0,
                last_sampled_position: position,
            },
            force_direction_change: false,
        }
    }

    /// Вернуться к патрулю после паузы (бой, крик, прыжок):
    /// stuck-проба стартует заново с текущей позиции.
    pub fn resume(&mut self, position: Vec3) {
        self.state.stuck_check_timer = 0.0;
        self.state.last_sampled_position = position;
    }

    pub fn tick<R: Rng>(
        &mut self,
        dt: f32,
        position: &mut Vec3,
        facing: &mut Vec3,
        speed: f32,
        navigator: &mut NavigatorFacade,
        rng: &mut R,
    ) {
        if std::mem::take(&mut self.force_direction_change) {
            self.change_heading(rng);
            navigator.stop();
        }

        // Плановая смена курса
        self.state.direction_timer += dt;
        if self.state.direction_timer >= self.settings.direction_change_interval {
            self.state.direction_timer = 0.0;
            let change = self.change_heading(rng);
            navigator.stop();
            crate::log(&format!("🚶 Patrol: heading change ({:?})", change));
        }

        // Stuck detection
        self.state.stuck_check_timer += dt;
        if self.state.stuck_check_timer >= self.settings.stuck_check_interval {
            self.state.stuck_check_timer = 0.0;
            let displacement = horizontal_distance(*position, self.state.last_sampled_position);
            self.state.last_sampled_position = *position;

            if displacement < self.settings.stuck_distance_threshold || navigator.is_stuck() {
                self.escape_turn(rng);
                navigator.stop();
                self.state.direction_timer = 0.0;
                crate::log_warning(&format!(
                    "🧱 Patrol: stuck (moved {:.2}m), forcing reroute",
                    displacement
                ));
            }
        }

        // Новая точка, если пути нет или дошли
        if !navigator.has_path() || navigator.arrived(*position, self.settings.destination_tolerance) {
            match self.select_destination(*position, navigator, rng) {
                Some(destination) if navigator.go_to(destination) => {}
                _ => {
                    navigator.stop();
                    self.force_direction_change = true;
                    crate::log_warning("🧭 Patrol: no reachable destination, changing heading next tick");
                    return;
                }
            }
        }

        let previous = *position;
        *position = navigator.step(previous, speed, dt);
        if let Some(direction) = (*position - previous).with_y(0.0).try_normalize() {
            *facing = direction;
        }
    }

    /// Взвешенная смена курса 40/40/20
    pub fn change_heading<R: Rng>(&mut self, rng: &mut R) -> HeadingChange {
        let roll: f32 = rng.gen();
        let change = if roll < 0.4 {
            let max_angle = self.settings.direction_change_angle;
            let angle = rng.gen_range(-max_angle..=max_angle);
            self.rotate_heading(angle);
            HeadingChange::Nudge
        } else if roll < 0.8 {
            self.escape_turn(rng);
            HeadingChange::EscapeTurn
        } else {
            let angle = rng.gen_range(0.0..TAU);
            self.state.current_direction = Vec3::new(angle.sin(), 0.0, angle.cos());
            HeadingChange::Random
        };
        self.renormalize();
        change
    }

    /// Резкий уход: 90°–180° со случайным знаком
    fn escape_turn<R: Rng>(&mut self, rng: &mut R) {
        let angle = rng.gen_range(FRAC_PI_2..=PI);
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.rotate_heading(angle * sign);
        self.renormalize();
    }

    fn rotate_heading(&mut self, angle: f32) {
        self.state.current_direction = Quat::from_rotation_y(angle) * self.state.current_direction;
    }

    fn renormalize(&mut self) {
        self.state.current_direction = flat_unit(self.state.current_direction);
    }

    /// До `sample_attempts` кандидатов вдоль курса (со случайным разбросом
    /// после первой попытки); None — ни один не прошёл проверку.
    pub fn select_destination<R: Rng>(
        &self,
        position: Vec3,
        navigator: &NavigatorFacade,
        rng: &mut R,
    ) -> Option<Vec3> {
        let radius = self.settings.search_radius;

        for attempt in 0..self.settings.sample_attempts {
            let spread = if attempt == 0 {
                0.0
            } else {
                rng.gen_range(-FRAC_PI_4..=FRAC_PI_4)
            };
            let direction = Quat::from_rotation_y(spread) * self.state.current_direction;
            let distance = rng.gen_range(radius * 0.5..=radius);

            let Some(candidate) = navigator.sample_point(position + direction * distance, radius) else {
                continue;
            };
            if self.accepts_candidate(position, candidate, navigator) {
                return Some(candidate);
            }
        }

        None
    }

    /// Точка в пределах `search_radius`, достижима и путь не длиннее
    /// `max_detour_ratio × прямая`
    pub fn accepts_candidate(&self, position: Vec3, candidate: Vec3, navigator: &NavigatorFacade) -> bool {
        let straight = horizontal_distance(position, candidate);
        if straight <= self.settings.destination_tolerance || straight > self.settings.search_radius {
            return false;
        }

        match navigator.path_length(position, candidate) {
            Some(path) => path <= straight * self.settings.max_detour_ratio,
            None => false,
        }
    }

    pub fn state(&self) -> &PatrolState {
        &self.state
    }

    pub fn heading(&self) -> Vec3 {
        self.state.current_direction
    }

    pub fn direction_change_pending(&self) -> bool {
        self.force_direction_change
    }
}

/// Горизонтальный единичный вектор (fallback — +Z)
fn flat_unit(direction: Vec3) -> Vec3 {
    direction.with_y(0.0).try_normalize().unwrap_or(Vec3::Z)
}
