//! AttackConfig — неизменяемый блок параметров врага
//!
//! Загружается при конструировании агента и больше не меняется.
//! Варианты (Laceratus, Kronus, Morlock, Drogath, Veynar) — это один и тот же
//! контроллер с разными числами, см. `EnemyProfile`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ports::LayerMask;

/// Параметры врага (дистанции в метрах, время в секундах)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    // --- Movement ---
    /// Базовая скорость (м/с)
    pub base_speed: f32,
    /// Множитель скорости во время патруля
    pub patrol_speed_multiplier: f32,
    /// Множитель скорости в Fury
    pub fury_speed_multiplier: f32,
    /// Бонус к скорости начиная с fury level 2 (0.25 = +25%)
    pub fury_level_speed_bonus: f32,

    // --- Perception ---
    pub vision_range: f32,
    pub vision_cone_half_angle_deg: f32,

    // --- Patrol ---
    pub direction_change_interval: f32,
    /// Максимальный "подворот" при мягкой смене направления (градусы)
    pub patrol_direction_change_angle_deg: f32,
    pub stuck_check_interval: f32,
    pub stuck_distance_threshold: f32,
    pub search_radius: f32,
    pub patrol_sample_attempts: u32,
    /// Путь длиннее `ratio × прямая` отбрасывается
    pub max_detour_ratio: f32,
    pub destination_tolerance: f32,

    // --- Normal attack ---
    pub normal_attack_range: f32,
    pub normal_attack_damage: f32,
    pub normal_attack_cooldown: f32,
    /// Доля замедления цели (0.3 = -30% скорости)
    pub normal_attack_slow_percent: f32,
    pub normal_attack_slow_duration: f32,

    // --- Fury attack ---
    pub fury_attack_range: f32,
    pub fury_attack_damage: f32,
    pub fury_attack_cooldown: f32,

    // --- Swing timing ---
    /// Задержка от начала замаха до резолва удара
    pub attack_hit_delay: f32,
    pub attack_recovery: f32,
    /// Смещение hit-origin вперёд от агента
    pub hit_origin_offset: f32,
    pub target_layers: LayerMask,

    // --- Leap ---
    /// Сколько цель должна пробыть вне fury range до прыжка
    pub jump_delay: f32,
    pub jump_cooldown: f32,
    pub jump_distance: f32,
    pub jump_height: f32,
    pub jump_duration: f32,
    pub jump_windup: f32,
    pub jump_recovery: f32,
    /// Цель ближе — прыжок отменяется
    pub jump_cancel_distance: f32,
    /// Насколько не долетать до цели при укороченном прыжке
    pub jump_landing_offset: f32,
    pub jump_landing_sample_radius: f32,
    /// Урон по области при приземлении (0 = без удара)
    pub jump_landing_damage: f32,

    // --- Aggression ---
    pub max_fury_level: u8,
    /// Длительность "крика" Calm → Fury
    pub transition_duration: f32,
    pub decay_time: f32,
    /// Расширенное окно decay (пока агент сам попадает)
    pub no_damage_decay_time: f32,
    pub regen_per_second: f32,
    pub consecutive_hit_push_distance: f32,
    pub pushback_hit_threshold: u8,

    // --- Lifecycle ---
    /// Сколько труп лежит до деспавна
    pub death_linger: f32,
}

impl Default for AttackConfig {
    /// Laceratus profile
    fn default() -> Self {
        Self {
            base_speed: 3.5,
            patrol_speed_multiplier: 0.6,
            fury_speed_multiplier: 1.6,
            fury_level_speed_bonus: 0.25,

            vision_range: 7.0,
            vision_cone_half_angle_deg: 60.0,

            direction_change_interval: 4.0,
            patrol_direction_change_angle_deg: 30.0,
            stuck_check_interval: 1.5,
            stuck_distance_threshold: 0.3,
            search_radius: 8.0,
            patrol_sample_attempts: 10,
            max_detour_ratio: 2.5,
            destination_tolerance: 0.5,

            normal_attack_range: 2.0,
            normal_attack_damage: 10.0,
            normal_attack_cooldown: 1.5,
            normal_attack_slow_percent: 0.3,
            normal_attack_slow_duration: 2.0,

            fury_attack_range: 2.5,
            fury_attack_damage: 18.0,
            fury_attack_cooldown: 0.8,

            attack_hit_delay: 0.35,
            attack_recovery: 0.25,
            hit_origin_offset: 1.0,
            target_layers: LayerMask::PLAYER,

            jump_delay: 1.5,
            jump_cooldown: 4.0,
            jump_distance: 6.0,
            jump_height: 2.0,
            jump_duration: 0.6,
            jump_windup: 0.2,
            jump_recovery: 0.3,
            jump_cancel_distance: 3.0,
            jump_landing_offset: 1.0,
            jump_landing_sample_radius: 2.0,
            jump_landing_damage: 0.0,

            max_fury_level: 3,
            transition_duration: 1.2,
            decay_time: 3.0,
            no_damage_decay_time: 5.0,
            regen_per_second: 2.0,
            consecutive_hit_push_distance: 4.0,
            pushback_hit_threshold: 2,

            death_linger: 5.0,
        }
    }
}

impl AttackConfig {
    /// Парсит JSON (недостающие поля берутся из default) и валидирует
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AttackConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("base_speed", self.base_speed),
            ("patrol_speed_multiplier", self.patrol_speed_multiplier),
            ("fury_speed_multiplier", self.fury_speed_multiplier),
            ("vision_range", self.vision_range),
            ("direction_change_interval", self.direction_change_interval),
            ("stuck_check_interval", self.stuck_check_interval),
            ("search_radius", self.search_radius),
            ("destination_tolerance", self.destination_tolerance),
            ("normal_attack_range", self.normal_attack_range),
            ("normal_attack_cooldown", self.normal_attack_cooldown),
            ("fury_attack_range", self.fury_attack_range),
            ("fury_attack_cooldown", self.fury_attack_cooldown),
            ("jump_distance", self.jump_distance),
            ("jump_duration", self.jump_duration),
            ("transition_duration", self.transition_duration),
            ("decay_time", self.decay_time),
            ("no_damage_decay_time", self.no_damage_decay_time),
        ];
        for (field, value) in positive {
            // `!(x > 0)` ловит и NaN
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("fury_level_speed_bonus", self.fury_level_speed_bonus),
            ("stuck_distance_threshold", self.stuck_distance_threshold),
            ("normal_attack_damage", self.normal_attack_damage),
            ("normal_attack_slow_duration", self.normal_attack_slow_duration),
            ("fury_attack_damage", self.fury_attack_damage),
            ("attack_hit_delay", self.attack_hit_delay),
            ("attack_recovery", self.attack_recovery),
            ("hit_origin_offset", self.hit_origin_offset),
            ("jump_delay", self.jump_delay),
            ("jump_cooldown", self.jump_cooldown),
            ("jump_height", self.jump_height),
            ("jump_windup", self.jump_windup),
            ("jump_recovery", self.jump_recovery),
            ("jump_cancel_distance", self.jump_cancel_distance),
            ("jump_landing_offset", self.jump_landing_offset),
            ("jump_landing_sample_radius", self.jump_landing_sample_radius),
            ("jump_landing_damage", self.jump_landing_damage),
            ("regen_per_second", self.regen_per_second),
            ("consecutive_hit_push_distance", self.consecutive_hit_push_distance),
            ("death_linger", self.death_linger),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: f32::INFINITY,
                });
            }
        }

        check_range("vision_cone_half_angle_deg", self.vision_cone_half_angle_deg, 0.0, 180.0)?;
        check_range(
            "patrol_direction_change_angle_deg",
            self.patrol_direction_change_angle_deg,
            0.0,
            180.0,
        )?;
        check_range("normal_attack_slow_percent", self.normal_attack_slow_percent, 0.0, 1.0)?;
        check_range("max_detour_ratio", self.max_detour_ratio, 1.0, f32::INFINITY)?;

        if self.max_fury_level == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_fury_level",
                value: 0.0,
                min: 1.0,
                max: u8::MAX as f32,
            });
        }
        if self.pushback_hit_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                field: "pushback_hit_threshold",
                value: 0.0,
                min: 1.0,
                max: u8::MAX as f32,
            });
        }
        if self.patrol_sample_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                field: "patrol_sample_attempts",
                value: 0.0,
                min: 1.0,
                max: u32::MAX as f32,
            });
        }
        if self.no_damage_decay_time < self.decay_time {
            return Err(ConfigError::InvalidDecayWindow {
                decay_time: self.decay_time,
                no_damage_decay_time: self.no_damage_decay_time,
            });
        }

        Ok(())
    }

    pub fn vision_cone_half_angle(&self) -> f32 {
        self.vision_cone_half_angle_deg.to_radians()
    }

    pub fn patrol_direction_change_angle(&self) -> f32 {
        self.patrol_direction_change_angle_deg.to_radians()
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

/// Варианты врагов одной формы (perceive → patrol/chase → attack → escalate/decay)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyProfile {
    /// Полная версия: 3 уровня ярости, прыжок, push-back
    Laceratus,
    /// Тяжёлый: медленный, бьёт сильно, 2 уровня
    Kronus,
    /// Быстрый и хрупкий, длинная эскалация
    Morlock,
    /// Танк с сильной регенерацией
    Drogath,
    /// Дальнозоркий, прыгает далеко
    Veynar,
}

impl EnemyProfile {
    pub fn config(self) -> AttackConfig {
        match self {
            EnemyProfile::Laceratus => AttackConfig::default(),
            EnemyProfile::Kronus => AttackConfig {
                base_speed: 2.8,
                fury_speed_multiplier: 1.4,
                normal_attack_damage: 16.0,
                normal_attack_cooldown: 2.0,
                fury_attack_damage: 26.0,
                fury_attack_cooldown: 1.2,
                jump_distance: 4.5,
                jump_height: 1.2,
                max_fury_level: 2,
                transition_duration: 1.6,
                ..AttackConfig::default()
            },
            EnemyProfile::Morlock => AttackConfig {
                base_speed: 4.5,
                fury_speed_multiplier: 1.8,
                fury_level_speed_bonus: 0.15,
                normal_attack_damage: 6.0,
                normal_attack_cooldown: 1.0,
                fury_attack_damage: 11.0,
                fury_attack_cooldown: 0.5,
                max_fury_level: 4,
                decay_time: 2.5,
                no_damage_decay_time: 4.0,
                regen_per_second: 1.0,
                ..AttackConfig::default()
            },
            EnemyProfile::Drogath => AttackConfig {
                base_speed: 2.5,
                fury_attack_damage: 22.0,
                regen_per_second: 6.0,
                decay_time: 4.0,
                no_damage_decay_time: 7.0,
                consecutive_hit_push_distance: 6.0,
                jump_delay: 2.5,
                ..AttackConfig::default()
            },
            EnemyProfile::Veynar => AttackConfig {
                vision_range: 12.0,
                vision_cone_half_angle_deg: 45.0,
                jump_distance: 9.0,
                jump_height: 3.0,
                jump_duration: 0.8,
                jump_delay: 1.0,
                jump_landing_damage: 12.0,
                ..AttackConfig::default()
            },
        }
    }
}
