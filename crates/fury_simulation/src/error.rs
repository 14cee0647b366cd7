//! Ошибки конфигурации
//!
//! Runtime-логика агента ошибок не возвращает: сбои портов деградируют
//! (Option/bool), отмена прыжка — обычное значение (`LeapCancel`).
//! Единственный fallible шаг — построение агента из `AttackConfig`.

use thiserror::Error;

/// Ошибка валидации/загрузки `AttackConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Поле должно быть строго положительным (дистанции, длительности, скорости)
    #[error("config field `{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    /// Поле вне допустимого диапазона
    #[error("config field `{field}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Расширенное окно decay короче базового
    #[error(
        "no_damage_decay_time ({no_damage_decay_time}) must not be shorter than decay_time ({decay_time})"
    )]
    InvalidDecayWindow {
        decay_time: f32,
        no_damage_decay_time: f32,
    },

    /// JSON не распарсился
    #[error("failed to parse attack config: {0}")]
    Parse(#[from] serde_json::Error),
}
