//! Phase — resumable состояние многотиковых операций (замах, прыжок)
//!
//! Вместо блокирующих вызовов: текущая фаза + elapsed, продвигается `dt`
//! каждый тик. Тик всегда возвращается сразу.

/// Фазы операции (elapsed в секундах внутри фазы)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Подготовка (замах, присед перед прыжком)
    Windup(f32),
    /// Активная часть (полёт)
    Active(f32),
    /// Восстановление после удара/приземления
    Cooldown(f32),
}

/// Что произошло с фазой за тик
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseStep {
    /// Ничего не выполняется
    Idle,
    /// Остаёмся в той же фазе
    Continue,
    /// Windup закончился, перешли в следующую фазу
    WindupFinished,
    /// Active закончился
    ActiveFinished,
    /// Cooldown закончился, операция завершена (→ Idle)
    Finished,
}

/// Длительности фаз конкретной операции
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDurations {
    pub windup: f32,
    /// None — фаза пропускается (Windup → Cooldown)
    pub active: Option<f32>,
    pub cooldown: f32,
}

impl Phase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    pub fn is_windup(&self) -> bool {
        matches!(self, Phase::Windup(_))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Active(_))
    }

    /// Продвинуть фазу на `dt`. Переход максимум на одну фазу за тик —
    /// вызывающий код должен увидеть каждый переход (резолв удара, взлёт).
    pub fn advance(&mut self, dt: f32, durations: PhaseDurations) -> PhaseStep {
        match *self {
            Phase::Idle => PhaseStep::Idle,
            Phase::Windup(elapsed) => {
                let elapsed = elapsed + dt;
                if elapsed >= durations.windup {
                    *self = match durations.active {
                        Some(_) => Phase::Active(0.0),
                        None => Phase::Cooldown(0.0),
                    };
                    PhaseStep::WindupFinished
                } else {
                    *self = Phase::Windup(elapsed);
                    PhaseStep::Continue
                }
            }
            Phase::Active(elapsed) => {
                let elapsed = elapsed + dt;
                let duration = durations.active.unwrap_or(0.0);
                if elapsed >= duration {
                    *self = Phase::Cooldown(0.0);
                    PhaseStep::ActiveFinished
                } else {
                    *self = Phase::Active(elapsed);
                    PhaseStep::Continue
                }
            }
            Phase::Cooldown(elapsed) => {
                let elapsed = elapsed + dt;
                if elapsed >= durations.cooldown {
                    *self = Phase::Idle;
                    PhaseStep::Finished
                } else {
                    *self = Phase::Cooldown(elapsed);
                    PhaseStep::Continue
                }
            }
        }
    }

    /// Нормализованный прогресс Active фазы (0..=1)
    pub fn active_progress(&self, durations: PhaseDurations) -> Option<f32> {
        match (*self, durations.active) {
            (Phase::Active(elapsed), Some(duration)) if duration > 0.0 => {
                Some((elapsed / duration).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}
