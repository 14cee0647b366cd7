//! AggressionStateMachine — Calm → Transitioning (крик) → Fury(level) → Calm
//!
//! Переходы по входящему урону применяются в момент доставки события,
//! а не на следующем тике — decay перевзводится по самому свежему времени.
//!
//! Инварианты:
//! - `level > 0 ⇔ in_fury()`
//! - `0 <= level <= max_fury_level`
//! - `consecutive_hits` растёт только в Fury

use crate::config::AttackConfig;

/// Публичное (наблюдаемое) состояние ярости
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggressionPhase {
    Calm,
    /// Телеграфированный крик: движение и атаки заблокированы
    Transitioning,
    Fury { level: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Calm,
    Transitioning { elapsed: f32 },
    Fury { level: u8 },
}

/// Параметры автомата (выжимка из AttackConfig)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggressionSettings {
    pub max_fury_level: u8,
    pub transition_duration: f32,
    pub decay_time: f32,
    pub no_damage_decay_time: f32,
    pub pushback_hit_threshold: u8,
    pub fury_speed_multiplier: f32,
    pub fury_level_speed_bonus: f32,
}

impl From<&AttackConfig> for AggressionSettings {
    fn from(config: &AttackConfig) -> Self {
        Self {
            max_fury_level: config.max_fury_level,
            transition_duration: config.transition_duration,
            decay_time: config.decay_time,
            no_damage_decay_time: config.no_damage_decay_time,
            pushback_hit_threshold: config.pushback_hit_threshold,
            fury_speed_multiplier: config.fury_speed_multiplier,
            fury_level_speed_bonus: config.fury_level_speed_bonus,
        }
    }
}

/// Реакция автомата на входящий урон
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageResponse {
    /// Calm → Transitioning
    TransitionStarted,
    /// Урон в Fury: уровень (возможно тот же, если max) + флаг push-back
    Escalated { level: u8, pushback: bool },
    /// Только bookkeeping (крик уже идёт / агент оглушён)
    Absorbed,
}

/// Переход, случившийся за тик
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggressionChange {
    EnteredFury,
    Decayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggressionTick {
    pub change: Option<AggressionChange>,
    /// Сколько раз за тик сработала секундная регенерация
    pub regen_pulses: u32,
}

#[derive(Debug, Clone)]
pub struct AggressionStateMachine {
    settings: AggressionSettings,
    state: State,
    consecutive_hits: u8,
    last_damage_received_at: Option<f32>,
    /// Стартует с 0.0 (момент спавна), а не с "никогда" — см. DESIGN.md
    last_damage_inflicted_at: f32,
    decay_remaining: Option<f32>,
    regen_accumulator: f32,
    pending_pushback: bool,
}

impl AggressionStateMachine {
    pub fn new(settings: AggressionSettings) -> Self {
        Self {
            settings,
            state: State::Calm,
            consecutive_hits: 0,
            last_damage_received_at: None,
            last_damage_inflicted_at: 0.0,
            decay_remaining: None,
            regen_accumulator: 0.0,
            pending_pushback: false,
        }
    }

    /// Входящий урон (в момент доставки события)
    pub fn on_damage_received(&mut self, now: f32, target_detected: bool, stunned: bool) -> DamageResponse {
        self.last_damage_received_at = Some(now);

        match self.state {
            State::Calm => {
                if stunned {
                    return DamageResponse::Absorbed;
                }
                self.state = State::Transitioning { elapsed: 0.0 };
                crate::log_info("😱 Aggression: Calm → Transitioning");
                DamageResponse::TransitionStarted
            }
            // Повторный урон во время крика второй переход не запускает
            State::Transitioning { .. } => DamageResponse::Absorbed,
            State::Fury { level } => {
                self.rearm_decay(now, target_detected);
                if stunned {
                    return DamageResponse::Absorbed;
                }

                self.consecutive_hits = self.consecutive_hits.saturating_add(1);
                let level = if level < self.settings.max_fury_level {
                    level + 1
                } else {
                    level
                };
                self.state = State::Fury { level };

                let pushback = self.consecutive_hits >= self.settings.pushback_hit_threshold;
                if pushback {
                    self.consecutive_hits = 0;
                    self.pending_pushback = true;
                }

                crate::log(&format!(
                    "🔥 Aggression: hit in Fury → level {} (push-back: {})",
                    level, pushback
                ));
                DamageResponse::Escalated { level, pushback }
            }
        }
    }

    /// Исходящий урон (агент попал по цели)
    pub fn on_damage_inflicted(&mut self, now: f32, target_detected: bool) {
        self.last_damage_inflicted_at = now;
        if self.in_fury() {
            self.rearm_decay(now, target_detected);
        }
    }

    /// Перевзвести decay.
    ///
    /// Окно расширяется до `no_damage_decay_time`, если цель обнаружена и с
    /// последнего *исходящего* урона прошло меньше `no_damage_decay_time`.
    pub fn rearm_decay(&mut self, now: f32, target_detected: bool) {
        let since_inflicted = now - self.last_damage_inflicted_at;
        let window = if target_detected && since_inflicted < self.settings.no_damage_decay_time {
            self.settings.no_damage_decay_time
        } else {
            self.settings.decay_time
        };
        self.decay_remaining = Some(window);
    }

    pub fn tick(&mut self, dt: f32, now: f32, target_detected: bool) -> AggressionTick {
        let mut result = AggressionTick::default();

        match self.state {
            State::Calm => {}
            State::Transitioning { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.settings.transition_duration {
                    self.state = State::Fury { level: 1 };
                    self.consecutive_hits = 0;
                    self.regen_accumulator = 0.0;
                    self.rearm_decay(now, target_detected);
                    crate::log_info("🔥 Aggression: Transitioning → Fury(1)");
                    result.change = Some(AggressionChange::EnteredFury);
                } else {
                    self.state = State::Transitioning { elapsed };
                }
            }
            State::Fury { .. } => {
                let remaining = self.decay_remaining.unwrap_or(self.settings.decay_time) - dt;
                if remaining <= 0.0 {
                    self.calm_down();
                    crate::log_info("😌 Aggression: Fury → Calm (decay)");
                    result.change = Some(AggressionChange::Decayed);
                    return result;
                }
                self.decay_remaining = Some(remaining);

                self.regen_accumulator += dt;
                while self.regen_accumulator >= 1.0 {
                    self.regen_accumulator -= 1.0;
                    result.regen_pulses += 1;
                }
            }
        }

        result
    }

    /// Fury → Calm: сброс уровня, счётчика, таймеров
    fn calm_down(&mut self) {
        self.state = State::Calm;
        self.consecutive_hits = 0;
        self.decay_remaining = None;
        self.regen_accumulator = 0.0;
        self.pending_pushback = false;
    }

    /// Забрать флаг push-back (однократно)
    pub fn take_pending_pushback(&mut self) -> bool {
        std::mem::take(&mut self.pending_pushback)
    }

    /// Сколько длится крик (None — не в Transitioning)
    pub fn transition_elapsed(&self) -> Option<f32> {
        match self.state {
            State::Transitioning { elapsed } => Some(elapsed),
            _ => None,
        }
    }

    pub fn phase(&self) -> AggressionPhase {
        match self.state {
            State::Calm => AggressionPhase::Calm,
            State::Transitioning { .. } => AggressionPhase::Transitioning,
            State::Fury { level } => AggressionPhase::Fury { level },
        }
    }

    pub fn level(&self) -> u8 {
        match self.state {
            State::Fury { level } => level,
            _ => 0,
        }
    }

    pub fn in_fury(&self) -> bool {
        matches!(self.state, State::Fury { .. })
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, State::Transitioning { .. })
    }

    pub fn consecutive_hits(&self) -> u8 {
        self.consecutive_hits
    }

    pub fn decay_remaining(&self) -> Option<f32> {
        self.decay_remaining
    }

    pub fn last_damage_received_at(&self) -> Option<f32> {
        self.last_damage_received_at
    }

    pub fn last_damage_inflicted_at(&self) -> f32 {
        self.last_damage_inflicted_at
    }

    /// Множитель скорости относительно base_speed
    ///
    /// `fury_multiplier × (1 + level_bonus если level ≥ 2)`; в Calm/крике — 1.0
    pub fn speed_multiplier(&self) -> f32 {
        match self.state {
            State::Fury { level } => {
                let bonus = if level >= 2 {
                    1.0 + self.settings.fury_level_speed_bonus
                } else {
                    1.0
                };
                self.settings.fury_speed_multiplier * bonus
            }
            _ => 1.0,
        }
    }
}
