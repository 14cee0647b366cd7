//! Melee swing: windup → hit resolution → recovery.
//!
//! # Swing Flow
//!
//! ```text
//! CombatController: target in range && cooldown ready
//!   ↓
//! MeleeSwing::start (phase = Windup)      — агент стоит, смотрит на цель
//!   ↓ attack_hit_delay
//! SwingStep::Strike                       — area query в hit origin, резолв
//!   ↓
//! Cooldown (attack_recovery)
//!   ↓
//! SwingStep::Finished → Idle
//! ```
//!
//! Замах можно отменить (push-back, крик, смерть) — удар тогда не резолвится.

use bevy::prelude::*;

use super::phase::{Phase, PhaseDurations, PhaseStep};
use super::resolution::{SlowEffect, Strike};
use crate::config::AttackConfig;

// ============================================================================
// Attack kinds
// ============================================================================

/// Вид атаки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackKind {
    /// Calm: меньше урон, накладывает замедление
    Normal,
    /// Fury: больше урон и радиус, короче cooldown
    Fury,
    /// Удар при приземлении после прыжка
    Landing,
}

/// Табличные параметры атаки (выжимка из AttackConfig)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub range: f32,
    pub damage: f32,
    pub cooldown: f32,
    pub slow: Option<SlowEffect>,
}

impl AttackProfile {
    pub fn for_kind(kind: AttackKind, config: &AttackConfig) -> Self {
        match kind {
            AttackKind::Normal => Self {
                range: config.normal_attack_range,
                damage: config.normal_attack_damage,
                cooldown: config.normal_attack_cooldown,
                slow: Some(SlowEffect {
                    percent: config.normal_attack_slow_percent,
                    duration: config.normal_attack_slow_duration,
                }),
            },
            AttackKind::Fury => Self {
                range: config.fury_attack_range,
                damage: config.fury_attack_damage,
                cooldown: config.fury_attack_cooldown,
                slow: None,
            },
            AttackKind::Landing => Self {
                range: config.fury_attack_range,
                damage: config.jump_landing_damage,
                cooldown: 0.0,
                slow: None,
            },
        }
    }

    pub fn strike(&self) -> Strike {
        Strike {
            damage: self.damage,
            slow: self.slow,
        }
    }
}

// ============================================================================
// Swing
// ============================================================================

/// Что замах сделал за тик
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingStep {
    Windup,
    /// Момент удара — резолвить попадание сейчас
    Strike,
    Recovery,
    Finished,
}

/// Замах в процессе
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeSwing {
    pub kind: AttackKind,
    phase: Phase,
    durations: PhaseDurations,
}

impl MeleeSwing {
    pub fn start(kind: AttackKind, hit_delay: f32, recovery: f32) -> Self {
        Self {
            kind,
            phase: Phase::Windup(0.0),
            durations: PhaseDurations {
                windup: hit_delay,
                active: None,
                cooldown: recovery,
            },
        }
    }

    pub fn advance(&mut self, dt: f32) -> SwingStep {
        match self.phase.advance(dt, self.durations) {
            PhaseStep::WindupFinished => SwingStep::Strike,
            PhaseStep::Finished | PhaseStep::Idle => SwingStep::Finished,
            PhaseStep::Continue | PhaseStep::ActiveFinished => {
                if self.phase.is_windup() {
                    SwingStep::Windup
                } else {
                    SwingStep::Recovery
                }
            }
        }
    }

    /// Удар ещё не нанесён
    pub fn in_windup(&self) -> bool {
        self.phase.is_windup()
    }
}

/// Точка, вокруг которой ищем цели: перед агентом на `offset`
pub fn hit_origin(position: Vec3, facing: Vec3, offset: f32) -> Vec3 {
    position + facing.with_y(0.0).normalize_or_zero() * offset
}
