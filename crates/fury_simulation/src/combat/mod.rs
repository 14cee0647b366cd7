//! Combat module
//!
//! Ответственность:
//! - Melee: замах → area query в hit origin → резолв (блок, урон, замедление)
//! - Leap: прыжок к цели в Fury (дуга, приземление, опциональный удар)
//! - Push-back: отбрасывание целей после серии полученных ударов
//!
//! Физика/коллизии не здесь — цели приходят из `SpatialQuery` порта.

pub mod controller;
pub mod leap;
pub mod melee;
pub mod phase;
pub mod pushback;
pub mod resolution;

// Re-export основных типов
pub use controller::{CombatContext, CombatController, CombatReport, CombatTimers};
pub use leap::{LeapAttack, LeapCancel, LeapProgress, LeapSettings};
pub use melee::{AttackKind, AttackProfile, MeleeSwing, SwingStep};
pub use phase::{Phase, PhaseDurations, PhaseStep};
pub use pushback::push_back;
pub use resolution::{is_back_hit, resolve_strike, strike_area, HitOutcome, SlowEffect, Strike, StrikeReport};
