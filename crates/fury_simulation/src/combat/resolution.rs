//! Резолв попадания по одной цели
//!
//! Порядок: блок (если цель умеет) → урон остатком → замедление (если умеет).
//! Каждая capability пробуется, отсутствие — не ошибка.

use bevy::prelude::*;

use crate::ports::{lock_target, LayerMask, SharedTarget, SpatialQuery};

/// Замедление цели после удара
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlowEffect {
    /// Доля скорости (0.3 = -30%)
    pub percent: f32,
    pub duration: f32,
}

/// Параметры одного удара
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub damage: f32,
    pub slow: Option<SlowEffect>,
}

/// Результат резолва по одной цели
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub requested: f32,
    pub absorbed: f32,
    pub applied: f32,
    pub back_hit: bool,
    pub slowed: bool,
}

/// Сводка по area-удару
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrikeReport {
    pub outcomes: Vec<HitOutcome>,
}

impl StrikeReport {
    pub fn targets_hit(&self) -> usize {
        self.outcomes.len()
    }

    /// Суммарно применённый урон (после блока)
    pub fn damage_applied(&self) -> f32 {
        self.outcomes.iter().map(|o| o.applied).sum()
    }
}

/// Атакующий за спиной цели?
///
/// Back hit ⇔ forward цели смотрит от атакующего (dot < 0).
pub fn is_back_hit(attacker_position: Vec3, target_position: Vec3, target_forward: Vec3) -> bool {
    let to_attacker = (attacker_position - target_position).with_y(0.0).try_normalize();
    let forward = target_forward.with_y(0.0).try_normalize();

    match (to_attacker, forward) {
        (Some(to_attacker), Some(forward)) => forward.dot(to_attacker) < 0.0,
        _ => false,
    }
}

/// Ударить одну цель. None — цель мертва или lock отравлен.
pub fn resolve_strike(target: &SharedTarget, attacker_position: Vec3, strike: &Strike) -> Option<HitOutcome> {
    let mut guard = lock_target(target)?;
    if !guard.is_alive() {
        return None;
    }

    let back_hit = is_back_hit(attacker_position, guard.position(), guard.forward());

    let absorbed = match guard.blocker() {
        Some(blocker) => blocker.block(strike.damage, attacker_position).clamp(0.0, strike.damage),
        None => 0.0,
    };
    let remaining = (strike.damage - absorbed).max(0.0);

    // Полностью заблокированный удар не наносит урона и не замедляет
    let applied = if remaining > 0.0 {
        guard.take_damage(remaining, back_hit)
    } else {
        0.0
    };

    let mut slowed = false;
    if let (Some(slow), true) = (strike.slow, remaining > 0.0) {
        if let Some(modifiable) = guard.speed_modifiable() {
            modifiable.apply_move_speed_modifier(-slow.percent, slow.duration);
            slowed = true;
        }
    }

    Some(HitOutcome {
        requested: strike.damage,
        absorbed,
        applied,
        back_hit,
        slowed,
    })
}

/// Sphere overlap в `origin` + резолв по каждой найденной цели
pub fn strike_area(
    spatial: &dyn SpatialQuery,
    origin: Vec3,
    radius: f32,
    layers: LayerMask,
    attacker_position: Vec3,
    strike: &Strike,
) -> StrikeReport {
    let outcomes = spatial
        .query_in_radius(origin, radius, layers)
        .iter()
        .filter_map(|target| resolve_strike(target, attacker_position, strike))
        .collect();

    StrikeReport { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{share, TrainingDummy};

    const STRIKE: Strike = Strike {
        damage: 10.0,
        slow: Some(SlowEffect {
            percent: 0.3,
            duration: 2.0,
        }),
    };

    #[test]
    fn test_back_hit_detection() {
        // Цель смотрит на +Z, атакующий сзади (-Z)
        assert!(is_back_hit(Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO, Vec3::Z));
        assert!(!is_back_hit(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Z));
    }

    #[test]
    fn test_plain_target_takes_full_damage() {
        let (dummy, target) = share(TrainingDummy::new(Vec3::ZERO));
        let outcome = resolve_strike(&target, Vec3::new(0.0, 0.0, 1.0), &STRIKE).unwrap();

        assert_eq!(outcome.applied, 10.0);
        assert!(!outcome.slowed);
        assert_eq!(dummy.lock().unwrap().health, 90.0);
    }

    #[test]
    fn test_block_reduces_damage() {
        let (dummy, target) = share(TrainingDummy::new(Vec3::ZERO).with_block(0.5));
        let outcome = resolve_strike(&target, Vec3::new(0.0, 0.0, 1.0), &STRIKE).unwrap();

        assert_eq!(outcome.absorbed, 5.0);
        assert_eq!(outcome.applied, 5.0);
        assert_eq!(dummy.lock().unwrap().hits.len(), 1);
    }

    #[test]
    fn test_full_block_skips_damage_and_slow() {
        let (dummy, target) = share(TrainingDummy::new(Vec3::ZERO).with_block(1.0).with_slow());
        let outcome = resolve_strike(&target, Vec3::new(0.0, 0.0, 1.0), &STRIKE).unwrap();

        assert_eq!(outcome.applied, 0.0);
        let dummy = dummy.lock().unwrap();
        assert!(dummy.hits.is_empty());
        assert!(dummy.slows.is_empty());
    }

    #[test]
    fn test_slow_applied_when_supported() {
        let (dummy, target) = share(TrainingDummy::new(Vec3::ZERO).with_slow());
        let outcome = resolve_strike(&target, Vec3::new(0.0, 0.0, -1.0), &STRIKE).unwrap();

        assert!(outcome.slowed);
        assert!(outcome.back_hit);
        assert_eq!(dummy.lock().unwrap().slows, vec![(-0.3, 2.0)]);
    }

    #[test]
    fn test_dead_target_is_skipped() {
        let mut dummy = TrainingDummy::new(Vec3::ZERO);
        dummy.health = 0.0;
        let (_dummy, target) = share(dummy);
        assert!(resolve_strike(&target, Vec3::ZERO, &STRIKE).is_none());
    }
}
