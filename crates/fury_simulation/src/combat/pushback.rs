//! Push-back: после N подряд полученных ударов в Fury агент отбрасывает
//! всех целей вокруг себя.

use bevy::prelude::*;

use crate::ports::{lock_target, LayerMask, SpatialQuery};

/// Отбросить цели в радиусе от `center`.
///
/// Направление — от агента к цели по горизонтали; цель в той же точке
/// отбрасывается вдоль `facing`. Возвращает сколько целей реально
/// приняли knockback.
pub fn push_back(
    spatial: &dyn SpatialQuery,
    center: Vec3,
    facing: Vec3,
    radius: f32,
    layers: LayerMask,
    distance: f32,
) -> usize {
    let fallback = facing.with_y(0.0).try_normalize().unwrap_or(Vec3::Z);
    let mut pushed = 0;

    for target in spatial.query_in_radius(center, radius, layers) {
        let Some(mut guard) = lock_target(&target) else {
            continue;
        };
        if !guard.is_alive() {
            continue;
        }

        let direction = (guard.position() - center)
            .with_y(0.0)
            .try_normalize()
            .unwrap_or(fallback);

        if let Some(receiver) = guard.knockback_receiver() {
            receiver.apply_knockback(direction, distance);
            pushed += 1;
        }
    }

    pushed
}
