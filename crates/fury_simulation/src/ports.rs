//! Порты — интерфейсы, которые реализует хост (движок)
//!
//! Ядро не владеет навигацией, физикой, здоровьем и презентацией.
//! Всё, что может отсутствовать, пробуется (`Option`), а не предполагается.
//!
//! - `Navigator`: per-agent nav-handle поверх общего navmesh
//! - `SpatialQuery`: sphere overlap для melee/push-back
//! - `HealthSink`: здоровье самого агента + подписка на его события
//! - `DamageTarget`: цель (игрок) с опциональными capabilities
//! - `Presentation`: анимации/звук/VFX, fire-and-forget

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::events::EventInbox;

/// Битовая маска слоёв для spatial query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    /// Layer 1: игрок
    pub const PLAYER: LayerMask = LayerMask(0b1);
    /// Layer 2: союзники игрока (NPC-компаньоны)
    pub const ALLY: LayerMask = LayerMask(0b10);
    /// Layer 3: враги
    pub const ENEMY: LayerMask = LayerMask(0b100);
    /// Layer 4: окружение (стены, препятствия)
    pub const ENVIRONMENT: LayerMask = LayerMask(0b1000);

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        LayerMask(self.0 | rhs.0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::PLAYER
    }
}

/// Навигация агента (NavMeshAgent-подобный handle)
///
/// Любой метод может "не суметь" — ядро обязано это пережить.
pub trait Navigator: Send + Sync {
    /// Построить путь к точке. false — точка недостижима / агент не на navmesh.
    fn set_destination(&mut self, point: Vec3) -> bool;

    /// Прямое руление к точке без построения пути
    fn move_towards(&mut self, point: Vec3);

    /// Ближайшая точка navmesh в радиусе
    fn sample_point(&self, near: Vec3, radius: f32) -> Option<Vec3>;

    /// Длина пути по navmesh (None — пути нет)
    fn path_length(&self, from: Vec3, to: Vec3) -> Option<f32>;

    fn is_stuck_or_blocked(&self) -> bool;

    /// Продвинуть агента вдоль текущего пути на `speed × dt`, вернуть новую позицию
    fn advance(&mut self, from: Vec3, speed: f32, dt: f32) -> Vec3;

    fn clear_path(&mut self);

    fn has_path(&self) -> bool;

    /// Вкл/выкл управление движением (прыжок, смерть)
    fn set_enabled(&mut self, enabled: bool);

    /// Телепорт nav-handle в точку (после прыжка)
    fn warp(&mut self, point: Vec3);
}

/// Sphere overlap query (snapshot-consistent в пределах одного вызова)
pub trait SpatialQuery: Send + Sync {
    fn query_in_radius(&self, center: Vec3, radius: f32, layers: LayerMask) -> Vec<SharedTarget>;
}

/// Здоровье самого агента
///
/// Хост кладёт `AgentEvent` (Damaged/Death/Stunned) в inbox, полученный в `subscribe`.
pub trait HealthSink: Send + Sync {
    fn heal(&mut self, amount: f32);

    fn set_speed_multiplier(&mut self, multiplier: f32);

    fn subscribe(&mut self, inbox: EventInbox);

    fn unsubscribe(&mut self);
}

/// Цель атаки (игрок или союзник)
///
/// Опциональные capabilities пробуются через `blocker()` и т.п.;
/// по умолчанию их нет.
pub trait DamageTarget: Send {
    fn position(&self) -> Vec3;

    /// Куда смотрит цель (для удара в спину)
    fn forward(&self) -> Vec3 {
        Vec3::Z
    }

    fn is_alive(&self) -> bool {
        true
    }

    /// Применить урон, вернуть фактически применённый
    fn take_damage(&mut self, amount: f32, is_back_hit: bool) -> f32;

    fn blocker(&mut self) -> Option<&mut dyn Blocker> {
        None
    }

    fn speed_modifiable(&mut self) -> Option<&mut dyn MoveSpeedModifiable> {
        None
    }

    fn knockback_receiver(&mut self) -> Option<&mut dyn KnockbackReceiver> {
        None
    }
}

/// Блок: поглощает часть урона, возвращает поглощённое
pub trait Blocker {
    fn block(&mut self, amount: f32, attacker_position: Vec3) -> f32;
}

pub trait MoveSpeedModifiable {
    /// `delta` — относительное изменение скорости (-0.3 = замедление на 30%)
    fn apply_move_speed_modifier(&mut self, delta: f32, duration: f32);
}

pub trait KnockbackReceiver {
    fn apply_knockback(&mut self, direction: Vec3, distance: f32);
}

/// Fire-and-forget презентация (анимации, звук, VFX)
pub trait Presentation: Send + Sync {
    fn play_animation(&mut self, name: &str);

    fn play_sound(&mut self, clip: &str);

    fn spawn_effect(&mut self, kind: EffectKind, position: Vec3, facing: Vec3);
}

/// Какие эффекты спавнит ядро
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    FuryAura,
    Scream,
    MeleeImpact,
    LeapDust,
    DeathBurst,
}

/// Цель, разделяемая между хостом и ядром
pub type SharedTarget = Arc<Mutex<dyn DamageTarget>>;

/// Невладеющая ссылка на цель
///
/// Цель может быть уничтожена в любой момент — тогда `lock()` вернёт None.
#[derive(Clone, Default)]
pub struct TargetRef {
    inner: Option<Weak<Mutex<dyn DamageTarget>>>,
}

impl TargetRef {
    pub fn new(target: &SharedTarget) -> Self {
        Self {
            inner: Some(Arc::downgrade(target)),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn upgrade(&self) -> Option<SharedTarget> {
        self.inner.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_valid(&self) -> bool {
        self.upgrade().is_some()
    }

    /// Позиция живой цели; None если цель удалена, мертва или lock отравлен
    pub fn live_position(&self) -> Option<Vec3> {
        let target = self.upgrade()?;
        let guard = lock_target(&target)?;
        let alive = guard.is_alive();
        let position = guard.position();
        drop(guard);
        alive.then_some(position)
    }
}

impl std::fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRef")
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Poisoned lock = невалидная цель
pub fn lock_target(target: &SharedTarget) -> Option<MutexGuard<'_, dyn DamageTarget + 'static>> {
    target.lock().ok()
}

/// Все порты агента (dependency injection при конструировании)
pub struct AgentPorts {
    pub navigator: Box<dyn Navigator>,
    pub spatial: Box<dyn SpatialQuery>,
    pub health: Box<dyn HealthSink>,
    pub presentation: Box<dyn Presentation>,
}
