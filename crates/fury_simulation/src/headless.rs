//! Headless порты — реализации без движка
//!
//! Используются demo-бинарником и тестами: плоская арена вместо navmesh,
//! список сущностей вместо физики, журнал вместо анимаций.
//!
//! Все "наблюдаемые" порты (`EntitySet`, `HealthLedger`,
//! `RecordingPresentation`) — это handle поверх `Arc<Mutex<..>>`: clone
//! отдаётся агенту, оригинал остаётся у хоста для проверок.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::ai::events::{AgentEvent, EventInbox};
use crate::movement::navigator::horizontal_distance;
use crate::ports::{
    lock_target, AgentPorts, Blocker, DamageTarget, EffectKind, HealthSink, KnockbackReceiver, LayerMask,
    MoveSpeedModifiable, Navigator, Presentation, SharedTarget, SpatialQuery,
};

// ============================================================================
// Navigator
// ============================================================================

/// Плоская квадратная арена `[-half_extent, half_extent]²` на y = 0
///
/// Путь по прямой, длина пути = прямая × `detour_factor`.
#[derive(Debug, Clone)]
pub struct FlatNavigator {
    half_extent: f32,
    detour_factor: f32,
    blocked: bool,
    failing_samples: bool,
    destination: Option<Vec3>,
    enabled: bool,
}

impl FlatNavigator {
    pub fn new(half_extent: f32) -> Self {
        Self {
            half_extent,
            detour_factor: 1.0,
            blocked: false,
            failing_samples: false,
            destination: None,
            enabled: true,
        }
    }

    /// Все пути длиннее прямой в `factor` раз (стены, лабиринт)
    pub fn with_detour(mut self, factor: f32) -> Self {
        self.detour_factor = factor;
        self
    }

    /// Агент упёрся: не двигается, `is_stuck_or_blocked` = true
    pub fn with_blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    /// navmesh не отдаёт ни одной точки
    pub fn with_failing_samples(mut self) -> Self {
        self.failing_samples = true;
        self
    }

    fn contains(&self, point: Vec3) -> bool {
        point.x.abs() <= self.half_extent && point.z.abs() <= self.half_extent
    }

    fn clamp(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(-self.half_extent, self.half_extent),
            0.0,
            point.z.clamp(-self.half_extent, self.half_extent),
        )
    }
}

impl Navigator for FlatNavigator {
    fn set_destination(&mut self, point: Vec3) -> bool {
        if !self.enabled || !self.contains(point) {
            return false;
        }
        self.destination = Some(point.with_y(0.0));
        true
    }

    fn move_towards(&mut self, point: Vec3) {
        if self.enabled {
            self.destination = Some(self.clamp(point));
        }
    }

    fn sample_point(&self, near: Vec3, radius: f32) -> Option<Vec3> {
        if self.failing_samples {
            return None;
        }
        let snapped = self.clamp(near);
        (horizontal_distance(snapped, near) <= radius).then_some(snapped)
    }

    fn path_length(&self, from: Vec3, to: Vec3) -> Option<f32> {
        if !self.contains(to) {
            return None;
        }
        Some(horizontal_distance(from, to) * self.detour_factor)
    }

    fn is_stuck_or_blocked(&self) -> bool {
        self.blocked
    }

    fn advance(&mut self, from: Vec3, speed: f32, dt: f32) -> Vec3 {
        let Some(destination) = self.destination else {
            return from;
        };
        if !self.enabled || self.blocked {
            return from;
        }

        let step = speed * dt;
        let to_destination = (destination - from).with_y(0.0);
        let distance = to_destination.length();
        if distance <= step {
            destination.with_y(from.y)
        } else {
            from + to_destination / distance * step
        }
    }

    fn clear_path(&mut self) {
        self.destination = None;
    }

    fn has_path(&self) -> bool {
        self.destination.is_some()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.destination = None;
        }
    }

    fn warp(&mut self, _point: Vec3) {
        // Позицию хранит агент, арене нечего переносить
        self.destination = None;
    }
}

// ============================================================================
// Spatial query
// ============================================================================

/// Список сущностей с их слоями (вместо физического overlap)
#[derive(Clone, Default)]
pub struct EntitySet {
    entries: Arc<Mutex<Vec<(LayerMask, SharedTarget)>>>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, layer: LayerMask, target: SharedTarget) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push((layer, target)),
            Err(_) => crate::log_error("EntitySet poisoned, entity not inserted"),
        }
    }

    /// Убрать сущность (по указателю)
    pub fn remove(&self, target: &SharedTarget) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|(_, existing)| !Arc::ptr_eq(existing, target));
        }
    }
}

impl SpatialQuery for EntitySet {
    fn query_in_radius(&self, center: Vec3, radius: f32, layers: LayerMask) -> Vec<SharedTarget> {
        let Ok(entries) = self.entries.lock() else {
            return Vec::new();
        };

        entries
            .iter()
            .filter(|(layer, _)| layer.intersects(layers))
            .filter(|(_, target)| {
                lock_target(target)
                    .map(|guard| guard.position().distance(center) <= radius)
                    .unwrap_or(false)
            })
            .map(|(_, target)| Arc::clone(target))
            .collect()
    }
}

// ============================================================================
// Damage target
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DummyHit {
    pub amount: f32,
    pub is_back_hit: bool,
}

/// Манекен для битья: записывает всё, что с ним сделали
///
/// Capabilities (блок, замедление, knockback) включаются явно.
#[derive(Debug, Clone)]
pub struct TrainingDummy {
    pub position: Vec3,
    pub forward: Vec3,
    pub health: f32,
    /// Доля поглощаемого блоком урона; None — блока нет
    pub block_fraction: Option<f32>,
    pub accepts_slow: bool,
    pub accepts_knockback: bool,
    pub hits: Vec<DummyHit>,
    pub blocked_total: f32,
    /// (delta, duration)
    pub slows: Vec<(f32, f32)>,
    /// (direction, distance)
    pub knockbacks: Vec<(Vec3, f32)>,
}

impl TrainingDummy {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::Z,
            health: 100.0,
            block_fraction: None,
            accepts_slow: false,
            accepts_knockback: false,
            hits: Vec::new(),
            blocked_total: 0.0,
            slows: Vec::new(),
            knockbacks: Vec::new(),
        }
    }

    pub fn with_block(mut self, fraction: f32) -> Self {
        self.block_fraction = Some(fraction.clamp(0.0, 1.0));
        self
    }

    pub fn with_slow(mut self) -> Self {
        self.accepts_slow = true;
        self
    }

    pub fn with_knockback(mut self) -> Self {
        self.accepts_knockback = true;
        self
    }

    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = forward;
        self
    }

    pub fn damage_taken(&self) -> f32 {
        self.hits.iter().map(|hit| hit.amount).sum()
    }
}

impl DamageTarget for TrainingDummy {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    fn take_damage(&mut self, amount: f32, is_back_hit: bool) -> f32 {
        let applied = amount.min(self.health).max(0.0);
        self.health -= applied;
        self.hits.push(DummyHit {
            amount: applied,
            is_back_hit,
        });
        applied
    }

    fn blocker(&mut self) -> Option<&mut dyn Blocker> {
        if self.block_fraction.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn speed_modifiable(&mut self) -> Option<&mut dyn MoveSpeedModifiable> {
        if self.accepts_slow {
            Some(self)
        } else {
            None
        }
    }

    fn knockback_receiver(&mut self) -> Option<&mut dyn KnockbackReceiver> {
        if self.accepts_knockback {
            Some(self)
        } else {
            None
        }
    }
}

impl Blocker for TrainingDummy {
    fn block(&mut self, amount: f32, _attacker_position: Vec3) -> f32 {
        let absorbed = amount * self.block_fraction.unwrap_or(0.0);
        self.blocked_total += absorbed;
        absorbed
    }
}

impl MoveSpeedModifiable for TrainingDummy {
    fn apply_move_speed_modifier(&mut self, delta: f32, duration: f32) {
        self.slows.push((delta, duration));
    }
}

impl KnockbackReceiver for TrainingDummy {
    fn apply_knockback(&mut self, direction: Vec3, distance: f32) {
        self.knockbacks.push((direction, distance));
        self.position += direction.normalize_or_zero() * distance;
    }
}

/// Обернуть манекен: (handle для проверок, цель для агента)
pub fn share(dummy: TrainingDummy) -> (Arc<Mutex<TrainingDummy>>, SharedTarget) {
    let handle = Arc::new(Mutex::new(dummy));
    let target: SharedTarget = handle.clone();
    (handle, target)
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug)]
struct LedgerState {
    healed: f32,
    heal_calls: u32,
    speed_multiplier: f32,
    inbox: Option<EventInbox>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            healed: 0.0,
            heal_calls: 0,
            speed_multiplier: 1.0,
            inbox: None,
        }
    }
}

/// Здоровье агента: хост "бьёт" агента через `damage`/`kill`/`stun`,
/// события уходят в inbox подписчика.
#[derive(Debug, Clone, Default)]
pub struct HealthLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl HealthLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Доставить событие подписчику. false — никто не подписан.
    pub fn emit(&self, event: AgentEvent) -> bool {
        let inbox = match self.state.lock() {
            Ok(state) => state.inbox.clone(),
            Err(_) => None,
        };
        match inbox {
            Some(inbox) => {
                inbox.push(event);
                true
            }
            None => false,
        }
    }

    pub fn damage(&self, amount: f32) -> bool {
        self.emit(AgentEvent::Damaged { amount })
    }

    pub fn kill(&self) -> bool {
        self.emit(AgentEvent::Death)
    }

    pub fn stun(&self, duration: f32) -> bool {
        self.emit(AgentEvent::Stunned { duration })
    }

    pub fn healed(&self) -> f32 {
        self.state.lock().map(|state| state.healed).unwrap_or(0.0)
    }

    pub fn heal_calls(&self) -> u32 {
        self.state.lock().map(|state| state.heal_calls).unwrap_or(0)
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.state.lock().map(|state| state.speed_multiplier).unwrap_or(1.0)
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().map(|state| state.inbox.is_some()).unwrap_or(false)
    }
}

impl HealthSink for HealthLedger {
    fn heal(&mut self, amount: f32) {
        if let Ok(mut state) = self.state.lock() {
            state.healed += amount;
            state.heal_calls += 1;
        }
    }

    fn set_speed_multiplier(&mut self, multiplier: f32) {
        if let Ok(mut state) = self.state.lock() {
            state.speed_multiplier = multiplier;
        }
    }

    fn subscribe(&mut self, inbox: EventInbox) {
        if let Ok(mut state) = self.state.lock() {
            state.inbox = Some(inbox);
        }
    }

    fn unsubscribe(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.inbox = None;
        }
    }
}

// ============================================================================
// Presentation
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCue {
    Animation(String),
    Sound(String),
    Effect(EffectKind),
}

/// Журнал всех презентационных вызовов
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    cues: Arc<Mutex<Vec<PresentationCue>>>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, cue: PresentationCue) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.push(cue);
        }
    }

    pub fn cues(&self) -> Vec<PresentationCue> {
        self.cues.lock().map(|cues| cues.clone()).unwrap_or_default()
    }

    pub fn effects(&self) -> Vec<EffectKind> {
        self.cues()
            .into_iter()
            .filter_map(|cue| match cue {
                PresentationCue::Effect(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    pub fn animations(&self) -> Vec<String> {
        self.cues()
            .into_iter()
            .filter_map(|cue| match cue {
                PresentationCue::Animation(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl Presentation for RecordingPresentation {
    fn play_animation(&mut self, name: &str) {
        self.record(PresentationCue::Animation(name.to_string()));
    }

    fn play_sound(&mut self, clip: &str) {
        self.record(PresentationCue::Sound(clip.to_string()));
    }

    fn spawn_effect(&mut self, kind: EffectKind, _position: Vec3, _facing: Vec3) {
        self.record(PresentationCue::Effect(kind));
    }
}

// ============================================================================
// Rig
// ============================================================================

/// Готовый набор headless портов + handles для наблюдения
#[derive(Clone)]
pub struct HeadlessRig {
    pub navigator: FlatNavigator,
    pub entities: EntitySet,
    pub health: HealthLedger,
    pub presentation: RecordingPresentation,
}

impl HeadlessRig {
    pub fn new(arena_half_extent: f32) -> Self {
        Self {
            navigator: FlatNavigator::new(arena_half_extent),
            entities: EntitySet::new(),
            health: HealthLedger::new(),
            presentation: RecordingPresentation::new(),
        }
    }

    pub fn with_navigator(mut self, navigator: FlatNavigator) -> Self {
        self.navigator = navigator;
        self
    }

    /// Порты для агента (shared handles клонируются)
    pub fn ports(&self) -> AgentPorts {
        AgentPorts {
            navigator: Box::new(self.navigator.clone()),
            spatial: Box::new(self.entities.clone()),
            health: Box::new(self.health.clone()),
            presentation: Box::new(self.presentation.clone()),
        }
    }

    /// Манекен-игрок: добавляется в spatial set, возвращается (handle, target)
    pub fn spawn_player(&self, dummy: TrainingDummy) -> (Arc<Mutex<TrainingDummy>>, SharedTarget) {
        let (handle, target) = share(dummy);
        self.entities.insert(LayerMask::PLAYER, Arc::clone(&target));
        (handle, target)
    }
}
