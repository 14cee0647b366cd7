//! EnemyAIPlugin — агенты как ECS компоненты
//!
//! Хост шлёт `EnemyHealthEvent` по Entity (один канал — порядок доставки
//! сохраняется), плагин отдаёт их агенту немедленно (`handle_event`),
//! тикает всех агентов фиксированным шагом и публикует `EnemyNotified`.
//!
//! Порядок выполнения (FixedUpdate, chain):
//! 1. deliver_enemy_events — входящие события → handle_event
//! 2. tick_enemy_agents — EnemyAgent::tick(fixed dt)
//! 3. sync_enemy_transforms — позиция/facing агента → Transform
//! 4. publish_enemy_notifications — буфер агента → EnemyNotified
//! 5. despawn_finished_enemies — тело отлежало → despawn

use bevy::prelude::*;
use rand::Rng;

use super::agent::EnemyAgent;
use super::events::{AgentEvent, AgentNotification};
use crate::config::AttackConfig;
use crate::error::ConfigError;
use crate::ports::AgentPorts;
use crate::DeterministicRng;

/// Враг в мире
#[derive(Component, Debug)]
pub struct Enemy {
    pub agent: EnemyAgent,
}

// ============================================================================
// Events
// ============================================================================

/// Событие здоровья врага (урон / стан / смерть)
///
/// Урон, стан и смерть идут одним типом: агент получает их ровно в том
/// порядке, в котором хост их отправил.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EnemyHealthEvent {
    pub entity: Entity,
    pub event: AgentEvent,
}

impl EnemyHealthEvent {
    pub fn damaged(entity: Entity, amount: f32) -> Self {
        Self {
            entity,
            event: AgentEvent::Damaged { amount },
        }
    }

    pub fn stunned(entity: Entity, duration: f32) -> Self {
        Self {
            entity,
            event: AgentEvent::Stunned { duration },
        }
    }

    pub fn died(entity: Entity) -> Self {
        Self {
            entity,
            event: AgentEvent::Death,
        }
    }
}

/// Исходящее уведомление агента (UI, звук, аналитика)
#[derive(Event, Debug, Clone)]
pub struct EnemyNotified {
    pub entity: Entity,
    pub notification: AgentNotification,
}

// ============================================================================
// Plugin
// ============================================================================

pub struct EnemyAIPlugin;

impl Plugin for EnemyAIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EnemyHealthEvent>().add_event::<EnemyNotified>();

        app.add_systems(
            FixedUpdate,
            (
                deliver_enemy_events,
                tick_enemy_agents,
                sync_enemy_transforms,
                publish_enemy_notifications,
                despawn_finished_enemies,
            )
                .chain(), // Последовательное выполнение для детерминизма
        );
    }
}

/// Заспавнить врага. Seed агента берётся из общего детерминистичного RNG.
pub fn spawn_enemy(
    commands: &mut Commands,
    rng: &mut DeterministicRng,
    config: AttackConfig,
    ports: AgentPorts,
    position: Vec3,
    facing: Vec3,
) -> Result<Entity, ConfigError> {
    let seed: u64 = rng.rng.gen();
    let agent = EnemyAgent::new(config, ports, position, facing, seed)?;

    let entity = commands
        .spawn((
            Enemy { agent },
            Transform::from_translation(position).looking_to(facing_or_forward(facing), Vec3::Y),
        ))
        .id();

    Ok(entity)
}

// ============================================================================
// Systems
// ============================================================================

/// Входящие события → агенту немедленно, в порядке отправки хостом
pub fn deliver_enemy_events(mut health_events: EventReader<EnemyHealthEvent>, mut enemies: Query<&mut Enemy>) {
    for health_event in health_events.read() {
        if let Ok(mut enemy) = enemies.get_mut(health_event.entity) {
            enemy.agent.handle_event(health_event.event);
        }
    }
}

pub fn tick_enemy_agents(mut enemies: Query<&mut Enemy>, time: Res<Time<Fixed>>) {
    let dt = time.delta_secs();
    for mut enemy in enemies.iter_mut() {
        enemy.agent.tick(dt);
    }
}

pub fn sync_enemy_transforms(mut enemies: Query<(&Enemy, &mut Transform)>) {
    for (enemy, mut transform) in enemies.iter_mut() {
        let position = enemy.agent.position();
        *transform = Transform::from_translation(position)
            .looking_to(facing_or_forward(enemy.agent.facing()), Vec3::Y);
    }
}

pub fn publish_enemy_notifications(
    mut enemies: Query<(Entity, &mut Enemy)>,
    mut notified: EventWriter<EnemyNotified>,
) {
    for (entity, mut enemy) in enemies.iter_mut() {
        for notification in enemy.agent.drain_notifications() {
            notified.write(EnemyNotified {
                entity,
                notification,
            });
        }
    }
}

pub fn despawn_finished_enemies(mut commands: Commands, enemies: Query<(Entity, &Enemy)>) {
    for (entity, enemy) in enemies.iter() {
        if enemy.agent.should_despawn() {
            commands.entity(entity).despawn();
            crate::log(&format!("🗑️ Despawned enemy {:?}", entity));
        }
    }
}

fn facing_or_forward(facing: Vec3) -> Vec3 {
    facing.with_y(0.0).try_normalize().unwrap_or(Vec3::Z)
}
