//! AI decision-making module
//!
//! Один враг = `EnemyAgent`: perception → patrol / combat, поверх
//! AggressionStateMachine (Calm → крик → Fury(level) → decay → Calm).
//! Движок подключается через порты (`crate::ports`).

pub mod aggression;
pub mod agent;
pub mod events;
pub mod patrol;
pub mod perception;
pub mod plugin;

#[cfg(test)]
mod aggression_tests;

// Re-export основных типов
pub use aggression::{AggressionPhase, AggressionSettings, AggressionStateMachine, DamageResponse};
pub use agent::{AgentActivity, EnemyAgent};
pub use events::{AgentEvent, AgentNotification, EventInbox, NotificationBuffer};
pub use patrol::{HeadingChange, PatrolController, PatrolSettings, PatrolState};
pub use perception::PerceptionSensor;
pub use plugin::{spawn_enemy, Enemy, EnemyAIPlugin, EnemyHealthEvent, EnemyNotified};
