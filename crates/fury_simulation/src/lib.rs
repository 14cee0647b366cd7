//! FURY Simulation Core
//!
//! Адаптивный враг ближнего боя: патруль → обнаружение → бой,
//! эскалация ярости от полученного урона, прыжок, отбрасывание, decay.
//!
//! Архитектура:
//! - Ядро (ai, combat, movement) = правила и состояние, тикается явно
//! - Хост (движок / headless) = navmesh, физика, здоровье, анимации через порты
//! - Bevy = опциональный ECS-слой (`EnemyAIPlugin`) с фиксированным шагом

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod config;
pub mod error;
pub mod headless;
pub mod logger;
pub mod movement;
pub mod ports;

// Re-export базовых типов для удобства
pub use ai::{
    AgentEvent, AgentNotification, AggressionPhase, EnemyAIPlugin, EnemyAgent, EventInbox, PerceptionSensor,
};
pub use combat::{AttackKind, CombatController, LeapCancel};
pub use config::{AttackConfig, EnemyProfile};
pub use error::ConfigError;
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use movement::NavigatorFacade;
pub use ports::{
    AgentPorts, DamageTarget, HealthSink, LayerMask, Navigator, Presentation, SharedTarget, SpatialQuery, TargetRef,
};

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed из create_headless_app не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .add_plugins(EnemyAIPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Из него выдаются seed'ы агентов — одинаковый seed мира даёт
/// одинаковое поведение всех врагов.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}
