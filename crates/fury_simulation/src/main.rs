//! Headless симуляция FURY
//!
//! Два врага (Laceratus, Kronus) и манекен-игрок на плоской арене.
//! Игрок бьёт ближайшего врага каждые 2 секунды. 1000 тиков по 1/60с.

use std::time::Duration;

use bevy::prelude::*;
use fury_simulation::ai::plugin::publish_enemy_notifications;
use fury_simulation::ai::{spawn_enemy, Enemy, EnemyHealthEvent, EnemyNotified};
use fury_simulation::headless::{HealthLedger, HeadlessRig, TrainingDummy};
use fury_simulation::{create_headless_app, log_info, DeterministicRng, EnemyProfile, SimulationPlugin};

const TICKS: usize = 1000;
const PLAYER_HIT_INTERVAL: usize = 120;

fn log_notifications(mut notified: EventReader<EnemyNotified>) {
    for event in notified.read() {
        log_info(&format!("📣 {:?}: {:?}", event.entity, event.notification));
    }
}

fn main() {
    let seed = 42;
    println!("Starting FURY headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.add_systems(FixedUpdate, log_notifications.after(publish_enemy_notifications));

    let rig = HeadlessRig::new(25.0);
    let (player, player_target) = rig.spawn_player(
        TrainingDummy::new(Vec3::new(0.0, 0.0, 4.0))
            .with_block(0.25)
            .with_slow()
            .with_knockback(),
    );

    let mut enemies = Vec::new();
    for (profile, position) in [
        (EnemyProfile::Laceratus, Vec3::ZERO),
        (EnemyProfile::Kronus, Vec3::new(6.0, 0.0, 0.0)),
    ] {
        // Своё здоровье на каждого врага, арена и журнал общие
        let ports = HeadlessRig {
            health: HealthLedger::new(),
            ..rig.clone()
        }
        .ports();

        let world = app.world_mut();
        let spawned = world.resource_scope(|world, mut rng: Mut<DeterministicRng>| {
            let mut commands = world.commands();
            spawn_enemy(&mut commands, &mut rng, profile.config(), ports, position, Vec3::Z)
        });
        match spawned {
            Ok(entity) => enemies.push(entity),
            Err(error) => eprintln!("Failed to spawn {:?}: {}", profile, error),
        }
        world.flush();
    }

    // Цель агентам
    for &entity in &enemies {
        if let Some(mut enemy) = app.world_mut().get_mut::<Enemy>(entity) {
            enemy.agent.set_target(&player_target);
        }
    }

    for tick in 0..TICKS {
        if tick % PLAYER_HIT_INTERVAL == 0 {
            if let Some(&entity) = enemies.first() {
                app.world_mut().send_event(EnemyHealthEvent::damaged(entity, 8.0));
            }
        }

        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .advance_by(Duration::from_secs_f64(1.0 / 60.0));
        app.world_mut().run_schedule(FixedUpdate);

        if tick % 100 == 0 {
            let health = player.lock().map(|dummy| dummy.health).unwrap_or(0.0);
            println!(
                "Tick {}: {} entities, player health {:.1}",
                tick,
                app.world().entities().len(),
                health
            );
        }
    }

    println!("Simulation complete!");
}
