//! NavigatorFacade — тонкая обёртка над `Navigator` портом
//!
//! Хранит текущую destination и флаг attached. Все сбои порта
//! превращаются в `false`/`None`, паники нет.

use bevy::prelude::*;

use crate::ports::Navigator;

/// Минимальный сдвиг цели, после которого chase переиздаёт destination
const CHASE_REPATH_EPSILON: f32 = 0.25;

pub struct NavigatorFacade {
    navigator: Box<dyn Navigator>,
    destination: Option<Vec3>,
    attached: bool,
}

impl NavigatorFacade {
    pub fn new(navigator: Box<dyn Navigator>) -> Self {
        Self {
            navigator,
            destination: None,
            attached: true,
        }
    }

    /// Путь к точке. false — navmesh отказал, destination сброшена.
    pub fn go_to(&mut self, point: Vec3) -> bool {
        if !self.attached {
            return false;
        }

        if self.navigator.set_destination(point) {
            self.destination = Some(point);
            true
        } else {
            self.destination = None;
            false
        }
    }

    /// Преследование: путь переиздаётся только если цель заметно сместилась.
    /// Если путь не строится — прямое руление к цели.
    pub fn chase(&mut self, target: Vec3) {
        if !self.attached {
            return;
        }

        let needs_repath = match self.destination {
            Some(current) => current.distance(target) > CHASE_REPATH_EPSILON || !self.navigator.has_path(),
            None => true,
        };

        if needs_repath && !self.go_to(target) {
            self.navigator.move_towards(target);
            self.destination = Some(target);
        }
    }

    /// Продвинуть агента на `speed × dt` вдоль пути
    pub fn step(&mut self, position: Vec3, speed: f32, dt: f32) -> Vec3 {
        if !self.attached || self.destination.is_none() {
            return position;
        }
        self.navigator.advance(position, speed, dt)
    }

    pub fn arrived(&self, position: Vec3, tolerance: f32) -> bool {
        match self.destination {
            Some(destination) => horizontal_distance(position, destination) <= tolerance,
            None => false,
        }
    }

    pub fn has_path(&self) -> bool {
        self.attached && self.destination.is_some() && self.navigator.has_path()
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn is_stuck(&self) -> bool {
        self.attached && self.navigator.is_stuck_or_blocked()
    }

    pub fn sample_point(&self, near: Vec3, radius: f32) -> Option<Vec3> {
        self.navigator.sample_point(near, radius)
    }

    pub fn path_length(&self, from: Vec3, to: Vec3) -> Option<f32> {
        self.navigator.path_length(from, to)
    }

    /// Остановиться (сбросить путь, остаться attached)
    pub fn stop(&mut self) {
        self.navigator.clear_path();
        self.destination = None;
    }

    /// Отключить управление (прыжок / смерть)
    pub fn detach(&mut self) {
        self.stop();
        self.navigator.set_enabled(false);
        self.attached = false;
    }

    pub fn attach(&mut self) {
        self.navigator.set_enabled(true);
        self.attached = true;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn warp(&mut self, point: Vec3) {
        self.navigator.warp(point);
    }
}

/// Дистанция в плоскости XZ (высота не важна для навигации)
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}
