//! PerceptionSensor — конус + радиус
//!
//! Обнаружение односторонне: однажды заметив цель, агент больше не
//! возвращается в "не в курсе" (sticky latch).

use bevy::prelude::*;

#[derive(Debug, Clone)]
pub struct PerceptionSensor {
    vision_range: f32,
    /// Половина угла конуса (радианы)
    cone_half_angle: f32,
    target_detected: bool,
}

impl PerceptionSensor {
    pub fn new(vision_range: f32, cone_half_angle: f32) -> Self {
        Self {
            vision_range,
            cone_half_angle,
            target_detected: false,
        }
    }

    /// Видна ли цель. true защёлкивает `target_detected` навсегда.
    pub fn sense(&mut self, self_pos: Vec3, self_forward: Vec3, target_pos: Vec3) -> bool {
        let visible = self.is_visible(self_pos, self_forward, target_pos);
        if visible && !self.target_detected {
            self.target_detected = true;
            crate::log_info(&format!(
                "👁️ Target detected at {:.1}m",
                self_pos.distance(target_pos)
            ));
        }
        visible
    }

    /// Геометрический тест без побочных эффектов
    pub fn is_visible(&self, self_pos: Vec3, self_forward: Vec3, target_pos: Vec3) -> bool {
        let to_target = target_pos - self_pos;
        let distance = to_target.length();
        if distance > self.vision_range {
            return false;
        }

        // Цель "внутри" агента — направление не определено, считаем видимой
        let Some(direction) = to_target.try_normalize() else {
            return true;
        };
        let Some(forward) = self_forward.try_normalize() else {
            return false;
        };

        forward.angle_between(direction) <= self.cone_half_angle
    }

    pub fn target_detected(&self) -> bool {
        self.target_detected
    }
}
