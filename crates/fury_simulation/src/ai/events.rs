//! EventBridge — входящие события здоровья и исходящие уведомления агента
//!
//! Входящие (`AgentEvent`) хост кладёт в `EventInbox` (можно из другого потока);
//! агент выгребает inbox в начале каждого тика. Хост, который доставляет события
//! синхронно, может звать `EnemyAgent::handle_event` напрямую — тогда переход
//! применяется в момент доставки.
//!
//! Исходящие (`AgentNotification`) буферизуются и забираются хостом через
//! `EnemyAgent::drain_notifications` (Bevy плагин делает это каждый тик).
//! Буфер ограничен `MAX_PENDING_NOTIFICATIONS`: хост, который не забирает
//! уведомления, теряет самые старые.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ai::aggression::AggressionPhase;
use crate::combat::melee::AttackKind;
use crate::combat::leap::LeapCancel;

/// Событие от health-коллаборатора агента
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentEvent {
    Damaged { amount: f32 },
    Death,
    Stunned { duration: f32 },
}

/// Уведомление наружу (UI, звук, аналитика)
#[derive(Debug, Clone, PartialEq)]
pub enum AgentNotification {
    AggressionChanged {
        from: AggressionPhase,
        to: AggressionPhase,
    },
    AttackPerformed {
        kind: AttackKind,
        targets_hit: usize,
        damage_applied: f32,
    },
    PushBack {
        targets_pushed: usize,
    },
    LeapStarted {
        distance: f32,
    },
    LeapLanded,
    LeapCancelled {
        reason: LeapCancel,
    },
    Died,
}

/// Потокобезопасная очередь входящих событий
///
/// Clone даёт handle на ту же очередь.
#[derive(Debug, Clone, Default)]
pub struct EventInbox {
    queue: Arc<Mutex<VecDeque<AgentEvent>>>,
}

impl EventInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Положить событие; при отравленном mutex событие теряется
    pub fn push(&self, event: AgentEvent) {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back(event),
            Err(_) => crate::logger::log_error(&format!(
                "EventInbox poisoned, dropping {:?}",
                event
            )),
        }
    }

    /// Забрать все события в порядке поступления
    pub fn drain(&self) -> Vec<AgentEvent> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

}

/// Сколько уведомлений держим до drain
pub const MAX_PENDING_NOTIFICATIONS: usize = 256;

/// Исходящий буфер уведомлений (кольцевой, старые вытесняются)
#[derive(Debug, Default)]
pub struct NotificationBuffer {
    pending: VecDeque<AgentNotification>,
    dropped: usize,
}

impl NotificationBuffer {
    pub fn emit(&mut self, notification: AgentNotification) {
        if self.pending.len() >= MAX_PENDING_NOTIFICATIONS {
            self.pending.pop_front();
            if self.dropped == 0 {
                crate::logger::log_warning("NotificationBuffer full, dropping oldest notifications");
            }
            self.dropped += 1;
        }
        self.pending.push_back(notification);
    }

    pub fn drain(&mut self) -> Vec<AgentNotification> {
        self.dropped = 0;
        self.pending.drain(..).collect()
    }

    /// Сколько уведомлений вытеснено с прошлого drain
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
