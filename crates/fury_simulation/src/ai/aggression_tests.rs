//! Tests for the aggression state machine.

#[cfg(test)]
mod tests {
    use super::super::aggression::*;
    use crate::config::AttackConfig;
    use proptest::prelude::*;

    fn settings() -> AggressionSettings {
        let config = AttackConfig {
            decay_time: 3.0,
            no_damage_decay_time: 5.0,
            transition_duration: 1.0,
            max_fury_level: 3,
            ..AttackConfig::default()
        };
        AggressionSettings::from(&config)
    }

    /// Довести автомат до Fury(1)
    fn enraged(now: f32) -> AggressionStateMachine {
        let mut fsm = AggressionStateMachine::new(settings());
        assert_eq!(fsm.on_damage_received(now, false, false), DamageResponse::TransitionStarted);
        let tick = fsm.tick(1.0, now + 1.0, false);
        assert_eq!(tick.change, Some(AggressionChange::EnteredFury));
        fsm
    }

    #[test]
    fn test_starts_calm() {
        let fsm = AggressionStateMachine::new(settings());
        assert_eq!(fsm.phase(), AggressionPhase::Calm);
        assert_eq!(fsm.level(), 0);
        assert_eq!(fsm.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_transition_blocks_until_duration() {
        let mut fsm = AggressionStateMachine::new(settings());
        fsm.on_damage_received(0.0, false, false);
        assert!(fsm.is_transitioning());

        assert_eq!(fsm.tick(0.5, 0.5, false).change, None);
        assert!(fsm.is_transitioning());
        assert_eq!(fsm.level(), 0);

        assert_eq!(fsm.tick(0.5, 1.0, false).change, Some(AggressionChange::EnteredFury));
        assert_eq!(fsm.phase(), AggressionPhase::Fury { level: 1 });
        assert_eq!(fsm.speed_multiplier(), settings().fury_speed_multiplier);
    }

    #[test]
    fn test_damage_during_transition_does_not_retrigger() {
        let mut fsm = AggressionStateMachine::new(settings());
        fsm.on_damage_received(0.0, false, false);
        fsm.tick(0.6, 0.6, false);

        assert_eq!(fsm.on_damage_received(0.6, false, false), DamageResponse::Absorbed);
        // Таймер крика не сбросился: 0.6 + 0.5 > 1.0
        assert_eq!(fsm.tick(0.5, 1.1, false).change, Some(AggressionChange::EnteredFury));
    }

    #[test]
    fn test_escalation_and_speed_bonus() {
        let mut fsm = enraged(0.0);
        let response = fsm.on_damage_received(1.5, false, false);
        assert_eq!(response, DamageResponse::Escalated { level: 2, pushback: false });

        let s = settings();
        let expected = s.fury_speed_multiplier * (1.0 + s.fury_level_speed_bonus);
        assert!((fsm.speed_multiplier() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_two_hits_trigger_pushback_and_reset() {
        let mut fsm = enraged(0.0);
        assert_eq!(
            fsm.on_damage_received(1.1, false, false),
            DamageResponse::Escalated { level: 2, pushback: false }
        );
        assert_eq!(fsm.consecutive_hits(), 1);

        assert_eq!(
            fsm.on_damage_received(1.2, false, false),
            DamageResponse::Escalated { level: 3, pushback: true }
        );
        assert_eq!(fsm.consecutive_hits(), 0);
        assert!(fsm.take_pending_pushback());
        assert!(!fsm.take_pending_pushback());

        // Третий удар начинает новую пару
        assert_eq!(
            fsm.on_damage_received(1.3, false, false),
            DamageResponse::Escalated { level: 3, pushback: false }
        );
        assert_eq!(fsm.consecutive_hits(), 1);
    }

    #[test]
    fn test_decay_returns_to_calm_without_damage() {
        // Цель не обнаружена → базовое окно 3с
        let mut fsm = enraged(0.0);
        assert_eq!(fsm.decay_remaining(), Some(3.0));

        let mut now = 1.0;
        for _ in 0..29 {
            now += 0.1;
            assert_eq!(fsm.tick(0.1, now, false).change, None);
        }
        assert!(fsm.in_fury());

        now += 0.2;
        assert_eq!(fsm.tick(0.2, now, false).change, Some(AggressionChange::Decayed));
        assert_eq!(fsm.phase(), AggressionPhase::Calm);
        assert_eq!(fsm.consecutive_hits(), 0);
        assert_eq!(fsm.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_inflicting_damage_keeps_fury_alive() {
        let mut fsm = enraged(0.0);
        let mut now = 1.0;
        fsm.on_damage_inflicted(now, true);
        assert_eq!(fsm.decay_remaining(), Some(5.0));

        // 60 секунд, попадание каждые 4.5с (< 5с расширенного окна)
        let mut since_hit = 0.0;
        for _ in 0..600 {
            now += 0.1;
            since_hit += 0.1;
            if since_hit >= 4.5 {
                fsm.on_damage_inflicted(now, true);
                since_hit = 0.0;
            }
            assert_eq!(fsm.tick(0.1, now, true).change, None);
        }
        assert!(fsm.in_fury());
        assert_eq!(fsm.decay_remaining().map(|d| d > 0.0), Some(true));
    }

    #[test]
    fn test_extended_window_requires_detection() {
        let mut fsm = enraged(0.0);
        fsm.on_damage_inflicted(10.0, true);
        assert_eq!(fsm.decay_remaining(), Some(5.0));

        fsm.rearm_decay(11.0, false);
        assert_eq!(fsm.decay_remaining(), Some(3.0));

        // Давно не попадал → базовое окно даже при обнаруженной цели
        fsm.rearm_decay(20.0, true);
        assert_eq!(fsm.decay_remaining(), Some(3.0));
    }

    #[test]
    fn test_regen_pulses_once_per_second() {
        let mut fsm = enraged(0.0);
        fsm.on_damage_inflicted(1.0, true); // окно 5с

        let mut pulses = 0;
        let mut now = 1.0;
        for _ in 0..25 {
            now += 0.1;
            pulses += fsm.tick(0.1, now, true).regen_pulses;
        }
        assert_eq!(pulses, 2);
    }

    #[test]
    fn test_stunned_damage_only_bookkeeping() {
        let mut fsm = AggressionStateMachine::new(settings());
        assert_eq!(fsm.on_damage_received(0.0, false, true), DamageResponse::Absorbed);
        assert_eq!(fsm.phase(), AggressionPhase::Calm);
        assert_eq!(fsm.last_damage_received_at(), Some(0.0));

        let mut fsm = enraged(0.0);
        assert_eq!(fsm.on_damage_received(2.0, false, true), DamageResponse::Absorbed);
        assert_eq!(fsm.level(), 1);
        assert_eq!(fsm.consecutive_hits(), 0);
    }

    proptest! {
        #[test]
        fn prop_level_stays_within_bounds(
            events in proptest::collection::vec((0u8..3, 0.0f32..2.0), 1..200)
        ) {
            let s = settings();
            let mut fsm = AggressionStateMachine::new(s);
            let mut now = 0.0;

            for (kind, dt) in events {
                now += dt;
                match kind {
                    0 => { fsm.on_damage_received(now, false, false); }
                    1 => { fsm.on_damage_inflicted(now, true); }
                    _ => { fsm.tick(dt, now, true); }
                }

                prop_assert!(fsm.level() <= s.max_fury_level);
                prop_assert_eq!(fsm.level() > 0, fsm.in_fury());
                prop_assert!(fsm.consecutive_hits() < s.pushback_hit_threshold);
            }
        }
    }
}
