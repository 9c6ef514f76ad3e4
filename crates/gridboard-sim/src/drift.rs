//! Telemetry drift, so simulated devices change between cycles

use gridboard_core::device::{BatteryTelemetry, DeviceKind, DeviceState, PistonStatus, PistonTelemetry, RotorTelemetry};
use std::f64::consts::TAU;
use std::time::Duration;

/// Advance one device's telemetry by `elapsed`
pub fn advance(state: &mut DeviceState, elapsed: Duration) {
    let dt = elapsed.as_secs_f64();
    match &mut state.kind {
        DeviceKind::Piston(piston) => advance_piston(piston, dt),
        DeviceKind::AdvancedRotor(rotor) => advance_rotor(rotor, dt),
        DeviceKind::Battery(battery) => advance_battery(battery, dt),
        _ => {}
    }
}

fn advance_piston(piston: &mut PistonTelemetry, dt: f64) {
    let speed = piston.velocity.abs();
    match piston.status {
        PistonStatus::Extending => {
            piston.position = (piston.position + speed * dt).min(piston.max_limit);
            if piston.position >= piston.max_limit {
                piston.status = PistonStatus::Extended;
            }
        }
        PistonStatus::Retracting => {
            piston.position = (piston.position - speed * dt).max(0.0);
            if piston.position <= 0.0 {
                piston.status = PistonStatus::Retracted;
            }
        }
        _ => {}
    }
}

fn advance_rotor(rotor: &mut RotorTelemetry, dt: f64) {
    let radians_per_sec = rotor.target_rpm * TAU / 60.0;
    rotor.angle = (rotor.angle + radians_per_sec * dt).rem_euclid(TAU);
}

fn advance_battery(battery: &mut BatteryTelemetry, dt: f64) {
    let hours = dt / 3600.0;
    if battery.is_charging {
        battery.stored = (battery.stored + battery.current_input * hours).min(battery.max_stored);
        if battery.stored >= battery.max_stored {
            battery.is_charging = false;
            battery.current_input = 0.0;
        }
    } else {
        battery.stored = (battery.stored - battery.current_output * hours).max(0.0);
        if battery.stored <= 0.0 {
            battery.current_output = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(kind: DeviceKind) -> DeviceState {
        DeviceState {
            kind,
            inventories: Vec::new(),
        }
    }

    #[test]
    fn test_piston_stops_at_limit() {
        let mut s = state(DeviceKind::Piston(PistonTelemetry {
            status: PistonStatus::Extending,
            position: 9.0,
            velocity: 0.5,
            max_limit: 10.0,
        }));
        advance(&mut s, Duration::from_secs(1));
        advance(&mut s, Duration::from_secs(4));
        match s.kind {
            DeviceKind::Piston(p) => {
                assert_eq!(p.position, 10.0);
                assert_eq!(p.status, PistonStatus::Extended);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_rotor_wraps_angle() {
        let mut s = state(DeviceKind::AdvancedRotor(RotorTelemetry {
            angle: 0.0,
            target_rpm: 1.0,
        }));
        advance(&mut s, Duration::from_secs(75));
        match s.kind {
            DeviceKind::AdvancedRotor(r) => assert!((r.angle - TAU / 4.0).abs() < 1e-9),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_battery_drains_to_empty() {
        let mut s = state(DeviceKind::Battery(BatteryTelemetry {
            current_output: 3.6,
            stored: 0.001,
            max_stored: 3.0,
            ..BatteryTelemetry::default()
        }));
        advance(&mut s, Duration::from_secs(10));
        match s.kind {
            DeviceKind::Battery(b) => {
                assert_eq!(b.stored, 0.0);
                assert_eq!(b.current_output, 0.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
