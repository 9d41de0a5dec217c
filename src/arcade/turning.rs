//! Turning envelope (max yaw rate by speed) and steering torque.

use rapier3d::prelude::Real;

use super::config::VehicleConfig;

/// Max yaw rate in deg/s, lerped from the min-speed to the full-speed envelope.
pub fn envelope(cfg: &VehicleConfig, speed_kmh: Real, drifting: bool) -> Real {
    let ratio = (speed_kmh.abs() / cfg.max_speed).clamp(0.0, 1.0);
    let rate = (1.0 - ratio) * cfg.max_turning_rate_min_speed
        + ratio * cfg.max_turning_rate_full_speed;
    if drifting { rate + cfg.drift_turning_boost } else { rate }
}

/// Steering angular acceleration (deg/s², positive turns right) or `None`
/// when no torque should be applied this step.
pub fn steering_acceleration(
    cfg: &VehicleConfig,
    speed_kmh: Real,
    reversing: bool,
    turn_scale: Real,
    yaw_rate_deg: Real,
    max_turning_rate: Real,
) -> Option<Real> {
    // Almost stopped: no spinning in place.
    if speed_kmh.abs() < cfg.turning_min_speed {
        return None;
    }
    let scale = turn_scale.clamp(-1.0, 1.0);
    if scale == 0.0 || yaw_rate_deg.abs() > max_turning_rate {
        return None;
    }
    let sign = if reversing { -1.0 } else { 1.0 };
    Some(cfg.turning_force * scale * sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_non_increasing_in_speed() {
        let cfg = VehicleConfig::arcade();
        let mut last = Real::INFINITY;
        for step in 0..=160 {
            let e = envelope(&cfg, step as Real, false);
            assert!(e <= last + 1e-4);
            assert!(e <= cfg.max_turning_rate_min_speed + 1e-4);
            assert!(e >= cfg.max_turning_rate_full_speed - 1e-4);
            last = e;
        }
        assert_eq!(envelope(&cfg, 0.0, false), cfg.max_turning_rate_min_speed);
        assert_eq!(envelope(&cfg, 500.0, false), cfg.max_turning_rate_full_speed);
    }

    #[test]
    fn drift_adds_boost() {
        let cfg = VehicleConfig::arcade();
        let d = envelope(&cfg, 100.0, true) - envelope(&cfg, 100.0, false);
        assert!((d - cfg.drift_turning_boost).abs() < 1e-4);
    }

    #[test]
    fn no_torque_below_min_speed() {
        let cfg = VehicleConfig::arcade();
        assert_eq!(steering_acceleration(&cfg, 4.9, false, 1.0, 0.0, 50.0), None);
        assert!(steering_acceleration(&cfg, 5.0, false, 1.0, 0.0, 50.0).is_some());
    }

    #[test]
    fn no_torque_above_envelope() {
        let cfg = VehicleConfig::arcade();
        assert_eq!(steering_acceleration(&cfg, 50.0, false, 1.0, 60.0, 45.0), None);
    }

    #[test]
    fn reversing_flips_and_input_is_clamped() {
        let cfg = VehicleConfig::arcade();
        let fwd = steering_acceleration(&cfg, 30.0, false, 3.0, 0.0, 45.0);
        let rev = steering_acceleration(&cfg, -30.0, true, 3.0, 0.0, 45.0);
        assert_eq!(fwd, Some(cfg.turning_force));
        assert_eq!(rev, Some(-cfg.turning_force));
    }
}
