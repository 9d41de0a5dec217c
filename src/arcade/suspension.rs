// ==============================================================================
// suspension.rs — SPRING-DAMPER SUSPENSION + VISUAL OFFSETS
// ------------------------------------------------------------------------------
// F = -k (d - target) - c (v · n), applied along chassis up at the ray origin.
// k comes from the weight the suspension must carry, so raising the gravity
// scale stiffens the springs with it.
// ==============================================================================

use rapier3d::prelude::Real;

use super::config::VehicleConfig;
use super::types::WheelSample;

/// Spring rate from the magnitude of the applied gravity force.
pub fn spring_rate(cfg: &VehicleConfig, gravity_force: Real) -> Real {
    gravity_force.abs() / cfg.suspension_spring_divisor
}

/// Signed force magnitude along up. `relative_velocity` is v(origin) · normal.
pub fn wheel_force(cfg: &VehicleConfig, k: Real, distance: Real, relative_velocity: Real) -> Real {
    -(k * (distance - cfg.target_suspension_height)) - cfg.suspension_damping * relative_velocity
}

/// Animation-only compression, always inside [offset_min, offset_max].
pub fn visual_offset(cfg: &VehicleConfig, sample: &WheelSample) -> Real {
    let (lo, hi) = (cfg.suspension_offset_min, cfg.suspension_offset_max);
    if !sample.contact {
        return lo;
    }
    let offset = -(sample.distance - cfg.target_suspension_height);
    if offset.is_nan() { lo } else { offset.clamp(lo, hi) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::{Point, Vector};

    fn sample(contact: bool, distance: Real) -> WheelSample {
        WheelSample { contact, distance, ..WheelSample::airborne(Point::origin(), Vector::y(), 1.1) }
    }

    #[test]
    fn spring_pushes_up_when_compressed() {
        let cfg = VehicleConfig::arcade();
        let k = spring_rate(&cfg, 2943.0);
        assert!(wheel_force(&cfg, k, 0.6, 0.0) > 0.0);
        assert!(wheel_force(&cfg, k, 1.0, 0.0) < 0.0);
        assert_eq!(wheel_force(&cfg, k, cfg.target_suspension_height, 0.0), 0.0);
    }

    #[test]
    fn damper_opposes_approach_speed() {
        let cfg = VehicleConfig::arcade();
        let at_rest = wheel_force(&cfg, 1000.0, 0.8, 0.0);
        // moving along the normal (away from the ground) is damped downward
        assert!(wheel_force(&cfg, 1000.0, 0.8, 1.0) < at_rest);
        assert!(wheel_force(&cfg, 1000.0, 0.8, -1.0) > at_rest);
    }

    #[test]
    fn offsets_stay_in_bounds_for_any_distance() {
        let cfg = VehicleConfig::arcade();
        for d in [-100.0, -1.0, 0.0, 0.5, 0.78, 0.8, 0.85, 1.1, 50.0, Real::INFINITY, Real::NAN] {
            let o = visual_offset(&cfg, &sample(true, d));
            assert!(
                o >= cfg.suspension_offset_min && o <= cfg.suspension_offset_max,
                "distance {d} gave {o}"
            );
        }
    }

    #[test]
    fn no_contact_is_fully_extended() {
        let cfg = VehicleConfig::arcade();
        assert_eq!(visual_offset(&cfg, &sample(false, 0.1)), cfg.suspension_offset_min);
    }
}
