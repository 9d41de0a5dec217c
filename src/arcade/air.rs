//! Jump impulse and in-air attitude stabilizer.

use rapier3d::prelude::{Isometry, Real, Vector};

use super::config::VehicleConfig;
use super::host::chassis_axes;

/// Upward velocity change times mass.
pub fn jump_impulse(cfg: &VehicleConfig) -> Real {
    cfg.jump_impulse * cfg.mass
}

/// Pitch (nose up positive) and roll (right side up positive), in degrees.
pub fn attitude_deg(pose: &Isometry<Real>) -> (Real, Real) {
    let (_, fwd, right) = chassis_axes(pose);
    let pitch = fwd.y.clamp(-1.0, 1.0).asin().to_degrees();
    let roll = right.y.clamp(-1.0, 1.0).asin().to_degrees();
    (pitch, roll)
}

/// World angular acceleration (rad/s²) pulling the chassis back to level.
/// Each axis: (angle * gain) - (angular velocity about that axis * damping).
pub fn stabilizing_acceleration(
    cfg: &VehicleConfig,
    pose: &Isometry<Real>,
    angvel: &Vector<Real>,
) -> Vector<Real> {
    let (_, fwd, right) = chassis_axes(pose);
    let (pitch, roll) = attitude_deg(pose);

    let pitch_rate = angvel.dot(&right).to_degrees();
    let roll_rate = angvel.dot(&fwd).to_degrees();

    // Positive rotation about right raises the nose, about forward lowers the right side.
    let about_right = -(cfg.turning_force * pitch.to_radians() * cfg.air_pitch_gain)
        - pitch_rate * cfg.air_angular_damping;
    let about_forward = (cfg.turning_force * roll.to_radians() * cfg.air_roll_gain)
        - roll_rate * cfg.air_angular_damping;

    (right * about_right + fwd * about_forward) * std::f32::consts::PI / 180.0
}
