// ==============================================================================
// animator.rs — ANIMATION FEEDBACK
// ------------------------------------------------------------------------------
// Reads a FrameSnapshot after the tick and eases its own visual values:
// - wheel steering angle: linear ease toward turn_scale * max angle
// - wheel spin: integer degrees, wrapped, signed by travel direction
// - body tilt: A * e^(-c t) * sin(w t), re-armed on accelerate/brake press
// - body roll: lateral slip, clamped and scaled
// Nothing here feeds back into physics.
// ==============================================================================

use rapier3d::prelude::Real;
use serde::Serialize;

use super::config::{AnimatorConfig, VehicleConfig};
use super::timer::Timer;
use super::types::{DriftState, FrameSnapshot};

/// Tilt re-arms only once the previous wave is nearly flat.
const TILT_RESET_EPSILON: Real = 0.1;
const TILT_OSC_MIN: Real = 5.0;
const TILT_OSC_MAX: Real = 10.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnimationFeedback {
    pub wheel_rotation: i32,            // degrees, -359..=359
    pub wheel_direction: f32,           // degrees, positive right
    pub suspension_offsets: Vec<f32>,
    pub drift_direction: i8,
    pub tilt_angle: f32,                // degrees
    pub roll_angle: f32,                // degrees
}

#[derive(Debug, Clone)]
pub struct Animator {
    cfg: AnimatorConfig,
    max_speed: Real,
    wheel_radius_m: Real,

    // steering ease
    wheel_direction: Real,
    wheel_target: Real,
    wheel_previous: Real,
    wheel_change_duration: Real,
    wheel_timer: Timer,

    wheel_spin: Real,

    // tilt
    was_accelerating: bool,
    was_braking: bool,
    reset_tilt: bool,
    since_reset: Real,
    tilt_amplitude: Real,
    tilt_damping: Real,
    tilt_osc: Real,
    tilt_angle: Real,
}

impl Animator {
    pub fn new(cfg: AnimatorConfig, vehicle: &VehicleConfig) -> Self {
        Self {
            cfg,
            max_speed: vehicle.max_speed,
            // The suspension target height doubles as the wheel radius.
            wheel_radius_m: vehicle.target_suspension_height / vehicle.world_units_per_meter,
            wheel_direction: 0.0,
            wheel_target: 0.0,
            wheel_previous: 0.0,
            wheel_change_duration: 0.0,
            wheel_timer: Timer::STOPPED,
            wheel_spin: 0.0,
            was_accelerating: false,
            was_braking: false,
            reset_tilt: false,
            since_reset: 0.0,
            tilt_amplitude: 0.0,
            tilt_damping: 0.0,
            tilt_osc: 0.0,
            tilt_angle: 0.0,
        }
    }

    pub fn update(&mut self, snap: &FrameSnapshot, dt: Real) -> AnimationFeedback {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if snap.on_ground
            && ((snap.accelerating && !self.was_accelerating) || (snap.braking && !self.was_braking))
        {
            self.reset_tilt = true;
        }
        self.was_accelerating = snap.accelerating;
        self.was_braking = snap.braking;

        AnimationFeedback {
            wheel_direction: self.update_wheel_direction(snap, dt),
            wheel_rotation: self.update_wheel_rotation(snap, dt),
            suspension_offsets: snap.wheels.iter().map(|w| w.suspension_offset).collect(),
            drift_direction: match snap.drift {
                DriftState::Drifting => snap.drift_direction.signum(),
                _ => 0,
            },
            tilt_angle: self.update_tilt(snap, dt),
            roll_angle: self.roll(snap),
        }
    }

    fn update_wheel_direction(&mut self, snap: &FrameSnapshot, dt: Real) -> Real {
        let max_angle = self.cfg.wheels_max_direction_angle;
        let target = snap.turn_scale * max_angle;

        if target != self.wheel_target {
            self.wheel_previous = self.wheel_direction;
            self.wheel_target = target;
            self.wheel_change_duration = if max_angle != 0.0 {
                (self.cfg.wheels_to_neutral_duration * (target - self.wheel_previous) / max_angle).abs()
            } else {
                0.0
            };
            self.wheel_timer.start();
        }

        match self.wheel_timer.elapsed() {
            Some(t) if t < self.wheel_change_duration => {
                self.wheel_timer.tick(dt);
                let t = self.wheel_timer.elapsed().unwrap_or(t);
                let ratio = (t / self.wheel_change_duration).min(1.0);
                self.wheel_direction = (self.wheel_target - self.wheel_previous) * ratio + self.wheel_previous;
            }
            _ => {
                self.wheel_timer.stop();
                self.wheel_change_duration = 0.0;
                self.wheel_direction = self.wheel_target;
            }
        }
        self.wheel_direction
    }

    fn update_wheel_rotation(&mut self, snap: &FrameSnapshot, dt: Real) -> i32 {
        if snap.speed_kmh == 0.0 || self.wheel_radius_m <= 0.0 {
            self.wheel_spin = 0.0;
            return 0;
        }

        let perimeter = 2.0 * std::f32::consts::PI * self.wheel_radius_m;
        let travelled = snap.speed_kmh.abs() / 3.6 * dt;
        self.wheel_spin = (self.wheel_spin + travelled / perimeter * 360.0) % 360.0;

        let sign = if snap.speed_kmh > 0.0 { 1 } else { -1 };
        sign * (self.wheel_spin as i32 % 360)
    }

    fn update_tilt(&mut self, snap: &FrameSnapshot, dt: Real) -> Real {
        let speed_diff = 1.0 - (snap.speed_kmh.abs() / self.max_speed);

        if self.reset_tilt && self.tilt_angle.abs() < TILT_RESET_EPSILON {
            self.reset_tilt = false;
            self.since_reset = 0.0;

            let (amplitude, damping, osc) = if self.was_accelerating {
                (
                    self.cfg.acceleration_tilt_max_angle,
                    self.cfg.acceleration_tilt_damping,
                    self.cfg.acceleration_tilt_osc_speed,
                )
            } else {
                (
                    self.cfg.braking_tilt_max_angle,
                    self.cfg.braking_tilt_damping,
                    self.cfg.braking_tilt_osc_speed,
                )
            };
            let axis = if self.was_accelerating {
                snap.accelerate_scale
            } else if self.was_braking {
                snap.brake_scale
            } else {
                1.0
            };

            self.tilt_amplitude = amplitude * axis;
            self.tilt_damping = damping;
            self.tilt_osc = (osc * speed_diff).clamp(TILT_OSC_MIN, TILT_OSC_MAX);
        }

        self.since_reset += dt;
        let t = self.since_reset;
        let mut tilt = self.tilt_amplitude * (-self.tilt_damping * t).exp() * (self.tilt_osc * t).sin();
        if self.cfg.scale_tilt_with_speed {
            tilt *= speed_diff;
        }
        self.tilt_angle = tilt;
        tilt
    }

    fn roll(&self, snap: &FrameSnapshot) -> Real {
        let slip = (snap.lateral_kmh / self.max_speed).clamp(-1.0, 1.0);
        let max = self.cfg.max_roll_angle;
        (max * slip).clamp(-max, max) * self.cfg.roll_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::types::WheelSnapshot;

    const DT: Real = 1.0 / 60.0;

    fn animator() -> Animator {
        Animator::new(AnimatorConfig::default(), &VehicleConfig::arcade())
    }

    fn grounded() -> FrameSnapshot {
        FrameSnapshot { on_ground: true, ..Default::default() }
    }

    #[test]
    fn steering_eases_linearly_then_snaps() {
        let mut anim = animator();
        let snap = FrameSnapshot { turn_scale: 1.0, ..grounded() };

        // full lock takes wheels_to_neutral_duration = 0.5 s
        let mut angle = 0.0;
        for _ in 0..15 {
            angle = anim.update(&snap, DT).wheel_direction;
        }
        assert!((angle - 17.5).abs() < 0.5, "half way: {angle}");

        for _ in 0..30 {
            angle = anim.update(&snap, DT).wheel_direction;
        }
        assert_eq!(angle, 35.0);
    }

    #[test]
    fn wheel_spin_is_wrapped_and_signed() {
        let mut anim = animator();
        let fwd = FrameSnapshot { speed_kmh: 100.0, ..grounded() };
        for _ in 0..200 {
            let r = anim.update(&fwd, DT).wheel_rotation;
            assert!((0..360).contains(&r));
        }

        let rev = FrameSnapshot { speed_kmh: -30.0, ..grounded() };
        let r = anim.update(&rev, DT).wheel_rotation;
        assert!(r <= 0 && r > -360);

        assert_eq!(anim.update(&grounded(), DT).wheel_rotation, 0);
    }

    #[test]
    fn tilt_starts_flat_and_decays() {
        let mut anim = animator();
        let accel = FrameSnapshot { accelerating: true, accelerate_scale: 1.0, ..grounded() };

        let first = anim.update(&accel, DT).tilt_angle;
        assert!(first > 0.0 && first < 1.0);

        let mut peak: Real = 0.0;
        let mut last = 0.0;
        for _ in 0..300 {
            last = anim.update(&accel, DT).tilt_angle;
            peak = peak.max(last.abs());
        }
        assert!(peak <= 3.0);
        assert!(last.abs() < 0.01);
    }

    #[test]
    fn no_tilt_when_pressed_in_the_air() {
        let mut anim = animator();
        let airborne = FrameSnapshot { accelerating: true, accelerate_scale: 1.0, ..Default::default() };
        for _ in 0..30 {
            assert_eq!(anim.update(&airborne, DT).tilt_angle, 0.0);
        }
    }

    #[test]
    fn roll_is_clamped_and_scaled() {
        let mut anim = animator();
        let cfg = AnimatorConfig::default();
        let sliding = FrameSnapshot { lateral_kmh: 1000.0, ..grounded() };
        let roll = anim.update(&sliding, DT).roll_angle;
        assert_eq!(roll, cfg.max_roll_angle * cfg.roll_scale);

        let gentle = FrameSnapshot { lateral_kmh: -16.0, ..grounded() };
        let roll = anim.update(&gentle, DT).roll_angle;
        assert!((roll + 1.0 * cfg.roll_scale).abs() < 1e-4);
    }

    #[test]
    fn copies_offsets_and_drift_direction() {
        let mut anim = animator();
        let snap = FrameSnapshot {
            drift: DriftState::Drifting,
            drift_direction: -1,
            wheels: vec![
                WheelSnapshot { suspension_offset: 0.05, ..Default::default() },
                WheelSnapshot { suspension_offset: -0.02, ..Default::default() },
            ],
            ..grounded()
        };
        let fb = anim.update(&snap, DT);
        assert_eq!(fb.suspension_offsets, vec![0.05, -0.02]);
        assert_eq!(fb.drift_direction, -1);

        let eligible = FrameSnapshot { drift: DriftState::DriftEligible, drift_direction: 1, ..grounded() };
        assert_eq!(anim.update(&eligible, DT).drift_direction, 0);
    }
}
