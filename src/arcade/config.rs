//! Tuning for one vehicle (physics) and its animator (visual only).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Immutable after spawn. Distances are world units, speeds are km/h,
/// turning rates are degrees/second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    // --- Suspension ---
    pub suspension_bones: Vec<String>,  // skeleton bones used as wheel anchors
    pub suspension_ray_length: f32,     // ray length below each anchor
    pub target_suspension_height: f32,  // distance the suspension tries to enforce
    pub suspension_offset_min: f32,     // visual offset, fully extended
    pub suspension_offset_max: f32,     // visual offset, fully compressed
    pub suspension_damping: f32,        // damper coefficient
    pub suspension_spring_divisor: f32, // spring k = gravity force / divisor
    pub adherence: f32,                 // lateral grip coefficient
    pub adherence_vertical_offset: f32, // along up, from the center of mass
    pub com_offset: [f32; 3],           // local center of mass offset

    // --- Power ---
    pub linear_damping: f32,
    pub mass: f32,                      // kg
    pub gravity_scale: f32,
    pub max_speed: f32,                 // km/h
    pub acceleration: f32,              // per unit mass
    pub brake: f32,                     // per unit mass
    pub traction_offset: [f32; 3],      // local offset from COM where propulsion applies
    pub reverse_delay: f32,             // s of braking while stopped before reversing
    pub max_reverse_speed: f32,         // km/h
    pub ground_contact_threshold: usize,// wheels in contact to count as on ground
    pub stopped_speed_band: f32,        // km/h, |speed| below this counts as stopped
    pub stop_speed_threshold: f32,      // world units/s, below fires the Stop event

    // --- Turning ---
    pub angular_damping: f32,
    pub turning_force: f32,             // deg/s² applied around up
    pub max_turning_rate_min_speed: f32,// deg/s envelope at rest
    pub max_turning_rate_full_speed: f32,// deg/s envelope at max speed
    pub turning_min_speed: f32,         // km/h, no steering torque below

    // --- Drift ---
    pub drift_min_speed_percent: f32,
    pub drift_min_turning_scale: f32,   // 0..1
    pub drift_start_delay: f32,         // s
    pub drift_turning_boost: f32,       // deg/s added to the envelope
    pub drift_acceleration_compensation: f32,
    pub drift_recover_duration: f32,    // s to regain full adherence
    pub drift_turning_offset: f32,      // 0..1, steering bias toward the drift side
    pub drift_adherence_nerf_percent: f32, // 0..100

    // --- Jump / air ---
    pub jump_enabled: bool,
    pub jump_impulse: f32,              // velocity change, world units/s
    pub jump_suspension_delay: f32,     // s
    pub disable_linear_damping_in_air: bool,
    pub stabilize_in_air: bool,
    pub air_pitch_gain: f32,
    pub air_roll_gain: f32,
    pub air_angular_damping: f32,

    // --- Units ---
    pub world_units_per_meter: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self::arcade()
    }
}

impl VehicleConfig {
    /// Light, twitchy kart. Metres.
    pub fn arcade() -> Self {
        Self {
            suspension_bones: vec![
                "wheel_fl".to_string(),
                "wheel_fr".to_string(),
                "wheel_rl".to_string(),
                "wheel_rr".to_string(),
            ],
            suspension_ray_length: 1.1,
            target_suspension_height: 0.8,
            suspension_offset_min: -0.02,
            suspension_offset_max: 0.10,
            suspension_damping: 300.0,
            suspension_spring_divisor: 0.2,
            adherence: 150.0,
            adherence_vertical_offset: -0.02,
            com_offset: [0.0, -0.5, 0.0],

            linear_damping: 0.2,
            mass: 100.0,
            gravity_scale: 3.0,
            max_speed: 160.0,
            acceleration: 40.0,
            brake: 20.0,
            traction_offset: [0.0, 0.0, 0.0],
            reverse_delay: 0.4,
            max_reverse_speed: 80.0,
            ground_contact_threshold: 1,
            stopped_speed_band: 1.0,
            stop_speed_threshold: 0.01,

            angular_damping: 3.0,
            turning_force: 300.0,
            max_turning_rate_min_speed: 50.0,
            max_turning_rate_full_speed: 40.0,
            turning_min_speed: 5.0,

            drift_min_speed_percent: 60.0,
            drift_min_turning_scale: 0.9,
            drift_start_delay: 0.0,
            drift_turning_boost: 35.0,
            drift_acceleration_compensation: 0.8,
            drift_recover_duration: 1.0,
            drift_turning_offset: 0.3,
            drift_adherence_nerf_percent: 25.0,

            jump_enabled: true,
            jump_impulse: 10.0,
            jump_suspension_delay: 0.2,
            disable_linear_damping_in_air: false,
            stabilize_in_air: true,
            air_pitch_gain: 50.0,
            air_roll_gain: 10.0,
            air_angular_damping: 50.0,

            world_units_per_meter: 1.0,
        }
    }

    /// Slow truck: more grip, less turning, no jump.
    pub fn heavy() -> Self {
        Self {
            mass: 400.0,
            max_speed: 110.0,
            acceleration: 25.0,
            brake: 15.0,
            adherence: 200.0,
            turning_force: 180.0,
            max_turning_rate_min_speed: 40.0,
            max_turning_rate_full_speed: 25.0,
            drift_min_speed_percent: 75.0,
            drift_turning_boost: 15.0,
            jump_enabled: false,
            ..Self::arcade()
        }
    }

    /// world units/s → km/h
    pub fn kmh_per_unit(&self) -> f32 {
        3.6 / self.world_units_per_meter
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("mass", self.mass),
            ("max_speed", self.max_speed),
            ("suspension_ray_length", self.suspension_ray_length),
            ("suspension_spring_divisor", self.suspension_spring_divisor),
            ("world_units_per_meter", self.world_units_per_meter),
        ];
        for (field, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        let durations = [
            ("reverse_delay", self.reverse_delay),
            ("drift_start_delay", self.drift_start_delay),
            ("drift_recover_duration", self.drift_recover_duration),
            ("jump_suspension_delay", self.jump_suspension_delay),
        ];
        for (field, value) in durations {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative duration in seconds, got {value}"),
                });
            }
        }
        if self.suspension_offset_min > self.suspension_offset_max {
            return Err(ConfigError::Invalid {
                field: "suspension_offset_min",
                reason: format!(
                    "{} is greater than suspension_offset_max {}",
                    self.suspension_offset_min, self.suspension_offset_max
                ),
            });
        }
        if self.target_suspension_height > self.suspension_ray_length {
            return Err(ConfigError::Invalid {
                field: "target_suspension_height",
                reason: "longer than suspension_ray_length, the suspension could never reach it".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.drift_adherence_nerf_percent) {
            return Err(ConfigError::Invalid {
                field: "drift_adherence_nerf_percent",
                reason: "must be within 0..=100".into(),
            });
        }
        Ok(())
    }
}

/// Purely visual easing, never fed back into physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub wheels_max_direction_angle: f32,   // degrees
    pub wheels_to_neutral_duration: f32,   // s from max angle to neutral
    pub acceleration_tilt_max_angle: f32,  // A, degrees
    pub braking_tilt_max_angle: f32,       // A, degrees (negative)
    pub acceleration_tilt_damping: f32,    // c
    pub braking_tilt_damping: f32,         // c
    pub acceleration_tilt_osc_speed: f32,  // w
    pub braking_tilt_osc_speed: f32,       // w
    pub max_roll_angle: f32,               // degrees
    pub roll_scale: f32,
    pub scale_tilt_with_speed: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            wheels_max_direction_angle: 35.0,
            wheels_to_neutral_duration: 0.5,
            acceleration_tilt_max_angle: 3.0,
            braking_tilt_max_angle: -3.0,
            acceleration_tilt_damping: 3.0,
            braking_tilt_damping: 2.0,
            acceleration_tilt_osc_speed: 10.0,
            braking_tilt_osc_speed: 10.0,
            max_roll_angle: 10.0,
            roll_scale: 3.0,
            scale_tilt_with_speed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(VehicleConfig::arcade().validate().is_ok());
        assert!(VehicleConfig::heavy().validate().is_ok());
    }

    #[test]
    fn metre_world_converts_to_kmh() {
        let cfg = VehicleConfig::arcade();
        assert!((cfg.kmh_per_unit() - 3.6).abs() < 1e-6);

        let cm = VehicleConfig { world_units_per_meter: 100.0, ..cfg };
        assert!((cm.kmh_per_unit() - 0.036).abs() < 1e-6);
    }

    #[test]
    fn rejects_inverted_offsets() {
        let cfg = VehicleConfig {
            suspension_offset_min: 0.5,
            suspension_offset_max: 0.1,
            ..VehicleConfig::arcade()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "suspension_offset_min", .. })
        ));
    }

    #[test]
    fn rejects_negative_durations() {
        let base = VehicleConfig::arcade();
        let cases = [
            ("reverse_delay", VehicleConfig { reverse_delay: -0.1, ..base.clone() }),
            ("drift_start_delay", VehicleConfig { drift_start_delay: -1.0, ..base.clone() }),
            ("drift_recover_duration", VehicleConfig { drift_recover_duration: -0.5, ..base.clone() }),
            ("jump_suspension_delay", VehicleConfig { jump_suspension_delay: -0.2, ..base.clone() }),
        ];
        for (name, cfg) in cases {
            match cfg.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, name),
                other => panic!("{name}: expected rejection, got {other:?}"),
            }
        }

        // Zero still means "no delay".
        let instant = VehicleConfig { drift_start_delay: 0.0, reverse_delay: 0.0, ..base };
        assert!(instant.validate().is_ok());
    }

    #[test]
    fn rejects_zero_mass() {
        let cfg = VehicleConfig { mass: 0.0, ..VehicleConfig::arcade() };
        assert!(cfg.validate().is_err());
    }
}
