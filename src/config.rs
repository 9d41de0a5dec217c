// ==============================================================================
// config.rs — SERVER CONFIGURATION (TOML)
// ------------------------------------------------------------------------------
// One file configures the whole server:
//
//   bind = "0.0.0.0:9001"
//   tick_hz = 60
//   debug_overlay = true
//
//   [vehicle]          # arcade::VehicleConfig, every field optional
//   max_speed = 140.0
//
//   [animator]         # arcade::AnimatorConfig
//   [rig]              # chassis box + wheel bone positions
//   [rig.bones]
//   wheel_fl = [0.8, 0.0, 1.3]
//
// Missing file sections fall back to the arcade preset.
// ==============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use rapier3d::prelude::{Point, Real};
use serde::{Deserialize, Serialize};

use crate::arcade::{AnimatorConfig, Skeleton, VehicleConfig};
use crate::error::ConfigError;

fn default_bind() -> String {
    "0.0.0.0:9001".to_string()
}

fn default_tick_hz() -> u32 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    #[serde(default)]
    pub debug_overlay: bool,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub animator: AnimatorConfig,
    #[serde(default)]
    pub rig: RigConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            tick_hz: default_tick_hz(),
            debug_overlay: false,
            vehicle: VehicleConfig::default(),
            animator: AnimatorConfig::default(),
            rig: RigConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults when `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ServerConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 || self.tick_hz > 1000 {
            return Err(ConfigError::Invalid {
                field: "tick_hz",
                reason: format!("{} is outside 1..=1000", self.tick_hz),
            });
        }
        self.vehicle.validate()
    }

    pub fn tick_dt(&self) -> Real {
        1.0 / self.tick_hz as Real
    }
}

/// Stand-in for the visual skeleton: named bones in chassis local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub chassis_half_extents: [f32; 3], // collider box, metres
    pub spawn_height: f32,              // y of the chassis origin at spawn
    pub bones: BTreeMap<String, [f32; 3]>,
}

impl Default for RigConfig {
    fn default() -> Self {
        let bones = [
            ("wheel_fl", [0.8, 0.0, 1.3]),
            ("wheel_fr", [-0.8, 0.0, 1.3]),
            ("wheel_rl", [0.8, 0.0, -1.3]),
            ("wheel_rr", [-0.8, 0.0, -1.3]),
        ]
        .into_iter()
        .map(|(name, p)| (name.to_string(), p))
        .collect();

        Self {
            chassis_half_extents: [0.9, 0.3, 1.8],
            spawn_height: 1.2,
            bones,
        }
    }
}

impl Skeleton for RigConfig {
    fn bone_local(&self, name: &str) -> Option<Point<Real>> {
        self.bones.bone_local(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_file_means_defaults() {
        let cfg = ServerConfig::load(None).unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert!((cfg.tick_dt() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
bind = "127.0.0.1:7000"
debug_overlay = true

[vehicle]
max_speed = 120.0
ground_contact_threshold = 2

[rig.bones]
front = [0.0, 0.0, 1.0]
"#
        )
        .unwrap();

        let cfg = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:7000");
        assert_eq!(cfg.tick_hz, 60);
        assert!(cfg.debug_overlay);
        assert_eq!(cfg.vehicle.max_speed, 120.0);
        assert_eq!(cfg.vehicle.ground_contact_threshold, 2);
        assert_eq!(cfg.vehicle.mass, VehicleConfig::arcade().mass);
        assert_eq!(cfg.rig.bones.len(), 1);
        assert!(cfg.rig.bone_local("front").is_some());
        assert!(cfg.rig.bone_local("wheel_fl").is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[vehicle]\nmass = -5.0").unwrap();
        let err = ServerConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "mass", .. }));
    }

    #[test]
    fn broken_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = ").unwrap();
        let err = ServerConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
