//! arcade - engine-agnostic arcade vehicle pipeline (host trait + models + orchestrator)

pub mod types;
pub mod timer;
pub mod host;
pub mod config;
pub mod events;
pub mod sensor;
pub mod ground;
pub mod suspension;
pub mod propulsion;
pub mod adherence;
pub mod turning;
pub mod drift;
pub mod air;
pub mod feel;
pub mod pipeline;
pub mod animator;

pub use types::*;
pub use timer::Timer;
pub use host::{ChassisBody, RayHit};
pub use config::{AnimatorConfig, VehicleConfig};
pub use events::{EventBus, VehicleEvent};
pub use feel::{AdherenceModel, DriftModel, PropulsionModel, SuspensionModel, TurningModel, VehicleFeel};
pub use pipeline::{ArcadeVehicle, INPUT_DEADZONE, Skeleton};
pub use animator::{AnimationFeedback, Animator};
