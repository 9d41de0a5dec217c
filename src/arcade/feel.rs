// ==============================================================================
// feel.rs — PER-PHASE STRATEGIES
// ------------------------------------------------------------------------------
// The orchestrator calls every force phase through these traits, so an
// alternate vehicle feel swaps a model instead of overriding the pipeline.
// The Arcade* impls are the stock behavior.
// ==============================================================================

use rapier3d::prelude::Real;

use super::config::VehicleConfig;
use super::types::{FrameState, WheelSample};
use super::{adherence, drift, propulsion, suspension, turning};

pub trait SuspensionModel: Send {
    fn spring_rate(&self, cfg: &VehicleConfig, gravity_force: Real) -> Real {
        suspension::spring_rate(cfg, gravity_force)
    }
    /// Signed force along chassis up for a wheel in contact.
    fn wheel_force(&self, cfg: &VehicleConfig, k: Real, sample: &WheelSample, relative_velocity: Real) -> Real;
    fn visual_offset(&self, cfg: &VehicleConfig, sample: &WheelSample) -> Real;
}

pub trait PropulsionModel: Send {
    fn acceleration_force(&self, cfg: &VehicleConfig, state: &FrameState, dt: Real) -> Real;
    /// May advance `state.reverse_timer`.
    fn braking_force(&self, cfg: &VehicleConfig, state: &mut FrameState, dt: Real) -> Real;
}

pub trait AdherenceModel: Send {
    fn lateral_force(&self, cfg: &VehicleConfig, state: &FrameState) -> Real;
}

pub trait TurningModel: Send {
    fn envelope(&self, cfg: &VehicleConfig, speed_kmh: Real, drifting: bool) -> Real;
    /// deg/s², positive turns right.
    fn steering_acceleration(&self, cfg: &VehicleConfig, state: &FrameState, yaw_rate_deg: Real) -> Option<Real>;
}

pub trait DriftModel: Send {
    /// New `can_drift`; may restart or stop `state.drift_timer`.
    fn eligibility(&self, cfg: &VehicleConfig, state: &mut FrameState, dt: Real) -> bool;
    fn steering(&self, cfg: &VehicleConfig, turn_input: Real, direction: i8) -> Real;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArcadeSuspension;

impl SuspensionModel for ArcadeSuspension {
    fn wheel_force(&self, cfg: &VehicleConfig, k: Real, sample: &WheelSample, relative_velocity: Real) -> Real {
        suspension::wheel_force(cfg, k, sample.distance, relative_velocity)
    }

    fn visual_offset(&self, cfg: &VehicleConfig, sample: &WheelSample) -> Real {
        suspension::visual_offset(cfg, sample)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArcadePropulsion;

impl PropulsionModel for ArcadePropulsion {
    fn acceleration_force(&self, cfg: &VehicleConfig, state: &FrameState, dt: Real) -> Real {
        propulsion::acceleration_force(cfg, state, dt)
    }

    fn braking_force(&self, cfg: &VehicleConfig, state: &mut FrameState, dt: Real) -> Real {
        propulsion::braking_force(cfg, state, dt)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArcadeAdherence;

impl AdherenceModel for ArcadeAdherence {
    fn lateral_force(&self, cfg: &VehicleConfig, state: &FrameState) -> Real {
        adherence::lateral_force(cfg, state)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArcadeTurning;

impl TurningModel for ArcadeTurning {
    fn envelope(&self, cfg: &VehicleConfig, speed_kmh: Real, drifting: bool) -> Real {
        turning::envelope(cfg, speed_kmh, drifting)
    }

    fn steering_acceleration(&self, cfg: &VehicleConfig, state: &FrameState, yaw_rate_deg: Real) -> Option<Real> {
        turning::steering_acceleration(
            cfg,
            state.speed_kmh,
            state.reversing,
            state.turn_scale,
            yaw_rate_deg,
            state.max_turning_rate,
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArcadeDrift;

impl DriftModel for ArcadeDrift {
    fn eligibility(&self, cfg: &VehicleConfig, state: &mut FrameState, dt: Real) -> bool {
        drift::eligibility(
            cfg,
            state.speed_percent,
            state.turn_input,
            state.can_drift,
            &mut state.drift_timer,
            dt,
        )
    }

    fn steering(&self, cfg: &VehicleConfig, turn_input: Real, direction: i8) -> Real {
        drift::steering(cfg, turn_input, direction)
    }
}

/// One model per force phase.
pub struct VehicleFeel {
    pub suspension: Box<dyn SuspensionModel>,
    pub propulsion: Box<dyn PropulsionModel>,
    pub adherence: Box<dyn AdherenceModel>,
    pub turning: Box<dyn TurningModel>,
    pub drift: Box<dyn DriftModel>,
}

impl Default for VehicleFeel {
    fn default() -> Self {
        Self::arcade()
    }
}

impl VehicleFeel {
    pub fn arcade() -> Self {
        Self {
            suspension: Box::new(ArcadeSuspension),
            propulsion: Box::new(ArcadePropulsion),
            adherence: Box::new(ArcadeAdherence),
            turning: Box::new(ArcadeTurning),
            drift: Box::new(ArcadeDrift),
        }
    }

    pub fn with_suspension(mut self, model: impl SuspensionModel + 'static) -> Self {
        self.suspension = Box::new(model);
        self
    }

    pub fn with_propulsion(mut self, model: impl PropulsionModel + 'static) -> Self {
        self.propulsion = Box::new(model);
        self
    }

    pub fn with_adherence(mut self, model: impl AdherenceModel + 'static) -> Self {
        self.adherence = Box::new(model);
        self
    }

    pub fn with_turning(mut self, model: impl TurningModel + 'static) -> Self {
        self.turning = Box::new(model);
        self
    }

    pub fn with_drift(mut self, model: impl DriftModel + 'static) -> Self {
        self.drift = Box::new(model);
        self
    }
}

impl std::fmt::Debug for VehicleFeel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleFeel").finish_non_exhaustive()
    }
}
