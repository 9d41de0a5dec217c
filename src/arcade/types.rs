// ==============================================================================
// types.rs — PER-WHEEL SAMPLES, ORCHESTRATOR STATE, FRAME SNAPSHOT
// ------------------------------------------------------------------------------
// FrameState is private to the orchestrator and mutated every tick.
// FrameSnapshot is the read-only copy handed to the animator / server after
// a tick completes.
// ==============================================================================

use rapier3d::prelude::{Point, Real, Vector};
use serde::Serialize;

use super::timer::Timer;

/// Wheel attachment point in chassis local space, resolved once at activation.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelAnchor {
    pub name: String,
    pub local: Point<Real>,
}

/// One suspension ray result. Rebuilt every tick, never carried over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSample {
    pub contact: bool,
    pub distance: Real,         // along -up from origin
    pub origin: Point<Real>,    // anchor in world space (ray start)
    pub point: Point<Real>,     // impact point, ray end when no contact
    pub normal: Vector<Real>,   // impact normal, chassis up when no contact
}

impl WheelSample {
    /// No hit: reads as a fully extended suspension.
    pub fn airborne(origin: Point<Real>, up: Vector<Real>, ray_length: Real) -> Self {
        Self {
            contact: false,
            distance: ray_length,
            origin,
            point: origin - up * ray_length,
            normal: up,
        }
    }
}

/// Observable drift state, derived from the two flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftState {
    #[default]
    NotDrifting,
    DriftEligible,
    Drifting,
}

#[derive(Debug, Clone)]
pub struct FrameState {
    // --- Kinematics (chassis local space unless noted) ---
    pub linvel_world: Vector<Real>,
    pub linvel_local: Vector<Real>,
    pub angvel_local: Vector<Real>,     // rad/s
    pub speed_kmh: Real,                // signed, negative in reverse
    pub speed_percent: Real,            // |speed| / max * 100
    pub lateral_kmh: Real,              // signed, positive sliding right
    pub reversing: bool,
    pub stopped: bool,

    // --- Ground ---
    pub on_ground: bool,
    pub wheels_on_ground: usize,
    pub wheels: Vec<WheelSample>,
    pub suspension_offsets: Vec<Real>,

    // --- Input intents ---
    pub accelerating: bool,
    pub accelerate_scale: Real,
    pub braking: bool,
    pub brake_scale: Real,
    pub turn_input: Real,               // raw, as last given by the controller
    pub turn_scale: Real,               // effective, after the drift offset
    pub turning: bool,                  // steering torque applied this tick
    pub jump_requested: bool,
    pub jumping: bool,

    // --- Drift ---
    pub can_drift: bool,
    pub drifting: bool,
    pub drift_direction: i8,            // -1 left, 0 none, 1 right

    // --- Timers ---
    pub drift_timer: Timer,
    pub drift_recover_timer: Timer,
    pub jump_suspension_timer: Timer,
    pub reverse_timer: Timer,

    // --- Derived ---
    pub max_turning_rate: Real,         // deg/s
    pub center_of_mass: Point<Real>,
    pub traction_point: Point<Real>,

    // --- Last applied forces (world) ---
    pub gravity_force: Vector<Real>,
    pub suspension_forces: Vec<Vector<Real>>,
    pub adherence_force: Vector<Real>,
    pub acceleration_force: Vector<Real>,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            linvel_world: Vector::zeros(),
            linvel_local: Vector::zeros(),
            angvel_local: Vector::zeros(),
            speed_kmh: 0.0,
            speed_percent: 0.0,
            lateral_kmh: 0.0,
            reversing: false,
            stopped: false,
            // Spawned vehicles are assumed grounded until the first raycast says otherwise.
            on_ground: true,
            wheels_on_ground: 0,
            wheels: Vec::new(),
            suspension_offsets: Vec::new(),
            accelerating: false,
            accelerate_scale: 0.0,
            braking: false,
            brake_scale: 0.0,
            turn_input: 0.0,
            turn_scale: 0.0,
            turning: false,
            jump_requested: false,
            jumping: false,
            can_drift: false,
            drifting: false,
            drift_direction: 0,
            drift_timer: Timer::STOPPED,
            drift_recover_timer: Timer::STOPPED,
            jump_suspension_timer: Timer::STOPPED,
            reverse_timer: Timer::STOPPED,
            max_turning_rate: 0.0,
            center_of_mass: Point::origin(),
            traction_point: Point::origin(),
            gravity_force: Vector::zeros(),
            suspension_forces: Vec::new(),
            adherence_force: Vector::zeros(),
            acceleration_force: Vector::zeros(),
        }
    }
}

impl FrameState {
    pub fn drift_state(&self) -> DriftState {
        if self.drifting {
            DriftState::Drifting
        } else if self.can_drift {
            DriftState::DriftEligible
        } else {
            DriftState::NotDrifting
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WheelSnapshot {
    pub contact: bool,
    pub distance: f32,
    pub origin: [f32; 3],
    pub point: [f32; 3],
    pub suspension_offset: f32,
    pub suspension_force: [f32; 3],     // zero when not applied
}

/// Read-only copy of the frame, produced after each tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameSnapshot {
    pub speed_kmh: f32,
    pub speed_percent: f32,
    pub lateral_kmh: f32,
    pub reversing: bool,
    pub stopped: bool,
    pub on_ground: bool,
    pub wheels_on_ground: usize,

    pub accelerating: bool,
    pub accelerate_scale: f32,
    pub braking: bool,
    pub brake_scale: f32,
    pub turn_input: f32,
    pub turn_scale: f32,
    pub turning: bool,
    pub jumping: bool,

    pub drift: DriftState,
    pub drift_direction: i8,
    pub adherence_scale: f32,           // 0..1 grip multiplier: drift nerf or recovery ratio
    pub max_turning_rate: f32,

    pub linvel: [f32; 3],               // world
    pub center_of_mass: [f32; 3],
    pub traction_point: [f32; 3],
    pub gravity_force: [f32; 3],
    pub adherence_force: [f32; 3],
    pub acceleration_force: [f32; 3],
    pub wheels: Vec<WheelSnapshot>,
}

#[inline]
pub fn v3(v: &Vector<Real>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

#[inline]
pub fn p3(p: &Point<Real>) -> [f32; 3] {
    [p.x, p.y, p.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::{point, vector};

    #[test]
    fn airborne_sample_is_fully_extended() {
        let s = WheelSample::airborne(point![0.0, 2.0, 0.0], vector![0.0, 1.0, 0.0], 1.1);
        assert!(!s.contact);
        assert_eq!(s.distance, 1.1);
        assert!((s.point.y - 0.9).abs() < 1e-6);
    }

    #[test]
    fn drift_state_prefers_drifting() {
        let mut st = FrameState::default();
        assert_eq!(st.drift_state(), DriftState::NotDrifting);
        st.can_drift = true;
        assert_eq!(st.drift_state(), DriftState::DriftEligible);
        st.drifting = true;
        assert_eq!(st.drift_state(), DriftState::Drifting);
    }
}
