// ==============================================================================
// pipeline.rs — ARCADE VEHICLE TICK ORCHESTRATOR
// ------------------------------------------------------------------------------
// Owns the per-vehicle FrameState and runs one fixed-order pass per step:
//
//   gravity -> speed/direction -> turning envelope -> raycasts -> ground
//   -> stop check -> jump gate -> suspension (unless just jumped)
//   -> visual offsets -> adherence
//   -> grounded: brake | accelerate, drift eligibility, turn
//   -> airborne: drop drift, stabilize
//
// Control calls (set_accelerate, set_turn, ...) only change intent; forces are
// applied during tick.
// ==============================================================================

use std::collections::{BTreeMap, HashMap};

use rapier3d::prelude::{Point, Real, Vector};
use tracing::{error, info, warn};

use super::config::VehicleConfig;
use super::events::{EventBus, VehicleEvent};
use super::feel::VehicleFeel;
use super::host::{ChassisBody, chassis_axes};
use super::types::{DriftState, FrameSnapshot, FrameState, WheelAnchor, WheelSnapshot, p3, v3};
use super::{adherence, air, drift, ground, sensor};
use crate::error::VehicleError;

/// Axis values at or below this count as released.
pub const INPUT_DEADZONE: Real = 0.05;

/// Bone lookup used to resolve wheel anchors at activation.
pub trait Skeleton {
    /// Bone position in chassis local space.
    fn bone_local(&self, name: &str) -> Option<Point<Real>>;
}

impl Skeleton for BTreeMap<String, [f32; 3]> {
    fn bone_local(&self, name: &str) -> Option<Point<Real>> {
        self.get(name).map(|p| Point::new(p[0], p[1], p[2]))
    }
}

impl Skeleton for HashMap<String, Point<Real>> {
    fn bone_local(&self, name: &str) -> Option<Point<Real>> {
        self.get(name).copied()
    }
}

pub struct ArcadeVehicle {
    cfg: VehicleConfig,
    feel: VehicleFeel,
    anchors: Vec<WheelAnchor>,
    state: FrameState,
    events: EventBus,
    active: bool,                   // false until activate succeeds
}

impl ArcadeVehicle {
    /// Inert until `activate` resolves the wheel anchors.
    pub fn new(cfg: VehicleConfig) -> Self {
        Self::with_feel(cfg, VehicleFeel::arcade())
    }

    pub fn with_feel(cfg: VehicleConfig, feel: VehicleFeel) -> Self {
        Self {
            cfg,
            feel,
            anchors: Vec::new(),
            state: FrameState::default(),
            events: EventBus::default(),
            active: false,
        }
    }

    /// Resolve anchors from the skeleton and reset the frame state. Unknown
    /// bones are reported and dropped; a missing skeleton leaves the vehicle
    /// inert. Returns the number of wheels kept.
    pub fn activate(&mut self, skeleton: Option<&dyn Skeleton>) -> Result<usize, VehicleError> {
        self.active = false;
        self.anchors.clear();

        if let Err(e) = self.cfg.validate() {
            error!("❌ Vehicle config rejected: {e}");
            return Err(e.into());
        }

        let Some(skeleton) = skeleton else {
            error!("❌ No skeleton assigned, vehicle stays inert");
            return Err(VehicleError::MissingSkeleton);
        };

        for name in &self.cfg.suspension_bones {
            match skeleton.bone_local(name) {
                Some(local) => self.anchors.push(WheelAnchor { name: name.clone(), local }),
                None => error!("❌ Suspension bone `{name}` not found, wheel dropped"),
            }
        }
        if self.anchors.is_empty() {
            warn!("⚠️ Vehicle has no wheel anchors, it will never be on ground");
        }

        self.state = FrameState::default();
        self.state.max_turning_rate = self.feel.turning.envelope(&self.cfg, 0.0, false);
        self.active = true;

        info!("🚗 Arcade vehicle active with {} wheel(s)", self.anchors.len());
        Ok(self.anchors.len())
    }

    // --------------------------------------------------------------------------
    // Tick
    // --------------------------------------------------------------------------

    pub fn tick(&mut self, body: &mut dyn ChassisBody, dt: Real) {
        if !self.active || !dt.is_finite() || dt <= 0.0 {
            return;
        }

        body.set_damping(self.cfg.linear_damping, self.cfg.angular_damping);
        self.state.acceleration_force = Vector::zeros();
        self.state.turning = false;

        self.apply_gravity(body);
        self.compute_speed_and_direction(body);
        self.state.max_turning_rate =
            self.feel.turning.envelope(&self.cfg, self.state.speed_kmh, self.state.drifting);

        sensor::sample_wheels(&*body, &self.anchors, self.cfg.suspension_ray_length, &mut self.state.wheels);
        if let Some(event) = ground::update(&mut self.state, self.cfg.ground_contact_threshold) {
            self.events.emit(event);
        }

        self.check_stopped();

        if self.jump_gate(body, dt) {
            self.apply_suspension(body);
        } else {
            self.state.suspension_forces.clear();
            self.state.suspension_forces.resize(self.state.wheels.len(), Vector::zeros());
        }

        self.compute_suspension_offsets();
        self.apply_adherence(body);
        self.state.drift_recover_timer.tick(dt);

        let pose = body.position();
        let traction_offset = Vector::from(self.cfg.traction_offset);
        self.state.traction_point = self.state.center_of_mass + pose.rotation * traction_offset;

        if self.state.on_ground {
            self.apply_propulsion(body, dt);
            self.update_drift(dt);
            self.apply_turn(body);
        } else {
            if self.cfg.disable_linear_damping_in_air {
                body.set_damping(0.0, self.cfg.angular_damping);
            }
            self.set_drift(false);
            self.drop_drift_eligibility();
            if self.cfg.stabilize_in_air {
                let alpha = air::stabilizing_acceleration(&self.cfg, &pose, &body.angvel());
                body.add_angular_acceleration(alpha);
            }
        }
    }

    fn apply_gravity(&mut self, body: &mut dyn ChassisBody) {
        let com = body.center_of_mass();
        let force = body.gravity() * self.cfg.gravity_scale * self.cfg.mass;
        body.add_force_at_point(force, com);
        self.state.center_of_mass = com;
        self.state.gravity_force = force;
    }

    fn compute_speed_and_direction(&mut self, body: &dyn ChassisBody) {
        let pose = body.position();
        let to_local = pose.rotation.inverse();
        let linvel = body.linvel();
        let kmh = self.cfg.kmh_per_unit();

        let st = &mut self.state;
        st.linvel_world = linvel;
        st.linvel_local = to_local * linvel;
        st.angvel_local = to_local * body.angvel();
        st.speed_kmh = st.linvel_local.z * kmh;
        // local right is -X
        st.lateral_kmh = -st.linvel_local.x * kmh;
        st.speed_percent = (st.speed_kmh / self.cfg.max_speed).abs() * 100.0;
        st.reversing = st.speed_kmh < 0.0;
    }

    fn check_stopped(&mut self) {
        if self.state.linvel_local.z.abs() < self.cfg.stop_speed_threshold {
            if !self.state.stopped {
                self.state.stopped = true;
                self.events.emit(VehicleEvent::Stop);
            }
        } else {
            self.state.stopped = false;
        }
    }

    /// Processes a pending jump and returns whether suspension may apply this step.
    fn jump_gate(&mut self, body: &mut dyn ChassisBody, dt: Real) -> bool {
        let mut just_jumped = false;
        if std::mem::take(&mut self.state.jump_requested) && self.cfg.jump_enabled && !self.state.jumping {
            let (up, _, _) = chassis_axes(&body.position());
            body.apply_impulse_at_point(up * air::jump_impulse(&self.cfg), body.center_of_mass());
            self.state.jumping = true;
            self.state.jump_suspension_timer.start();
            self.events.emit(VehicleEvent::Jump);
            just_jumped = true;
        }

        if !self.state.jumping {
            return true;
        }
        if !just_jumped {
            self.state.jump_suspension_timer.tick(dt);
        }
        if !self.state.jump_suspension_timer.reached(self.cfg.jump_suspension_delay) {
            return false;
        }
        if self.state.on_ground {
            self.state.jumping = false;
            self.state.jump_suspension_timer.stop();
        }
        true
    }

    fn apply_suspension(&mut self, body: &mut dyn ChassisBody) {
        let (up, _, _) = chassis_axes(&body.position());
        let k = self.feel.suspension.spring_rate(&self.cfg, self.state.gravity_force.norm());

        self.state.suspension_forces.clear();
        for wheel in &self.state.wheels {
            if !wheel.contact {
                self.state.suspension_forces.push(Vector::zeros());
                continue;
            }
            let relative_velocity = body.velocity_at_point(&wheel.origin).dot(&wheel.normal);
            let magnitude = self.feel.suspension.wheel_force(&self.cfg, k, wheel, relative_velocity);
            let force = up * magnitude;
            body.add_force_at_point(force, wheel.origin);
            self.state.suspension_forces.push(force);
        }
    }

    fn compute_suspension_offsets(&mut self) {
        let (cfg, feel) = (&self.cfg, &self.feel);
        self.state.suspension_offsets = self
            .state
            .wheels
            .iter()
            .map(|w| feel.suspension.visual_offset(cfg, w))
            .collect();
    }

    fn apply_adherence(&mut self, body: &mut dyn ChassisBody) {
        let (up, _, right) = chassis_axes(&body.position());
        let magnitude = self.feel.adherence.lateral_force(&self.cfg, &self.state);
        self.state.adherence_force = right * magnitude;
        if magnitude != 0.0 {
            let at = self.state.center_of_mass + up * self.cfg.adherence_vertical_offset;
            body.add_force_at_point(self.state.adherence_force, at);
        }
    }

    fn apply_propulsion(&mut self, body: &mut dyn ChassisBody, dt: Real) {
        let magnitude = if self.state.braking {
            self.set_drift(false);
            self.feel.propulsion.braking_force(&self.cfg, &mut self.state, dt)
        } else if self.state.accelerating {
            self.state.reverse_timer.stop();
            self.feel.propulsion.acceleration_force(&self.cfg, &self.state, dt)
        } else {
            self.set_drift(false);
            0.0
        };

        if magnitude != 0.0 {
            let (_, fwd, _) = chassis_axes(&body.position());
            let force = fwd * magnitude;
            body.add_force_at_point(force, self.state.traction_point);
            self.state.acceleration_force = force;
        }
    }

    fn update_drift(&mut self, dt: Real) {
        if self.state.drifting {
            if self.state.speed_percent < self.cfg.drift_min_speed_percent {
                self.set_drift(false);
                self.drop_drift_eligibility();
            }
            return;
        }

        let can_drift = self.feel.drift.eligibility(&self.cfg, &mut self.state, dt);
        if can_drift != self.state.can_drift {
            self.state.can_drift = can_drift;
            self.events.emit(if can_drift {
                VehicleEvent::CanDriftStart
            } else {
                VehicleEvent::CanDriftEnd
            });
        }
    }

    /// Back to NotDrifting: eligibility has to be earned again from scratch.
    fn drop_drift_eligibility(&mut self) {
        self.state.drift_timer.stop();
        if self.state.can_drift {
            self.state.can_drift = false;
            self.events.emit(VehicleEvent::CanDriftEnd);
        }
    }

    fn apply_turn(&mut self, body: &mut dyn ChassisBody) {
        let (up, _, _) = chassis_axes(&body.position());
        let yaw_rate_deg = body.angvel().dot(&up).to_degrees();

        if let Some(alpha_deg) = self.feel.turning.steering_acceleration(&self.cfg, &self.state, yaw_rate_deg) {
            // Positive input turns right, which is a negative rotation about +Y.
            body.add_angular_acceleration(-up * alpha_deg.to_radians());
            self.state.turning = true;
        }
    }

    // --------------------------------------------------------------------------
    // Control surface
    // --------------------------------------------------------------------------

    pub fn set_accelerate(&mut self, scale: Real) {
        self.state.accelerate_scale = scale;
        let active = scale > INPUT_DEADZONE;
        if self.state.accelerating == active {
            return;
        }

        self.state.accelerating = active;
        if active {
            self.events.emit(VehicleEvent::StartAccelerate);
            self.state.reverse_timer.stop();
            self.set_brake(0.0);
        } else {
            self.events.emit(VehicleEvent::StopAccelerate);
        }
    }

    pub fn set_brake(&mut self, scale: Real) {
        self.state.brake_scale = scale;
        let active = scale > INPUT_DEADZONE;
        if self.state.braking == active {
            return;
        }

        self.state.braking = active;
        if active {
            self.events.emit(VehicleEvent::StartBrake);
            self.set_accelerate(0.0);
        } else {
            self.events.emit(VehicleEvent::StopBrake);
            self.state.reverse_timer.stop();
        }
    }

    /// Engages only while drift-eligible. Events fire on actual transitions only.
    pub fn set_drift(&mut self, active: bool) {
        let drifting = active && (self.state.drifting || self.state.can_drift);
        if drifting == self.state.drifting {
            return;
        }

        self.state.drifting = drifting;
        if drifting {
            self.state.drift_direction = drift::direction_from_input(self.state.turn_input);
            self.state.drift_recover_timer.stop();
            self.events.emit(VehicleEvent::StartDrift);
        } else {
            self.state.drift_direction = 0;
            self.state.drift_recover_timer.start();
            self.events.emit(VehicleEvent::StopDrift);
        }

        self.refresh_turn_scale();
        self.state.max_turning_rate =
            self.feel.turning.envelope(&self.cfg, self.state.speed_kmh, self.state.drifting);
    }

    pub fn set_turn(&mut self, scale: Real) {
        self.state.turn_input = scale;
        self.refresh_turn_scale();
    }

    /// Queued for the next tick.
    pub fn jump(&mut self) {
        if self.cfg.jump_enabled && !self.state.jumping {
            self.state.jump_requested = true;
        }
    }

    /// Clears every intent so disabled input cannot leave one stuck.
    pub fn stop(&mut self) {
        self.set_drift(false);
        self.set_accelerate(0.0);
        self.set_brake(0.0);
        self.state.turn_input = 0.0;
        self.state.turn_scale = 0.0;
        self.state.jump_requested = false;
    }

    fn refresh_turn_scale(&mut self) {
        self.state.turn_scale = if self.state.drifting {
            self.feel.drift.steering(&self.cfg, self.state.turn_input, self.state.drift_direction)
        } else {
            self.state.turn_input
        };
    }

    // --------------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.cfg
    }

    pub fn anchors(&self) -> &[WheelAnchor] {
        &self.anchors
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn drift_state(&self) -> DriftState {
        self.state.drift_state()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&VehicleEvent) + Send + 'static) {
        self.events.subscribe(listener);
    }

    pub fn drain_events(&mut self) -> Vec<VehicleEvent> {
        self.events.drain()
    }

    /// Read-only copy of the frame for the animator and the network snapshot.
    pub fn snapshot(&self) -> FrameSnapshot {
        let st = &self.state;
        let wheels = st
            .wheels
            .iter()
            .enumerate()
            .map(|(i, w)| WheelSnapshot {
                contact: w.contact,
                distance: w.distance,
                origin: p3(&w.origin),
                point: p3(&w.point),
                suspension_offset: st.suspension_offsets.get(i).copied().unwrap_or(self.cfg.suspension_offset_min),
                suspension_force: st.suspension_forces.get(i).map(v3).unwrap_or([0.0; 3]),
            })
            .collect();

        FrameSnapshot {
            speed_kmh: st.speed_kmh,
            speed_percent: st.speed_percent,
            lateral_kmh: st.lateral_kmh,
            reversing: st.reversing,
            stopped: st.stopped,
            on_ground: st.on_ground,
            wheels_on_ground: st.wheels_on_ground,
            accelerating: st.accelerating,
            accelerate_scale: st.accelerate_scale,
            braking: st.braking,
            brake_scale: st.brake_scale,
            turn_input: st.turn_input,
            turn_scale: st.turn_scale,
            turning: st.turning,
            jumping: st.jumping,
            drift: st.drift_state(),
            drift_direction: st.drift_direction,
            adherence_scale: if st.drifting {
                1.0 - self.cfg.drift_adherence_nerf_percent / 100.0
            } else {
                adherence::recovery_ratio(&self.cfg, &st.drift_recover_timer)
            },
            max_turning_rate: st.max_turning_rate,
            linvel: v3(&st.linvel_world),
            center_of_mass: p3(&st.center_of_mass),
            traction_point: p3(&st.traction_point),
            gravity_force: v3(&st.gravity_force),
            adherence_force: v3(&st.adherence_force),
            acceleration_force: v3(&st.acceleration_force),
            wheels,
        }
    }
}

impl std::fmt::Debug for ArcadeVehicle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcadeVehicle")
            .field("active", &self.active)
            .field("anchors", &self.anchors.len())
            .field("drift", &self.state.drift_state())
            .finish_non_exhaustive()
    }
}
