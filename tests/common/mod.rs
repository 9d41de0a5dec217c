//! Minimal rigid body for driving ArcadeVehicle without rapier: semi-implicit
//! Euler, diagonal inertia, an infinite floor at y = 0.

#![allow(dead_code)]

use std::collections::BTreeMap;

use arcade_physics_server::arcade::{ArcadeVehicle, ChassisBody, RayHit, VehicleConfig};
use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;

pub const DT: Real = 1.0 / 60.0;

pub struct TestBody {
    pub pose: Isometry<Real>,
    pub linvel: Vector<Real>,
    pub angvel: Vector<Real>,
    pub mass: Real,
    pub inertia: Vector<Real>,      // local principal moments
    pub com_local: Point<Real>,
    pub floor: Option<Real>,        // height of the ground plane, None = void
    pub lock_rotation: bool,
    pub frozen: bool,               // forces are recorded but never integrated
    pub linear_damping: Real,
    pub angular_damping: Real,

    force: Vector<Real>,
    torque: Vector<Real>,
    alpha: Vector<Real>,
    pub impulses: Vec<Vector<Real>>,
}

impl TestBody {
    pub fn new(cfg: &VehicleConfig, height: Real) -> Self {
        let m = cfg.mass;
        Self {
            pose: Isometry::translation(0.0, height, 0.0),
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            mass: m,
            inertia: vector![m, m, m],
            com_local: Point::from(Vector::from(cfg.com_offset)),
            floor: Some(0.0),
            lock_rotation: false,
            frozen: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
            force: Vector::zeros(),
            torque: Vector::zeros(),
            alpha: Vector::zeros(),
            impulses: Vec::new(),
        }
    }

    /// Body resting exactly at the suspension target height.
    pub fn at_rest(cfg: &VehicleConfig) -> Self {
        Self::new(cfg, cfg.target_suspension_height)
    }

    pub fn forward_kmh(&self, cfg: &VehicleConfig) -> Real {
        (self.pose.rotation.inverse() * self.linvel).z * cfg.kmh_per_unit()
    }

    /// Forces accumulated since the last step.
    pub fn last_force(&self) -> Vector<Real> {
        self.force
    }

    pub fn last_alpha(&self) -> Vector<Real> {
        self.alpha
    }

    fn world_inverse_inertia(&self, v: &Vector<Real>) -> Vector<Real> {
        let r = self.pose.rotation;
        let local = r.inverse() * v;
        r * local.component_div(&self.inertia)
    }

    /// Integrate accumulated forces then clear them, like a physics step.
    pub fn step(&mut self, dt: Real) {
        if !self.frozen {
            self.linvel += self.force / self.mass * dt;
            self.linvel *= 1.0 / (1.0 + dt * self.linear_damping);
            self.pose.translation.vector += self.linvel * dt;

            if !self.lock_rotation {
                self.angvel += (self.world_inverse_inertia(&self.torque) + self.alpha) * dt;
                self.angvel *= 1.0 / (1.0 + dt * self.angular_damping);
                self.pose.rotation = UnitQuaternion::from_scaled_axis(self.angvel * dt) * self.pose.rotation;
            } else {
                self.angvel = Vector::zeros();
            }
        }
        self.force = Vector::zeros();
        self.torque = Vector::zeros();
        self.alpha = Vector::zeros();
    }
}

impl ChassisBody for TestBody {
    fn position(&self) -> Isometry<Real> {
        self.pose
    }

    fn linvel(&self) -> Vector<Real> {
        self.linvel
    }

    fn angvel(&self) -> Vector<Real> {
        self.angvel
    }

    fn center_of_mass(&self) -> Point<Real> {
        self.pose * self.com_local
    }

    fn gravity(&self) -> Vector<Real> {
        vector![0.0, -9.81, 0.0]
    }

    fn cast_ray(&self, ray: &Ray, max_toi: Real) -> Option<RayHit> {
        let floor = self.floor?;
        if ray.dir.y >= 0.0 {
            return None;
        }
        let toi = (floor - ray.origin.y) / ray.dir.y;
        if !(0.0..=max_toi).contains(&toi) {
            return None;
        }
        Some(RayHit {
            distance: toi * ray.dir.norm(),
            point: ray.point_at(toi),
            normal: vector![0.0, 1.0, 0.0],
        })
    }

    fn add_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>) {
        self.force += force;
        let r = point - self.center_of_mass();
        self.torque += r.cross(&force);
    }

    fn add_angular_acceleration(&mut self, alpha: Vector<Real>) {
        self.alpha += alpha;
    }

    fn apply_impulse_at_point(&mut self, impulse: Vector<Real>, point: Point<Real>) {
        self.impulses.push(impulse);
        if self.frozen {
            return;
        }
        self.linvel += impulse / self.mass;
        let r = point - self.center_of_mass();
        if !self.lock_rotation {
            self.angvel += self.world_inverse_inertia(&r.cross(&impulse));
        }
    }

    fn set_damping(&mut self, linear: Real, angular: Real) {
        self.linear_damping = linear;
        self.angular_damping = angular;
    }
}

/// Four wheels at chassis height, 0.8 to the sides, 1.3 fore and aft.
pub fn four_wheel_rig() -> BTreeMap<String, [f32; 3]> {
    [
        ("wheel_fl", [0.8, 0.0, 1.3]),
        ("wheel_fr", [-0.8, 0.0, 1.3]),
        ("wheel_rl", [0.8, 0.0, -1.3]),
        ("wheel_rr", [-0.8, 0.0, -1.3]),
    ]
    .into_iter()
    .map(|(name, p)| (name.to_string(), p))
    .collect()
}

pub fn active_vehicle(cfg: VehicleConfig) -> ArcadeVehicle {
    let mut vehicle = ArcadeVehicle::new(cfg);
    let rig = four_wheel_rig();
    vehicle.activate(Some(&rig)).expect("rig has every bone");
    vehicle
}

/// One pipeline tick followed by one integration step.
pub fn tick(vehicle: &mut ArcadeVehicle, body: &mut TestBody, dt: Real) {
    vehicle.tick(body, dt);
    body.step(dt);
}

/// Pins the body to a forward speed, on the ground, before each tick.
pub fn cruise(body: &mut TestBody, cfg: &VehicleConfig, kmh: Real) {
    body.frozen = true;
    body.linvel = body.pose.rotation * vector![0.0, 0.0, kmh / cfg.kmh_per_unit()];
}
