// ==============================================================================
// physics.rs — RAPIER HOST FOR ARCADE VEHICLES
// ------------------------------------------------------------------------------
// Owns the rapier world (static ground + chassis bodies) and exposes each
// chassis to the arcade pipeline through RapierChassis, the ChassisBody
// adapter. Chassis bodies have gravity_scale 0: the pipeline applies its own
// scaled gravity.
//
// Per server tick:
//   reset_forces() -> update_queries() -> [pipeline ticks] -> step()
// User forces persist in rapier until reset, so reset_forces must run first.
// ==============================================================================

use nalgebra::Matrix3;
use rapier3d::prelude::*;
use tracing::{info, warn};

use crate::arcade::{ChassisBody, RayHit, VehicleConfig};

const GROUP_GROUND: Group  = Group::GROUP_1;
const GROUP_CHASSIS: Group = Group::GROUP_2;

/// Bodies past this distance (or non-finite) are teleported back.
const SAFE_EXTENT: Real = 1_000.0;

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,              // gravity vector
    pub pipeline: PhysicsPipeline,          // physics pipeline
    pub island_manager: IslandManager,      // manages islands of bodies
    pub broad_phase: DefaultBroadPhase,     // broad-phase collision detection
    pub narrow_phase: NarrowPhase,          // collision detection
    pub bodies: RigidBodySet,               // for rigid bodies
    pub colliders: ColliderSet,             // for collision shapes
    pub joints: ImpulseJointSet,            // for constraints
    pub multibody_joints: MultibodyJointSet,// for articulated bodies
    pub ccd: CCDSolver,                     // continuous collision detection
    pub query_pipeline: QueryPipeline,      // for suspension raycasts
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // === Big static ground box, top surface exactly at y = 0 ===
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(
            "🌎 Ground inserted. Bodies = {}, Colliders = {}",
            bodies.len(),
            colliders.len()
        );

        let mut world = Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        };
        world.update_queries();
        world
    }

    /// Dynamic box chassis with the configured mass and center of mass
    /// offset. The collider itself is massless.
    pub fn spawn_chassis(
        &mut self,
        cfg: &VehicleConfig,
        half_extents: [f32; 3],
        position: [f32; 3],
    ) -> RigidBodyHandle {
        let [hx, hy, hz] = half_extents;
        let [cx, cy, cz] = cfg.com_offset;
        let m = cfg.mass;

        // Solid box inertia about its center.
        let inertia = vector![
            m / 3.0 * (hy * hy + hz * hz),
            m / 3.0 * (hx * hx + hz * hz),
            m / 3.0 * (hx * hx + hy * hy)
        ];
        let mprops = MassProperties::new(point![cx, cy, cz], m, inertia);

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .gravity_scale(0.0)
            .linear_damping(cfg.linear_damping)
            .angular_damping(cfg.angular_damping)
            .additional_mass_properties(mprops)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .density(0.0)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);

        info!("🚗 Spawned chassis at {:?} (body = {:?})", position, handle);
        handle
    }

    pub fn remove_chassis(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Clear forces/torques accumulated by the previous tick.
    pub fn reset_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.reset_forces(false);
                body.reset_torques(false);
            }
        }
    }

    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    /// ChassisBody view of one body, valid until the next mutable use of the world.
    pub fn chassis(&mut self, handle: RigidBodyHandle) -> Option<RapierChassis<'_>> {
        self.bodies.get(handle)?;
        Some(RapierChassis {
            handle,
            gravity: self.gravity,
            bodies: &mut self.bodies,
            colliders: &self.colliders,
            query_pipeline: &self.query_pipeline,
        })
    }

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        // Safety: prevent bodies from exploding to insane coordinates
        for (handle, body) in self.bodies.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let pos = *body.translation();
            let bad = !pos.x.is_finite() || !pos.y.is_finite() || !pos.z.is_finite()
                || pos.x.abs() > SAFE_EXTENT || pos.y.abs() > SAFE_EXTENT || pos.z.abs() > SAFE_EXTENT;

            if bad {
                let safe = vector![0.0, 2.0, 0.0];
                body.set_position(Isometry::translation(safe.x, safe.y, safe.z), true);
                body.set_linvel(Vector::zeros(), true);
                body.set_angvel(Vector::zeros(), true);
                warn!("⚠️ Reset exploding body {:?} back to {:?}", handle, safe);
            }
        }
    }
}

/// Borrowed view of one chassis inside a PhysicsWorld.
pub struct RapierChassis<'a> {
    handle: RigidBodyHandle,
    gravity: Vector<Real>,
    bodies: &'a mut RigidBodySet,
    colliders: &'a ColliderSet,
    query_pipeline: &'a QueryPipeline,
}

impl RapierChassis<'_> {
    fn body(&self) -> &RigidBody {
        &self.bodies[self.handle]
    }

    fn body_mut(&mut self) -> &mut RigidBody {
        &mut self.bodies[self.handle]
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }
}

impl ChassisBody for RapierChassis<'_> {
    fn position(&self) -> Isometry<Real> {
        *self.body().position()
    }

    fn linvel(&self) -> Vector<Real> {
        *self.body().linvel()
    }

    fn angvel(&self) -> Vector<Real> {
        *self.body().angvel()
    }

    fn center_of_mass(&self) -> Point<Real> {
        *self.body().center_of_mass()
    }

    fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    fn cast_ray(&self, ray: &Ray, max_toi: Real) -> Option<RayHit> {
        // Static geometry only, never the chassis itself.
        let filter = QueryFilter::only_fixed().exclude_rigid_body(self.handle);
        let (_, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &*self.bodies,
            self.colliders,
            ray,
            max_toi,
            true,
            filter,
        )?;

        let scale = ray.dir.norm();
        Some(RayHit {
            distance: hit.time_of_impact * scale,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
        })
    }

    fn add_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>) {
        self.body_mut().add_force_at_point(force, point, true);
    }

    fn add_angular_acceleration(&mut self, alpha: Vector<Real>) {
        // τ = I_world α, with I_world = R I_local Rᵀ
        let body = self.body();
        let rot = body.position().rotation.to_rotation_matrix();
        let local: Matrix3<Real> = body.mass_properties().local_mprops.reconstruct_inertia_matrix();
        let world = rot.matrix() * local * rot.matrix().transpose();
        let torque = world * alpha;
        self.body_mut().add_torque(torque, true);
    }

    fn apply_impulse_at_point(&mut self, impulse: Vector<Real>, point: Point<Real>) {
        self.body_mut().apply_impulse_at_point(impulse, point, true);
    }

    fn set_damping(&mut self, linear: Real, angular: Real) {
        let body = self.body_mut();
        body.set_linear_damping(linear);
        body.set_angular_damping(angular);
    }
}
