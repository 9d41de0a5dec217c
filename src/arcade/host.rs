// ==============================================================================
// host.rs — PHYSICS HOST SEAM
// ------------------------------------------------------------------------------
// The arcade pipeline never owns a rigid body. Everything it reads (pose,
// velocities, ray hits) and everything it writes (forces, torques, impulses)
// goes through ChassisBody. physics.rs implements it on top of rapier3d; the
// integration tests implement it on a tiny explicit-Euler body.
//
// Axis convention (chassis local space):
// - up      = +Y
// - forward = +Z
// - right   = -X
// ==============================================================================

use rapier3d::prelude::{Isometry, Point, Ray, Real, Vector, vector};

/// Result of a suspension ray against static world geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: Real,         // along the (unit) ray direction
    pub point: Point<Real>,     // world space
    pub normal: Vector<Real>,   // world space, unit
}

pub trait ChassisBody {
    /// World pose of the chassis.
    fn position(&self) -> Isometry<Real>;
    /// World linear velocity of the center of mass.
    fn linvel(&self) -> Vector<Real>;
    /// World angular velocity (rad/s).
    fn angvel(&self) -> Vector<Real>;
    /// World-space center of mass.
    fn center_of_mass(&self) -> Point<Real>;
    /// World gravity acceleration. The pipeline applies it itself, scaled.
    fn gravity(&self) -> Vector<Real>;

    /// v(p) = v_com + ω × (p - com)
    fn velocity_at_point(&self, p: &Point<Real>) -> Vector<Real> {
        let r = p.coords - self.center_of_mass().coords;
        self.linvel() + self.angvel().cross(&r)
    }

    /// Cast against static geometry only, never against the chassis itself.
    fn cast_ray(&self, ray: &Ray, max_toi: Real) -> Option<RayHit>;

    fn add_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>);
    /// Mass-independent torque: angular acceleration in rad/s² (world).
    fn add_angular_acceleration(&mut self, alpha: Vector<Real>);
    fn apply_impulse_at_point(&mut self, impulse: Vector<Real>, point: Point<Real>);
    fn set_damping(&mut self, linear: Real, angular: Real);
}

#[inline]
pub fn local_up() -> Vector<Real> {
    vector![0.0, 1.0, 0.0]
}

#[inline]
pub fn local_forward() -> Vector<Real> {
    vector![0.0, 0.0, 1.0]
}

#[inline]
pub fn local_right() -> Vector<Real> {
    vector![-1.0, 0.0, 0.0]
}

/// World-space (up, forward, right) of a chassis pose.
#[inline]
pub fn chassis_axes(pose: &Isometry<Real>) -> (Vector<Real>, Vector<Real>, Vector<Real>) {
    let rot = pose.rotation;
    (rot * local_up(), rot * local_forward(), rot * local_right())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_are_right_handed() {
        let (up, fwd, right) = chassis_axes(&Isometry::identity());
        // forward × up points right in a right-handed, +Y up, +Z forward frame
        assert!((fwd.cross(&up) - right).norm() < 1e-6);
    }

    #[test]
    fn axes_follow_rotation() {
        let pose = Isometry::new(Vector::zeros(), vector![0.0, std::f32::consts::FRAC_PI_2, 0.0]);
        let (_, fwd, _) = chassis_axes(&pose);
        assert!((fwd - vector![1.0, 0.0, 0.0]).norm() < 1e-5);
    }
}
