// ==============================================================================
// sensor.rs — RAYCAST SUSPENSION SENSOR
// ------------------------------------------------------------------------------
// One ray per anchor, from the anchor's world position straight down the
// chassis up axis. Exactly one WheelSample per anchor per tick.
// ==============================================================================

use rapier3d::prelude::{Ray, Real};

use super::host::{ChassisBody, chassis_axes};
use super::types::{WheelAnchor, WheelSample};

/// Overwrites `out` with a fresh sample for every anchor.
pub fn sample_wheels(
    body: &dyn ChassisBody,
    anchors: &[WheelAnchor],
    ray_length: Real,
    out: &mut Vec<WheelSample>,
) {
    let pose = body.position();
    let (up, _, _) = chassis_axes(&pose);

    out.clear();
    for anchor in anchors {
        let origin = pose * anchor.local;
        let ray = Ray::new(origin, -up);

        let sample = match body.cast_ray(&ray, ray_length) {
            Some(hit) if hit.distance <= ray_length => WheelSample {
                contact: true,
                distance: hit.distance,
                origin,
                point: hit.point,
                normal: hit.normal,
            },
            _ => WheelSample::airborne(origin, up, ray_length),
        };
        out.push(sample);
    }
}
