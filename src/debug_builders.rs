// ==============================================================================
// debug_builders.rs — DEBUG OVERLAY PRIMITIVES (SERVER -> CLIENT)
// ------------------------------------------------------------------------------
// Defines serializable debug primitives built from a vehicle FrameSnapshot:
// - DebugRay: suspension raycasts, colored by compression
// - DebugArrow: force vectors (momentum, gravity, suspension, adherence,
//   propulsion)
// - DebugChassis: pose + box size
//
// Helpers:
// - build_overlay(): one overlay per vehicle per tick
// - compression_color(): green (extended) -> red (fully compressed)
//
// This file is purely visualization scaffolding and should not contain physics
// side effects.
// ==============================================================================

use rapier3d::prelude::*;
use serde::Serialize;

use crate::arcade::FrameSnapshot;

/// Force arrows are drawn at `force * FORCE_SCALE / mass` world units.
const FORCE_SCALE: f32 = 0.05;

const MISS_COLOR: [f32; 3] = [1.0, 0.0, 0.0];
const MOMENTUM_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const GRAVITY_COLOR: [f32; 3] = [0.6, 0.6, 0.6];
const SUSPENSION_COLOR: [f32; 3] = [0.2, 0.6, 1.0];
const ADHERENCE_COLOR: [f32; 3] = [1.0, 0.8, 0.0];
const PROPULSION_COLOR: [f32; 3] = [0.0, 1.0, 0.4];

#[derive(Clone, Debug, Default, Serialize)]
pub struct DebugOverlay {
    pub chassis: Option<DebugChassis>,
    pub suspension_rays: Vec<DebugRay>,
    pub forces: Vec<DebugArrow>,
    pub center_of_mass: [f32; 3],
    pub traction_point: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugRay {
    pub origin: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugChassis {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion
    pub half_extents: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugArrow {
    pub label: &'static str,
    pub origin: [f32; 3],
    pub vector: [f32; 3],
    pub color: [f32; 3],
}

/// 0 = fully extended (green), 1 = fully compressed (red).
pub fn compression_color(distance: f32, ray_length: f32) -> [f32; 3] {
    let ratio = if ray_length > 0.0 {
        (1.0 - distance / ray_length).clamp(0.0, 1.0)
    } else {
        0.0
    };
    [ratio, 1.0 - ratio, 0.0]
}

fn arrow(label: &'static str, origin: [f32; 3], force: [f32; 3], mass: f32, color: [f32; 3]) -> Option<DebugArrow> {
    if force == [0.0; 3] {
        return None;
    }
    let s = FORCE_SCALE / mass.max(f32::EPSILON);
    Some(DebugArrow {
        label,
        origin,
        vector: [force[0] * s, force[1] * s, force[2] * s],
        color,
    })
}

pub fn build_overlay(
    snap: &FrameSnapshot,
    pose: &Isometry<Real>,
    half_extents: [f32; 3],
    ray_length: f32,
    mass: f32,
) -> DebugOverlay {
    let q = pose.rotation;
    let t = pose.translation.vector;

    let suspension_rays = snap
        .wheels
        .iter()
        .map(|w| DebugRay {
            origin: w.origin,
            length: if w.contact { w.distance } else { ray_length },
            hit: w.contact.then_some(w.point),
            color: if w.contact {
                compression_color(w.distance, ray_length)
            } else {
                MISS_COLOR
            },
        })
        .collect();

    let com = snap.center_of_mass;
    let mut forces: Vec<DebugArrow> = snap
        .wheels
        .iter()
        .filter_map(|w| arrow("suspension", w.origin, w.suspension_force, mass, SUSPENSION_COLOR))
        .collect();
    let momentum = snap.linvel.map(|v| v * mass);
    forces.extend(arrow("momentum", com, momentum, mass, MOMENTUM_COLOR));
    forces.extend(arrow("gravity", com, snap.gravity_force, mass, GRAVITY_COLOR));
    forces.extend(arrow("adherence", com, snap.adherence_force, mass, ADHERENCE_COLOR));
    forces.extend(arrow(
        "propulsion",
        snap.traction_point,
        snap.acceleration_force,
        mass,
        PROPULSION_COLOR,
    ));

    DebugOverlay {
        chassis: Some(DebugChassis {
            position: [t.x, t.y, t.z],
            rotation: [q.i, q.j, q.k, q.w],
            half_extents,
        }),
        suspension_rays,
        forces,
        center_of_mass: com,
        traction_point: snap.traction_point,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::WheelSnapshot;

    #[test]
    fn rays_are_colored_by_compression_and_misses_are_red() {
        let snap = FrameSnapshot {
            wheels: vec![
                WheelSnapshot { contact: true, distance: 1.1, ..Default::default() },
                WheelSnapshot { contact: true, distance: 0.0, ..Default::default() },
                WheelSnapshot { contact: false, ..Default::default() },
            ],
            ..Default::default()
        };
        let overlay = build_overlay(&snap, &Isometry::identity(), [1.0; 3], 1.1, 100.0);

        assert_eq!(overlay.suspension_rays[0].color, [0.0, 1.0, 0.0]);
        assert_eq!(overlay.suspension_rays[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(overlay.suspension_rays[2].color, MISS_COLOR);
        assert!(overlay.suspension_rays[2].hit.is_none());
        assert_eq!(overlay.suspension_rays[2].length, 1.1);
    }

    #[test]
    fn zero_forces_are_not_drawn() {
        let snap = FrameSnapshot {
            gravity_force: [0.0, -2943.0, 0.0],
            ..Default::default()
        };
        let overlay = build_overlay(&snap, &Isometry::identity(), [1.0; 3], 1.1, 100.0);
        assert_eq!(overlay.forces.len(), 1);
        assert_eq!(overlay.forces[0].label, "gravity");
        assert!((overlay.forces[0].vector[1] + 2943.0 * FORCE_SCALE / 100.0).abs() < 1e-4);
    }

    #[test]
    fn momentum_arrow_follows_velocity() {
        let snap = FrameSnapshot { linvel: [0.0, 0.0, 20.0], ..Default::default() };
        let overlay = build_overlay(&snap, &Isometry::identity(), [1.0; 3], 1.1, 100.0);
        let momentum = overlay.forces.iter().find(|a| a.label == "momentum").unwrap();
        assert!((momentum.vector[2] - 20.0 * FORCE_SCALE).abs() < 1e-5);
    }
}
