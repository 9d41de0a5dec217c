// ==============================================================================
// propulsion.rs — ACCELERATE / BRAKE / REVERSE
// ------------------------------------------------------------------------------
// Forces are signed magnitudes along chassis forward, applied by the
// orchestrator at center of mass + traction offset.
//
// - Accelerate: mass * accel * (1 - speed/max)^10 * scale, zero at/above max.
// - Brake: constant mass * brake * scale while moving forward, never strong
//   enough to flip the vehicle into reverse within one step.
// - Reverse: only after `reverse_delay` seconds of braking while stopped,
//   capped so reverse speed never passes `max_reverse_speed`.
// ==============================================================================

use rapier3d::prelude::Real;

use super::config::VehicleConfig;
use super::types::FrameState;

/// Exponent of the acceleration falloff curve.
pub const ACCELERATION_CURVE: i32 = 10;

/// (1 - speed/max)^10 for forward speed; full strength when stopped or reversing.
pub fn acceleration_curve(speed_kmh: Real, max_speed: Real) -> Real {
    let ratio = (1.0 - speed_kmh.max(0.0) / max_speed).clamp(0.0, 1.0);
    ratio.powi(ACCELERATION_CURVE)
}

pub fn acceleration_force(cfg: &VehicleConfig, state: &FrameState, dt: Real) -> Real {
    if state.speed_kmh.abs() >= cfg.max_speed {
        return 0.0;
    }

    let mut force = cfg.mass * cfg.acceleration
        * acceleration_curve(state.speed_kmh, cfg.max_speed)
        * state.accelerate_scale;
    if state.drifting {
        force *= cfg.drift_acceleration_compensation;
    }

    // Never push past max speed within a single step.
    if dt > 0.0 && force > 0.0 {
        let max_units = cfg.max_speed / cfg.kmh_per_unit();
        let headroom = cfg.mass * (max_units - state.linvel_local.z) / dt;
        force = force.min(headroom.max(0.0));
    }
    force
}

/// Advances the reverse delay timer and returns the signed forward force.
pub fn braking_force(cfg: &VehicleConfig, state: &mut FrameState, dt: Real) -> Real {
    let forward_units = state.linvel_local.z;

    if state.speed_kmh >= cfg.stopped_speed_band {
        // Still rolling forward: plain braking, reverse timer not running.
        state.reverse_timer.stop();
        let force = cfg.mass * cfg.brake * state.brake_scale;
        let stopping = if dt > 0.0 { cfg.mass * forward_units / dt } else { force };
        return -force.min(stopping.max(0.0));
    }

    let held = state.reverse_timer.start_or_tick(dt);
    if held < cfg.reverse_delay {
        return 0.0;
    }
    if -state.speed_kmh >= cfg.max_reverse_speed {
        return 0.0;
    }

    let mut force = cfg.mass * cfg.brake * state.brake_scale;
    if dt > 0.0 {
        let max_units = cfg.max_reverse_speed / cfg.kmh_per_unit();
        let headroom = cfg.mass * (max_units + forward_units) / dt;
        force = force.min(headroom.max(0.0));
    }
    -force
}
