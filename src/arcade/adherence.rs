//! Lateral grip: a force along chassis right opposing sideways slip.

use rapier3d::prelude::Real;

use super::config::VehicleConfig;
use super::timer::Timer;
use super::types::FrameState;

/// 0 right after a drift ends, 1 after `drift_recover_duration`. A stopped
/// timer means no drift has ended yet: full grip.
pub fn recovery_ratio(cfg: &VehicleConfig, timer: &Timer) -> Real {
    match timer.elapsed() {
        None => 1.0,
        Some(_) if cfg.drift_recover_duration <= 0.0 => 1.0,
        Some(t) => (t / cfg.drift_recover_duration).clamp(0.0, 1.0),
    }
}

/// Signed magnitude along chassis right. Zero while airborne.
pub fn lateral_force(cfg: &VehicleConfig, state: &FrameState) -> Real {
    if !state.on_ground {
        return 0.0;
    }

    let slip = -(state.lateral_kmh / cfg.max_speed);
    let force = slip * cfg.mass * cfg.adherence;

    if state.drifting {
        force - force * (cfg.drift_adherence_nerf_percent / 100.0)
    } else {
        force * recovery_ratio(cfg, &state.drift_recover_timer)
    }
}
