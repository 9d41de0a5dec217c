// ==============================================================================
// drift.rs — DRIFT ELIGIBILITY + STEERING LOCK
// ------------------------------------------------------------------------------
// NotDrifting -> DriftEligible: grounded, speed% >= min and |turn| >= min
//   held continuously for `drift_start_delay` (timer restarts on any break).
// DriftEligible -> Drifting: explicit drift input.
// While drifting the steering input is biased toward the drift side and
// clamped to that half of the range.
// ==============================================================================

use rapier3d::prelude::Real;

use super::config::VehicleConfig;
use super::timer::Timer;

/// New `can_drift` value. Only evaluated while not drifting.
pub fn eligibility(
    cfg: &VehicleConfig,
    speed_percent: Real,
    turn_input: Real,
    can_drift: bool,
    timer: &mut Timer,
    dt: Real,
) -> bool {
    if speed_percent < cfg.drift_min_speed_percent
        || turn_input.abs() < cfg.drift_min_turning_scale
    {
        timer.stop();
        return false;
    }
    let held = timer.start_or_tick(dt);
    can_drift || held >= cfg.drift_start_delay
}

/// -1 / 1 from the steering sign at engage time.
pub fn direction_from_input(turn_input: Real) -> i8 {
    if turn_input > 0.0 { 1 } else { -1 }
}

/// Effective steering scale for a raw input and drift direction.
pub fn steering(cfg: &VehicleConfig, turn_input: Real, direction: i8) -> Real {
    let offset = cfg.drift_turning_offset;
    match direction {
        d if d < 0 => (turn_input - offset).clamp(-1.0, 0.0),
        d if d > 0 => (turn_input + offset).clamp(0.0, 1.0),
        _ => turn_input,
    }
}
