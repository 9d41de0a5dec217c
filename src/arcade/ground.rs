//! Ground state tracker: contact count vs threshold, one event per transition.

use super::events::VehicleEvent;
use super::types::{FrameState, WheelSample};

pub fn count_contacts(wheels: &[WheelSample]) -> usize {
    wheels.iter().filter(|w| w.contact).count()
}

/// A threshold of 0 would make a vehicle with no wheels "grounded"; treat it as 1.
pub fn is_on_ground(contacts: usize, threshold: usize) -> bool {
    contacts >= threshold.max(1)
}

/// The only place `on_ground` is written.
pub fn update(state: &mut FrameState, threshold: usize) -> Option<VehicleEvent> {
    let contacts = count_contacts(&state.wheels);
    let grounded = is_on_ground(contacts, threshold);
    let was = state.on_ground;

    state.wheels_on_ground = contacts;
    state.on_ground = grounded;

    match (was, grounded) {
        (false, true) => Some(VehicleEvent::OffGroundEnd),
        (true, false) => Some(VehicleEvent::OffGroundStart),
        _ => None,
    }
}
