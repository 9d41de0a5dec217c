// ==============================================================================
// controller.rs — INPUT CONTROLLER
// ------------------------------------------------------------------------------
// Thin layer between a client's input message and the vehicle control
// surface. No physics here: it only forwards intents, and only while movement
// is enabled. Disabling movement clears every intent on the vehicle.
// ==============================================================================

use serde::Deserialize;

use crate::arcade::ArcadeVehicle;

/// One client input frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlInput {
    pub accelerate: f32,    // 0..1
    pub brake: f32,         // 0..1
    pub turn: f32,          // -1 (left) .. 1 (right)
    pub drift: bool,
    pub jump: bool,
}

#[derive(Debug, Clone)]
pub struct VehicleController {
    movement_enabled: bool,
    accelerate_axis: f32,   // remembered so re-enabling resumes throttle
    brake_axis: f32,
}

impl Default for VehicleController {
    fn default() -> Self {
        Self {
            movement_enabled: true,
            accelerate_axis: 0.0,
            brake_axis: 0.0,
        }
    }
}

impl VehicleController {
    pub fn is_movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    pub fn set_movement_enabled(&mut self, vehicle: &mut ArcadeVehicle, enable: bool) {
        self.movement_enabled = enable;
        if enable {
            self.accelerate(vehicle, self.accelerate_axis);
        } else {
            vehicle.stop();
        }
    }

    pub fn accelerate(&mut self, vehicle: &mut ArcadeVehicle, axis: f32) {
        self.accelerate_axis = axis;
        if self.movement_enabled {
            vehicle.set_accelerate(axis);
        }
    }

    pub fn brake(&mut self, vehicle: &mut ArcadeVehicle, axis: f32) {
        self.brake_axis = axis;
        if self.movement_enabled {
            vehicle.set_brake(axis);
        }
    }

    pub fn turn(&mut self, vehicle: &mut ArcadeVehicle, axis: f32) {
        if self.movement_enabled {
            vehicle.set_turn(axis);
        }
    }

    pub fn drift(&mut self, vehicle: &mut ArcadeVehicle, drift: bool) {
        if self.movement_enabled {
            vehicle.set_drift(drift);
        }
    }

    pub fn jump(&mut self, vehicle: &mut ArcadeVehicle) {
        if self.movement_enabled {
            vehicle.jump();
        }
    }

    /// Forward a whole input frame. Brake is applied after accelerate so a
    /// frame holding both ends up braking.
    pub fn apply(&mut self, vehicle: &mut ArcadeVehicle, input: &ControlInput) {
        self.accelerate(vehicle, input.accelerate);
        self.brake(vehicle, input.brake);
        self.turn(vehicle, input.turn);
        self.drift(vehicle, input.drift);
        if input.jump {
            self.jump(vehicle);
        }
    }

    pub fn last_axes(&self) -> (f32, f32) {
        (self.accelerate_axis, self.brake_axis)
    }
}
