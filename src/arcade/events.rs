//! Fire-and-forget vehicle notifications.

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleEvent {
    StartAccelerate,
    StopAccelerate,
    StartBrake,
    StopBrake,
    StartDrift,
    StopDrift,
    CanDriftStart,
    CanDriftEnd,
    Jump,
    Stop,
    OffGroundStart,
    OffGroundEnd,
}

pub type Listener = Box<dyn FnMut(&VehicleEvent) + Send>;

/// Listeners are called synchronously on emit; their return never reaches the
/// pipeline. Emitted events are also buffered until `drain`.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    pending: Vec<VehicleEvent>,
}

impl EventBus {
    pub fn subscribe(&mut self, listener: impl FnMut(&VehicleEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: VehicleEvent) {
        debug!(?event, "vehicle event");
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
        self.pending.push(event);
    }

    /// Events emitted since the last drain, in order.
    pub fn drain(&mut self) -> Vec<VehicleEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[VehicleEvent] {
        &self.pending
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending)
            .finish()
    }
}
