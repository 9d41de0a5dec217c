// ==============================================================================
// state.rs — SHARED GAME STATE
// ------------------------------------------------------------------------------
// One Entity per connected player: a rapier chassis body driven by an
// ArcadeVehicle, an Animator for the visual feedback, and the controller that
// gates input. The tick loop in main.rs drives it:
//
//   apply_inputs() -> [physics reset + queries] -> tick_vehicles()
//   -> [physics step] -> update_feedback() -> broadcast_snapshot()
// ==============================================================================

use std::collections::HashMap;

use rapier3d::prelude::{Real, RigidBodyHandle, RigidBodySet};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};
use uuid::Uuid;

use crate::arcade::{AnimationFeedback, Animator, ArcadeVehicle, FrameSnapshot, VehicleEvent};
use crate::config::ServerConfig;
use crate::controller::{ControlInput, VehicleController};
use crate::debug_builders::{DebugOverlay, build_overlay};
use crate::error::VehicleError;
use crate::physics::PhysicsWorld;

pub struct Entity {
    pub id: String,
    pub body_handle: RigidBodyHandle,
    pub vehicle: ArcadeVehicle,
    pub animator: Animator,
    pub controller: VehicleController,
    pub pending_input: Option<ControlInput>,    // latest input, applied next tick
    pub pending_movement: Option<bool>,
    pub frame: FrameSnapshot,
    pub feedback: AnimationFeedback,
    pub events: Vec<VehicleEvent>,              // emitted during the last tick
}

#[derive(Serialize)]
pub struct VehicleSnapshot<'a> {
    pub id: &'a str,
    pub position: [f32; 3],
    pub rotation: [f32; 4],     // quaternion (x, y, z, w)
    pub frame: &'a FrameSnapshot,
    pub animation: &'a AnimationFeedback,
    pub events: &'a [VehicleEvent],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugOverlay>,
}

/// Everything the server sends, tagged by `type`.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage<'a> {
    Welcome { player_id: &'a str },
    Pong,
    Snapshot { tick: u64, vehicles: Vec<VehicleSnapshot<'a>> },
}

impl ServerMessage<'_> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub struct SharedGameState {
    pub tick: u64,
    pub config: ServerConfig,
    pub clients: Vec<UnboundedSender<String>>,
    pub entities: HashMap<String, Entity>,
}

impl SharedGameState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            tick: 0,
            config,
            clients: Vec::new(),
            entities: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) {
        self.clients.push(tx);
    }

    /// Spawn a chassis body and an activated vehicle for a new player.
    pub fn spawn_vehicle(&mut self, phys: &mut PhysicsWorld) -> Result<String, VehicleError> {
        let cfg = &self.config;
        let mut vehicle = ArcadeVehicle::new(cfg.vehicle.clone());
        vehicle.activate(Some(&cfg.rig))?;

        let body_handle = phys.spawn_chassis(
            &cfg.vehicle,
            cfg.rig.chassis_half_extents,
            [0.0, cfg.rig.spawn_height, 0.0],
        );

        let id = Uuid::new_v4().to_string();
        let entity = Entity {
            id: id.clone(),
            body_handle,
            vehicle,
            animator: Animator::new(cfg.animator.clone(), &cfg.vehicle),
            controller: VehicleController::default(),
            pending_input: None,
            pending_movement: None,
            frame: FrameSnapshot::default(),
            feedback: AnimationFeedback::default(),
            events: Vec::new(),
        };
        self.entities.insert(id.clone(), entity);
        Ok(id)
    }

    pub fn remove_entity(&mut self, id: &str, phys: &mut PhysicsWorld) {
        if let Some(entity) = self.entities.remove(id) {
            phys.remove_chassis(entity.body_handle);
            info!("🗑️ Removed vehicle {}", id);
        }
    }

    /// Latest input wins, but a jump press survives until the next tick.
    pub fn queue_input(&mut self, id: &str, mut input: ControlInput) {
        if let Some(entity) = self.entities.get_mut(id) {
            input.jump |= entity.pending_input.is_some_and(|p| p.jump);
            entity.pending_input = Some(input);
        }
    }

    pub fn queue_movement(&mut self, id: &str, enabled: bool) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.pending_movement = Some(enabled);
        }
    }

    /// Hand queued inputs to the controllers. Must run before tick_vehicles.
    pub fn apply_inputs(&mut self) {
        for entity in self.entities.values_mut() {
            if let Some(enabled) = entity.pending_movement.take() {
                entity.controller.set_movement_enabled(&mut entity.vehicle, enabled);
            }
            if let Some(input) = entity.pending_input.take() {
                entity.controller.apply(&mut entity.vehicle, &input);
            }
        }
    }

    /// Run every vehicle pipeline against its chassis. Forces land in rapier
    /// and take effect on the following `PhysicsWorld::step`.
    pub fn tick_vehicles(&mut self, phys: &mut PhysicsWorld, dt: Real) {
        for entity in self.entities.values_mut() {
            match phys.chassis(entity.body_handle) {
                Some(mut chassis) => entity.vehicle.tick(&mut chassis, dt),
                None => warn!("⚠️ Vehicle {} lost its body", entity.id),
            }
        }
    }

    /// Snapshot each vehicle, run its animator and collect tick events.
    pub fn update_feedback(&mut self, dt: Real) {
        for entity in self.entities.values_mut() {
            entity.frame = entity.vehicle.snapshot();
            entity.feedback = entity.animator.update(&entity.frame, dt);
            entity.events = entity.vehicle.drain_events();
        }
        self.tick += 1;
    }

    pub fn snapshot_json(&self, bodies: &RigidBodySet) -> Result<String, serde_json::Error> {
        let vcfg = &self.config.vehicle;
        let mut vehicles = Vec::with_capacity(self.entities.len());

        for entity in self.entities.values() {
            let Some(body) = bodies.get(entity.body_handle) else {
                continue;
            };
            let pose = body.position();
            let t = pose.translation.vector;
            let q = pose.rotation;

            vehicles.push(VehicleSnapshot {
                id: &entity.id,
                position: [t.x, t.y, t.z],
                rotation: [q.i, q.j, q.k, q.w],
                frame: &entity.frame,
                animation: &entity.feedback,
                events: &entity.events,
                debug: self.config.debug_overlay.then(|| {
                    build_overlay(
                        &entity.frame,
                        pose,
                        self.config.rig.chassis_half_extents,
                        vcfg.suspension_ray_length,
                        vcfg.mass,
                    )
                }),
            });
        }

        ServerMessage::Snapshot { tick: self.tick, vehicles }.to_json()
    }

    /// Build and send a snapshot of all vehicles to all clients. Closed
    /// client channels are dropped.
    pub fn broadcast_snapshot(&mut self, bodies: &RigidBodySet) -> Result<(), serde_json::Error> {
        let json = self.snapshot_json(bodies)?;
        self.clients.retain(|tx| tx.send(json.clone()).is_ok());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(game: &mut SharedGameState, phys: &mut PhysicsWorld, ticks: usize) {
        let dt = game.config.tick_dt();
        for _ in 0..ticks {
            game.apply_inputs();
            phys.reset_forces();
            phys.update_queries();
            game.tick_vehicles(phys, dt);
            phys.step(dt);
            game.update_feedback(dt);
        }
    }

    #[test]
    fn spawned_vehicle_settles_on_its_suspension() {
        let mut phys = PhysicsWorld::new();
        let mut game = SharedGameState::new(ServerConfig::default());
        let id = game.spawn_vehicle(&mut phys).unwrap();

        run(&mut game, &mut phys, 240);

        let entity = &game.entities[&id];
        assert!(entity.frame.on_ground);
        assert_eq!(entity.frame.wheels_on_ground, 4);
        let y = phys.bodies[entity.body_handle].translation().y;
        // four springs carrying 3g settle near target height minus sag
        assert!(y > 0.6 && y < 0.85, "rest height {y}");
    }

    #[test]
    fn throttle_input_drives_forward() {
        let mut phys = PhysicsWorld::new();
        let mut game = SharedGameState::new(ServerConfig::default());
        let id = game.spawn_vehicle(&mut phys).unwrap();
        run(&mut game, &mut phys, 120);

        game.queue_input(&id, ControlInput { accelerate: 1.0, ..Default::default() });
        run(&mut game, &mut phys, 60);

        let frame = &game.entities[&id].frame;
        assert!(frame.accelerating);
        assert!(frame.speed_kmh > 10.0, "speed {}", frame.speed_kmh);
        assert!(frame.speed_kmh <= game.config.vehicle.max_speed);
    }

    #[test]
    fn snapshot_is_tagged_and_removal_frees_the_body() {
        let mut phys = PhysicsWorld::new();
        let mut game = SharedGameState::new(ServerConfig { debug_overlay: true, ..Default::default() });
        let id = game.spawn_vehicle(&mut phys).unwrap();
        run(&mut game, &mut phys, 1);

        let json: serde_json::Value = serde_json::from_str(&game.snapshot_json(&phys.bodies).unwrap()).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["vehicles"][0]["id"], id.as_str());
        assert!(json["vehicles"][0]["debug"].is_object());

        let handle = game.entities[&id].body_handle;
        game.remove_entity(&id, &mut phys);
        assert!(game.entities.is_empty());
        assert!(phys.bodies.get(handle).is_none());
    }

    #[test]
    fn closed_clients_are_pruned() {
        let phys = PhysicsWorld::new();
        let mut game = SharedGameState::new(ServerConfig::default());
        let (tx_open, mut rx_open) = tokio::sync::mpsc::unbounded_channel();
        let (tx_closed, rx_closed) = tokio::sync::mpsc::unbounded_channel();
        drop(rx_closed);
        game.register_client(tx_open);
        game.register_client(tx_closed);

        game.broadcast_snapshot(&phys.bodies).unwrap();
        assert_eq!(game.clients.len(), 1);
        assert!(rx_open.try_recv().is_ok());
    }
}
