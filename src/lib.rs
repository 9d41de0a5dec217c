//! Authoritative arcade vehicle physics server.
//!
//! `arcade` holds the engine-agnostic vehicle pipeline; the remaining modules
//! host it on rapier3d and serve it over WebSocket.

pub mod arcade;
pub mod config;
pub mod controller;
pub mod debug_builders;
pub mod error;
pub mod net;
pub mod physics;
pub mod state;
