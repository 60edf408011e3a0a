//! Voxel Guard - anti-cheat core for a voxel-world multiplayer server
//!
//! The library exposes the action-rate limiter and movement validator plus the
//! world abstractions they sample. The `voxel_guard` binary wraps them with a
//! maintenance loop and a WebSocket admin bridge.

pub mod admin;
pub mod anticheat;
pub mod app;
pub mod config;
pub mod util;
pub mod world;

pub use anticheat::{Action, AntiCheat, ActionRateLimiter, MovementAntiCheat};
pub use config::{AntiCheatConfig, Config};
