//! Read-only view of the game world as seen by the anti-cheat core
//!
//! The host engine owns the world. Everything here is either a plain value
//! type or a trait the host implements so the core can sample block state
//! without mutating it.

pub mod block;
pub mod context;
pub mod geometry;
pub mod player;

pub use block::{BlockKind, EntityKind, EntityTarget, Hand, ItemKind, WorldView};
pub use context::BlockContext;
pub use geometry::{Aabb, BlockPos, Vec3};
pub use player::{Effects, PlayerStatus};

use uuid::Uuid;

/// Stable per-session player identity supplied by the host
pub type PlayerId = Uuid;
