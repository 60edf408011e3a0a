//! Block, item and entity categories plus the world oracle

use serde::{Deserialize, Serialize};

use super::geometry::{Aabb, BlockPos, Vec3};

/// Coarse block category; the host maps its concrete block registry onto these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Air,
    /// Ordinary full collision cube
    Solid,
    /// Instant-break terrain: crops, grass, flowers, saplings
    Harvestable,
    Water,
    Lava,
    /// Ice variants; full cube with low friction
    Ice,
    Slab,
    Stairs,
    /// Ladders, vines, scaffolding
    Climbable,
    /// Fences and walls (taller than a block)
    Barrier,
    /// Doors, trapdoors, fence gates, buttons, levers
    Door,
    /// Chests, barrels, furnaces and other inventories
    Container,
    /// Slime blocks and beds
    Bouncy,
    /// Cobweb, powder snow, honey; slows or suspends the player
    Sticky,
    /// Carpets, lily pads, snow layers
    Thin,
}

impl BlockKind {
    /// Height of the collision shape inside the block cell, if any
    pub fn collision_height(self) -> Option<f64> {
        match self {
            BlockKind::Solid | BlockKind::Ice | BlockKind::Container | BlockKind::Bouncy => Some(1.0),
            BlockKind::Slab | BlockKind::Stairs => Some(0.5),
            BlockKind::Barrier => Some(1.5),
            BlockKind::Thin => Some(0.1),
            // Open state is unknown to the core, so doors never obstruct
            BlockKind::Door
            | BlockKind::Air
            | BlockKind::Harvestable
            | BlockKind::Water
            | BlockKind::Lava
            | BlockKind::Climbable
            | BlockKind::Sticky => None,
        }
    }

    pub fn collision_box(self, pos: BlockPos) -> Option<Aabb> {
        self.collision_height().map(|h| Aabb::block_part(pos, h))
    }
}

/// Read-only block query interface implemented by the host engine.
///
/// Implementations may return slightly stale state; the core tolerates it.
pub trait WorldView {
    fn block_at(&self, pos: BlockPos) -> BlockKind;

    /// Collision box of the block at `pos`, derived from its category by default
    fn collision_box(&self, pos: BlockPos) -> Option<Aabb> {
        self.block_at(pos).collision_box(pos)
    }
}

/// Held item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Block,
    Tool,
    Weapon,
    Food,
    /// Wheat, seeds, carrots and other breeding items
    AnimalFeed,
    Bucket,
    Other,
}

/// Which hand performed the action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    #[default]
    Main,
    Off,
}

/// Target entity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Animal,
    Monster,
    Player,
    Vehicle,
    Other,
}

/// Entity an action is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityTarget {
    pub kind: EntityKind,
    pub position: Vec3,
}

impl EntityTarget {
    pub fn new(kind: EntityKind, position: Vec3) -> Self {
        Self { kind, position }
    }
}
