//! Terrain sample around a position

use super::block::{BlockKind, WorldView};
use super::geometry::{Aabb, BlockPos, Vec3, PLAYER_WIDTH};

/// Highest ledge a player walks onto without jumping
pub const STEP_HEIGHT: f64 = 0.6;

/// How far below the feet a block still counts as support
const SUPPORT_DEPTH: f64 = 0.1;

/// Slack applied to hitboxes so grazing a wall is not a collision
const COLLISION_EPSILON: f64 = 0.01;

/// Point-in-time classification of the 3x3x3 block neighbourhood of a position.
///
/// Built fresh for every movement check and thrown away afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockContext {
    /// A collision shape sits directly under the player's footprint
    pub solid_support: bool,
    /// Tallest walk-up ledge next to the feet (0 when there is none)
    pub step_height: f64,
    pub in_water: bool,
    pub in_lava: bool,
    /// Block immediately under the feet is water
    pub water_below: bool,
    /// Block at the feet is air
    pub air_at_feet: bool,
    pub climbable: bool,
    pub sticky: bool,
    pub on_ice: bool,
    pub bouncy_below: bool,
    /// Fence or wall somewhere in the neighbourhood
    pub near_barrier: bool,
    /// First solid cell the hitbox overlaps here, ignoring the step-up band
    pub collision: Option<BlockPos>,
}

impl BlockContext {
    /// Sample the world around a feet position
    pub fn sample(world: &dyn WorldView, feet: Vec3) -> Self {
        let origin = BlockPos::containing(feet);
        let body = Aabb::player_at(feet);
        let half = PLAYER_WIDTH / 2.0;
        let footprint = Aabb::new(
            Vec3::new(feet.x - half, feet.y - SUPPORT_DEPTH, feet.z - half),
            Vec3::new(feet.x + half, feet.y + COLLISION_EPSILON, feet.z + half),
        );

        let mut ctx = BlockContext {
            water_below: world.block_at(BlockPos::containing(Vec3::new(feet.x, feet.y - 0.5, feet.z)))
                == BlockKind::Water,
            air_at_feet: world.block_at(origin) == BlockKind::Air,
            ..Self::default()
        };

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let pos = origin.offset(dx, dy, dz);
                    let kind = world.block_at(pos);
                    if kind == BlockKind::Air {
                        continue;
                    }

                    if kind == BlockKind::Barrier {
                        ctx.near_barrier = true;
                    }

                    let cell = Aabb::block_part(pos, 1.0);
                    if cell.intersects(&body) {
                        match kind {
                            BlockKind::Water => ctx.in_water = true,
                            BlockKind::Lava => ctx.in_lava = true,
                            BlockKind::Climbable => ctx.climbable = true,
                            BlockKind::Sticky => ctx.sticky = true,
                            _ => {}
                        }
                    }

                    let Some(shape) = world.collision_box(pos) else {
                        continue;
                    };

                    if shape.intersects(&footprint) {
                        ctx.solid_support = true;
                        match kind {
                            BlockKind::Ice => ctx.on_ice = true,
                            BlockKind::Bouncy => ctx.bouncy_below = true,
                            _ => {}
                        }
                    }

                    if dy == 0 {
                        let rise = shape.max.y - feet.y;
                        if rise > 0.0 && rise <= STEP_HEIGHT {
                            ctx.step_height = ctx.step_height.max(rise);
                        }
                    }
                }
            }
        }

        ctx.collision = obstructions(world, upper_hitbox(feet)).into_iter().next();
        ctx
    }

    pub fn collides(&self) -> bool {
        self.collision.is_some()
    }

    pub fn in_liquid(&self) -> bool {
        self.in_water || self.in_lava
    }

    /// Terrain that legitimately produces unusual speeds or vertical motion
    pub fn explains_fast_movement(&self) -> bool {
        self.in_liquid() || self.on_ice || self.climbable
    }
}

/// Player hitbox above the step-up band, so stairs and ledges are not walls
pub fn upper_hitbox(feet: Vec3) -> Aabb {
    let body = Aabb::player_at(feet);
    Aabb::new(Vec3::new(body.min.x, body.min.y + STEP_HEIGHT, body.min.z), body.max)
        .deflate(COLLISION_EPSILON)
}

/// Cells whose collision shape overlaps `hitbox`
pub fn obstructions(world: &dyn WorldView, hitbox: Aabb) -> Vec<BlockPos> {
    hitbox
        .blocks()
        .filter(|pos| {
            world
                .collision_box(*pos)
                .is_some_and(|shape| shape.intersects(&hitbox))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Sparse world: everything not set is air
    #[derive(Default)]
    pub(crate) struct GridWorld {
        blocks: HashMap<BlockPos, BlockKind>,
    }

    impl GridWorld {
        pub(crate) fn set(&mut self, pos: BlockPos, kind: BlockKind) {
            self.blocks.insert(pos, kind);
        }

        /// Flat floor of `kind` at layer `y` spanning x/z in -r..=r
        pub(crate) fn floor(kind: BlockKind, y: i32, r: i32) -> Self {
            let mut world = Self::default();
            for x in -r..=r {
                for z in -r..=r {
                    world.set(BlockPos::new(x, y, z), kind);
                }
            }
            world
        }
    }

    impl WorldView for GridWorld {
        fn block_at(&self, pos: BlockPos) -> BlockKind {
            self.blocks.get(&pos).copied().unwrap_or_default()
        }
    }

    #[test]
    fn standing_on_floor_has_support_and_no_collision() {
        let world = GridWorld::floor(BlockKind::Solid, 63, 3);
        let ctx = BlockContext::sample(&world, Vec3::new(0.5, 64.0, 0.5));
        assert!(ctx.solid_support);
        assert!(!ctx.collides());
        assert!(ctx.air_at_feet);
    }

    #[test]
    fn floating_has_no_support() {
        let world = GridWorld::default();
        let ctx = BlockContext::sample(&world, Vec3::new(0.5, 70.0, 0.5));
        assert!(!ctx.solid_support);
        assert!(!ctx.in_liquid());
    }

    #[test]
    fn edge_of_pool_keeps_support() {
        let mut world = GridWorld::floor(BlockKind::Water, 63, 3);
        world.set(BlockPos::new(1, 63, 0), BlockKind::Solid);
        // Centre over water, footprint overlapping the solid neighbour
        let ctx = BlockContext::sample(&world, Vec3::new(0.9, 64.0, 0.5));
        assert!(ctx.water_below);
        assert!(ctx.solid_support);
    }

    #[test]
    fn detects_slab_step_and_barrier() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 3);
        world.set(BlockPos::new(1, 64, 0), BlockKind::Slab);
        world.set(BlockPos::new(-1, 64, 0), BlockKind::Barrier);
        let ctx = BlockContext::sample(&world, Vec3::new(0.5, 64.0, 0.5));
        assert!((ctx.step_height - 0.5).abs() < 1e-9);
        assert!(ctx.near_barrier);
    }

    #[test]
    fn inside_wall_collides() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 3);
        world.set(BlockPos::new(0, 65, 0), BlockKind::Solid);
        let ctx = BlockContext::sample(&world, Vec3::new(0.5, 64.0, 0.5));
        assert_eq!(ctx.collision, Some(BlockPos::new(0, 65, 0)));
    }

    #[test]
    fn slab_underfoot_is_not_a_collision() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 3);
        world.set(BlockPos::new(0, 64, 0), BlockKind::Slab);
        assert!(!BlockContext::sample(&world, Vec3::new(0.5, 64.2, 0.5)).collides());
    }

    #[test]
    fn ice_and_liquids_are_classified() {
        let world = GridWorld::floor(BlockKind::Ice, 63, 2);
        assert!(BlockContext::sample(&world, Vec3::new(0.5, 64.0, 0.5)).on_ice);

        let mut pool = GridWorld::default();
        pool.set(BlockPos::new(0, 64, 0), BlockKind::Water);
        let ctx = BlockContext::sample(&pool, Vec3::new(0.5, 64.2, 0.5));
        assert!(ctx.in_water);
        assert!(ctx.explains_fast_movement());
    }
}
