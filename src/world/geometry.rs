//! Positions and axis-aligned boxes

use serde::{Deserialize, Serialize};

/// Player hitbox width in blocks
pub const PLAYER_WIDTH: f64 = 0.6;
/// Player hitbox height in blocks
pub const PLAYER_HEIGHT: f64 = 1.8;

/// World-space position; for players this is the centre of the feet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(self, factor: f64) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Length ignoring the vertical axis
    pub fn horizontal_length(self) -> f64 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f64 {
        self.sub(other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Integer block coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block containing a world-space point
    pub fn containing(pos: Vec3) -> Self {
        Self::new(pos.x.floor() as i32, pos.y.floor() as i32, pos.z.floor() as i32)
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    pub fn center(self) -> Vec3 {
        Vec3::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        )
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box covering a fraction of a block cell, measured from its floor
    pub fn block_part(pos: BlockPos, height: f64) -> Self {
        let min = Vec3::new(f64::from(pos.x), f64::from(pos.y), f64::from(pos.z));
        Self::new(min, Vec3::new(min.x + 1.0, min.y + height, min.z + 1.0))
    }

    /// Player hitbox standing with feet at `feet`
    pub fn player_at(feet: Vec3) -> Self {
        let half = PLAYER_WIDTH / 2.0;
        Self::new(
            Vec3::new(feet.x - half, feet.y, feet.z - half),
            Vec3::new(feet.x + half, feet.y + PLAYER_HEIGHT, feet.z + half),
        )
    }

    /// Shrink every face inward by `amount`
    pub fn deflate(self, amount: f64) -> Self {
        Self::new(
            Vec3::new(self.min.x + amount, self.min.y + amount, self.min.z + amount),
            Vec3::new(self.max.x - amount, self.max.y - amount, self.max.z - amount),
        )
    }

    /// Strict overlap; boxes that only touch do not intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// All block cells this box overlaps
    pub fn blocks(&self) -> impl Iterator<Item = BlockPos> {
        let min = BlockPos::containing(self.min);
        let max = BlockPos::containing(self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| BlockPos::new(x, y, z)))
        })
    }
}
