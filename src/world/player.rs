//! Player status snapshot supplied by the host for each check

use serde::{Deserialize, Serialize};

use super::geometry::Vec3;
use super::PlayerId;

/// Active movement-affecting status modifiers.
///
/// Each field holds the effect level (1 = level I); `None` means absent.
/// A lookup the host cannot answer should be reported as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Effects {
    pub speed: Option<u8>,
    pub slowness: Option<u8>,
    pub jump_boost: Option<u8>,
    pub levitation: Option<u8>,
    pub slow_falling: Option<u8>,
    /// Water breathing, dolphin's grace, frost walking and similar water abilities
    pub water_walking: Option<u8>,
}

impl Effects {
    pub fn speed_level(&self) -> f64 {
        level(self.speed)
    }

    pub fn slowness_level(&self) -> f64 {
        level(self.slowness)
    }

    pub fn jump_boost_level(&self) -> f64 {
        level(self.jump_boost)
    }

    pub fn has_levitation(&self) -> bool {
        self.levitation.is_some()
    }

    pub fn has_slow_falling(&self) -> bool {
        self.slow_falling.is_some()
    }

    pub fn has_water_walking(&self) -> bool {
        self.water_walking.is_some()
    }
}

fn level(value: Option<u8>) -> f64 {
    value.map(f64::from).unwrap_or(0.0)
}

/// Point-in-time view of a player, read from the host's player oracle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStatus {
    pub id: PlayerId,
    /// Current feet position as the server sees it
    pub position: Vec3,
    /// Client-reported on-ground flag
    pub on_ground: bool,
    pub yaw: f32,
    pub sprinting: bool,
    pub swimming: bool,
    pub gliding: bool,
    /// Actively flying with a granted flight ability
    pub flying: bool,
    /// Host says the player is on a ladder or vine
    pub climbing: bool,
    /// Creative/operator-equivalent; skips every check
    pub privileged: bool,
    /// Riding a vehicle or animal
    pub mounted: bool,
    /// Host confirmed this tick's large jump came from an ability (pearl, warp item)
    pub confirmed_teleport: bool,
    pub effects: Effects,
}

impl PlayerStatus {
    pub fn new(id: PlayerId, position: Vec3) -> Self {
        Self {
            id,
            position,
            on_ground: true,
            ..Self::default()
        }
    }
}
