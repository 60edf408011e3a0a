//! Tunable anti-cheat thresholds
//!
//! Defaults lean permissive: the goal is catching obvious automation, not
//! policing fast but legitimate play. Every value can be overridden from a
//! JSON file; omitted fields keep their defaults.

use serde::{Deserialize, Serialize};

/// Thresholds for the action-rate limiter (times in milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLimits {
    pub break_cooldown_ms: u64,
    pub harvest_break_cooldown_ms: u64,
    pub place_cooldown_ms: u64,
    pub use_cooldown_ms: u64,
    pub attack_cooldown_ms: u64,
    pub interact_cooldown_ms: u64,
    pub door_cooldown_ms: u64,
    /// Minimum gap between two toggles of the same door
    pub same_door_cooldown_ms: u64,

    /// Cap on accepted actions of every kind within `rate_window_ms`
    pub max_actions_per_second: usize,
    pub rate_window_ms: u64,

    /// Actions of a single kind within `burst_window_ms` that mark automation
    pub burst_threshold: usize,
    pub burst_window_ms: u64,

    /// Capacity of the recent-action ring buffer
    pub history_capacity: usize,

    pub feed_cooldown_ms: u64,
    pub feed_sequence_cap: u32,
    pub feed_sequence_timeout_ms: u64,
    pub bucket_cooldown_ms: u64,
    pub bucket_sequence_cap: u32,
    pub bucket_sequence_timeout_ms: u64,
    pub container_sequence_cap: u32,
    pub container_sequence_timeout_ms: u64,

    /// Farthest legitimate interaction distance in blocks
    pub max_reach: f64,
    /// Cached player position is refreshed at most this often
    pub position_refresh_ms: u64,

    /// Counts at which the player is warned
    pub warn_at: Vec<u32>,
    /// Escalate once the count goes above this
    pub escalate_above: u32,

    pub violation_decay_ms: u64,
    pub sweep_interval_ms: u64,
    /// Idle, clean state is dropped after this long
    pub stale_after_ms: u64,
}

impl Default for ActionLimits {
    fn default() -> Self {
        Self {
            break_cooldown_ms: 25,
            harvest_break_cooldown_ms: 10,
            place_cooldown_ms: 50,
            use_cooldown_ms: 100,
            attack_cooldown_ms: 50,
            interact_cooldown_ms: 50,
            door_cooldown_ms: 5,
            same_door_cooldown_ms: 150,
            max_actions_per_second: 40,
            rate_window_ms: 1_000,
            burst_threshold: 45,
            burst_window_ms: 3_000,
            history_capacity: 64,
            feed_cooldown_ms: 50,
            feed_sequence_cap: 20,
            feed_sequence_timeout_ms: 10_000,
            bucket_cooldown_ms: 50,
            bucket_sequence_cap: 16,
            bucket_sequence_timeout_ms: 5_000,
            container_sequence_cap: 30,
            container_sequence_timeout_ms: 5_000,
            max_reach: 7.0,
            position_refresh_ms: 100,
            warn_at: vec![10, 25],
            escalate_above: 30,
            violation_decay_ms: 30_000,
            sweep_interval_ms: 300_000,
            stale_after_ms: 600_000,
        }
    }
}

/// Thresholds for movement validation (distances in blocks per tick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementLimits {
    pub walk_speed: f64,
    pub sprint_speed: f64,
    pub fly_speed: f64,
    pub glide_speed: f64,
    /// Uniform jitter tolerance on every ceiling
    pub lag_multiplier: f64,
    /// Extra horizontal allowance while airborne (sprint-jumping)
    pub airborne_bonus: f64,
    pub speed_effect_per_level: f64,
    pub slowness_effect_per_level: f64,
    pub mount_speed_factor: f64,
    pub ice_speed_factor: f64,
    pub water_speed_factor: f64,
    pub lava_speed_factor: f64,
    /// Ice speed allowance lingers this long after leaving ice
    pub ice_momentum_ms: u64,

    pub teleport_threshold: f64,

    pub max_upward: f64,
    pub jump_boost_upward_per_level: f64,
    pub hover_max_delta: f64,
    pub hover_ticks: u32,
    pub antigravity_air_ticks: u32,
    pub antigravity_min_fall: f64,
    pub max_jump_height: f64,
    pub jump_height_per_level: f64,
    /// Jump height ceiling next to fences and walls
    pub barrier_jump_cap: f64,
    /// Vertical checks pause this long after bouncing off slime or a bed
    pub bounce_grace_ms: u64,

    pub mount_grace_ms: u64,

    pub phase_min_distance: f64,
    pub phase_sample_step: f64,
    /// Solid cells tolerated in the path around mount transitions
    pub mount_phase_tolerance: usize,

    /// Consecutive ungrounded "on ground" claims tolerated
    pub ground_mismatch_ticks: u32,

    pub sustained_samples: usize,
    pub sustained_ratio: f64,

    pub history_size: usize,

    /// Snap back to the last valid position above this count
    pub correct_above: u32,
    pub warn_at: Vec<u32>,
    /// Signal removal and drop state above this count
    pub kick_above: u32,

    pub violation_decay_ms: u64,
    pub sweep_interval_ms: u64,
    pub stale_after_ms: u64,
}

impl Default for MovementLimits {
    fn default() -> Self {
        Self {
            walk_speed: 0.32,
            sprint_speed: 0.43,
            fly_speed: 1.1,
            glide_speed: 4.0,
            lag_multiplier: 1.25,
            airborne_bonus: 1.35,
            speed_effect_per_level: 0.2,
            slowness_effect_per_level: 0.15,
            mount_speed_factor: 10.0,
            ice_speed_factor: 2.6,
            water_speed_factor: 0.8,
            lava_speed_factor: 0.6,
            ice_momentum_ms: 1_000,
            teleport_threshold: 8.0,
            max_upward: 0.48,
            jump_boost_upward_per_level: 0.1,
            hover_max_delta: 0.02,
            hover_ticks: 30,
            antigravity_air_ticks: 60,
            antigravity_min_fall: -0.05,
            max_jump_height: 1.35,
            jump_height_per_level: 0.6,
            barrier_jump_cap: 1.3,
            bounce_grace_ms: 1_500,
            mount_grace_ms: 2_500,
            phase_min_distance: 0.1,
            phase_sample_step: 0.1,
            mount_phase_tolerance: 3,
            ground_mismatch_ticks: 5,
            sustained_samples: 5,
            sustained_ratio: 0.9,
            history_size: 10,
            correct_above: 3,
            warn_at: vec![5, 10],
            kick_above: 20,
            violation_decay_ms: 30_000,
            sweep_interval_ms: 300_000,
            stale_after_ms: 600_000,
        }
    }
}

/// Full anti-cheat configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiCheatConfig {
    pub actions: ActionLimits,
    pub movement: MovementLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "actions": { "max_reach": 6.0 }, "movement": { "hover_ticks": 40 } }"#;
        let config: AntiCheatConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.actions.max_reach, 6.0);
        assert_eq!(config.actions.max_actions_per_second, 40);
        assert_eq!(config.movement.hover_ticks, 40);
        assert_eq!(config.movement.teleport_threshold, 8.0);
    }

    #[test]
    fn burst_threshold_fits_in_history() {
        let limits = ActionLimits::default();
        assert!(limits.burst_threshold <= limits.history_capacity);
        assert!(limits.max_actions_per_second <= limits.history_capacity);
    }
}
