//! Single entry point owning both validators

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::AntiCheatConfig;
use crate::util::time::Clock;
use crate::world::{BlockKind, BlockPos, EntityTarget, Hand, ItemKind, PlayerId, PlayerStatus, Vec3, WorldView};

use super::action::{Action, ActionRateLimiter};
use super::movement::MovementAntiCheat;
use super::sinks::Sinks;

/// Violation counts of one player across both validators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViolationSummary {
    pub player: PlayerId,
    pub action_violations: u32,
    pub movement_violations: u32,
}

impl ViolationSummary {
    pub fn total(&self) -> u32 {
        self.action_violations + self.movement_violations
    }
}

/// Players tracked by each validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackedPlayers {
    pub actions: usize,
    pub movement: usize,
}

/// Anti-cheat core, built once at host start and shared across event threads
pub struct AntiCheat {
    actions: ActionRateLimiter,
    movement: MovementAntiCheat,
}

impl AntiCheat {
    pub fn new(config: AntiCheatConfig, clock: Arc<dyn Clock>, sinks: Sinks) -> Self {
        Self {
            actions: ActionRateLimiter::new(config.actions, clock.clone(), sinks.clone()),
            movement: MovementAntiCheat::new(config.movement, clock, sinks),
        }
    }

    pub fn actions(&self) -> &ActionRateLimiter {
        &self.actions
    }

    pub fn movement(&self) -> &MovementAntiCheat {
        &self.movement
    }

    pub fn check_action(&self, status: &PlayerStatus, action: Action) -> bool {
        self.actions.check(status, action)
    }

    pub fn can_break_block(&self, status: &PlayerStatus, pos: BlockPos, block: BlockKind) -> bool {
        self.actions.can_break_block(status, pos, block)
    }

    pub fn can_place_block(&self, status: &PlayerStatus, pos: BlockPos) -> bool {
        self.actions.can_place_block(status, pos)
    }

    pub fn can_use_item(
        &self,
        status: &PlayerStatus,
        item: Option<ItemKind>,
        hand: Hand,
        target: Option<EntityTarget>,
    ) -> bool {
        self.actions.can_use_item(status, item, hand, target)
    }

    pub fn can_interact_with_block(&self, status: &PlayerStatus, pos: BlockPos, block: BlockKind) -> bool {
        self.actions.can_interact_with_block(status, pos, block)
    }

    pub fn can_attack(&self, status: &PlayerStatus, target: Option<EntityTarget>) -> bool {
        self.actions.can_attack(status, target)
    }

    pub fn validate_movement(&self, world: &dyn WorldView, status: &PlayerStatus, from: Vec3, to: Vec3) -> bool {
        self.movement.validate_movement(world, status, from, to)
    }

    pub fn violation_summary(&self, player: PlayerId) -> ViolationSummary {
        ViolationSummary {
            player,
            action_violations: self.actions.violation_count(player),
            movement_violations: self.movement.violation_count(player),
        }
    }

    pub fn reset_violations(&self, player: PlayerId) {
        self.actions.reset_violations(player);
        self.movement.reset_violations(player);
        info!(player = %player, "Violations reset");
    }

    /// Run both sweeps; each is independently gated on its own interval
    pub fn perform_maintenance(&self) -> bool {
        let actions = self.actions.perform_maintenance();
        let movement = self.movement.perform_maintenance();
        actions || movement
    }

    /// Forget a disconnected player everywhere
    pub fn remove_player(&self, player: PlayerId) {
        self.actions.remove_player(player);
        self.movement.remove_player(player);
    }

    pub fn tracked_players(&self) -> TrackedPlayers {
        TrackedPlayers {
            actions: self.actions.tracked_players(),
            movement: self.movement.tracked_players(),
        }
    }

    pub fn is_tracked(&self, player: PlayerId) -> bool {
        self.actions.is_tracked(player) || self.movement.is_tracked(player)
    }

    pub fn player_stats(&self, player: PlayerId) -> String {
        format!(
            "{}\n{}",
            self.actions.player_stats(player),
            self.movement.player_stats(player)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anticheat::sinks::MemorySink;
    use crate::util::time::ManualClock;
    use crate::world::context::tests::GridWorld;
    use uuid::Uuid;

    fn facade() -> (AntiCheat, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let sink = MemorySink::new();
        (
            AntiCheat::new(AntiCheatConfig::default(), clock.clone(), sink.sinks()),
            clock,
        )
    }

    #[test]
    fn summary_and_reset_cover_both_components() {
        let (ac, clock) = facade();
        let world = GridWorld::floor(BlockKind::Solid, 63, 5);
        let status = PlayerStatus::new(Uuid::new_v4(), Vec3::new(0.5, 64.0, 0.5));

        assert!(ac.can_attack(&status, None));
        assert!(!ac.can_attack(&status, None));

        let start = status.position;
        assert!(ac.validate_movement(&world, &status, start, start));
        clock.advance(50);
        assert!(!ac.validate_movement(&world, &status, start, start.add(Vec3::new(20.0, 0.0, 0.0))));

        let summary = ac.violation_summary(status.id);
        assert_eq!(summary.action_violations, 1);
        assert_eq!(summary.movement_violations, 1);
        assert_eq!(summary.total(), 2);

        ac.reset_violations(status.id);
        assert_eq!(ac.violation_summary(status.id).total(), 0);
    }

    #[test]
    fn remove_player_clears_both() {
        let (ac, _clock) = facade();
        let world = GridWorld::default();
        let status = PlayerStatus::new(Uuid::new_v4(), Vec3::ZERO);
        ac.can_place_block(&status, BlockPos::new(0, 0, 1));
        ac.validate_movement(&world, &status, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(ac.tracked_players(), TrackedPlayers { actions: 1, movement: 1 });

        ac.remove_player(status.id);
        assert_eq!(ac.tracked_players(), TrackedPlayers { actions: 0, movement: 0 });
    }

    #[test]
    fn maintenance_is_gated() {
        let (ac, clock) = facade();
        assert!(!ac.perform_maintenance());
        clock.advance(300_000);
        assert!(ac.perform_maintenance());
        assert!(!ac.perform_maintenance());
    }
}
