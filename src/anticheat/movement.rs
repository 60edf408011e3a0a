//! Movement validation
//!
//! Once per server tick the host hands over a player's previous and proposed
//! position. The transition is checked in order for teleports, horizontal
//! speed, vertical motion, phasing through blocks, ground-state spoofing and
//! walking on water. Thresholds adapt to terrain via [`BlockContext`], to
//! status effects, and to vehicles (with a grace window around mounting and
//! dismounting).

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::config::MovementLimits;
use crate::util::time::Clock;
use crate::world::context::{upper_hitbox, obstructions, STEP_HEIGHT};
use crate::world::{BlockContext, BlockPos, PlayerId, PlayerStatus, Vec3, WorldView};

use super::sinks::{Escalation, Recommendation, Sinks, ViolationSource};
use super::violations::{SweepGate, ViolationTracker};

/// Why a movement was refused
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementViolation {
    InvalidPosition,
    IllegalTeleport { distance: f64 },
    Speed { distance: f64, ceiling: f64 },
    SustainedSpeed { average: f64, ceiling: f64 },
    Upward { rise: f64, ceiling: f64 },
    Hover { ticks: u32 },
    AntiGravity { air_ticks: u32 },
    JumpHeight { gained: f64, ceiling: f64 },
    Phase { block: BlockPos },
    PhaseWhileMounting { blocks: usize },
    GroundSpoof { ticks: u32 },
    WaterWalking,
}

impl fmt::Display for MovementViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementViolation::InvalidPosition => write!(f, "non-finite position"),
            MovementViolation::IllegalTeleport { distance } => {
                write!(f, "illegal teleport: {:.2} blocks", distance)
            }
            MovementViolation::Speed { distance, ceiling } => {
                write!(f, "speed: {:.3} > {:.3}", distance, ceiling)
            }
            MovementViolation::SustainedSpeed { average, ceiling } => {
                write!(f, "sustained high speed: avg {:.3} near {:.3}", average, ceiling)
            }
            MovementViolation::Upward { rise, ceiling } => {
                write!(f, "fly: upward {:.3} > {:.3}", rise, ceiling)
            }
            MovementViolation::Hover { ticks } => write!(f, "hovering for {} ticks", ticks),
            MovementViolation::AntiGravity { air_ticks } => {
                write!(f, "anti-gravity after {} airborne ticks", air_ticks)
            }
            MovementViolation::JumpHeight { gained, ceiling } => {
                write!(f, "jump height {:.2} > {:.2}", gained, ceiling)
            }
            MovementViolation::Phase { block } => {
                write!(f, "phase through block at {},{},{}", block.x, block.y, block.z)
            }
            MovementViolation::PhaseWhileMounting { blocks } => {
                write!(f, "{} solid blocks in path while mounting", blocks)
            }
            MovementViolation::GroundSpoof { ticks } => {
                write!(f, "claimed ground without support for {} ticks", ticks)
            }
            MovementViolation::WaterWalking => write!(f, "walking on water"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MovementSnapshot {
    position: Vec3,
    timestamp: u64,
    on_ground: bool,
    yaw: f32,
}

/// Per-player movement history, created on first validation
#[derive(Debug, Clone)]
struct PlayerMovementState {
    history: VecDeque<MovementSnapshot>,
    last_valid: Option<Vec3>,
    air_ticks: u32,
    hover_ticks: u32,
    ground_mismatch_ticks: u32,
    near_ceiling_streak: u32,
    /// Height the current airborne episode started from
    jump_origin_y: Option<f64>,
    mounted: bool,
    last_mount_change_ms: Option<u64>,
    ice_until_ms: u64,
    bounce_until_ms: u64,
    was_in_liquid: bool,
    violations: ViolationTracker,
    last_activity_ms: u64,
}

impl PlayerMovementState {
    fn new(now: u64) -> Self {
        Self {
            history: VecDeque::new(),
            last_valid: None,
            air_ticks: 0,
            hover_ticks: 0,
            ground_mismatch_ticks: 0,
            near_ceiling_streak: 0,
            jump_origin_y: None,
            mounted: false,
            last_mount_change_ms: None,
            ice_until_ms: 0,
            bounce_until_ms: 0,
            was_in_liquid: false,
            violations: ViolationTracker::default(),
            last_activity_ms: now,
        }
    }

    fn push_snapshot(&mut self, limits: &MovementLimits, status: &PlayerStatus, position: Vec3, now: u64) {
        self.history.push_back(MovementSnapshot {
            position,
            timestamp: now,
            on_ground: status.on_ground,
            yaw: status.yaw,
        });
        while self.history.len() > limits.history_size.max(1) {
            self.history.pop_front();
        }
    }

    /// Start over from `position`, as after a first sighting or a legitimate teleport
    fn reseed(&mut self, limits: &MovementLimits, status: &PlayerStatus, position: Vec3, now: u64) {
        self.history.clear();
        self.push_snapshot(limits, status, position, now);
        self.last_valid = Some(position);
        self.air_ticks = 0;
        self.hover_ticks = 0;
        self.ground_mismatch_ticks = 0;
        self.near_ceiling_streak = 0;
        self.jump_origin_y = None;
    }

    fn in_mount_grace(&self, limits: &MovementLimits, now: u64) -> bool {
        self.mounted
            || self
                .last_mount_change_ms
                .is_some_and(|at| now.saturating_sub(at) < limits.mount_grace_ms)
    }

    /// Mean horizontal distance over the newest `samples - 1` recorded steps plus `current`
    fn rolling_speed(&self, samples: usize, current: f64) -> f64 {
        let steps: Vec<f64> = self
            .history
            .iter()
            .zip(self.history.iter().skip(1))
            .map(|(a, b)| b.position.sub(a.position).horizontal_length())
            .collect();
        let take = samples.saturating_sub(1).min(steps.len());
        let total: f64 = steps.iter().rev().take(take).sum::<f64>() + current;
        total / (take + 1) as f64
    }
}

/// Everything one validation needs, computed up front
struct Transition<'a> {
    status: &'a PlayerStatus,
    from: Vec3,
    to: Vec3,
    delta: Vec3,
    origin: BlockContext,
    dest: BlockContext,
    mount_relaxed: bool,
    now: u64,
}

impl Transition<'_> {
    fn airborne(&self) -> bool {
        !self.dest.solid_support
    }

    fn in_liquid(&self) -> bool {
        self.origin.in_liquid() || self.dest.in_liquid()
    }

    fn climbing(&self) -> bool {
        self.status.climbing || self.origin.climbable || self.dest.climbable
    }
}

/// Side effects decided while the player entry was locked
struct ViolationOutcome {
    count: u32,
    correct_to: Option<Vec3>,
    warning: Option<&'static str>,
    remove: bool,
}

/// Per-player movement validator
pub struct MovementAntiCheat {
    limits: MovementLimits,
    players: DashMap<PlayerId, PlayerMovementState>,
    clock: Arc<dyn Clock>,
    sinks: Sinks,
    sweep: SweepGate,
}

impl MovementAntiCheat {
    pub fn new(limits: MovementLimits, clock: Arc<dyn Clock>, sinks: Sinks) -> Self {
        let sweep = SweepGate::new(clock.now_millis(), limits.sweep_interval_ms);
        Self {
            limits,
            players: DashMap::new(),
            clock,
            sinks,
            sweep,
        }
    }

    pub fn limits(&self) -> &MovementLimits {
        &self.limits
    }

    /// Validate one tick of movement; `false` means the host should not apply `to`
    pub fn validate_movement(
        &self,
        world: &dyn WorldView,
        status: &PlayerStatus,
        from: Vec3,
        to: Vec3,
    ) -> bool {
        let now = self.clock.now_millis();
        let verdict = {
            let mut state = self
                .players
                .entry(status.id)
                .or_insert_with(|| PlayerMovementState::new(now));
            state.last_activity_ms = now;

            if state.last_valid.is_none() {
                state.mounted = status.mounted;
                if from.is_finite() {
                    state.reseed(&self.limits, status, from, now);
                }
                return true;
            }

            if status.privileged && from.is_finite() && to.is_finite() {
                state.mounted = status.mounted;
                state.reseed(&self.limits, status, to, now);
                return true;
            }

            match self.evaluate(&mut state, world, status, from, to, now) {
                Ok(()) => Ok(()),
                Err(violation) => {
                    let count = state.violations.record(now);
                    Err((violation, self.outcome(&state, count)))
                }
            }
        };

        match verdict {
            Ok(()) => true,
            Err((violation, outcome)) => {
                self.dispatch(status.id, &violation, outcome, now);
                false
            }
        }
    }

    fn evaluate(
        &self,
        state: &mut PlayerMovementState,
        world: &dyn WorldView,
        status: &PlayerStatus,
        from: Vec3,
        to: Vec3,
        now: u64,
    ) -> Result<(), MovementViolation> {
        if !from.is_finite() || !to.is_finite() {
            return Err(MovementViolation::InvalidPosition);
        }

        if status.mounted != state.mounted {
            state.mounted = status.mounted;
            state.last_mount_change_ms = Some(now);
        }

        let delta = to.sub(from);
        let distance = delta.length();
        if distance > self.limits.teleport_threshold {
            if status.confirmed_teleport {
                debug!(player = %status.id, distance, "Accepted confirmed teleport");
                state.reseed(&self.limits, status, to, now);
                return Ok(());
            }
            return Err(MovementViolation::IllegalTeleport { distance });
        }

        let t = Transition {
            status,
            from,
            to,
            delta,
            origin: BlockContext::sample(world, from),
            dest: BlockContext::sample(world, to),
            mount_relaxed: state.in_mount_grace(&self.limits, now),
            now,
        };

        if t.origin.on_ice || t.dest.on_ice {
            state.ice_until_ms = now + self.limits.ice_momentum_ms;
        }
        if t.origin.bouncy_below {
            state.bounce_until_ms = now + self.limits.bounce_grace_ms;
        }

        self.check_speed(state, &t)?;
        self.check_vertical(state, &t)?;
        self.check_phase(world, &t)?;
        self.check_ground(state, &t)?;
        self.check_water_walking(&t)?;

        self.accept(state, &t);
        Ok(())
    }

    fn accept(&self, state: &mut PlayerMovementState, t: &Transition<'_>) {
        let grounded = t.dest.solid_support
            || t.climbing()
            || t.in_liquid()
            || t.mount_relaxed
            || t.status.flying
            || t.status.gliding;
        if grounded {
            state.air_ticks = 0;
            state.jump_origin_y = None;
        } else {
            state.air_ticks = state.air_ticks.saturating_add(1);
            state.jump_origin_y.get_or_insert(t.from.y);
        }
        state.was_in_liquid = t.dest.in_liquid();
        state.last_valid = Some(t.to);
        state.push_snapshot(&self.limits, t.status, t.to, t.now);
    }

    /// Highest horizontal distance per tick this transition may cover
    fn speed_ceiling(&self, state: &PlayerMovementState, t: &Transition<'_>) -> f64 {
        let limits = &self.limits;
        let status = t.status;
        let mut ceiling = if status.gliding {
            limits.glide_speed
        } else if status.flying {
            limits.fly_speed
        } else if status.sprinting || status.swimming {
            limits.sprint_speed
        } else {
            limits.walk_speed
        };

        ceiling *= 1.0 + limits.speed_effect_per_level * status.effects.speed_level();
        ceiling *= (1.0 - limits.slowness_effect_per_level * status.effects.slowness_level()).max(0.0);

        // Vehicle speed applies only while riding
        if status.mounted {
            ceiling *= limits.mount_speed_factor;
        }
        if t.now < state.ice_until_ms {
            ceiling *= limits.ice_speed_factor;
        }
        // Momentum carries into liquid for a tick before drag applies
        if state.was_in_liquid && !status.mounted {
            if t.dest.in_lava {
                ceiling *= limits.lava_speed_factor;
            } else if t.dest.in_water && !status.swimming {
                ceiling *= limits.water_speed_factor;
            }
        }
        // Airborne is judged from terrain, not the client's ground flag
        if !t.origin.solid_support || !t.dest.solid_support {
            ceiling *= limits.airborne_bonus;
        }

        ceiling.max(0.01) * limits.lag_multiplier
    }

    fn check_speed(&self, state: &mut PlayerMovementState, t: &Transition<'_>) -> Result<(), MovementViolation> {
        let horizontal = t.delta.horizontal_length();
        let ceiling = self.speed_ceiling(state, t);
        if horizontal > ceiling {
            return Err(MovementViolation::Speed {
                distance: horizontal,
                ceiling,
            });
        }

        let ratio = self.limits.sustained_ratio;
        if horizontal > ceiling * ratio {
            state.near_ceiling_streak += 1;
        } else {
            state.near_ceiling_streak = 0;
        }

        let explained = t.origin.explains_fast_movement()
            || t.dest.explains_fast_movement()
            || t.now < state.ice_until_ms
            || t.status.mounted;
        if !explained && state.near_ceiling_streak as usize >= self.limits.sustained_samples {
            let average = state.rolling_speed(self.limits.sustained_samples, horizontal);
            if average > ceiling * ratio {
                return Err(MovementViolation::SustainedSpeed { average, ceiling });
            }
        }
        Ok(())
    }

    fn check_vertical(&self, state: &mut PlayerMovementState, t: &Transition<'_>) -> Result<(), MovementViolation> {
        let limits = &self.limits;
        let status = t.status;
        let effects = &status.effects;

        let exempt = status.flying
            || status.gliding
            || status.swimming
            || t.climbing()
            || t.in_liquid()
            || t.mount_relaxed
            || t.origin.sticky
            || t.dest.sticky;
        if exempt {
            state.hover_ticks = 0;
            return Ok(());
        }

        let vertical = t.delta.y;
        let bouncing = t.now < state.bounce_until_ms;
        let jump_boost = effects.jump_boost_level();

        if !bouncing && !effects.has_levitation() {
            let ceiling = ((limits.max_upward + limits.jump_boost_upward_per_level * jump_boost)
                * limits.lag_multiplier)
                .max(t.origin.step_height.min(STEP_HEIGHT) + 0.05);
            if vertical > ceiling {
                return Err(MovementViolation::Upward {
                    rise: vertical,
                    ceiling,
                });
            }
        }

        if t.airborne() && vertical.abs() < limits.hover_max_delta && !effects.has_levitation() {
            if state.hover_ticks >= limits.hover_ticks {
                return Err(MovementViolation::Hover {
                    ticks: state.hover_ticks,
                });
            }
            state.hover_ticks += 1;
        } else {
            state.hover_ticks = 0;
        }

        if t.airborne()
            && state.air_ticks > limits.antigravity_air_ticks
            && vertical > limits.antigravity_min_fall
            && !effects.has_slow_falling()
            && !effects.has_levitation()
        {
            return Err(MovementViolation::AntiGravity {
                air_ticks: state.air_ticks,
            });
        }

        if t.airborne() && !bouncing && !effects.has_levitation() {
            let origin_y = state.jump_origin_y.unwrap_or(t.from.y);
            let gained = t.to.y - origin_y;
            let mut ceiling = limits.max_jump_height + limits.jump_height_per_level * jump_boost;
            if (t.origin.near_barrier || t.dest.near_barrier) && jump_boost == 0.0 {
                ceiling = ceiling.min(limits.barrier_jump_cap);
            }
            if gained > ceiling {
                return Err(MovementViolation::JumpHeight { gained, ceiling });
            }
        }

        Ok(())
    }

    fn check_phase(&self, world: &dyn WorldView, t: &Transition<'_>) -> Result<(), MovementViolation> {
        let distance = t.delta.length();
        if distance < self.limits.phase_min_distance {
            return Ok(());
        }

        if !t.mount_relaxed {
            if let Some(block) = t.dest.collision {
                return Err(MovementViolation::Phase { block });
            }
        }

        let steps = (distance / self.limits.phase_sample_step.max(0.01)).ceil().max(1.0) as usize;
        let mut crossed: Vec<BlockPos> = Vec::new();
        for i in 1..=steps {
            let point = t.from.add(t.delta.scale(i as f64 / steps as f64));
            for block in obstructions(world, upper_hitbox(point)) {
                if !t.mount_relaxed {
                    return Err(MovementViolation::Phase { block });
                }
                if !crossed.contains(&block) {
                    crossed.push(block);
                }
            }
        }

        if crossed.len() > self.limits.mount_phase_tolerance {
            return Err(MovementViolation::PhaseWhileMounting {
                blocks: crossed.len(),
            });
        }
        Ok(())
    }

    fn check_ground(&self, state: &mut PlayerMovementState, t: &Transition<'_>) -> Result<(), MovementViolation> {
        let suspicious = t.status.on_ground
            && !t.dest.solid_support
            && !t.mount_relaxed
            && !t.climbing()
            && !t.in_liquid();
        if !suspicious {
            state.ground_mismatch_ticks = 0;
            return Ok(());
        }

        state.ground_mismatch_ticks += 1;
        if state.ground_mismatch_ticks > self.limits.ground_mismatch_ticks {
            return Err(MovementViolation::GroundSpoof {
                ticks: state.ground_mismatch_ticks,
            });
        }
        Ok(())
    }

    fn check_water_walking(&self, t: &Transition<'_>) -> Result<(), MovementViolation> {
        let status = t.status;
        let walking_on_water = t.dest.water_below
            && t.dest.air_at_feet
            && !t.dest.solid_support
            && status.on_ground
            && !status.swimming
            && !status.flying
            && !status.mounted
            && !status.effects.has_water_walking();
        if walking_on_water {
            return Err(MovementViolation::WaterWalking);
        }
        Ok(())
    }

    fn outcome(&self, state: &PlayerMovementState, count: u32) -> ViolationOutcome {
        let limits = &self.limits;
        let warning = if !limits.warn_at.contains(&count) {
            None
        } else if limits.warn_at.first() == Some(&count) {
            Some("[AntiCheat] Movement irregularities detected")
        } else {
            Some("[AntiCheat] Suspicious movement patterns detected")
        };
        ViolationOutcome {
            count,
            correct_to: if count > limits.correct_above {
                state.last_valid
            } else {
                None
            },
            warning,
            remove: count > limits.kick_above,
        }
    }

    fn dispatch(&self, player: PlayerId, violation: &MovementViolation, outcome: ViolationOutcome, now: u64) {
        debug!(
            player = %player,
            violations = outcome.count,
            reason = %violation,
            "Movement rejected"
        );

        if let Some(position) = outcome.correct_to {
            self.sinks.remediation.correct_position(player, position);
        }

        if let Some(message) = outcome.warning {
            info!(player = %player, violations = outcome.count, "Warning player about movement");
            self.sinks.remediation.warn_player(player, message);
        }

        if outcome.remove {
            self.sinks.escalation.escalate(&Escalation {
                player,
                source: ViolationSource::Movement,
                violations: outcome.count,
                reason: violation.to_string(),
                recommendation: Recommendation::Remove,
                at_millis: now,
            });
            self.players.remove(&player);
        }
    }

    pub fn violation_count(&self, player: PlayerId) -> u32 {
        self.players
            .get(&player)
            .map(|s| s.violations.count())
            .unwrap_or(0)
    }

    pub fn reset_violations(&self, player: PlayerId) {
        if let Some(mut state) = self.players.get_mut(&player) {
            state.violations.reset();
        }
    }

    /// Last position the validator accepted for a player
    pub fn last_valid_position(&self, player: PlayerId) -> Option<Vec3> {
        self.players.get(&player).and_then(|s| s.last_valid)
    }

    /// Decay violations and evict idle clean state; no-op until the sweep interval has passed
    pub fn perform_maintenance(&self) -> bool {
        let now = self.clock.now_millis();
        if !self.sweep.try_claim(now) {
            return false;
        }

        for mut entry in self.players.iter_mut() {
            entry.violations.decay(now, self.limits.violation_decay_ms);
        }

        let before = self.players.len();
        let stale_after = self.limits.stale_after_ms;
        self.players.retain(|_, state| {
            state.violations.count() > 0 || now.saturating_sub(state.last_activity_ms) < stale_after
        });
        debug!(
            evicted = before - self.players.len(),
            tracked = self.players.len(),
            "Movement validator maintenance"
        );
        true
    }

    pub fn remove_player(&self, player: PlayerId) {
        self.players.remove(&player);
    }

    pub fn is_tracked(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    pub fn tracked_players(&self) -> usize {
        self.players.len()
    }

    /// Human-readable diagnostics for admin tooling
    pub fn player_stats(&self, player: PlayerId) -> String {
        let Some(state) = self.players.get(&player) else {
            return format!("Movement[{}]: no data", player);
        };
        let now = self.clock.now_millis();
        let last = state.history.back().map(|s| {
            format!(
                "({:.2}, {:.2}, {:.2}) yaw={:.1} ground={} {}ms ago",
                s.position.x,
                s.position.y,
                s.position.z,
                s.yaw,
                s.on_ground,
                now.saturating_sub(s.timestamp)
            )
        });
        format!(
            "Movement[{}]: violations={} air_ticks={} hover_ticks={} mounted={} history={} last={}",
            player,
            state.violations.count(),
            state.air_ticks,
            state.hover_ticks,
            state.mounted,
            state.history.len(),
            last.unwrap_or_else(|| "none".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anticheat::sinks::MemorySink;
    use crate::util::time::ManualClock;
    use crate::world::context::tests::GridWorld;
    use crate::world::{BlockKind, Effects};
    use uuid::Uuid;

    struct Harness {
        ac: MovementAntiCheat,
        clock: Arc<ManualClock>,
        sink: Arc<MemorySink>,
        world: GridWorld,
        status: PlayerStatus,
        pos: Vec3,
    }

    impl Harness {
        fn on_floor() -> Self {
            Self::with_world(GridWorld::floor(BlockKind::Solid, 63, 40), Vec3::new(0.5, 64.0, 0.5))
        }

        fn with_world(world: GridWorld, start: Vec3) -> Self {
            let clock = Arc::new(ManualClock::new(5_000_000));
            let sink = MemorySink::new();
            let ac = MovementAntiCheat::new(MovementLimits::default(), clock.clone(), sink.sinks());
            let status = PlayerStatus::new(Uuid::new_v4(), start);
            let mut harness = Self {
                ac,
                clock,
                sink,
                world,
                status,
                pos: start,
            };
            assert!(harness.step(Vec3::ZERO));
            harness
        }

        /// Move by `delta` one tick later; the position only advances when accepted
        fn step(&mut self, delta: Vec3) -> bool {
            self.clock.advance(50);
            let to = self.pos.add(delta);
            let ok = self.ac.validate_movement(&self.world, &self.status, self.pos, to);
            if ok {
                self.pos = to;
            }
            ok
        }
    }

    #[test]
    fn first_call_seeds_and_accepts() {
        let clock = Arc::new(ManualClock::new(0));
        let ac = MovementAntiCheat::new(MovementLimits::default(), clock, Sinks::logging());
        let world = GridWorld::default();
        let status = PlayerStatus::new(Uuid::new_v4(), Vec3::ZERO);
        let from = Vec3::new(1.0, 2.0, 3.0);
        assert!(ac.validate_movement(&world, &status, from, Vec3::new(500.0, 2.0, 3.0)));
        assert_eq!(ac.last_valid_position(status.id), Some(from));
    }

    #[test]
    fn walking_and_sprinting_pass() {
        let mut h = Harness::on_floor();
        for _ in 0..20 {
            assert!(h.step(Vec3::new(0.3, 0.0, 0.0)));
        }
        h.status.sprinting = true;
        for _ in 0..20 {
            assert!(h.step(Vec3::new(0.0, 0.0, 0.43)));
        }
        assert_eq!(h.ac.violation_count(h.status.id), 0);
    }

    #[test]
    fn speed_beyond_sprint_ceiling_fails() {
        let mut h = Harness::on_floor();
        h.status.sprinting = true;
        assert!(!h.step(Vec3::new(0.43 * 1.25 + 0.01, 0.0, 0.0)));
        assert_eq!(h.ac.violation_count(h.status.id), 1);
    }

    #[test]
    fn speed_effect_raises_ceiling() {
        let mut h = Harness::on_floor();
        h.status.sprinting = true;
        h.status.effects = Effects {
            speed: Some(2),
            ..Effects::default()
        };
        assert!(h.step(Vec3::new(0.7, 0.0, 0.0)));
    }

    #[test]
    fn ice_momentum_allows_fast_sliding() {
        let world = GridWorld::floor(BlockKind::Ice, 63, 40);
        let mut h = Harness::with_world(world, Vec3::new(0.5, 64.0, 0.5));
        h.status.sprinting = true;
        assert!(h.step(Vec3::new(1.0, 0.0, 0.0)));
        assert!(h.step(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn mounted_player_may_move_fast() {
        let mut h = Harness::on_floor();
        h.status.mounted = true;
        assert!(h.step(Vec3::new(3.0, 0.0, 0.0)));
        assert!(h.step(Vec3::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn illegal_teleport_is_rejected_and_confirmed_one_reseeds() {
        let mut h = Harness::on_floor();
        assert!(!h.step(Vec3::new(9.0, 0.0, 0.0)));
        h.status.confirmed_teleport = true;
        assert!(h.step(Vec3::new(9.0, 0.0, 0.0)));
        assert_eq!(h.ac.last_valid_position(h.status.id), Some(h.pos));
    }

    #[test]
    fn upward_burst_is_flagged() {
        let mut h = Harness::on_floor();
        assert!(!h.step(Vec3::new(0.0, 0.9, 0.0)));
    }

    #[test]
    fn normal_jump_passes() {
        let mut h = Harness::on_floor();
        h.status.on_ground = false;
        for dy in [0.42, 0.33, 0.25, 0.17, 0.09, 0.0, -0.08, -0.16, -0.23, -0.31, -0.38, -0.1] {
            assert!(h.step(Vec3::new(0.1, dy, 0.0)), "rejected at dy={}", dy);
        }
        assert_eq!(h.ac.violation_count(h.status.id), 0);
    }

    #[test]
    fn walking_up_a_slab_is_not_flying() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 10);
        world.set(BlockPos::new(1, 64, 0), BlockKind::Slab);
        let mut h = Harness::with_world(world, Vec3::new(0.75, 64.0, 0.5));
        assert!(h.step(Vec3::new(0.3, 0.5, 0.0)));
    }

    #[test]
    fn jump_over_fence_height_is_flagged() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 10);
        world.set(BlockPos::new(1, 64, 0), BlockKind::Barrier);
        let mut h = Harness::with_world(world, Vec3::new(0.5, 64.0, 0.5));
        h.status.on_ground = false;
        assert!(h.step(Vec3::new(0.0, 0.45, 0.0)));
        assert!(h.step(Vec3::new(0.0, 0.45, 0.0)));
        assert!(h.step(Vec3::new(0.0, 0.35, 0.0)));
        // 1.32 would pass in the open but not beside a fence
        assert!(!h.step(Vec3::new(0.0, 0.07, 0.0)));
    }

    #[test]
    fn phase_through_wall_is_rejected() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 10);
        world.set(BlockPos::new(1, 64, 0), BlockKind::Solid);
        world.set(BlockPos::new(1, 65, 0), BlockKind::Solid);
        let mut h = Harness::with_world(world, Vec3::new(0.69, 64.0, 0.5));
        assert!(!h.step(Vec3::new(0.3, 0.0, 0.0)));
    }

    #[test]
    fn doors_do_not_block() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 10);
        world.set(BlockPos::new(1, 64, 0), BlockKind::Door);
        world.set(BlockPos::new(1, 65, 0), BlockKind::Door);
        let mut h = Harness::with_world(world, Vec3::new(0.69, 64.0, 0.5));
        assert!(h.step(Vec3::new(0.3, 0.0, 0.0)));
    }

    #[test]
    fn mount_transition_tolerates_a_little_clipping_but_not_a_wall() {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 20);
        world.set(BlockPos::new(1, 64, 0), BlockKind::Solid);
        let mut h = Harness::with_world(world, Vec3::new(0.5, 64.0, 0.5));
        h.status.mounted = true;
        assert!(h.step(Vec3::new(1.2, 0.0, 0.0)));

        for x in 3..8 {
            for y in 64..67 {
                h.world.set(BlockPos::new(x, y, 0), BlockKind::Solid);
            }
        }
        assert!(!h.step(Vec3::new(3.5, 0.0, 0.0)));
    }

    #[test]
    fn hovering_is_rejected_after_limit() {
        let mut h = Harness::with_world(GridWorld::default(), Vec3::new(0.5, 100.0, 0.5));
        h.status.on_ground = false;
        for _ in 0..15 {
            assert!(h.step(Vec3::new(0.0, 0.01, 0.0)));
            assert!(h.step(Vec3::new(0.0, -0.01, 0.0)));
        }
        assert!(!h.step(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn levitation_explains_hovering() {
        let mut h = Harness::with_world(GridWorld::default(), Vec3::new(0.5, 100.0, 0.5));
        h.status.on_ground = false;
        h.status.effects.levitation = Some(1);
        for _ in 0..40 {
            assert!(h.step(Vec3::new(0.0, 0.0, 0.0)));
        }
    }

    #[test]
    fn ground_spoof_is_tolerated_briefly() {
        let mut h = Harness::with_world(GridWorld::default(), Vec3::new(0.5, 100.0, 0.5));
        for _ in 0..5 {
            assert!(h.step(Vec3::new(0.0, -0.3, 0.0)));
        }
        assert!(!h.step(Vec3::new(0.0, -0.3, 0.0)));
    }

    #[test]
    fn water_walking_is_rejected() {
        let world = GridWorld::floor(BlockKind::Water, 63, 10);
        let mut h = Harness::with_world(world, Vec3::new(0.5, 64.0, 0.5));
        assert!(!h.step(Vec3::new(0.2, 0.0, 0.0)));

        h.status.effects.water_walking = Some(1);
        assert!(h.step(Vec3::new(0.2, 0.0, 0.0)));
    }

    #[test]
    fn dismounting_drops_vehicle_speed() {
        let mut h = Harness::on_floor();
        h.status.mounted = true;
        assert!(h.step(Vec3::new(2.0, 0.0, 0.0)));

        h.status.mounted = false;
        assert!(!h.step(Vec3::new(3.5, 0.0, 0.0)));
        assert_eq!(h.ac.violation_count(h.status.id), 1);
    }

    #[test]
    fn mount_grace_expires() {
        let mut h = Harness::on_floor();
        h.status.mounted = true;
        assert!(h.step(Vec3::new(1.0, 0.0, 0.0)));

        h.status.mounted = false;
        assert!(h.step(Vec3::new(0.0, 0.9, 0.0)));
        assert!(h.step(Vec3::new(0.0, -0.9, 0.0)));

        h.clock.advance(2_500);
        assert!(!h.step(Vec3::new(0.0, 0.9, 0.0)));
    }

    #[test]
    fn first_sighting_while_mounted_is_not_a_mount_change() {
        let clock = Arc::new(ManualClock::new(0));
        let ac = MovementAntiCheat::new(MovementLimits::default(), clock, Sinks::logging());
        let world = GridWorld::floor(BlockKind::Solid, 63, 5);
        let mut status = PlayerStatus::new(Uuid::new_v4(), Vec3::new(0.5, 64.0, 0.5));
        status.mounted = true;
        assert!(ac.validate_movement(&world, &status, status.position, status.position));
        assert!(ac.player_stats(status.id).contains("mounted=true"));
        assert!(ac.players.get(&status.id).is_some_and(|s| s.last_mount_change_ms.is_none()));
    }

    #[test]
    fn ground_flag_does_not_raise_ceiling_on_solid_floor() {
        let mut h = Harness::on_floor();
        h.status.sprinting = true;
        h.status.on_ground = false;
        assert!(!h.step(Vec3::new(0.64, 0.0, 0.0)));
        assert_eq!(h.ac.violation_count(h.status.id), 1);
    }

    #[test]
    fn sustained_speed_just_under_ceiling_is_rejected() {
        let mut h = Harness::on_floor();
        h.status.sprinting = true;
        for _ in 0..20 {
            assert!(h.step(Vec3::new(0.45, 0.0, 0.0)));
        }
        for i in 0..4 {
            assert!(h.step(Vec3::new(0.5, 0.0, 0.0)), "step {} rejected", i);
        }
        assert!(!h.step(Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn slowness_lowers_ceiling() {
        let mut h = Harness::on_floor();
        h.status.sprinting = true;
        h.status.effects.slowness = Some(2);
        assert!(!h.step(Vec3::new(0.43, 0.0, 0.0)));
    }

    fn pool(liquid: BlockKind) -> GridWorld {
        let mut world = GridWorld::floor(BlockKind::Solid, 63, 10);
        for x in -10..=10 {
            for z in -10..=10 {
                world.set(BlockPos::new(x, 64, z), liquid);
            }
        }
        world
    }

    #[test]
    fn water_drags_walking_speed() {
        let mut h = Harness::with_world(pool(BlockKind::Water), Vec3::new(0.5, 64.0, 0.5));
        assert!(h.step(Vec3::new(0.1, 0.0, 0.0)));
        assert!(!h.step(Vec3::new(0.35, 0.0, 0.0)));
        assert!(h.step(Vec3::new(0.3, 0.0, 0.0)));
    }

    #[test]
    fn lava_drags_harder_than_water() {
        let mut h = Harness::with_world(pool(BlockKind::Lava), Vec3::new(0.5, 64.0, 0.5));
        assert!(h.step(Vec3::new(0.1, 0.0, 0.0)));
        assert!(!h.step(Vec3::new(0.3, 0.0, 0.0)));
        assert!(h.step(Vec3::new(0.2, 0.0, 0.0)));
    }

    #[test]
    fn long_fall_that_stops_is_anti_gravity() {
        let mut h = Harness::with_world(GridWorld::default(), Vec3::new(0.5, 200.0, 0.5));
        h.status.on_ground = false;
        for _ in 0..61 {
            assert!(h.step(Vec3::new(0.0, -0.5, 0.0)));
        }
        assert!(!h.step(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn slow_falling_explains_drifting() {
        let mut h = Harness::with_world(GridWorld::default(), Vec3::new(0.5, 200.0, 0.5));
        h.status.on_ground = false;
        h.status.effects.slow_falling = Some(1);
        for _ in 0..61 {
            assert!(h.step(Vec3::new(0.0, -0.5, 0.0)));
        }
        assert!(h.step(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn bounce_pad_allows_launch_until_grace_ends() {
        let world = GridWorld::floor(BlockKind::Bouncy, 63, 10);
        let mut h = Harness::with_world(world, Vec3::new(0.5, 64.0, 0.5));
        h.status.on_ground = false;
        assert!(h.step(Vec3::new(0.0, 0.9, 0.0)));

        h.clock.advance(1_500);
        assert!(!h.step(Vec3::new(0.0, 0.9, 0.0)));
    }

    #[test]
    fn sticky_blocks_suspend_vertical_checks() {
        let mut world = GridWorld::default();
        world.set(BlockPos::new(0, 100, 0), BlockKind::Sticky);
        world.set(BlockPos::new(0, 101, 0), BlockKind::Sticky);
        let mut h = Harness::with_world(world, Vec3::new(0.5, 100.0, 0.5));
        h.status.on_ground = false;
        for _ in 0..40 {
            assert!(h.step(Vec3::ZERO));
        }
        assert_eq!(h.ac.violation_count(h.status.id), 0);
    }

    #[test]
    fn remediation_escalates_with_count() {
        let mut h = Harness::on_floor();
        for _ in 0..10 {
            assert!(!h.step(Vec3::new(9.0, 0.0, 0.0)));
        }
        assert_eq!(h.sink.corrections(), 7);
        assert_eq!(
            h.sink.warnings(),
            vec![
                "[AntiCheat] Movement irregularities detected".to_string(),
                "[AntiCheat] Suspicious movement patterns detected".to_string(),
            ]
        );
        assert!(h.sink.escalations().is_empty());

        for _ in 0..11 {
            assert!(!h.step(Vec3::new(9.0, 0.0, 0.0)));
        }
        let escalations = h.sink.escalations();
        assert_eq!(escalations.len(), 1);
        assert_eq!(escalations[0].recommendation, Recommendation::Remove);
        assert_eq!(h.ac.tracked_players(), 0);
    }

    #[test]
    fn maintenance_decays_and_evicts() {
        let mut h = Harness::on_floor();
        assert!(!h.step(Vec3::new(9.0, 0.0, 0.0)));
        assert!(!h.ac.perform_maintenance());
        h.clock.advance(300_000);
        assert!(h.ac.perform_maintenance());
        assert_eq!(h.ac.violation_count(h.status.id), 0);
        h.clock.advance(600_000);
        assert!(h.ac.perform_maintenance());
        assert_eq!(h.ac.tracked_players(), 0);
    }

    #[test]
    fn stats_describe_player() {
        let mut h = Harness::on_floor();
        assert!(h.step(Vec3::new(0.2, 0.0, 0.0)));
        let stats = h.ac.player_stats(h.status.id);
        assert!(stats.contains("violations=0"));
        assert!(stats.contains("history=2"));
    }
}
