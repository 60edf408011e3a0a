//! Action-rate limiter
//!
//! Gates discrete player actions (break, place, use, attack, interact) before
//! they touch the world. Each call runs, in order:
//!
//! 1. privileged bypass
//! 2. reach check against the cached player position
//! 3. context-aware cooldown for the action kind
//! 4. context-specific sequence caps (feeding, buckets, containers, doors)
//! 5. global sliding-window rate cap across all kinds
//! 6. coarse burst detector for automation (nuker, killaura)
//!
//! Limits are deliberately loose; only the burst detector and the reach
//! check target cheats, the rest absorbs network batching.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::config::ActionLimits;
use crate::util::ring::RingBuffer;
use crate::util::time::Clock;
use crate::world::{BlockKind, BlockPos, EntityKind, EntityTarget, Hand, ItemKind, PlayerId, PlayerStatus, Vec3};

use super::sinks::{Escalation, Recommendation, Sinks, ViolationSource};
use super::violations::{SweepGate, ViolationTracker};

/// Eye height above the feet, used as the origin for reach
const EYE_HEIGHT: f64 = 1.62;

/// Doors remembered per player for the same-door cooldown
const TRACKED_DOORS: usize = 8;

/// Discrete action kinds with their own cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Break,
    Place,
    Use,
    Attack,
    Interact,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Break,
        ActionKind::Place,
        ActionKind::Use,
        ActionKind::Attack,
        ActionKind::Interact,
    ];

    fn index(self) -> usize {
        match self {
            ActionKind::Break => 0,
            ActionKind::Place => 1,
            ActionKind::Use => 2,
            ActionKind::Attack => 3,
            ActionKind::Interact => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Break => "break",
            ActionKind::Place => "place",
            ActionKind::Use => "use",
            ActionKind::Attack => "attack",
            ActionKind::Interact => "interact",
        }
    }
}

/// A player action together with whatever context the host knows about it.
///
/// Missing context (`None`) falls back to the plain per-kind cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Break {
        pos: BlockPos,
        block: BlockKind,
    },
    Place {
        pos: BlockPos,
    },
    UseItem {
        item: Option<ItemKind>,
        hand: Hand,
        target: Option<EntityTarget>,
    },
    Interact {
        pos: BlockPos,
        block: BlockKind,
    },
    Attack {
        target: Option<EntityTarget>,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Break { .. } => ActionKind::Break,
            Action::Place { .. } => ActionKind::Place,
            Action::UseItem { .. } => ActionKind::Use,
            Action::Attack { .. } => ActionKind::Attack,
            Action::Interact { .. } => ActionKind::Interact,
        }
    }

    /// Where the action lands, for the reach check
    fn target_position(&self) -> Option<Vec3> {
        match self {
            Action::Break { pos, .. } | Action::Place { pos } | Action::Interact { pos, .. } => {
                Some(pos.center())
            }
            Action::UseItem { target, .. } | Action::Attack { target } => {
                target.map(|t| t.position)
            }
        }
    }

    fn rule(&self) -> Rule {
        match *self {
            Action::Break {
                block: BlockKind::Harvestable,
                ..
            } => Rule::Harvest,
            Action::UseItem {
                item: Some(ItemKind::AnimalFeed),
                target: Some(EntityTarget {
                    kind: EntityKind::Animal,
                    ..
                }),
                ..
            } => Rule::Sequence(SequenceKind::Feed),
            Action::UseItem {
                item: Some(ItemKind::Bucket),
                ..
            } => Rule::Sequence(SequenceKind::Bucket),
            Action::Interact {
                pos,
                block: BlockKind::Door,
            } => Rule::Door(pos),
            Action::Interact {
                block: BlockKind::Container,
                ..
            } => Rule::Sequence(SequenceKind::Container),
            _ => Rule::Default,
        }
    }
}

/// Which cooldown/exception applies to an action
#[derive(Debug, Clone, Copy, PartialEq)]
enum Rule {
    Default,
    Harvest,
    Door(BlockPos),
    Sequence(SequenceKind),
}

/// Repeatable interactions with a bounded run length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Feed,
    Bucket,
    Container,
}

impl SequenceKind {
    fn index(self) -> usize {
        match self {
            SequenceKind::Feed => 0,
            SequenceKind::Bucket => 1,
            SequenceKind::Container => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SequenceKind::Feed => "excessive animal feeding",
            SequenceKind::Bucket => "excessive bucket use",
            SequenceKind::Container => "excessive container access",
        }
    }
}

/// Why an action was refused
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionViolation {
    OutOfReach { distance: f64 },
    TooFast { kind: ActionKind, elapsed_ms: u64 },
    DoorSpam,
    SequenceCap(SequenceKind),
    RateCap { recent: usize },
    Burst { kind: ActionKind, count: usize },
}

impl fmt::Display for ActionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionViolation::OutOfReach { distance } => {
                write!(f, "reach: target {:.2} blocks away", distance)
            }
            ActionViolation::TooFast { kind, elapsed_ms } => {
                write!(f, "impossible {} speed ({}ms since last)", kind.label(), elapsed_ms)
            }
            ActionViolation::DoorSpam => write!(f, "door toggled too fast"),
            ActionViolation::SequenceCap(seq) => write!(f, "{}", seq.label()),
            ActionViolation::RateCap { recent } => {
                write!(f, "too many actions per second ({})", recent)
            }
            ActionViolation::Burst { kind, count } => {
                write!(f, "automated {} burst ({} in window)", kind.label(), count)
            }
        }
    }
}

/// Consecutive uses of one repeatable interaction
#[derive(Debug, Clone, Copy, Default)]
struct SequenceCounter {
    count: u32,
    last_ms: u64,
}

impl SequenceCounter {
    /// Current run length, treating a stale run as over
    fn run_length(&self, now: u64, timeout_ms: u64) -> u32 {
        if now.saturating_sub(self.last_ms) > timeout_ms {
            0
        } else {
            self.count
        }
    }

    fn bump(&mut self, now: u64, timeout_ms: u64) {
        self.count = self.run_length(now, timeout_ms) + 1;
        self.last_ms = now;
    }
}

/// Per-player action history, created on first action
#[derive(Debug, Clone)]
struct PlayerActionState {
    last_action: [Option<u64>; 5],
    recent: RingBuffer<(u64, ActionKind)>,
    sequences: [SequenceCounter; 3],
    doors: RingBuffer<(BlockPos, u64)>,
    violations: ViolationTracker,
    cached_position: Option<(Vec3, u64)>,
    last_activity_ms: u64,
}

impl PlayerActionState {
    fn new(limits: &ActionLimits, now: u64) -> Self {
        Self {
            last_action: [None; 5],
            recent: RingBuffer::with_capacity(limits.history_capacity),
            sequences: [SequenceCounter::default(); 3],
            doors: RingBuffer::with_capacity(TRACKED_DOORS),
            violations: ViolationTracker::default(),
            cached_position: None,
            last_activity_ms: now,
        }
    }

    /// Cached position, refreshed from the host at most once per refresh interval
    fn position(&mut self, status: &PlayerStatus, now: u64, refresh_ms: u64) -> Vec3 {
        match self.cached_position {
            Some((pos, at)) if now.saturating_sub(at) < refresh_ms => pos,
            _ => {
                self.cached_position = Some((status.position, now));
                status.position
            }
        }
    }

    fn evaluate(
        &mut self,
        limits: &ActionLimits,
        status: &PlayerStatus,
        action: &Action,
        now: u64,
    ) -> Result<(), ActionViolation> {
        let kind = action.kind();
        let rule = action.rule();

        if let Some(target) = action.target_position() {
            let origin = self.position(status, now, limits.position_refresh_ms);
            let eye = Vec3::new(origin.x, origin.y + EYE_HEIGHT, origin.z);
            let distance = eye.distance(target);
            if distance > limits.max_reach {
                return Err(ActionViolation::OutOfReach { distance });
            }
        }

        let cooldown = match rule {
            Rule::Default => kind_cooldown(limits, kind),
            Rule::Harvest => limits.harvest_break_cooldown_ms,
            Rule::Door(_) => limits.door_cooldown_ms,
            Rule::Sequence(SequenceKind::Feed) => limits.feed_cooldown_ms,
            Rule::Sequence(SequenceKind::Bucket) => limits.bucket_cooldown_ms,
            Rule::Sequence(SequenceKind::Container) => limits.interact_cooldown_ms,
        };
        if let Some(last) = self.last_action[kind.index()] {
            let elapsed_ms = now.saturating_sub(last);
            if elapsed_ms < cooldown {
                return Err(ActionViolation::TooFast { kind, elapsed_ms });
            }
        }

        match rule {
            Rule::Door(pos) => {
                let recently_toggled = self.doors.iter().any(|(door, at)| {
                    door == pos && now.saturating_sub(at) < limits.same_door_cooldown_ms
                });
                if recently_toggled {
                    return Err(ActionViolation::DoorSpam);
                }
            }
            Rule::Sequence(seq) => {
                let (cap, timeout) = sequence_limits(limits, seq);
                if self.sequences[seq.index()].run_length(now, timeout) >= cap {
                    return Err(ActionViolation::SequenceCap(seq));
                }
            }
            Rule::Default | Rule::Harvest => {}
        }

        let recent = self
            .recent
            .count_where(|(at, _)| now.saturating_sub(*at) < limits.rate_window_ms);
        if recent >= limits.max_actions_per_second {
            return Err(ActionViolation::RateCap { recent });
        }

        let count = self.recent.count_where(|(at, k)| {
            *k == kind && now.saturating_sub(*at) < limits.burst_window_ms
        });
        if count >= limits.burst_threshold {
            return Err(ActionViolation::Burst { kind, count });
        }

        Ok(())
    }

    fn accept(&mut self, limits: &ActionLimits, action: &Action, now: u64) {
        let kind = action.kind();
        self.last_action[kind.index()] = Some(now);
        self.recent.push((now, kind));

        match action.rule() {
            Rule::Door(pos) => self.doors.push((pos, now)),
            Rule::Sequence(seq) => {
                let (_, timeout) = sequence_limits(limits, seq);
                self.sequences[seq.index()].bump(now, timeout);
            }
            Rule::Default | Rule::Harvest => {}
        }
    }
}

fn kind_cooldown(limits: &ActionLimits, kind: ActionKind) -> u64 {
    match kind {
        ActionKind::Break => limits.break_cooldown_ms,
        ActionKind::Place => limits.place_cooldown_ms,
        ActionKind::Use => limits.use_cooldown_ms,
        ActionKind::Attack => limits.attack_cooldown_ms,
        ActionKind::Interact => limits.interact_cooldown_ms,
    }
}

fn sequence_limits(limits: &ActionLimits, seq: SequenceKind) -> (u32, u64) {
    match seq {
        SequenceKind::Feed => (limits.feed_sequence_cap, limits.feed_sequence_timeout_ms),
        SequenceKind::Bucket => (limits.bucket_sequence_cap, limits.bucket_sequence_timeout_ms),
        SequenceKind::Container => (
            limits.container_sequence_cap,
            limits.container_sequence_timeout_ms,
        ),
    }
}

/// Side effects decided while the player entry was locked
struct ViolationOutcome {
    count: u32,
    warn: bool,
    escalate: bool,
}

/// Per-player allow/deny gate for discrete actions
pub struct ActionRateLimiter {
    limits: ActionLimits,
    players: DashMap<PlayerId, PlayerActionState>,
    clock: Arc<dyn Clock>,
    sinks: Sinks,
    sweep: SweepGate,
}

impl ActionRateLimiter {
    pub fn new(limits: ActionLimits, clock: Arc<dyn Clock>, sinks: Sinks) -> Self {
        let sweep = SweepGate::new(clock.now_millis(), limits.sweep_interval_ms);
        Self {
            limits,
            players: DashMap::new(),
            clock,
            sinks,
            sweep,
        }
    }

    pub fn limits(&self) -> &ActionLimits {
        &self.limits
    }

    /// Decide whether `action` may proceed; records a violation on refusal
    pub fn check(&self, status: &PlayerStatus, action: Action) -> bool {
        if status.privileged {
            return true;
        }

        let now = self.clock.now_millis();
        let verdict = {
            let mut state = self
                .players
                .entry(status.id)
                .or_insert_with(|| PlayerActionState::new(&self.limits, now));
            state.last_activity_ms = now;

            match state.evaluate(&self.limits, status, &action, now) {
                Ok(()) => {
                    state.accept(&self.limits, &action, now);
                    Ok(())
                }
                Err(violation) => {
                    let count = state.violations.record(now);
                    Err((violation, self.outcome(count)))
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

    pub fn can_break_block(&self, status: &PlayerStatus, pos: BlockPos, block: BlockKind) -> bool {
        self.check(status, Action::Break { pos, block })
    }

    pub fn can_place_block(&self, status: &PlayerStatus, pos: BlockPos) -> bool {
        self.check(status, Action::Place { pos })
    }

    pub fn can_use_item(
        &self,
        status: &PlayerStatus,
        item: Option<ItemKind>,
        hand: Hand,
        target: Option<EntityTarget>,
    ) -> bool {
        self.check(status, Action::UseItem { item, hand, target })
    }

    pub fn can_interact_with_block(
        &self,
        status: &PlayerStatus,
        pos: BlockPos,
        block: BlockKind,
    ) -> bool {
        self.check(status, Action::Interact { pos, block })
    }

    pub fn can_attack(&self, status: &PlayerStatus, target: Option<EntityTarget>) -> bool {
        self.check(status, Action::Attack { target })
    }

    fn outcome(&self, count: u32) -> ViolationOutcome {
        let above = self.limits.escalate_above;
        ViolationOutcome {
            count,
            warn: self.limits.warn_at.contains(&count),
            // Signal on crossing, then again every ten further violations
            escalate: count > above && (count - above - 1) % 10 == 0,
        }
    }

    fn dispatch(&self, player: PlayerId, violation: &ActionViolation, outcome: ViolationOutcome, now: u64) {
        debug!(
            player = %player,
            violations = outcome.count,
            reason = %violation,
            "Action rejected"
        );

        if outcome.warn {
            self.sinks.remediation.warn_player(
                player,
                &format!(
                    "[AntiCheat] You are acting faster than allowed ({} violations)",
                    outcome.count
                ),
            );
        }

        if outcome.escalate {
            self.sinks.escalation.escalate(&Escalation {
                player,
                source: ViolationSource::Action,
                violations: outcome.count,
                reason: violation.to_string(),
                recommendation: Recommendation::Review,
                at_millis: now,
            });
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
            "Action limiter maintenance"
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

    /// Number of timestamps currently retained for a player
    pub fn history_len(&self, player: PlayerId) -> usize {
        self.players.get(&player).map(|s| s.recent.len()).unwrap_or(0)
    }

    /// Human-readable diagnostics for admin tooling
    pub fn player_stats(&self, player: PlayerId) -> String {
        let Some(state) = self.players.get(&player) else {
            return format!("Actions[{}]: no data", player);
        };
        let now = self.clock.now_millis();
        let last_second = state
            .recent
            .count_where(|(at, _)| now.saturating_sub(*at) < self.limits.rate_window_ms);
        let per_kind = ActionKind::ALL
            .iter()
            .map(|kind| {
                let ago = state.last_action[kind.index()]
                    .map(|at| format!("{}ms", now.saturating_sub(at)))
                    .unwrap_or_else(|| "never".to_string());
                format!("{}={}", kind.label(), ago)
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "Actions[{}]: violations={} last_second={} history={}/{} last: {}",
            player,
            state.violations.count(),
            last_second,
            state.recent.len(),
            state.recent.capacity(),
            per_kind
        )
    }
}
