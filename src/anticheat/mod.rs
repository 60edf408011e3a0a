//! Heuristic anti-cheat core
//!
//! Two validators share violation bookkeeping and sinks:
//! - [`ActionRateLimiter`] gates discrete actions (break, place, use, attack, interact)
//! - [`MovementAntiCheat`] validates per-tick position changes
//!
//! Hosts normally hold a single [`AntiCheat`] which owns both.

pub mod action;
pub mod commands;
pub mod facade;
pub mod movement;
pub mod sinks;
pub mod violations;

pub use action::{Action, ActionKind, ActionRateLimiter, ActionViolation};
pub use commands::{run_command, AdminCommand, CommandError};
pub use facade::{AntiCheat, TrackedPlayers, ViolationSummary};
pub use movement::{MovementAntiCheat, MovementViolation};
pub use sinks::{
    EscalationSink, Escalation, FanoutEscalation, LogSink, MemorySink, Recommendation, Remediation,
    RemediationSink, Sinks, ViolationSource,
};
