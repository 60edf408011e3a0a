//! Outbound hooks: player remediation and operator escalation
//!
//! The core never talks to the game or the network directly. It asks these
//! sinks to correct a position, warn a player, or flag a player to operators,
//! and the host decides what that means.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::world::{PlayerId, Vec3};

/// Player-facing remediation requested by the core
pub trait RemediationSink: Send + Sync {
    /// Hard position correction (teleport back)
    fn correct_position(&self, player: PlayerId, position: Vec3);

    /// Informational, player-visible warning
    fn warn_player(&self, player: PlayerId, message: &str);
}

/// Operator-facing escalation channel; never kicks on its own
pub trait EscalationSink: Send + Sync {
    fn escalate(&self, event: &Escalation);
}

/// Which component raised a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSource {
    Action,
    Movement,
}

impl ViolationSource {
    pub fn label(self) -> &'static str {
        match self {
            ViolationSource::Action => "action",
            ViolationSource::Movement => "movement",
        }
    }
}

/// What the core suggests operators do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Review,
    Remove,
}

/// Raised when a player's violation count crosses its ceiling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Escalation {
    pub player: PlayerId,
    pub source: ViolationSource,
    pub violations: u32,
    pub reason: String,
    pub recommendation: Recommendation,
    pub at_millis: u64,
}

/// Both sinks bundled for injection into a component
#[derive(Clone)]
pub struct Sinks {
    pub remediation: Arc<dyn RemediationSink>,
    pub escalation: Arc<dyn EscalationSink>,
}

impl Sinks {
    pub fn new(remediation: Arc<dyn RemediationSink>, escalation: Arc<dyn EscalationSink>) -> Self {
        Self {
            remediation,
            escalation,
        }
    }

    /// Sinks that only write to the log
    pub fn logging() -> Self {
        let sink = Arc::new(LogSink);
        Self::new(sink.clone(), sink)
    }
}

/// Writes every request to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RemediationSink for LogSink {
    fn correct_position(&self, player: PlayerId, position: Vec3) {
        warn!(
            player = %player,
            x = position.x,
            y = position.y,
            z = position.z,
            "Position correction requested"
        );
    }

    fn warn_player(&self, player: PlayerId, message: &str) {
        info!(player = %player, message, "Player warning");
    }
}

impl EscalationSink for LogSink {
    fn escalate(&self, event: &Escalation) {
        warn!(
            player = %event.player,
            source = event.source.label(),
            violations = event.violations,
            recommendation = ?event.recommendation,
            reason = %event.reason,
            "Player exceeded violation threshold"
        );
    }
}

/// Request captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub enum Remediation {
    Correct { player: PlayerId, position: Vec3 },
    Warn { player: PlayerId, message: String },
}

/// Keeps every request in memory; used for trace replays and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    remediations: Mutex<Vec<Remediation>>,
    escalations: Mutex<Vec<Escalation>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn remediations(&self) -> Vec<Remediation> {
        self.remediations.lock().clone()
    }

    pub fn escalations(&self) -> Vec<Escalation> {
        self.escalations.lock().clone()
    }

    pub fn corrections(&self) -> usize {
        self.remediations
            .lock()
            .iter()
            .filter(|r| matches!(r, Remediation::Correct { .. }))
            .count()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.remediations
            .lock()
            .iter()
            .filter_map(|r| match r {
                Remediation::Warn { message, .. } => Some(message.clone()),
                Remediation::Correct { .. } => None,
            })
            .collect()
    }

    /// Bundle this sink as both remediation and escalation target
    pub fn sinks(self: &Arc<Self>) -> Sinks {
        Sinks::new(self.clone(), self.clone())
    }
}

impl RemediationSink for MemorySink {
    fn correct_position(&self, player: PlayerId, position: Vec3) {
        self.remediations
            .lock()
            .push(Remediation::Correct { player, position });
    }

    fn warn_player(&self, player: PlayerId, message: &str) {
        self.remediations.lock().push(Remediation::Warn {
            player,
            message: message.to_string(),
        });
    }
}

impl EscalationSink for MemorySink {
    fn escalate(&self, event: &Escalation) {
        self.escalations.lock().push(event.clone());
    }
}

/// Fans one escalation out to several sinks
pub struct FanoutEscalation {
    targets: Vec<Arc<dyn EscalationSink>>,
}

impl FanoutEscalation {
    pub fn new(targets: Vec<Arc<dyn EscalationSink>>) -> Self {
        Self { targets }
    }
}

impl EscalationSink for FanoutEscalation {
    fn escalate(&self, event: &Escalation) {
        for target in &self.targets {
            target.escalate(event);
        }
    }
}
