//! Escalation fan-out to connected admin sockets

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::anticheat::{Escalation, EscalationSink};

use super::protocol::AdminServerMsg;

/// Broadcast channel capacity for escalation events
const CHANNEL_CAPACITY: usize = 256;

/// Recent escalations kept for newly connected admins
pub const HISTORY_LIMIT: usize = 50;

/// Publishes every escalation to subscribed admin connections
pub struct EscalationBroadcaster {
    tx: broadcast::Sender<AdminServerMsg>,
    history: Mutex<VecDeque<Escalation>>,
}

impl EscalationBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdminServerMsg> {
        self.tx.subscribe()
    }

    /// Most recent escalations, oldest first
    pub fn recent(&self) -> Vec<Escalation> {
        self.history.lock().iter().cloned().collect()
    }

    /// Recent escalations as wire messages, replayed to an admin on connect
    pub fn replay(&self) -> Vec<AdminServerMsg> {
        self.history.lock().iter().map(AdminServerMsg::from).collect()
    }
}

impl Default for EscalationBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EscalationSink for EscalationBroadcaster {
    fn escalate(&self, event: &Escalation) {
        {
            let mut history = self.history.lock();
            if history.len() == HISTORY_LIMIT {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        // No receivers just means no admin is connected
        if let Ok(receivers) = self.tx.send(AdminServerMsg::from(event)) {
            debug!(player = %event.player, receivers, "Escalation broadcast to admins");
        }
    }
}
