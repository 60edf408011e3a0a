//! Application state shared across routes and background tasks

use std::sync::Arc;

use crate::admin::EscalationBroadcaster;
use crate::anticheat::{AntiCheat, EscalationSink, FanoutEscalation, LogSink, Sinks};
use crate::config::Config;
use crate::util::time::{Clock, SystemClock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub anticheat: Arc<AntiCheat>,
    pub escalations: Arc<EscalationBroadcaster>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(config);

        // Escalations go to the log and to every connected admin
        let escalations = Arc::new(EscalationBroadcaster::new());
        let targets: Vec<Arc<dyn EscalationSink>> = vec![
            Arc::new(LogSink) as Arc<dyn EscalationSink>,
            escalations.clone() as Arc<dyn EscalationSink>,
        ];
        let sinks = Sinks::new(Arc::new(LogSink), Arc::new(FanoutEscalation::new(targets)));

        let anticheat = Arc::new(AntiCheat::new(config.anticheat.clone(), clock, sinks));

        Self {
            config,
            anticheat,
            escalations,
        }
    }
}
