//! Admin bridge: WebSocket command channel and escalation feed

pub mod broadcast;
pub mod handler;
pub mod protocol;
pub mod routes;

pub use broadcast::EscalationBroadcaster;
pub use protocol::{AdminClientMsg, AdminServerMsg};
pub use routes::build_router;
