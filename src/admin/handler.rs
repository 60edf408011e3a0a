//! Admin WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::admin::protocol::{AdminClientMsg, AdminServerMsg};
use crate::anticheat::run_command;
use crate::app::AppState;
use crate::util::rate_limit::AdminRateLimiter;
use crate::util::time::{unix_millis, uptime_secs};

/// Queued replies per connection before the reader waits on the writer
const REPLY_QUEUE: usize = 32;

/// Query parameters for the admin socket
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    /// Shared secret, required when the server has one configured
    pub token: Option<String>,
}

/// Admin WebSocket upgrade handler
pub async fn admin_ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<AdminQuery>,
    State(state): State<AppState>,
) -> Response {
    if !authorized(state.config.admin_token.as_deref(), query.token.as_deref()) {
        warn!("Admin socket refused: bad or missing token");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn authorized(expected: Option<&str>, presented: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(secret) => presented == Some(secret),
    }
}

/// Handle the upgraded admin connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = Uuid::new_v4();
    info!(session = %session, "Admin connected");

    let (mut ws_sink, ws_stream) = socket.split();

    let welcome = AdminServerMsg::Welcome {
        server_time: unix_millis(),
        uptime_secs: uptime_secs(),
    };
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(session = %session, error = %e, "Failed to send welcome");
        return;
    }

    // Subscribe before replaying so nothing falls between the two
    let escalation_rx = state.escalations.subscribe();
    for msg in state.escalations.replay() {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(session = %session, error = %e, "Failed to replay escalations");
            return;
        }
    }

    run_session(session, state, ws_sink, ws_stream, escalation_rx).await;

    info!(session = %session, "Admin connection closed");
}

/// Run the admin session with read/write split
async fn run_session(
    session: Uuid,
    state: AppState,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut escalation_rx: broadcast::Receiver<AdminServerMsg>,
) {
    let rate_limiter = AdminRateLimiter::new();
    let (reply_tx, mut reply_rx) = mpsc::channel::<AdminServerMsg>(REPLY_QUEUE);

    // Writer task: command replies and escalation pushes -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
                event = escalation_rx.recv() => match event {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(session = %session, lagged_count = n, "Admin lagged behind escalations");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(session = %session, error = %e, "Admin send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> command dispatch
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_message() {
                    warn!(session = %session, "Rate limited admin message");
                    let refused = AdminServerMsg::Error {
                        message: "rate limited".to_string(),
                    };
                    if reply_tx.send(refused).await.is_err() {
                        break;
                    }
                    continue;
                }

                if dispatch(&state, &text, &reply_tx).await.is_err() {
                    debug!(session = %session, "Reply channel closed");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session = %session, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session = %session, "Admin initiated close");
                break;
            }
            Err(e) => {
                error!(session = %session, error = %e, "Admin socket error");
                break;
            }
        }
    }

    drop(reply_tx);
    writer_handle.abort();
}

/// Parse one text frame, execute it, and queue the reply
pub async fn dispatch(
    state: &AppState,
    text: &str,
    replies: &mpsc::Sender<AdminServerMsg>,
) -> Result<(), mpsc::error::SendError<AdminServerMsg>> {
    let reply = match serde_json::from_str::<AdminClientMsg>(text) {
        Ok(AdminClientMsg::Command { line }) => {
            let result = run_command(&state.anticheat, &line);
            info!(command = %line, ok = result.is_ok(), "Admin command");
            match result {
                Ok(output) => AdminServerMsg::CommandResult {
                    line,
                    ok: true,
                    output,
                },
                Err(e) => AdminServerMsg::CommandResult {
                    line,
                    ok: false,
                    output: e.to_string(),
                },
            }
        }
        Ok(AdminClientMsg::Ping { t }) => AdminServerMsg::Pong {
            t,
            server_time: unix_millis(),
        },
        Err(e) => {
            warn!(error = %e, "Failed to parse admin message");
            AdminServerMsg::Error {
                message: format!("invalid message: {}", e),
            }
        }
    };

    replies.send(reply).await
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &AdminServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
