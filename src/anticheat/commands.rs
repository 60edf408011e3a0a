//! Operator commands executed against the anti-cheat core

use std::fmt;

use uuid::Uuid;

use crate::util::time::uptime_secs;
use crate::world::PlayerId;

use super::facade::AntiCheat;

/// A parsed admin command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Status,
    Check(PlayerId),
    Reset(PlayerId),
    Stats(PlayerId),
}

/// Command parsing and execution errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0} (expected status, check, reset or stats)")]
    Unknown(String),

    #[error("Usage: {0} <player-uuid>")]
    MissingPlayer(&'static str),

    #[error("Invalid player id: {0}")]
    InvalidPlayer(String),

    #[error("No anti-cheat data for player {0}")]
    UnknownPlayer(PlayerId),
}

impl AdminCommand {
    /// Parse `status`, `check <player>`, `reset <player>` or `stats <player>`
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();

        let player = |usage: &'static str, arg: Option<&str>| -> Result<PlayerId, CommandError> {
            let raw = arg.ok_or(CommandError::MissingPlayer(usage))?;
            Uuid::parse_str(raw).map_err(|_| CommandError::InvalidPlayer(raw.to_string()))
        };

        match name.as_str() {
            "status" => Ok(AdminCommand::Status),
            "check" => Ok(AdminCommand::Check(player("check", parts.next())?)),
            "reset" => Ok(AdminCommand::Reset(player("reset", parts.next())?)),
            "stats" => Ok(AdminCommand::Stats(player("stats", parts.next())?)),
            _ => Err(CommandError::Unknown(name)),
        }
    }

    /// Run the command and produce the operator-facing reply
    pub fn execute(self, anticheat: &AntiCheat) -> Result<String, CommandError> {
        match self {
            AdminCommand::Status => {
                let tracked = anticheat.tracked_players();
                Ok(format!(
                    "Anti-cheat active: {} players in action limiter, {} in movement validator, uptime {}s",
                    tracked.actions,
                    tracked.movement,
                    uptime_secs()
                ))
            }
            AdminCommand::Check(player) => {
                let summary = anticheat.violation_summary(player);
                if summary.total() == 0 && !anticheat.is_tracked(player) {
                    return Err(CommandError::UnknownPlayer(player));
                }
                Ok(format!(
                    "{}: {} action violations, {} movement violations",
                    player, summary.action_violations, summary.movement_violations
                ))
            }
            AdminCommand::Reset(player) => {
                if !anticheat.is_tracked(player) {
                    return Err(CommandError::UnknownPlayer(player));
                }
                anticheat.reset_violations(player);
                Ok(format!("Reset violations for {}", player))
            }
            AdminCommand::Stats(player) => {
                if !anticheat.is_tracked(player) {
                    return Err(CommandError::UnknownPlayer(player));
                }
                Ok(anticheat.player_stats(player))
            }
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminCommand::Status => write!(f, "status"),
            AdminCommand::Check(p) => write!(f, "check {}", p),
            AdminCommand::Reset(p) => write!(f, "reset {}", p),
            AdminCommand::Stats(p) => write!(f, "stats {}", p),
        }
    }
}

/// Parse and execute in one step
pub fn run_command(anticheat: &AntiCheat, line: &str) -> Result<String, CommandError> {
    AdminCommand::parse(line)?.execute(anticheat)
}
