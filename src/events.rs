//! Boundary between the game core and whatever presents it.

use crate::scoring::Rank;
use crate::token::{TokenId, TokenKind};

/// Inbound requests from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// The player clicked or tapped a token.
    Activate(TokenId),
    /// Start a session, or restart after one ended.
    Start,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Fell past the bottom edge.
    Exited,
    /// Caught by the player. The presenter may fade it out; the core already forgot it.
    Collected,
    /// Swept away by a session start or end.
    Cleared,
}

/// Outbound notifications, in the order state changed.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SessionStarted,
    TokenSpawned {
        id: TokenId,
        kind: TokenKind,
        x: f32,
        y: f32,
        speed: f32,
    },
    TokenMoved {
        id: TokenId,
        y: f32,
    },
    TokenRemoved {
        id: TokenId,
        reason: RemovalReason,
    },
    ScoreChanged(u32),
    TimeChanged(u32),
    SetProgressChanged {
        collected: Vec<TokenKind>,
        next_expected: TokenKind,
    },
    ComboChanged {
        multiplier: u32,
    },
    SetCompleted {
        ordered: bool,
        points: u32,
    },
    SessionEnded {
        final_score: u32,
        rank: Rank,
    },
}
