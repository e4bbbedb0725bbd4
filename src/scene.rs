//! What the screen shows, rebuilt purely from [`GameEvent`]s.
//!
//! The core never hands out its registry to the UI. Instead the scene mirrors
//! tokens, HUD values and the final result from the event stream, keeps
//! collected tokens around while they fade, and maps clicks back to ids.

use crate::config::{TOKEN_HEIGHT, TOKEN_WIDTH};
use crate::events::{GameEvent, RemovalReason};
use crate::scoring::Rank;
use crate::token::{TokenId, TokenKind};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// How long a collected token lingers on screen while it fades.
pub const COLLECT_FADE: Duration = Duration::from_millis(300);
/// Playfield border flash after a completed set.
pub const SET_FLASH: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneToken {
    pub kind: TokenKind,
    pub x: f32,
    pub y: f32,
}

impl SceneToken {
    /// Top-left terminal cell, relative to the board.
    pub fn cell(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.floor() as i32)
    }

    pub fn contains(&self, column: i32, row: i32) -> bool {
        let (cx, cy) = self.cell();
        column >= cx
            && column < cx + TOKEN_WIDTH as i32
            && row >= cy
            && row < cy + TOKEN_HEIGHT as i32
    }
}

pub struct Fading {
    pub token: SceneToken,
    pub started: Instant,
    /// Created by the renderer on first draw.
    pub effect: Option<Effect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastSet {
    pub ordered: bool,
    pub points: u32,
}

pub struct Scene {
    pub tokens: BTreeMap<TokenId, SceneToken>,
    pub fading: Vec<Fading>,
    pub score: u32,
    pub time_remaining: u32,
    pub collected: Vec<TokenKind>,
    pub next_expected: TokenKind,
    pub multiplier: u32,
    pub last_set: Option<LastSet>,
    pub flash_until: Option<Instant>,
    pub result: Option<(u32, Rank)>,
    /// Last time fade effects were advanced, for frame deltas.
    pub fx_time: Option<Instant>,
    animate: bool,
}

impl Scene {
    pub fn new(animate: bool) -> Self {
        Self {
            tokens: BTreeMap::new(),
            fading: Vec::new(),
            score: 0,
            time_remaining: 0,
            collected: Vec::new(),
            next_expected: TokenKind(0),
            multiplier: 1,
            last_set: None,
            flash_until: None,
            result: None,
            fx_time: None,
            animate,
        }
    }

    pub fn apply(&mut self, event: GameEvent, now: Instant) {
        match event {
            GameEvent::SessionStarted => {
                self.fading.clear();
                self.last_set = None;
                self.flash_until = None;
                self.result = None;
            }
            GameEvent::TokenSpawned { id, kind, x, y, .. } => {
                self.tokens.insert(id, SceneToken { kind, x, y });
            }
            GameEvent::TokenMoved { id, y } => {
                if let Some(t) = self.tokens.get_mut(&id) {
                    t.y = y;
                }
            }
            GameEvent::TokenRemoved { id, reason } => {
                let removed = self.tokens.remove(&id);
                let fades = reason == RemovalReason::Collected && self.animate;
                if let (Some(token), true) = (removed, fades) {
                    self.fading.push(Fading {
                        token,
                        started: now,
                        effect: None,
                    });
                }
            }
            GameEvent::ScoreChanged(score) => self.score = score,
            GameEvent::TimeChanged(secs) => self.time_remaining = secs,
            GameEvent::SetProgressChanged {
                collected,
                next_expected,
            } => {
                self.collected = collected;
                self.next_expected = next_expected;
            }
            GameEvent::ComboChanged { multiplier } => self.multiplier = multiplier,
            GameEvent::SetCompleted { ordered, points } => {
                self.last_set = Some(LastSet { ordered, points });
                if self.animate {
                    self.flash_until = Some(now + SET_FLASH);
                }
            }
            GameEvent::SessionEnded { final_score, rank } => {
                self.fading.clear();
                self.result = Some((final_score, rank));
            }
        }
    }

    /// Drop finished fades and expired flashes.
    pub fn prune(&mut self, now: Instant) {
        self.fading
            .retain(|f| now.saturating_duration_since(f.started) < COLLECT_FADE);
        if self.flash_until.is_some_and(|t| now >= t) {
            self.flash_until = None;
        }
    }

    pub fn flashing(&self, now: Instant) -> bool {
        self.flash_until.is_some_and(|t| now < t)
    }

    /// Live token under a board cell. Later spawns are drawn on top, so they win.
    pub fn hit_test(&self, column: i32, row: i32) -> Option<TokenId> {
        self.tokens
            .iter()
            .rev()
            .find(|(_, t)| t.contains(column, row))
            .map(|(id, _)| *id)
    }
}
