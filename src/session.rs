//! Session state machine: owns every piece of mutable game state.
//!
//! Everything runs on one timeline. Commands queue in an inbox and are pumped
//! before clock ticks are dispatched; each handler runs to completion and
//! reports what changed as [`GameEvent`]s.

use crate::clock::{Clock, Tick, TickKind};
use crate::config::{ConfigError, GameConfig, PlayArea};
use crate::events::{Command, GameEvent, RemovalReason};
use crate::motion;
use crate::scoring::{ComboState, Rank, Scorer, SetProgress};
use crate::spawner::{RandomSource, Spawner};
use crate::token::{TokenId, TokenRegistry};
use rand_pcg::Pcg32;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Ended,
}

#[derive(Debug)]
pub struct GameSession<R: RandomSource = Pcg32> {
    config: GameConfig,
    area: PlayArea,
    phase: Phase,
    score: u32,
    time_remaining: u32,
    progress: SetProgress,
    combo: ComboState,
    registry: TokenRegistry,
    clock: Clock,
    spawner: Spawner,
    scorer: Scorer,
    rng: R,
    inbox: VecDeque<Command>,
    events: Vec<GameEvent>,
    /// Scratch buffer for ticks due in one `advance`.
    due: Vec<Tick>,
}

impl<R: RandomSource> GameSession<R> {
    pub fn new(config: GameConfig, area: PlayArea, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = Clock::new(
            config.spawn_period(),
            config.motion_period(),
            config.countdown_period(),
        );
        let spawner = Spawner::new(&config);
        let scorer = Scorer::new(config.alphabet.len(), config.base_points);
        Ok(Self {
            time_remaining: config.session_secs,
            config,
            area,
            phase: Phase::Idle,
            score: 0,
            progress: SetProgress::default(),
            combo: ComboState::default(),
            registry: TokenRegistry::new(),
            clock,
            spawner,
            scorer,
            rng,
            inbox: VecDeque::new(),
            events: Vec::new(),
            due: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    #[cfg(test)]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[cfg(test)]
    pub fn progress(&self) -> &SetProgress {
        &self.progress
    }

    #[cfg(test)]
    pub fn combo(&self) -> ComboState {
        self.combo
    }

    #[cfg(test)]
    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn area(&self) -> PlayArea {
        self.area
    }

    /// Final score and rank of the last finished session.
    #[cfg(test)]
    pub fn outcome(&self) -> Option<(u32, Rank)> {
        (self.phase == Phase::Ended).then(|| (self.score, Rank::for_score(self.score)))
    }

    /// Resize the play area. Live tokens keep their positions; the new bounds
    /// apply to the next spawn and exit check.
    pub fn set_play_area(&mut self, area: PlayArea) {
        self.area = area;
    }

    /// Queue a command for the next `pump`/`advance`.
    pub fn submit(&mut self, command: Command) {
        self.inbox.push_back(command);
    }

    /// Handle every queued command in arrival order.
    pub fn pump(&mut self) {
        while let Some(command) = self.inbox.pop_front() {
            self.handle(command);
        }
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Activate(id) => {
                self.activate(id);
            }
        }
    }

    /// Pump the inbox, then run every tick that fell due during `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.pump();
        let mut due = std::mem::take(&mut self.due);
        self.clock.advance(dt, &mut due);
        for tick in due.drain(..) {
            self.dispatch(tick);
        }
        self.due = due;
    }

    /// Run one tick's handler, unless it belongs to a stopped or earlier run.
    pub fn dispatch(&mut self, tick: Tick) {
        if !self.clock.is_current(tick) {
            tracing::trace!(?tick, "dropping stale tick");
            return;
        }
        match tick.kind {
            TickKind::Spawn => self.spawn_tick(),
            TickKind::Motion => self.motion_tick(),
            TickKind::Countdown => self.countdown_tick(),
        }
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    /// Reset everything and begin a session. Ignored while one is running.
    pub fn start(&mut self) {
        if self.phase == Phase::Active {
            tracing::debug!("start requested during an active session; ignored");
            return;
        }
        self.score = 0;
        self.time_remaining = self.config.session_secs;
        self.progress.clear();
        self.combo = ComboState::default();
        self.clear_tokens();
        self.phase = Phase::Active;
        self.clock.start();
        tracing::info!(
            secs = self.time_remaining,
            kinds = self.config.alphabet.len(),
            "session started"
        );

        self.events.push(GameEvent::SessionStarted);
        self.events.push(GameEvent::ScoreChanged(self.score));
        self.events.push(GameEvent::TimeChanged(self.time_remaining));
        self.emit_progress();
        self.emit_combo();
        self.ensure_coverage();
    }

    /// Stop the clock, sweep the field and publish the result.
    pub fn end(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        self.phase = Phase::Ended;
        self.clock.stop();
        self.clear_tokens();
        let rank = Rank::for_score(self.score);
        tracing::info!(score = self.score, rank = rank.name(), "session ended");
        self.events.push(GameEvent::SessionEnded {
            final_score: self.score,
            rank,
        });
    }

    pub fn spawn_tick(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        let id = self
            .spawner
            .spawn_random(&mut self.registry, self.area, &mut self.rng);
        self.emit_spawned(id);
        self.ensure_coverage();
    }

    pub fn motion_tick(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        let report = motion::integrate(&mut self.registry, self.area);
        self.events.extend(
            report
                .moved
                .into_iter()
                .map(|(id, y)| GameEvent::TokenMoved { id, y }),
        );
        let evicted = !report.exited.is_empty();
        self.events
            .extend(report.exited.into_iter().map(|id| GameEvent::TokenRemoved {
                id,
                reason: RemovalReason::Exited,
            }));
        if evicted {
            self.ensure_coverage();
        }
    }

    pub fn countdown_tick(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.events.push(GameEvent::TimeChanged(self.time_remaining));
        if self.time_remaining == 0 {
            self.end();
        }
    }

    /// Collect a token. Returns false, with no effect, when the session is not
    /// active, the token is gone, or its kind is already in the current set.
    pub fn activate(&mut self, id: TokenId) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        let Some(kind) = self.registry.get(id).map(|t| t.kind) else {
            return false;
        };
        if !self.progress.push(kind) {
            return false;
        }
        self.registry.remove(id);
        self.events.push(GameEvent::TokenRemoved {
            id,
            reason: RemovalReason::Collected,
        });

        if let Some(done) =
            self.scorer
                .check_completion(&mut self.progress, &mut self.combo, &mut self.score)
        {
            self.events.push(GameEvent::SetCompleted {
                ordered: done.ordered,
                points: done.points,
            });
            self.events.push(GameEvent::ScoreChanged(self.score));
            self.emit_combo();
        }
        self.emit_progress();
        self.ensure_coverage();
        true
    }

    fn ensure_coverage(&mut self) {
        let ids = self
            .spawner
            .ensure_coverage(&mut self.registry, self.area, &mut self.rng);
        for id in ids {
            self.emit_spawned(id);
        }
    }

    fn clear_tokens(&mut self) {
        for id in self.registry.clear() {
            self.events.push(GameEvent::TokenRemoved {
                id,
                reason: RemovalReason::Cleared,
            });
        }
    }

    fn emit_spawned(&mut self, id: TokenId) {
        if let Some(t) = self.registry.get(id) {
            self.events.push(GameEvent::TokenSpawned {
                id,
                kind: t.kind,
                x: t.pos.x,
                y: t.pos.y,
                speed: t.speed,
            });
        }
    }

    fn emit_progress(&mut self) {
        self.events.push(GameEvent::SetProgressChanged {
            collected: self.progress.sequence().to_vec(),
            next_expected: self.progress.next_expected(self.config.alphabet.len()),
        });
    }

    fn emit_combo(&mut self) {
        self.events.push(GameEvent::ComboChanged {
            multiplier: self.combo.multiplier(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Epoch;
    use crate::spawner::Scripted;
    use crate::token::TokenKind;
    use rand::SeedableRng;

    fn session() -> GameSession<Scripted> {
        GameSession::new(GameConfig::default(), PlayArea::default(), Scripted::centered()).unwrap()
    }

    fn live(s: &GameSession<Scripted>, kind: u8) -> TokenId {
        s.registry()
            .all()
            .find(|t| t.kind == TokenKind(kind))
            .map(|t| t.id)
            .expect("coverage keeps every kind live")
    }

    fn catch(s: &mut GameSession<Scripted>, order: &[u8]) {
        for &k in order {
            let id = live(s, k);
            assert!(s.activate(id), "catching kind {k}");
            let seq = s.progress().sequence();
            let mut sorted = seq.to_vec();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), seq.len(), "progress never holds duplicates");
        }
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let s = session();
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.registry().is_empty());
        assert!(!s.clock().is_running());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GameConfig {
            frame_rate: 0,
            ..GameConfig::default()
        };
        let err = GameSession::new(config, PlayArea::default(), Scripted::centered()).unwrap_err();
        assert_eq!(err, ConfigError::ZeroFrameRate);
    }

    #[test]
    fn start_populates_one_token_per_kind() {
        let mut s = session();
        s.start();
        assert_eq!(s.phase(), Phase::Active);
        assert_eq!(s.time_remaining(), 60);
        assert_eq!(s.registry().len(), 4);
        assert_eq!(s.registry().types_present().len(), 4);
        let spawned = s
            .drain_events()
            .filter(|e| matches!(e, GameEvent::TokenSpawned { .. }))
            .count();
        assert_eq!(spawned, 4);
    }

    #[test]
    fn ordered_sets_build_a_combo() {
        let mut s = session();
        s.start();
        catch(&mut s, &[0, 1, 2, 3]);
        assert_eq!((s.score(), s.combo().count), (200, 1));
        assert!(s.progress().is_empty());
        catch(&mut s, &[0, 1, 2, 3]);
        assert_eq!((s.score(), s.combo().count), (500, 2));
    }

    #[test]
    fn out_of_order_set_pays_base_only() {
        let mut s = session();
        s.start();
        catch(&mut s, &[1, 0, 2, 3]);
        assert_eq!((s.score(), s.combo().count), (100, 0));
        assert!(s.progress().is_empty());
    }

    #[test]
    fn broken_streak_resets_multiplier() {
        let mut s = session();
        s.start();
        catch(&mut s, &[0, 1, 2, 3]);
        catch(&mut s, &[0, 1, 2, 3]);
        catch(&mut s, &[3, 2, 1, 0]);
        assert_eq!((s.score(), s.combo().count), (600, 0));
        catch(&mut s, &[0, 1, 2, 3]);
        assert_eq!(s.score(), 800);
    }

    #[test]
    fn duplicate_kind_in_set_is_ignored() {
        let mut s = session();
        s.start();
        catch(&mut s, &[0]);
        // Coverage brought a fresh kind-0 token back.
        let again = live(&s, 0);
        s.drain_events().for_each(drop);
        assert!(!s.activate(again));
        assert!(s.registry().get(again).is_some(), "token is left in play");
        assert_eq!(s.progress().len(), 1);
        assert_eq!(s.drain_events().count(), 0);
    }

    #[test]
    fn activation_of_unknown_token_is_ignored() {
        let mut s = session();
        s.start();
        assert!(!s.activate(TokenId(9_999)));
        assert!(s.progress().is_empty());
    }

    #[test]
    fn activation_before_start_is_ignored() {
        let mut s = session();
        assert!(!s.activate(TokenId(0)));
    }

    #[test]
    fn collection_emits_removal_and_refills_coverage() {
        let mut s = session();
        s.start();
        s.drain_events().for_each(drop);
        let id = live(&s, 2);
        s.activate(id);
        let events: Vec<_> = s.drain_events().collect();
        assert_eq!(
            events[0],
            GameEvent::TokenRemoved {
                id,
                reason: RemovalReason::Collected
            }
        );
        assert!(events.contains(&GameEvent::SetProgressChanged {
            collected: vec![TokenKind(2)],
            next_expected: TokenKind(1),
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::TokenSpawned { kind: TokenKind(2), .. }
        )));
        assert_eq!(s.registry().types_present().len(), 4);
    }

    #[test]
    fn countdown_to_zero_ends_and_freezes_the_session() {
        let mut s = session();
        s.start();
        let id = live(&s, 0);
        for _ in 0..59 {
            s.countdown_tick();
        }
        assert_eq!(s.phase(), Phase::Active);
        s.countdown_tick();
        assert_eq!(s.phase(), Phase::Ended);
        assert!(s.registry().is_empty());
        assert!(!s.clock().is_running());
        assert!(!s.activate(id));
        assert_eq!(s.outcome(), Some((0, Rank::Apprentice)));
        let last = s.drain_events().last();
        assert_eq!(
            last,
            Some(GameEvent::SessionEnded {
                final_score: 0,
                rank: Rank::Apprentice
            })
        );
        s.spawn_tick();
        s.motion_tick();
        assert!(s.registry().is_empty());
    }

    #[test]
    fn restart_resets_state() {
        let mut s = session();
        s.start();
        catch(&mut s, &[0, 1, 2, 3]);
        catch(&mut s, &[0, 1]);
        for _ in 0..60 {
            s.countdown_tick();
        }
        assert_eq!(s.phase(), Phase::Ended);
        s.start();
        assert_eq!(s.phase(), Phase::Active);
        assert_eq!((s.score(), s.combo().count, s.time_remaining()), (0, 0, 60));
        assert!(s.progress().is_empty());
        assert_eq!(s.registry().len(), 4);
        assert_eq!(s.outcome(), None);
    }

    #[test]
    fn start_during_active_session_is_ignored() {
        let mut s = session();
        s.start();
        catch(&mut s, &[0, 1]);
        s.start();
        assert_eq!(s.progress().len(), 2);
    }

    #[test]
    fn stale_tick_from_previous_run_is_dropped() {
        let mut s = session();
        s.start();
        let stale = Tick {
            kind: TickKind::Countdown,
            epoch: s.clock().epoch(),
        };
        for _ in 0..60 {
            s.countdown_tick();
        }
        s.start();
        s.dispatch(stale);
        assert_eq!(s.time_remaining(), 60);
        s.dispatch(Tick {
            kind: TickKind::Countdown,
            epoch: s.clock().epoch(),
        });
        assert_eq!(s.time_remaining(), 59);
        s.dispatch(Tick {
            kind: TickKind::Countdown,
            epoch: Epoch(u64::MAX),
        });
        assert_eq!(s.time_remaining(), 59);
    }

    #[test]
    fn ticks_after_session_end_in_one_batch_are_dropped() {
        let config = GameConfig {
            session_secs: 1,
            countdown_interval_ms: 100,
            ..GameConfig::default()
        };
        let mut s =
            GameSession::new(config, PlayArea::default(), Pcg32::seed_from_u64(3)).unwrap();
        s.start();
        s.advance(Duration::from_millis(250));
        assert_eq!(s.phase(), Phase::Ended);
        let events: Vec<_> = s.drain_events().collect();
        let end = events
            .iter()
            .position(|e| matches!(e, GameEvent::SessionEnded { .. }))
            .unwrap();
        assert_eq!(end, events.len() - 1, "nothing runs after the end");
    }

    #[test]
    fn inbox_is_pumped_in_order_before_ticks() {
        let mut s = session();
        s.submit(Command::Start);
        assert_eq!(s.phase(), Phase::Idle);
        s.advance(Duration::ZERO);
        assert_eq!(s.phase(), Phase::Active);
        let a = live(&s, 0);
        let b = live(&s, 1);
        s.submit(Command::Activate(b));
        s.submit(Command::Activate(a));
        s.pump();
        assert_eq!(s.progress().sequence(), &[TokenKind(1), TokenKind(0)]);
    }

    #[test]
    fn exit_on_motion_tick_refills_the_missing_kind() {
        let mut s = session();
        s.start();
        let id = live(&s, 2);
        let height = s.area().height;
        if let Some(t) = s.registry.all_mut().find(|t| t.id == id) {
            t.pos.y = height - 0.01;
        }
        s.drain_events().for_each(drop);

        s.motion_tick();
        let events: Vec<_> = s.drain_events().collect();
        let removed = events
            .iter()
            .position(|e| {
                *e == GameEvent::TokenRemoved {
                    id,
                    reason: RemovalReason::Exited,
                }
            })
            .expect("token fell out of the play area");
        let respawned = events
            .iter()
            .position(|e| matches!(e, GameEvent::TokenSpawned { kind: TokenKind(2), .. }))
            .expect("coverage respawned the kind");
        assert!(removed < respawned);
        assert!(s.registry().get(id).is_none());
        assert_eq!(s.registry().types_present().len(), 4);
        assert_eq!(s.registry().len(), 4);
    }

    #[test]
    fn spawn_tick_adds_exactly_one_random_token() {
        let rng = Scripted::new(vec![0.5], vec![3]);
        let mut s = GameSession::new(GameConfig::default(), PlayArea::default(), rng).unwrap();
        s.start();
        assert_eq!(s.registry().len(), 4);
        s.drain_events().for_each(drop);

        s.spawn_tick();
        let spawned: Vec<_> = s
            .drain_events()
            .filter_map(|e| match e {
                GameEvent::TokenSpawned { kind, .. } => Some(kind),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec![TokenKind(3)], "field was covered, no refill");
        assert_eq!(s.registry().len(), 5);
        let threes = s.registry().all().filter(|t| t.kind == TokenKind(3)).count();
        assert_eq!(threes, 2);
    }

    #[test]
    fn spawn_tick_then_refills_missing_kinds() {
        let rng = Scripted::new(vec![0.5], vec![3]);
        let mut s = GameSession::new(GameConfig::default(), PlayArea::default(), rng).unwrap();
        s.start();
        let gone = live(&s, 1);
        s.registry.remove(gone);
        s.drain_events().for_each(drop);

        s.spawn_tick();
        let spawned: Vec<_> = s
            .drain_events()
            .filter_map(|e| match e {
                GameEvent::TokenSpawned { kind, .. } => Some(kind),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec![TokenKind(3), TokenKind(1)]);
        assert_eq!(s.registry().types_present().len(), 4);
    }

    #[test]
    fn real_time_run_moves_spawns_and_counts_down() {
        let mut s =
            GameSession::new(GameConfig::default(), PlayArea::default(), Pcg32::seed_from_u64(9))
                .unwrap();
        s.start();
        for _ in 0..8 {
            s.advance(Duration::from_millis(250));
        }
        assert_eq!(s.time_remaining(), 58);
        assert!(s.registry().len() >= 4);
        assert_eq!(s.registry().types_present().len(), 4);
        assert!(s.registry().all().all(|t| t.pos.y <= s.area().height));
        let moves = s
            .drain_events()
            .filter(|e| matches!(e, GameEvent::TokenMoved { .. }))
            .count();
        assert!(moves > 0);
    }

    #[test]
    fn full_session_ends_after_configured_time() {
        let mut s =
            GameSession::new(GameConfig::default(), PlayArea::default(), Pcg32::seed_from_u64(1))
                .unwrap();
        s.start();
        for _ in 0..(60 * 4) {
            s.advance(Duration::from_millis(250));
        }
        assert_eq!(s.phase(), Phase::Ended);
        assert_eq!(s.time_remaining(), 0);
        assert!(s.registry().is_empty());
    }
}
