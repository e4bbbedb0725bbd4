//! Token creation: random spawns on the spawn tick plus coverage refills.

use crate::config::{GameConfig, PlayArea, TOKEN_HEIGHT};
use crate::token::{TokenId, TokenKind, TokenRegistry};
use rand::Rng;
use rand_pcg::Pcg32;

/// Randomness the spawner needs. Seedable in production, scriptable in tests.
pub trait RandomSource {
    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f32;
    /// Uniform in `0..n`; `n > 0`.
    fn below(&mut self, n: usize) -> usize;
}

impl RandomSource for Pcg32 {
    fn unit(&mut self) -> f32 {
        self.random::<f32>()
    }

    fn below(&mut self, n: usize) -> usize {
        self.random_range(0..n)
    }
}

#[derive(Debug, Clone)]
pub struct Spawner {
    kinds: usize,
    fall_secs: f32,
    fall_jitter: f32,
    frame_rate: f32,
}

impl Spawner {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            kinds: config.alphabet.len(),
            fall_secs: config.fall_secs,
            fall_jitter: config.fall_jitter,
            frame_rate: config.frame_rate as f32,
        }
    }

    /// Per-tick fall speed for a full-height traversal lasting
    /// `fall_secs ± fall_jitter` seconds.
    pub fn fall_speed(&self, area: PlayArea, rng: &mut impl RandomSource) -> f32 {
        let secs = self.fall_secs + (rng.unit() - 0.5) * 2.0 * self.fall_jitter;
        area.height / (secs * self.frame_rate)
    }

    /// One token of a uniformly random kind.
    pub fn spawn_random(
        &self,
        reg: &mut TokenRegistry,
        area: PlayArea,
        rng: &mut impl RandomSource,
    ) -> TokenId {
        let kind = TokenKind(rng.below(self.kinds) as u8);
        self.spawn_kind(kind, reg, area, rng)
    }

    /// One token of `kind` at a random column just above the top edge.
    pub fn spawn_kind(
        &self,
        kind: TokenKind,
        reg: &mut TokenRegistry,
        area: PlayArea,
        rng: &mut impl RandomSource,
    ) -> TokenId {
        let x = rng.unit() * area.max_spawn_x();
        let speed = self.fall_speed(area, rng);
        let id = reg.spawn(kind, x, -TOKEN_HEIGHT, speed);
        tracing::trace!(?id, ?kind, x, speed, "spawned token");
        id
    }

    /// Spawn exactly one token of every kind not currently live, in canonical order.
    pub fn ensure_coverage(
        &self,
        reg: &mut TokenRegistry,
        area: PlayArea,
        rng: &mut impl RandomSource,
    ) -> Vec<TokenId> {
        let present = reg.types_present();
        let missing: Vec<TokenKind> = TokenKind::all(self.kinds)
            .filter(|k| !present.contains(k))
            .collect();
        if !missing.is_empty() {
            tracing::debug!(missing = missing.len(), "refilling coverage");
        }
        missing
            .into_iter()
            .map(|kind| self.spawn_kind(kind, reg, area, rng))
            .collect()
    }
}

/// Test double replaying fixed values; cycles when exhausted.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Scripted {
    units: Vec<f32>,
    picks: Vec<usize>,
    next_unit: usize,
    next_pick: usize,
}

#[cfg(test)]
impl Scripted {
    pub fn new(units: Vec<f32>, picks: Vec<usize>) -> Self {
        Self {
            units,
            picks,
            next_unit: 0,
            next_pick: 0,
        }
    }

    /// Always the middle of every range.
    pub fn centered() -> Self {
        Self::new(vec![0.5], vec![0])
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn unit(&mut self) -> f32 {
        let v = self.units[self.next_unit % self.units.len()];
        self.next_unit += 1;
        v
    }

    fn below(&mut self, n: usize) -> usize {
        let v = self.picks[self.next_pick % self.picks.len()] % n;
        self.next_pick += 1;
        v
    }
}
