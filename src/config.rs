//! Tunable constants: session length, alphabet, scoring, motion rate, fall band.

use std::time::Duration;
use thiserror::Error;

/// Default ordered alphabet. Catching these in this order is a combo.
pub const DEFAULT_ALPHABET: [&str; 4] = ["U", "X", "王", "子"];

/// Token footprint in play units (terminal cells): 4 columns, 1 row.
pub const TOKEN_WIDTH: f32 = 4.0;
pub const TOKEN_HEIGHT: f32 = 1.0;

/// Motion ticks per second above this would flood one `advance` with ticks.
pub const MAX_FRAME_RATE: u32 = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("alphabet is empty")]
    EmptyAlphabet,
    #[error("alphabet has {0} symbols; at most 255 are supported")]
    AlphabetTooLong(usize),
    #[error("alphabet symbol {0:?} appears more than once")]
    DuplicateSymbol(String),
    #[error("alphabet symbol at position {0} is blank")]
    BlankSymbol(usize),
    #[error("session length must be at least one second")]
    ZeroSessionLength,
    #[error("frame rate must be positive")]
    ZeroFrameRate,
    #[error("frame rate {0} is too high (expected <= {max})", max = MAX_FRAME_RATE)]
    FrameRateTooHigh(u32),
    #[error("spawn interval must be positive")]
    ZeroSpawnInterval,
    #[error("fall duration {secs}s with jitter {jitter}s can reach zero or below")]
    FallBand { secs: f32, jitter: f32 },
}

/// Ordered set of distinct symbols. Index order is the canonical combo order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<String>,
}

impl Alphabet {
    pub fn new<I, S>(symbols: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if symbols.len() > usize::from(u8::MAX) {
            return Err(ConfigError::AlphabetTooLong(symbols.len()));
        }
        for (i, s) in symbols.iter().enumerate() {
            if s.trim().is_empty() {
                return Err(ConfigError::BlankSymbol(i));
            }
            if symbols[..i].contains(s) {
                return Err(ConfigError::DuplicateSymbol(s.clone()));
            }
        }
        Ok(Self { symbols })
    }

    /// Parse a comma-separated list, e.g. `U,X,王,子`.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(',').map(str::trim))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Rectangle tokens fall through. y grows downward; tokens spawn just above y = 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
}

impl PlayArea {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Largest x a token may spawn at so it stays fully inside the area.
    pub fn max_spawn_x(&self) -> f32 {
        (self.width - TOKEN_WIDTH).max(0.0)
    }
}

impl Default for PlayArea {
    fn default() -> Self {
        Self::new(48.0, 24.0)
    }
}

/// Gameplay constants. Defaults reproduce the arcade's fixed tuning.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub session_secs: u32,
    pub alphabet: Alphabet,
    pub base_points: u32,
    /// Motion ticks per second.
    pub frame_rate: u32,
    /// Mean seconds for a token to fall the full play height.
    pub fall_secs: f32,
    /// Half-width of the uniform band around `fall_secs`.
    pub fall_jitter: f32,
    pub spawn_interval_ms: u64,
    pub countdown_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            session_secs: 60,
            alphabet: Alphabet::default(),
            base_points: 100,
            frame_rate: 60,
            fall_secs: 3.0,
            fall_jitter: 0.5,
            spawn_interval_ms: 1000,
            countdown_interval_ms: 1000,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secs == 0 {
            return Err(ConfigError::ZeroSessionLength);
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        if self.frame_rate > MAX_FRAME_RATE {
            return Err(ConfigError::FrameRateTooHigh(self.frame_rate));
        }
        if self.spawn_period().is_zero() || self.countdown_period().is_zero() {
            return Err(ConfigError::ZeroSpawnInterval);
        }
        if self.motion_period().is_zero() {
            return Err(ConfigError::ZeroFrameRate);
        }
        let band = ConfigError::FallBand {
            secs: self.fall_secs,
            jitter: self.fall_jitter,
        };
        if !(self.fall_secs.is_finite()
            && self.fall_jitter.is_finite()
            && self.fall_jitter >= 0.0
            && self.fall_secs - self.fall_jitter > 0.0)
        {
            return Err(band);
        }
        // Slowest token per unit of height must still move.
        let slowest = 1.0 / ((self.fall_secs + self.fall_jitter) * self.frame_rate as f32);
        if !(slowest.is_finite() && slowest > 0.0) {
            return Err(band);
        }
        Ok(())
    }

    pub fn spawn_period(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn motion_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate))
    }

    pub fn countdown_period(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alphabet_has_four_symbols_in_order() {
        let a = Alphabet::default();
        assert_eq!(a.len(), 4);
        assert_eq!(a.symbols().collect::<Vec<_>>(), ["U", "X", "王", "子"]);
    }

    #[test]
    fn parse_trims_and_rejects_duplicates() {
        let a = Alphabet::parse(" A, B ,C").unwrap();
        assert_eq!(a.symbol(1), Some("B"));
        assert_eq!(
            Alphabet::parse("A,B,A"),
            Err(ConfigError::DuplicateSymbol("A".into()))
        );
        assert_eq!(Alphabet::parse("A,,B"), Err(ConfigError::BlankSymbol(1)));
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn fall_band_must_stay_positive() {
        let config = GameConfig {
            fall_secs: 1.0,
            fall_jitter: 1.0,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::FallBand { .. })));
    }

    #[test]
    fn non_finite_fall_secs_are_rejected() {
        for fall_secs in [f32::INFINITY, f32::NAN, f32::MAX] {
            let config = GameConfig {
                fall_secs,
                ..GameConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::FallBand { .. })),
                "fall_secs {fall_secs} accepted"
            );
        }
        let config = GameConfig {
            fall_jitter: f32::NAN,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::FallBand { .. })));
    }

    #[test]
    fn frame_rate_must_give_a_nonzero_period() {
        let config = GameConfig {
            frame_rate: u32::MAX,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::FrameRateTooHigh(u32::MAX)));
        let config = GameConfig {
            frame_rate: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroFrameRate));
        let config = GameConfig {
            frame_rate: MAX_FRAME_RATE,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
        assert!(!config.motion_period().is_zero());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let config = GameConfig {
            spawn_interval_ms: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSpawnInterval));
        let config = GameConfig {
            countdown_interval_ms: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSpawnInterval));
    }

    #[test]
    fn motion_period_matches_frame_rate() {
        let config = GameConfig::default();
        let ms = config.motion_period().as_secs_f64() * 1000.0;
        assert!((ms - 16.666).abs() < 0.01);
    }
}
