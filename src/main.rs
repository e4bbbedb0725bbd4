//! UX Prince: catch falling glyphs in order before the clock runs out.

mod app;
mod clock;
mod config;
mod events;
mod input;
mod logging;
mod motion;
mod scene;
mod scoring;
mod session;
mod spawner;
mod theme;
mod token;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::{Alphabet, GameConfig};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;
    let config = args.game_config()?;
    let theme = theme::Theme::load(args.theme.as_deref())
        .with_context(|| format!("cannot load theme {:?}", args.theme))?;
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    tracing::info!(seed, "rng seeded");
    let mut app = App::new(
        config,
        theme,
        Pcg32::seed_from_u64(seed),
        args.no_menu,
        !args.no_animation,
    )?;
    app.run()?;
    Ok(())
}

/// Timed glyph-catching arcade in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "uxprince",
    version,
    about = "Catch falling glyphs in the terminal. One of each completes a set; catch them in order for a combo.",
    long_about = "UX Prince is a timed arcade game for the terminal.\n\n\
        Glyphs fall down the playfield. Click one of each kind to complete a set. \
        A set caught in alphabet order is a combo and scores double, growing with every \
        combo in a row; any other order scores the base points and breaks the streak. \
        When the clock hits zero your score earns a rank.\n\n\
        CONTROLS:\n  Left click  Catch a glyph    Enter/Space/R  Start    Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (theme[glyph0]=\"#RRGGBB\", ...)."
)]
pub struct Args {
    /// Session length in seconds.
    #[arg(short = 's', long = "time", default_value = "60", value_name = "SECS")]
    pub time: u32,

    /// Comma-separated glyphs in combo order.
    #[arg(short, long, default_value = "U,X,王,子", value_name = "LIST")]
    pub alphabet: String,

    /// Points for one completed set before the combo multiplier.
    #[arg(long, default_value = "100", value_name = "N")]
    pub base_points: u32,

    /// Motion ticks per second.
    #[arg(long, default_value = "60", value_name = "RATE")]
    pub frame_rate: u32,

    /// Mean seconds for a glyph to fall the full playfield.
    #[arg(long, default_value = "3.0", value_name = "SECS")]
    pub fall_secs: f32,

    /// Random spread (plus or minus) around --fall-secs.
    #[arg(long, default_value = "0.5", value_name = "SECS")]
    pub fall_jitter: f32,

    /// Milliseconds between random spawns.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub spawn_interval_ms: u64,

    /// RNG seed for a reproducible session.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Skip the title screen and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the collect fade and set flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,
}

impl Args {
    fn game_config(&self) -> Result<GameConfig> {
        let config = GameConfig {
            session_secs: self.time,
            alphabet: Alphabet::parse(&self.alphabet)?,
            base_points: self.base_points,
            frame_rate: self.frame_rate,
            fall_secs: self.fall_secs,
            fall_jitter: self.fall_jitter,
            spawn_interval_ms: self.spawn_interval_ms,
            ..GameConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
