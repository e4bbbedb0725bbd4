//! App: terminal init, main loop, feeding wall time to the session and
//! clicks into its inbox.

use crate::config::GameConfig;
use crate::events::Command;
use crate::input::{Action, event_to_action};
use crate::scene::Scene;
use crate::session::{GameSession, Phase};
use crate::theme::Theme;
use crate::ui::{self, View};
use anyhow::Result;
use crossterm::event;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use rand_pcg::Pcg32;
use std::time::{Duration, Instant};

/// Render/poll cadence, about 60 fps. Game ticks run off the session clock.
const FRAME: Duration = Duration::from_millis(16);

pub struct App {
    session: GameSession<Pcg32>,
    scene: Scene,
    theme: Theme,
    /// Start a session without waiting on the title screen.
    no_menu: bool,
    last_frame: Instant,
}

impl App {
    pub fn new(
        config: GameConfig,
        theme: Theme,
        rng: Pcg32,
        no_menu: bool,
        animate: bool,
    ) -> Result<Self> {
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let session = GameSession::new(config, ui::play_area_for_terminal(cols, rows), rng)?;
        Ok(Self {
            session,
            scene: Scene::new(animate),
            theme,
            no_menu,
            last_frame: Instant::now(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::DefaultTerminal::new(backend)?;

        if self.no_menu {
            self.session.submit(Command::Start);
        }
        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let area: Rect = terminal.size()?.into();
            self.step(area, now);

            let view = View {
                phase: self.session.phase(),
                alphabet: &self.session.config().alphabet,
                theme: &self.theme,
                play: self.session.area(),
                session_secs: self.session.config().session_secs,
                now,
            };
            let scene = &mut self.scene;
            terminal.draw(|f| ui::draw(f, scene, &view))?;

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let action = event_to_action(&event::read()?);
                    if !self.on_action(action, area) {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Advance the session by the wall time since the previous frame and
    /// mirror what happened into the scene.
    fn step(&mut self, area: Rect, now: Instant) {
        let dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        // Resizes only take effect between sessions so live tokens keep their lanes.
        if self.session.phase() != Phase::Active {
            self.session
                .set_play_area(ui::play_area_for_terminal(area.width, area.height));
        }
        self.session.advance(dt);
        for event in self.session.drain_events() {
            self.scene.apply(event, now);
        }
        self.scene.prune(now);
    }

    /// Returns false when the player asked to quit.
    fn on_action(&mut self, action: Action, area: Rect) -> bool {
        match action {
            Action::Quit => {
                tracing::info!(score = self.session.score(), "quit");
                return false;
            }
            Action::Start => self.session.submit(Command::Start),
            Action::Click { column, row } => {
                if self.session.phase() != Phase::Active {
                    return true;
                }
                let hit = ui::to_board_cell(area, self.session.area(), column, row)
                    .and_then(|(x, y)| self.scene.hit_test(x, y));
                if let Some(id) = hit {
                    tracing::trace!(?id, column, row, "click");
                    self.session.submit(Command::Activate(id));
                }
            }
            Action::None => {}
        }
        true
    }
}
