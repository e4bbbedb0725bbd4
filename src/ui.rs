//! Layout and drawing: title, playfield with falling glyphs, HUD, result.

use crate::config::{Alphabet, PlayArea, TOKEN_WIDTH};
use crate::scene::{COLLECT_FADE, Scene, SceneToken};
use crate::session::Phase;
use crate::theme::Theme;
use crate::token::TokenKind;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 24;
const MIN_BOARD_WIDTH: u16 = 16;
const MIN_BOARD_HEIGHT: u16 = 8;
/// Kept modest so fall speed (rows per second) stays readable on huge terminals.
const MAX_BOARD_WIDTH: u16 = 64;
const MAX_BOARD_HEIGHT: u16 = 32;

/// Everything the renderer needs besides the scene.
pub struct View<'a> {
    pub phase: Phase,
    pub alphabet: &'a Alphabet,
    pub theme: &'a Theme,
    pub play: PlayArea,
    pub session_secs: u32,
    pub now: Instant,
}

/// Board size (in cells) for a terminal, leaving room for border and HUD.
pub fn play_area_for_terminal(cols: u16, rows: u16) -> PlayArea {
    let w = cols
        .saturating_sub(SIDEBAR_WIDTH + 2)
        .clamp(MIN_BOARD_WIDTH, MAX_BOARD_WIDTH);
    let h = rows
        .saturating_sub(2)
        .clamp(MIN_BOARD_HEIGHT, MAX_BOARD_HEIGHT);
    PlayArea::new(f32::from(w), f32::from(h))
}

/// Playfield (with border) and sidebar, centred as one unit in `area`.
fn layout(area: Rect, play: PlayArea) -> (Rect, Rect) {
    let pw = play.width as u16 + 2;
    let ph = play.height as u16 + 2;
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let playfield = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    };
    let sidebar = Rect {
        x: playfield.right(),
        y,
        width: SIDEBAR_WIDTH.min(area.right().saturating_sub(playfield.right())),
        height: ph.min(area.height),
    };
    (playfield, sidebar)
}

/// Board rect (inside the playfield border).
pub fn board_rect(area: Rect, play: PlayArea) -> Rect {
    let (playfield, _) = layout(area, play);
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: playfield.width.saturating_sub(2),
        height: playfield.height.saturating_sub(2),
    }
}

/// Translate a terminal cell into board coordinates, if it lies on the board.
pub fn to_board_cell(area: Rect, play: PlayArea, column: u16, row: u16) -> Option<(i32, i32)> {
    let board = board_rect(area, play);
    let inside = column >= board.x
        && column < board.right()
        && row >= board.y
        && row < board.bottom();
    inside.then(|| (i32::from(column - board.x), i32::from(row - board.y)))
}

pub fn draw(frame: &mut Frame, scene: &mut Scene, view: &View) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(view.theme.bg))
        .render(area, frame.buffer_mut());
    match view.phase {
        Phase::Idle => draw_title(frame, view, area),
        Phase::Active => {
            draw_game(frame, scene, view, area);
            apply_fades(frame, scene, view, area);
        }
        Phase::Ended => {
            draw_game(frame, scene, view, area);
            draw_result(frame, scene, view, area);
        }
    }
}

fn bold(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Alphabet in canonical order, each glyph in its colour.
fn alphabet_line<'a>(view: &View<'a>) -> Line<'a> {
    let mut spans = Vec::new();
    for (i, sym) in view.alphabet.symbols().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" → ", Style::default().fg(view.theme.muted)));
        }
        spans.push(Span::styled(sym, bold(view.theme.glyph_color(TokenKind(i as u8)))));
    }
    Line::from(spans)
}

fn draw_title(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(" UX Prince ", bold(theme.title))),
        Line::from(""),
        Line::from(Span::styled(
            "Click the falling glyphs.",
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled(
            "One of each completes a set;",
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled(
            "catch them in this order for a combo:",
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        alphabet_line(view),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} seconds on the clock", view.session_secs),
            Style::default().fg(theme.muted),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ENTER ", bold(theme.title)),
            Span::styled("start   ", Style::default().fg(theme.text)),
            Span::styled(" Q ", bold(theme.title)),
            Span::styled("quit", Style::default().fg(theme.text)),
        ]),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border).bg(theme.bg)),
    );
    p.render(centered_popup(area, 44, 15), frame.buffer_mut());
}

fn draw_game(frame: &mut Frame, scene: &Scene, view: &View, area: Rect) {
    let theme = view.theme;
    let (playfield, sidebar) = layout(area, view.play);
    let border = if scene.flashing(view.now) {
        theme.flash
    } else {
        theme.border
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(theme.bg))
        .title(Span::styled(" UX Prince ", bold(theme.title)));
    let board = block.inner(playfield);
    block.render(playfield, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for fading in &scene.fading {
        draw_token(buf, board, &fading.token, view);
    }
    for token in scene.tokens.values() {
        draw_token(buf, board, token, view);
    }
    draw_sidebar(frame, scene, view, sidebar);
}

/// Screen cells a token covers, clipped to the board.
fn token_rect(board: Rect, token: &SceneToken) -> Option<Rect> {
    let (cx, cy) = token.cell();
    if cy < 0 || cy >= i32::from(board.height) {
        return None;
    }
    let left = cx.max(0);
    let right = (cx + TOKEN_WIDTH as i32).min(i32::from(board.width));
    (left < right).then(|| Rect {
        x: board.x + left as u16,
        y: board.y + cy as u16,
        width: (right - left) as u16,
        height: 1,
    })
}

fn draw_token(buf: &mut Buffer, board: Rect, token: &SceneToken, view: &View) {
    let Some(rect) = token_rect(board, token) else {
        return;
    };
    let color = view.theme.glyph_color(token.kind);
    let body = Style::default().fg(Color::Black).bg(color);
    for x in rect.left()..rect.right() {
        buf[(x, rect.y)].set_symbol(" ").set_style(body);
    }
    let sym = view.alphabet.symbol(token.kind.index()).unwrap_or("?");
    let sym_w = Span::raw(sym).width() as u16;
    let (cx, _) = token.cell();
    let glyph_x = i32::from(board.x) + cx + (TOKEN_WIDTH as i32 - i32::from(sym_w)) / 2;
    let fits = glyph_x >= i32::from(rect.x)
        && glyph_x + i32::from(sym_w) <= i32::from(rect.right());
    if fits {
        buf.set_string(glyph_x as u16, rect.y, sym, body.add_modifier(Modifier::BOLD));
    }
}

/// Fade collected glyphs into the background.
fn apply_fades(frame: &mut Frame, scene: &mut Scene, view: &View, area: Rect) {
    let delta = scene
        .fx_time
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or_default();
    scene.fx_time = Some(view.now);
    let delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
    let board = board_rect(area, view.play);
    let bg = view.theme.bg;
    for fading in &mut scene.fading {
        let Some(rect) = token_rect(board, &fading.token) else {
            continue;
        };
        let effect = fading.effect.get_or_insert_with(|| {
            fx::fade_to(
                bg,
                bg,
                (COLLECT_FADE.as_millis() as u32, Interpolation::Linear),
            )
        });
        frame.render_effect(effect, rect, delta);
    }
}

fn section(frame: &mut Frame, view: &View, area: Rect, title: &str) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(view.theme.border).bg(view.theme.bg))
        .title(Span::styled(format!(" {title} "), Style::default().fg(view.theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    inner
}

fn draw_sidebar(frame: &mut Frame, scene: &Scene, view: &View, area: Rect) {
    if area.width < 4 {
        return;
    }
    let theme = view.theme;
    let fg = Style::default().fg(theme.text);
    let row = |y: u16, h: u16| Rect {
        x: area.x + 1,
        y: area.y + y,
        width: area.width.saturating_sub(1),
        height: h.min(area.bottom().saturating_sub(area.y + y)),
    };

    let stats = section(frame, view, row(0, 4), "Score");
    Paragraph::new(vec![
        Line::from(Span::styled(scene.score.to_string(), bold(theme.text))),
        Line::from(Span::styled(
            format!("combo x{}", scene.multiplier),
            if scene.multiplier > 1 {
                bold(theme.title)
            } else {
                fg
            },
        )),
    ])
    .render(stats, frame.buffer_mut());

    let time = section(frame, view, row(4, 4), "Time");
    let ratio = if view.session_secs > 0 {
        (f64::from(scene.time_remaining) / f64::from(view.session_secs)).min(1.0)
    } else {
        0.0
    };
    let bar = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    let time_rows = Rect { height: 1, ..time };
    Paragraph::new(Span::styled(format!("{} s", scene.time_remaining), fg))
        .render(time_rows, frame.buffer_mut());
    if time.height > 1 {
        Gauge::default()
            .ratio(ratio)
            .label("")
            .gauge_style(Style::default().fg(bar).bg(theme.bg))
            .render(Rect { y: time.y + 1, ..time_rows }, frame.buffer_mut());
    }

    let set = section(frame, view, row(8, 4), "Set");
    let mut slots = Vec::new();
    for (i, sym) in view.alphabet.symbols().enumerate() {
        let kind = TokenKind(i as u8);
        if scene.collected.contains(&kind) {
            slots.push(Span::styled(sym, bold(theme.glyph_color(kind))));
        } else {
            slots.push(Span::styled("_", Style::default().fg(theme.muted)));
        }
        slots.push(Span::raw(" "));
    }
    let next = view.alphabet.symbol(scene.next_expected.index()).unwrap_or("?");
    Paragraph::new(vec![
        Line::from(slots),
        Line::from(vec![
            Span::styled("next ", Style::default().fg(theme.muted)),
            Span::styled(next, bold(theme.glyph_color(scene.next_expected))),
        ]),
    ])
    .render(set, frame.buffer_mut());

    if let Some(last) = scene.last_set {
        let label = if last.ordered {
            format!("+{} combo!", last.points)
        } else {
            format!("+{}", last.points)
        };
        let style = if last.ordered { bold(theme.title) } else { fg };
        Paragraph::new(Span::styled(label, style)).render(row(13, 1), frame.buffer_mut());
    }
}

fn draw_result(frame: &mut Frame, scene: &Scene, view: &View, area: Rect) {
    let theme = view.theme;
    let Some((score, rank)) = scene.result else {
        return;
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Time's up! ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {score} "), bold(theme.text))),
        Line::from(""),
        Line::from(Span::styled(rank.title(), bold(theme.title))),
        Line::from(""),
        Line::from(Span::styled(
            " R restart    Q quit ",
            Style::default().fg(theme.text),
        )),
    ];
    let popup = centered_popup(area, 36, 10);
    for y in popup.top()..popup.bottom() {
        for x in popup.left()..popup.right() {
            frame.buffer_mut()[(x, y)].reset();
        }
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.title).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}
