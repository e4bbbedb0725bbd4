//! Colours: one per glyph plus UI chrome, optionally read from a btop-style
//! `theme[key]="value"` file.

use crate::token::TokenKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Glyph colours, cycled when the alphabet is longer.
    pub glyphs: Vec<Color>,
    pub bg: Color,
    pub border: Color,
    pub text: Color,
    pub title: Color,
    pub muted: Color,
    pub flash: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            glyphs: vec![
                Color::Rgb(0x61, 0xAF, 0xEF),
                Color::Rgb(0xE0, 0x6C, 0x75),
                Color::Rgb(0xE5, 0xC0, 0x7B),
                Color::Rgb(0x98, 0xC3, 0x79),
            ],
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            border: Color::Rgb(0x3F, 0x44, 0x4F),
            text: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            muted: Color::Rgb(0x5C, 0x63, 0x70),
            flash: Color::Rgb(0xFF, 0xFF, 0xFF),
        }
    }
}

impl Theme {
    /// Built-in colours when `path` is None; otherwise the file's entries
    /// layered over them. Unknown keys and bad values are skipped.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let map = parse_theme_file(&std::fs::read_to_string(path)?);
        Ok(Self::default().overlay(&map))
    }

    fn overlay(mut self, map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        for (i, slot) in self.glyphs.iter_mut().enumerate() {
            if let Some(c) = get(&format!("glyph{i}")) {
                *slot = c;
            }
        }
        // Further glyph colours beyond the built-in four.
        let mut i = self.glyphs.len();
        while let Some(c) = get(&format!("glyph{i}")) {
            self.glyphs.push(c);
            i += 1;
        }
        let fields: [(&str, &str, &mut Color); 6] = [
            ("background", "main_bg", &mut self.bg),
            ("border", "div_line", &mut self.border),
            ("text", "main_fg", &mut self.text),
            ("title", "title", &mut self.title),
            ("muted", "inactive_fg", &mut self.muted),
            ("flash", "hi_fg", &mut self.flash),
        ];
        for (key, btop_key, slot) in fields {
            if let Some(c) = get(key).or_else(|| get(btop_key)) {
                *slot = c;
            }
        }
        self
    }

    #[inline]
    pub fn glyph_color(&self, kind: TokenKind) -> Color {
        self.glyphs[kind.index() % self.glyphs.len()]
    }
}

/// Parse `theme[key]="value"` lines into a map. `#` comments and blanks skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| {
            let rest = l.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// `#RRGGBB` or `#RGB` to an RGB colour.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(bad)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
        3 => Ok(Color::Rgb(channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
        _ => Err(bad()),
    }
}
