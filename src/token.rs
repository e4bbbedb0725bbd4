//! Live tokens and the registry that owns them.

use std::collections::{BTreeMap, BTreeSet};

/// Index into the alphabet. Ordering follows the canonical combo order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenKind(pub u8);

impl TokenKind {
    /// Every kind of an alphabet of `len` symbols, in canonical order.
    pub fn all(len: usize) -> impl Iterator<Item = Self> {
        (0..len.min(usize::from(u8::MAX))).map(|i| Self(i as u8))
    }

    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Identity of a token. Never reused, not even across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub id: TokenId,
    pub kind: TokenKind,
    pub pos: Position,
    /// Play units per motion tick; always > 0.
    pub speed: f32,
}

/// Sole source of truth for what is on screen. Iteration is in spawn order.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: BTreeMap<TokenId, Token>,
    next_id: u64,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: TokenKind, x: f32, y: f32, speed: f32) -> TokenId {
        debug_assert!(speed > 0.0, "token speed must be positive");
        let id = TokenId(self.next_id);
        self.next_id += 1;
        self.tokens.insert(
            id,
            Token {
                id,
                kind,
                pos: Position { x, y },
                speed,
            },
        );
        id
    }

    pub fn remove(&mut self, id: TokenId) -> Option<Token> {
        self.tokens.remove(&id)
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub(crate) fn all_mut(&mut self) -> impl Iterator<Item = &mut Token> {
        self.tokens.values_mut()
    }

    pub fn types_present(&self) -> BTreeSet<TokenKind> {
        self.all().map(|t| t.kind).collect()
    }

    /// Remove every token, returning their ids in spawn order.
    pub fn clear(&mut self) -> Vec<TokenId> {
        let ids = self.tokens.keys().copied().collect();
        self.tokens.clear();
        ids
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
