//! Set progress, combo streak, completion scoring and final rank.

use crate::token::TokenKind;
use std::collections::BTreeSet;

/// Kinds collected since the last completed set, in the order they were caught.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetProgress {
    sequence: Vec<TokenKind>,
    members: BTreeSet<TokenKind>,
}

impl SetProgress {
    /// Record `kind`. Returns false (and changes nothing) if it is already in the set.
    pub fn push(&mut self, kind: TokenKind) -> bool {
        if !self.members.insert(kind) {
            return false;
        }
        self.sequence.push(kind);
        debug_assert_eq!(self.sequence.len(), self.members.len(), "duplicate kind in set");
        true
    }

    pub fn sequence(&self) -> &[TokenKind] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn clear(&mut self) {
        self.sequence.clear();
        self.members.clear();
    }

    /// Kind that would keep the current catch order canonical. Wraps to the
    /// first kind once the set is empty or full.
    pub fn next_expected(&self, kinds: usize) -> TokenKind {
        if self.sequence.len() < kinds {
            TokenKind(self.sequence.len() as u8)
        } else {
            TokenKind(0)
        }
    }

    /// True when the catch order so far is a prefix of the canonical order.
    pub fn in_order(&self) -> bool {
        self.sequence
            .iter()
            .enumerate()
            .all(|(i, k)| k.index() == i)
    }
}

/// Number of consecutive sets completed in canonical order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboState {
    pub count: u32,
}

impl ComboState {
    /// Multiplier shown to the player: `count + 1` during a streak, else 1.
    pub fn multiplier(&self) -> u32 {
        if self.count > 0 { self.count + 1 } else { 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCompletion {
    pub ordered: bool,
    pub points: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    pub kinds: usize,
    pub base_points: u32,
}

impl Scorer {
    pub fn new(kinds: usize, base_points: u32) -> Self {
        Self { kinds, base_points }
    }

    /// Score a full set and reset progress. Ordered sets extend the streak and
    /// pay `base * (streak + 1)`; anything else pays `base` and breaks the streak.
    pub fn check_completion(
        &self,
        progress: &mut SetProgress,
        combo: &mut ComboState,
        score: &mut u32,
    ) -> Option<SetCompletion> {
        debug_assert!(progress.len() <= self.kinds);
        if progress.len() != self.kinds {
            return None;
        }
        let ordered = progress.in_order();
        let points = if ordered {
            combo.count += 1;
            self.base_points.saturating_mul(combo.count + 1)
        } else {
            combo.count = 0;
            self.base_points
        };
        *score = score.saturating_add(points);
        progress.clear();
        tracing::debug!(ordered, points, streak = combo.count, "set complete");
        Some(SetCompletion { ordered, points })
    }
}

/// Title tier for a final score. Bounds are inclusive; the last tier is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Apprentice,
    Journeyman,
    Virtuoso,
    Charismatic,
    Legendary,
}

impl Rank {
    #[cfg(test)]
    pub const ALL: [Self; 5] = [
        Self::Apprentice,
        Self::Journeyman,
        Self::Virtuoso,
        Self::Charismatic,
        Self::Legendary,
    ];

    pub fn for_score(score: u32) -> Self {
        match score {
            0..=2000 => Self::Apprentice,
            2001..=3500 => Self::Journeyman,
            3501..=4499 => Self::Virtuoso,
            4500..=4999 => Self::Charismatic,
            _ => Self::Legendary,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Apprentice => "apprentice",
            Self::Journeyman => "journeyman",
            Self::Virtuoso => "virtuoso",
            Self::Charismatic => "charismatic",
            Self::Legendary => "legendary",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Apprentice => "Apprentice UX Prince",
            Self::Journeyman => "Journeyman UX Prince",
            Self::Virtuoso => "Virtuoso UX Prince",
            Self::Charismatic => "Charismatic UX Prince",
            Self::Legendary => "Legendary UX Prince",
        }
    }
}
