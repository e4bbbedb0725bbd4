//! Per-tick fall integration and bottom-edge eviction.

use crate::config::PlayArea;
use crate::token::{TokenId, TokenRegistry};

/// What one motion tick did to the registry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MotionReport {
    /// Tokens that moved and are still live, with their new y.
    pub moved: Vec<(TokenId, f32)>,
    /// Tokens that fell past the bottom edge and were removed.
    pub exited: Vec<TokenId>,
}

/// Advance every live token by its speed, then drop those past `area.height`.
/// All tokens move before any is removed, so evictions never affect the batch.
pub fn integrate(reg: &mut TokenRegistry, area: PlayArea) -> MotionReport {
    let mut report = MotionReport::default();
    for token in reg.all_mut() {
        token.pos.y += token.speed;
        if token.pos.y > area.height {
            report.exited.push(token.id);
        } else {
            report.moved.push((token.id, token.pos.y));
        }
    }
    for id in &report.exited {
        reg.remove(*id);
        tracing::trace!(?id, "token fell out of play");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn moves_every_token_by_its_speed() {
        let mut reg = TokenRegistry::new();
        let a = reg.spawn(TokenKind(0), 0.0, -1.0, 0.5);
        let b = reg.spawn(TokenKind(1), 4.0, 2.0, 1.5);
        let report = integrate(&mut reg, PlayArea::new(40.0, 20.0));
        assert_eq!(report.moved, vec![(a, -0.5), (b, 3.5)]);
        assert!(report.exited.is_empty());
        assert_eq!(reg.get(b).unwrap().pos.y, 3.5);
    }

    #[test]
    fn token_one_above_bottom_with_speed_five_is_removed() {
        let area = PlayArea::new(40.0, 20.0);
        let mut reg = TokenRegistry::new();
        let id = reg.spawn(TokenKind(0), 0.0, area.height - 1.0, 5.0);
        let report = integrate(&mut reg, area);
        assert_eq!(report.exited, vec![id]);
        assert!(reg.get(id).is_none());
    }

    #[test]
    fn landing_exactly_on_bottom_edge_stays() {
        let area = PlayArea::new(40.0, 20.0);
        let mut reg = TokenRegistry::new();
        let id = reg.spawn(TokenKind(0), 0.0, 19.0, 1.0);
        let report = integrate(&mut reg, area);
        assert_eq!(report.moved, vec![(id, 20.0)]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn eviction_does_not_skip_neighbours() {
        let area = PlayArea::new(40.0, 10.0);
        let mut reg = TokenRegistry::new();
        let gone = reg.spawn(TokenKind(0), 0.0, 9.5, 1.0);
        let stays = reg.spawn(TokenKind(1), 4.0, 0.0, 1.0);
        let report = integrate(&mut reg, area);
        assert_eq!(report.exited, vec![gone]);
        assert_eq!(report.moved, vec![(stays, 1.0)]);
    }
}
