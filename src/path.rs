//! Path resolution between regimes.
//!
//! Regimes form a path graph (adjacency == index distance 1), so the route
//! between two regimes is simply the contiguous run of indices between them.

use crate::catalog::RegimeId;

/// Ordered run of regimes from `from` to `to`, both inclusive.
pub fn resolve_path(from: RegimeId, to: RegimeId) -> Vec<RegimeId> {
    if from == to {
        return vec![from];
    }
    if from.is_adjacent(to) {
        return vec![from, to];
    }

    let (a, b) = (from.index(), to.index());
    let indices: Vec<usize> = if a < b {
        (a..=b).collect()
    } else {
        (b..=a).rev().collect()
    };
    indices.into_iter().filter_map(RegimeId::from_index).collect()
}

pub fn describe_path(from: RegimeId, to: RegimeId) -> String {
    describe(&resolve_path(from, to))
}

/// Human description of an already-resolved path.
pub fn describe(path: &[RegimeId]) -> String {
    match path.len() {
        0 | 1 => "Already there".to_string(),
        2 => "Direct transition".to_string(),
        n => format!("Must pass through {} regimes", n - 2),
    }
}

/// True when the jump needs a visual walk through intermediate regimes.
pub fn requires_preview(from: RegimeId, to: RegimeId) -> bool {
    from.distance(to) > 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use RegimeId::*;

    #[test]
    fn test_same_regime() {
        for r in RegimeId::ALL {
            assert_eq!(resolve_path(r, r), vec![r]);
            assert_eq!(describe_path(r, r), "Already there");
        }
    }

    #[test]
    fn test_adjacent() {
        assert_eq!(resolve_path(Fear, Neutral), vec![Fear, Neutral]);
        assert_eq!(resolve_path(Greed, Neutral), vec![Greed, Neutral]);
        assert_eq!(describe_path(Greed, Neutral), "Direct transition");
        assert!(!requires_preview(Greed, Neutral));
    }

    #[test]
    fn test_full_span() {
        assert_eq!(
            resolve_path(ExtremeFear, ExtremeGreed),
            vec![ExtremeFear, Fear, Neutral, Greed, ExtremeGreed]
        );
        assert_eq!(describe_path(ExtremeFear, ExtremeGreed), "Must pass through 3 regimes");
        assert!(requires_preview(ExtremeFear, ExtremeGreed));
    }

    #[test]
    fn test_backward_walk() {
        assert_eq!(resolve_path(Greed, ExtremeFear), vec![Greed, Neutral, Fear, ExtremeFear]);
        assert_eq!(describe_path(Greed, ExtremeFear), "Must pass through 2 regimes");
    }

    #[test]
    fn test_all_pairs_contiguous_and_symmetric() {
        for from in RegimeId::ALL {
            for to in RegimeId::ALL {
                let path = resolve_path(from, to);
                assert_eq!(path.len(), from.distance(to) + 1);
                assert_eq!(path.first(), Some(&from));
                assert_eq!(path.last(), Some(&to));
                for pair in path.windows(2) {
                    assert!(pair[0].is_adjacent(pair[1]));
                }
                let mut reversed = resolve_path(to, from);
                reversed.reverse();
                assert_eq!(path, reversed);
            }
        }
    }
}
