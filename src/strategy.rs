//! Direction-aware strategy selection.
//!
//! Only the two asymmetric regimes (index 1 and 3) have arrival-specific
//! strategies. Arrival side is taken from the previous regime when one is
//! known, otherwise from the autoplay direction.

use crate::autoplay::Direction;
use crate::catalog::{RegimeCatalog, RegimeId, Strategy};

pub fn select_strategy<'a>(
    catalog: &'a RegimeCatalog,
    regime: RegimeId,
    direction: Direction,
    previous: Option<RegimeId>,
) -> &'a Strategy {
    let set = &catalog.get(regime).strategies;
    if !regime.is_asymmetric() {
        return &set.default;
    }

    if let Some(prev) = previous.filter(|p| *p != regime) {
        let by_arrival = if prev.index() < regime.index() {
            set.from_left.as_ref()
        } else {
            set.from_right.as_ref()
        };
        if let Some(strategy) = by_arrival {
            return strategy;
        }
    }

    let by_direction = match direction {
        Direction::Forward => set.from_left.as_ref(),
        Direction::Backward => set.from_right.as_ref(),
    };
    by_direction.unwrap_or(&set.default)
}

/// Short narrative for how the market is moving through `regime`.
pub fn direction_label(regime: RegimeId, direction: Direction) -> Option<&'static str> {
    match (regime, direction) {
        (RegimeId::Fear, Direction::Forward) => Some("Recovery from extreme fear"),
        (RegimeId::Fear, Direction::Backward) => Some("Decline into fear"),
        (RegimeId::Greed, Direction::Forward) => Some("Bull run building"),
        (RegimeId::Greed, Direction::Backward) => Some("Correction from euphoria"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RegimeId::*;

    const DIRECTIONS: [Direction; 2] = [Direction::Forward, Direction::Backward];

    #[test]
    fn test_symmetric_regimes_always_default() {
        let catalog = RegimeCatalog::builtin().unwrap();
        for regime in [ExtremeFear, Neutral, ExtremeGreed] {
            let expected = &catalog.get(regime).strategies.default;
            for direction in DIRECTIONS {
                for previous in [None, Some(Fear), Some(Greed)] {
                    assert_eq!(select_strategy(&catalog, regime, direction, previous), expected);
                }
            }
        }
    }

    #[test]
    fn test_previous_wins_over_direction() {
        let catalog = RegimeCatalog::builtin().unwrap();
        let fear = &catalog.get(Fear).strategies;
        assert_eq!(
            select_strategy(&catalog, Fear, Direction::Backward, Some(ExtremeFear)),
            fear.from_left.as_ref().unwrap()
        );
        assert_eq!(
            select_strategy(&catalog, Fear, Direction::Forward, Some(Neutral)),
            fear.from_right.as_ref().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_direction() {
        let catalog = RegimeCatalog::builtin().unwrap();
        let greed = &catalog.get(Greed).strategies;
        assert_eq!(
            select_strategy(&catalog, Greed, Direction::Forward, None),
            greed.from_left.as_ref().unwrap()
        );
        // previous == regime is ignored
        assert_eq!(
            select_strategy(&catalog, Greed, Direction::Backward, Some(Greed)),
            greed.from_right.as_ref().unwrap()
        );
    }

    #[test]
    fn test_missing_variant_falls_to_default() {
        let mut regimes = RegimeCatalog::builtin().unwrap().regimes().to_vec();
        regimes[1].strategies.from_left = None;
        let catalog = RegimeCatalog::new(regimes).unwrap();
        let fear = &catalog.get(Fear).strategies;
        assert_eq!(
            select_strategy(&catalog, Fear, Direction::Forward, Some(ExtremeFear)),
            &fear.default
        );
        // arrival side missing, direction still finds from_right
        assert_eq!(
            select_strategy(&catalog, Fear, Direction::Backward, Some(ExtremeFear)),
            fear.from_right.as_ref().unwrap()
        );
    }

    #[test]
    fn test_direction_labels() {
        for regime in [ExtremeFear, Neutral, ExtremeGreed] {
            for direction in DIRECTIONS {
                assert_eq!(direction_label(regime, direction), None);
            }
        }
        for regime in [Fear, Greed] {
            let fwd = direction_label(regime, Direction::Forward).unwrap();
            let back = direction_label(regime, Direction::Backward).unwrap();
            assert_ne!(fwd, back);
        }
    }
}
