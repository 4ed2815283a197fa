//! Static, ordered registry of the five market-sentiment regimes.
//!
//! The catalog is built once at startup and validated before anything reads
//! it. After construction it is immutable and every lookup is side-effect
//! free, except the legacy fallback lookup which logs when it misses.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::logging::{log, obj, v_str, Domain, Level};

// =============================================================================
// Regime identifiers
// =============================================================================

/// One of the five regimes, ordered along the fear/greed spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegimeId {
    #[serde(rename = "ef")]
    ExtremeFear,
    #[serde(rename = "f")]
    Fear,
    #[serde(rename = "n")]
    Neutral,
    #[serde(rename = "g")]
    Greed,
    #[serde(rename = "eg")]
    ExtremeGreed,
}

pub const REGIME_COUNT: usize = 5;

impl RegimeId {
    pub const ALL: [RegimeId; REGIME_COUNT] = [
        RegimeId::ExtremeFear,
        RegimeId::Fear,
        RegimeId::Neutral,
        RegimeId::Greed,
        RegimeId::ExtremeGreed,
    ];

    pub const MIDDLE: RegimeId = RegimeId::Neutral;

    pub fn index(self) -> usize {
        match self {
            RegimeId::ExtremeFear => 0,
            RegimeId::Fear => 1,
            RegimeId::Neutral => 2,
            RegimeId::Greed => 3,
            RegimeId::ExtremeGreed => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short key used by the view layer ("ef", "f", "n", "g", "eg").
    pub fn key(self) -> &'static str {
        match self {
            RegimeId::ExtremeFear => "ef",
            RegimeId::Fear => "f",
            RegimeId::Neutral => "n",
            RegimeId::Greed => "g",
            RegimeId::ExtremeGreed => "eg",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.key() == key)
    }

    pub fn is_extreme(self) -> bool {
        matches!(self, RegimeId::ExtremeFear | RegimeId::ExtremeGreed)
    }

    pub fn is_middle(self) -> bool {
        self == Self::MIDDLE
    }

    /// Regimes at index 1 and 3 are the only ones with direction-specific strategies.
    pub fn is_asymmetric(self) -> bool {
        !self.is_extreme() && !self.is_middle()
    }

    /// Index distance between two regimes.
    pub fn distance(self, other: RegimeId) -> usize {
        self.index().abs_diff(other.index())
    }

    pub fn is_adjacent(self, other: RegimeId) -> bool {
        self.distance(other) == 1
    }
}

impl fmt::Display for RegimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RegimeId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        RegimeId::from_key(s.trim()).ok_or_else(|| anyhow!("unknown regime key: {:?}", s))
    }
}

// =============================================================================
// Regime records
// =============================================================================

/// Inclusive range on the 0-100 fear & greed index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SentimentRange {
    pub min: u8,
    pub max: u8,
}

impl SentimentRange {
    pub fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Target portfolio split, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetAllocation {
    pub crypto: u8,
    pub stable: u8,
}

impl TargetAllocation {
    pub fn total(&self) -> u32 {
        self.crypto as u32 + self.stable as u32
    }
}

/// Spot / LP / stable breakdown, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocationBreakdown {
    pub spot: u8,
    pub lp: u8,
    pub stable: u8,
}

impl AllocationBreakdown {
    pub fn total(&self) -> u32 {
        self.spot as u32 + self.lp as u32 + self.stable as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UseCase {
    pub scenario: &'static str,
    pub user_intent: &'static str,
    pub action: &'static str,
    pub allocation_before: AllocationBreakdown,
    pub allocation_after: AllocationBreakdown,
}

/// A recommended rebalancing action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub title: &'static str,
    pub use_case: Option<UseCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySet {
    pub default: Strategy,
    /// Valid when arriving from a lower index
    pub from_left: Option<Strategy>,
    /// Valid when arriving from a higher index
    pub from_right: Option<Strategy>,
}

impl StrategySet {
    fn all(&self) -> impl Iterator<Item = &Strategy> {
        std::iter::once(&self.default)
            .chain(self.from_left.iter())
            .chain(self.from_right.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Regime {
    pub id: RegimeId,
    pub label: &'static str,
    pub sentiment: SentimentRange,
    pub allocation: TargetAllocation,
    /// Opaque accent for the view layer
    pub accent: &'static str,
    pub philosophy: &'static str,
    pub strategies: StrategySet,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone)]
pub struct RegimeCatalog {
    regimes: Vec<Regime>,
}

impl RegimeCatalog {
    /// Build a catalog from `regimes`, rejecting anything that breaks the
    /// ordering or allocation invariants.
    pub fn new(regimes: Vec<Regime>) -> Result<Self> {
        validate(&regimes)?;
        Ok(Self { regimes })
    }

    /// The catalog shipped with the product.
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_regimes())
    }

    pub fn order(&self) -> &'static [RegimeId; REGIME_COUNT] {
        &RegimeId::ALL
    }

    pub fn regimes(&self) -> &[Regime] {
        &self.regimes
    }

    pub fn get(&self, id: RegimeId) -> &Regime {
        // validate() pins regimes[i].id == RegimeId::ALL[i]
        &self.regimes[id.index()]
    }

    pub fn by_key(&self, key: &str) -> Option<&Regime> {
        RegimeId::from_key(key).map(|id| self.get(id))
    }

    /// Lookup that falls back to the first regime on an unknown key.
    ///
    /// Callers cannot tell a miss from a genuine "ef" lookup by the return
    /// value; prefer [`RegimeCatalog::by_key`].
    pub fn by_key_or_first(&self, key: &str) -> &Regime {
        match self.by_key(key) {
            Some(regime) => regime,
            None => {
                log(
                    Level::Warn,
                    Domain::Catalog,
                    "unknown_regime_fallback",
                    obj(&[("key", v_str(key)), ("fallback", v_str(RegimeId::ALL[0].key()))]),
                );
                &self.regimes[0]
            }
        }
    }

    pub fn index_of_key(&self, key: &str) -> Option<usize> {
        RegimeId::from_key(key).map(RegimeId::index)
    }

    /// Regime whose sentiment range contains `value` (0-100).
    pub fn classify(&self, value: u8) -> Option<&Regime> {
        self.regimes.iter().find(|r| r.sentiment.contains(value))
    }

    /// SHA-256 of the catalog's JSON form, hex encoded.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.regimes)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

fn validate(regimes: &[Regime]) -> Result<()> {
    if regimes.len() != REGIME_COUNT {
        bail!("catalog must hold {} regimes, got {}", REGIME_COUNT, regimes.len());
    }

    for (i, regime) in regimes.iter().enumerate() {
        let expected = RegimeId::ALL[i];
        if regime.id != expected {
            bail!("catalog slot {} holds {}, expected {}", i, regime.id, expected);
        }
        if regime.allocation.total() != 100 {
            bail!(
                "{}: crypto + stable allocation sums to {}, not 100",
                regime.id,
                regime.allocation.total()
            );
        }
        if regime.sentiment.min > regime.sentiment.max {
            bail!("{}: sentiment range is inverted", regime.id);
        }

        let strategies = &regime.strategies;
        if !regime.id.is_asymmetric()
            && (strategies.from_left.is_some() || strategies.from_right.is_some())
        {
            bail!("{}: only index 1 and 3 may carry direction strategies", regime.id);
        }

        for strategy in strategies.all() {
            if let Some(use_case) = &strategy.use_case {
                for (which, breakdown) in [
                    ("before", &use_case.allocation_before),
                    ("after", &use_case.allocation_after),
                ] {
                    if breakdown.total() != 100 {
                        bail!(
                            "{}: '{}' allocation {} sums to {}, not 100",
                            regime.id,
                            strategy.title,
                            which,
                            breakdown.total()
                        );
                    }
                }
            }
        }
    }

    // Ranges tile 0..=100 without gaps or overlap
    if regimes[0].sentiment.min != 0 || regimes[REGIME_COUNT - 1].sentiment.max != 100 {
        bail!("sentiment ranges must span 0..=100");
    }
    for pair in regimes.windows(2) {
        if pair[1].sentiment.min as u16 != pair[0].sentiment.max as u16 + 1 {
            bail!("sentiment ranges of {} and {} are not contiguous", pair[0].id, pair[1].id);
        }
    }

    Ok(())
}

// =============================================================================
// Built-in data
// =============================================================================

const fn split(spot: u8, lp: u8, stable: u8) -> AllocationBreakdown {
    AllocationBreakdown { spot, lp, stable }
}

fn builtin_regimes() -> Vec<Regime> {
    vec![
        Regime {
            id: RegimeId::ExtremeFear,
            label: "Extreme Fear",
            sentiment: SentimentRange { min: 0, max: 25 },
            allocation: TargetAllocation { crypto: 70, stable: 30 },
            accent: "#dc2626",
            philosophy: "Be greedy when others are fearful",
            strategies: StrategySet {
                default: Strategy {
                    title: "Accumulate aggressively",
                    use_case: Some(UseCase {
                        scenario: "BTC drops 30% in a week and the index prints 12",
                        user_intent: "Buy the panic without trying to time the bottom",
                        action: "Deploy stablecoin reserves into spot BTC and ETH in staged tranches",
                        allocation_before: split(30, 20, 50),
                        allocation_after: split(60, 10, 30),
                    }),
                },
                from_left: None,
                from_right: None,
            },
        },
        Regime {
            id: RegimeId::Fear,
            label: "Fear",
            sentiment: SentimentRange { min: 26, max: 45 },
            allocation: TargetAllocation { crypto: 60, stable: 40 },
            accent: "#f97316",
            philosophy: "Patience while the crowd hesitates",
            strategies: StrategySet {
                default: Strategy {
                    title: "Hold and add selectively",
                    use_case: None,
                },
                from_left: Some(Strategy {
                    title: "Take partial profits on the bounce",
                    use_case: Some(UseCase {
                        scenario: "The index climbs from 18 to 35 as capitulation fades",
                        user_intent: "Lock in part of the rebound without leaving the market",
                        action: "Rotate a slice of spot gains into LP positions",
                        allocation_before: split(60, 10, 30),
                        allocation_after: split(50, 25, 25),
                    }),
                }),
                from_right: Some(Strategy {
                    title: "Keep buying the dip",
                    use_case: Some(UseCase {
                        scenario: "Sentiment slides from a neutral 50 down to 38",
                        user_intent: "Average into weakness instead of chasing",
                        action: "Move stablecoins into spot gradually",
                        allocation_before: split(40, 30, 30),
                        allocation_after: split(50, 25, 25),
                    }),
                }),
            },
        },
        Regime {
            id: RegimeId::Neutral,
            label: "Neutral",
            sentiment: SentimentRange { min: 46, max: 54 },
            allocation: TargetAllocation { crypto: 50, stable: 50 },
            accent: "#eab308",
            philosophy: "Balance and earn while the market decides",
            strategies: StrategySet {
                default: Strategy {
                    title: "Hold and earn yield",
                    use_case: Some(UseCase {
                        scenario: "The index drifts between 46 and 54 for weeks",
                        user_intent: "Earn something while waiting for a clear signal",
                        action: "Keep the 50/50 split and farm LP fees",
                        allocation_before: split(50, 25, 25),
                        allocation_after: split(40, 40, 20),
                    }),
                },
                from_left: None,
                from_right: None,
            },
        },
        Regime {
            id: RegimeId::Greed,
            label: "Greed",
            sentiment: SentimentRange { min: 55, max: 75 },
            allocation: TargetAllocation { crypto: 40, stable: 60 },
            accent: "#84cc16",
            philosophy: "Let winners run, but start trimming",
            strategies: StrategySet {
                default: Strategy {
                    title: "Trim into strength",
                    use_case: None,
                },
                from_left: Some(Strategy {
                    title: "Ride the trend with trailing profits",
                    use_case: Some(UseCase {
                        scenario: "The index rises from 50 to 68 on a breakout",
                        user_intent: "Stay exposed while banking some gains",
                        action: "Move part of spot into stable-paired LP",
                        allocation_before: split(50, 25, 25),
                        allocation_after: split(40, 30, 30),
                    }),
                }),
                from_right: Some(Strategy {
                    title: "Rebuild exposure after the cool-down",
                    use_case: Some(UseCase {
                        scenario: "The index falls from 82 to 65 after a blow-off top",
                        user_intent: "Re-enter partially without going all in",
                        action: "Move a small slice of stables back into LP",
                        allocation_before: split(25, 20, 55),
                        allocation_after: split(30, 30, 40),
                    }),
                }),
            },
        },
        Regime {
            id: RegimeId::ExtremeGreed,
            label: "Extreme Greed",
            sentiment: SentimentRange { min: 76, max: 100 },
            allocation: TargetAllocation { crypto: 30, stable: 70 },
            accent: "#22c55e",
            philosophy: "Be fearful when others are greedy",
            strategies: StrategySet {
                default: Strategy {
                    title: "Take profits",
                    use_case: Some(UseCase {
                        scenario: "The index prints 90 while memecoins go vertical",
                        user_intent: "Protect gains before the reversal",
                        action: "Sell spot into stablecoins and keep a small LP sleeve",
                        allocation_before: split(60, 20, 20),
                        allocation_after: split(20, 10, 70),
                    }),
                },
                from_left: None,
                from_right: None,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_validates() {
        let catalog = RegimeCatalog::builtin().unwrap();
        assert_eq!(catalog.regimes().len(), REGIME_COUNT);
        for (i, id) in catalog.order().iter().enumerate() {
            assert_eq!(catalog.get(*id).id, *id);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_allocations_sum_to_100() {
        let catalog = RegimeCatalog::builtin().unwrap();
        for regime in catalog.regimes() {
            assert_eq!(regime.allocation.total(), 100, "{}", regime.id);
            for strategy in regime.strategies.all() {
                if let Some(uc) = &strategy.use_case {
                    assert_eq!(uc.allocation_before.total(), 100);
                    assert_eq!(uc.allocation_after.total(), 100);
                }
            }
        }
    }

    #[test]
    fn test_direction_variants_only_on_asymmetric() {
        let catalog = RegimeCatalog::builtin().unwrap();
        for regime in catalog.regimes() {
            let has_variants =
                regime.strategies.from_left.is_some() || regime.strategies.from_right.is_some();
            assert_eq!(has_variants, regime.id.is_asymmetric(), "{}", regime.id);
        }
    }

    #[test]
    fn test_key_lookup_distinguishes_miss() {
        let catalog = RegimeCatalog::builtin().unwrap();
        assert_eq!(catalog.by_key("g").map(|r| r.id), Some(RegimeId::Greed));
        assert!(catalog.by_key("zz").is_none());
        assert_eq!(catalog.index_of_key("eg"), Some(4));
        assert_eq!(catalog.index_of_key("zz"), None);
    }

    #[test]
    fn test_fallback_returns_first() {
        let catalog = RegimeCatalog::builtin().unwrap();
        assert_eq!(catalog.by_key_or_first("nope").id, RegimeId::ExtremeFear);
        assert_eq!(catalog.by_key_or_first("n").id, RegimeId::Neutral);
    }

    #[test]
    fn test_classify_index_value() {
        let catalog = RegimeCatalog::builtin().unwrap();
        assert_eq!(catalog.classify(0).map(|r| r.id), Some(RegimeId::ExtremeFear));
        assert_eq!(catalog.classify(50).map(|r| r.id), Some(RegimeId::Neutral));
        assert_eq!(catalog.classify(75).map(|r| r.id), Some(RegimeId::Greed));
        assert_eq!(catalog.classify(100).map(|r| r.id), Some(RegimeId::ExtremeGreed));
    }

    #[test]
    fn test_rejects_bad_allocation() {
        let mut regimes = builtin_regimes();
        regimes[2].allocation = TargetAllocation { crypto: 50, stable: 40 };
        assert!(RegimeCatalog::new(regimes).is_err());
    }

    #[test]
    fn test_rejects_out_of_order() {
        let mut regimes = builtin_regimes();
        regimes.swap(0, 1);
        assert!(RegimeCatalog::new(regimes).is_err());
    }

    #[test]
    fn test_rejects_direction_variant_on_extreme() {
        let mut regimes = builtin_regimes();
        regimes[0].strategies.from_left = Some(Strategy { title: "x", use_case: None });
        assert!(RegimeCatalog::new(regimes).is_err());
    }

    #[test]
    fn test_rejects_short_catalog() {
        let mut regimes = builtin_regimes();
        regimes.pop();
        assert!(RegimeCatalog::new(regimes).is_err());
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = RegimeCatalog::builtin().unwrap().fingerprint().unwrap();
        let b = RegimeCatalog::builtin().unwrap().fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_key_roundtrip_and_parse() {
        for id in RegimeId::ALL {
            assert_eq!(RegimeId::from_key(id.key()), Some(id));
            assert_eq!(id.to_string().parse::<RegimeId>().unwrap(), id);
        }
        assert!("xx".parse::<RegimeId>().is_err());
    }
}
