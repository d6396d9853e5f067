//! Piotroski F-Score breakdown derived from the nine boolean signals

use serde::{Deserialize, Serialize};

/// The nine F-Score signals. `None` means the service did not report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FScoreFlags {
    // profitability
    pub roa_positive: Option<bool>,
    pub cfo_positive: Option<bool>,
    pub roa_increasing: Option<bool>,
    pub cfo_exceeds_net_income: Option<bool>,
    // leverage, liquidity and source of funds
    pub leverage_decreasing: Option<bool>,
    pub current_ratio_increasing: Option<bool>,
    pub no_new_shares: Option<bool>,
    // operating efficiency
    pub gross_margin_increasing: Option<bool>,
    pub asset_turnover_increasing: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FScoreCategory {
    Profitability,
    LeverageLiquidity,
    OperatingEfficiency,
}

impl FScoreCategory {
    pub fn max_score(self) -> u8 {
        match self {
            FScoreCategory::Profitability => 4,
            FScoreCategory::LeverageLiquidity => 3,
            FScoreCategory::OperatingEfficiency => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FScoreRating {
    /// 0-3
    Weak,
    /// 4-6
    Neutral,
    /// 7-9
    Strong,
}

impl FScoreRating {
    pub fn from_total(total: u8) -> Self {
        match total {
            0..=3 => FScoreRating::Weak,
            4..=6 => FScoreRating::Neutral,
            _ => FScoreRating::Strong,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: FScoreCategory,
    pub score: u8,
    pub max: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FScoreBreakdown {
    pub categories: [CategoryScore; 3],
    pub total: u8,
    pub rating: FScoreRating,
    /// camelCase names of signals that were not reported
    pub unknown: Vec<&'static str>,
}

impl FScoreBreakdown {
    /// Score each category; unreported signals count as zero.
    pub fn from_flags(flags: &FScoreFlags) -> Self {
        let groups: [(FScoreCategory, Vec<(&'static str, Option<bool>)>); 3] = [
            (
                FScoreCategory::Profitability,
                vec![
                    ("roaPositive", flags.roa_positive),
                    ("cfoPositive", flags.cfo_positive),
                    ("roaIncreasing", flags.roa_increasing),
                    ("cfoExceedsNetIncome", flags.cfo_exceeds_net_income),
                ],
            ),
            (
                FScoreCategory::LeverageLiquidity,
                vec![
                    ("leverageDecreasing", flags.leverage_decreasing),
                    ("currentRatioIncreasing", flags.current_ratio_increasing),
                    ("noNewShares", flags.no_new_shares),
                ],
            ),
            (
                FScoreCategory::OperatingEfficiency,
                vec![
                    ("grossMarginIncreasing", flags.gross_margin_increasing),
                    ("assetTurnoverIncreasing", flags.asset_turnover_increasing),
                ],
            ),
        ];

        let mut unknown = Vec::new();
        let categories = groups.map(|(category, signals)| {
            let mut score = 0;
            for (name, signal) in signals {
                match signal {
                    Some(true) => score += 1,
                    Some(false) => {}
                    None => unknown.push(name),
                }
            }
            CategoryScore {
                category,
                score,
                max: category.max_score(),
            }
        });

        let total = categories.iter().map(|c| c.score).sum();
        Self {
            categories,
            total,
            rating: FScoreRating::from_total(total),
            unknown,
        }
    }

    pub fn category(&self, category: FScoreCategory) -> CategoryScore {
        self.categories
            .iter()
            .copied()
            .find(|c| c.category == category)
            .unwrap_or(CategoryScore {
                category,
                score: 0,
                max: category.max_score(),
            })
    }

    pub fn is_complete(&self) -> bool {
        self.unknown.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(value: bool) -> FScoreFlags {
        FScoreFlags {
            roa_positive: Some(value),
            cfo_positive: Some(value),
            roa_increasing: Some(value),
            cfo_exceeds_net_income: Some(value),
            leverage_decreasing: Some(value),
            current_ratio_increasing: Some(value),
            no_new_shares: Some(value),
            gross_margin_increasing: Some(value),
            asset_turnover_increasing: Some(value),
        }
    }

    #[test]
    fn test_perfect_and_zero_scores() {
        let best = FScoreBreakdown::from_flags(&all(true));
        assert_eq!(best.total, 9);
        assert_eq!(best.rating, FScoreRating::Strong);
        assert!(best.is_complete());

        let worst = FScoreBreakdown::from_flags(&all(false));
        assert_eq!(worst.total, 0);
        assert_eq!(worst.rating, FScoreRating::Weak);
    }

    #[test]
    fn test_category_split() {
        let flags = FScoreFlags {
            roa_positive: Some(true),
            cfo_positive: Some(true),
            leverage_decreasing: Some(true),
            gross_margin_increasing: Some(true),
            asset_turnover_increasing: Some(true),
            ..all(false)
        };
        let breakdown = FScoreBreakdown::from_flags(&flags);

        assert_eq!(breakdown.category(FScoreCategory::Profitability).score, 2);
        assert_eq!(breakdown.category(FScoreCategory::LeverageLiquidity).score, 1);
        let efficiency = breakdown.category(FScoreCategory::OperatingEfficiency);
        assert_eq!((efficiency.score, efficiency.max), (2, 2));
        assert_eq!(breakdown.total, 5);
        assert_eq!(breakdown.rating, FScoreRating::Neutral);
    }

    #[test]
    fn test_missing_flags_are_reported() {
        let flags = FScoreFlags {
            roa_positive: Some(true),
            ..Default::default()
        };
        let breakdown = FScoreBreakdown::from_flags(&flags);
        assert_eq!(breakdown.total, 1);
        assert_eq!(breakdown.unknown.len(), 8);
        assert!(breakdown.unknown.contains(&"noNewShares"));
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(FScoreRating::from_total(3), FScoreRating::Weak);
        assert_eq!(FScoreRating::from_total(4), FScoreRating::Neutral);
        assert_eq!(FScoreRating::from_total(6), FScoreRating::Neutral);
        assert_eq!(FScoreRating::from_total(7), FScoreRating::Strong);
    }
}
