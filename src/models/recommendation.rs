use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;

/// Filter pipeline stages, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterStage {
    SowMonths,
    Sanity,
    Vegetables,
    GroupFilter,
    Favorites,
    Rotation,
}

impl FilterStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterStage::SowMonths => "sow months",
            FilterStage::Sanity => "sanity checks",
            FilterStage::Vegetables => "vegetable exclusion",
            FilterStage::GroupFilter => "group filter",
            FilterStage::Favorites => "favorites filter",
            FilterStage::Rotation => "rotation rules",
        }
    }
}

impl std::fmt::Display for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a crop was dropped from the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    NoSowMonths,
    SanityFail,
    VegetableExcluded,
    GroupFilter,
    FavoritesFilter,
    RotationForbidden,
    PriceOutOfRange,
    NoPrice,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::NoSowMonths => "no_sow_months",
            ExclusionReason::SanityFail => "sanity_fail",
            ExclusionReason::VegetableExcluded => "vegetable_excluded",
            ExclusionReason::GroupFilter => "group_filter",
            ExclusionReason::FavoritesFilter => "favorites_filter",
            ExclusionReason::RotationForbidden => "rotation_forbidden",
            ExclusionReason::PriceOutOfRange => "price_out_of_range",
            ExclusionReason::NoPrice => "no_price",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub crop: String,
    pub reason: ExclusionReason,
}

impl Exclusion {
    pub fn new(crop: impl Into<String>, reason: ExclusionReason) -> Self {
        Self {
            crop: crop.into(),
            reason,
        }
    }
}

/// Typed empty outcome: the recommendation produced no candidate, and this
/// says precisely where the set was emptied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyReason {
    /// Filtering left nothing; carries the stage that emptied the set.
    NoAllowedCrops { stage: FilterStage },
    /// Allowed crops exist, but none has a usable price and crops without
    /// a price were not requested.
    NoPriceEligibleCrops,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    pub name: String,
    pub profit_total: f64,
    pub profit_per_ha: f64,
    pub revenue_total: f64,
    pub revenue_per_ha: f64,
    pub cost_total: f64,
    pub cost_per_ha: f64,
    pub sow_months: Vec<u32>,
    pub risk_level: RiskLevel,
    pub volatility_pct: Option<f64>,
    pub is_market_crop: bool,
    pub yield_fallback_used: bool,
    pub warnings: Vec<String>,
    pub ph_note: Option<String>,
}

/// Advisory cover-crop suggestion attached to the best candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverCropSuggestion {
    pub name: String,
    pub cost_eur_ha: f64,
    pub cost_total: f64,
    pub benefits: Vec<String>,
    pub sow_months: Vec<u32>,
    /// Best candidate's profit net of cover-crop establishment cost.
    pub profit_with_cover_total: f64,
}

/// Result of a single-field, single-year recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Highest-profit candidate, if any survived filtering and pricing.
    pub best: Option<RecommendationCandidate>,
    /// All surviving candidates, ranked by total profit (stable ties).
    pub candidates: Vec<RecommendationCandidate>,
    /// Up to three top candidates, vegetables elided when not requested.
    pub top_picks: Vec<RecommendationCandidate>,
    /// Ranked tail below the top picks, same vegetable elision.
    pub lower_profit: Vec<RecommendationCandidate>,
    /// Per-stage exclusion records for every dropped crop.
    pub excluded: Vec<Exclusion>,
    /// Allowed crops that lacked a usable price.
    pub crops_without_price: Vec<String>,
    pub empty: Option<EmptyReason>,
    pub explanation: String,
    pub cover_crop: Option<CoverCropSuggestion>,
}

impl RecommendationResult {
    pub fn best_name(&self) -> Option<&str> {
        self.best.as_ref().map(|c| c.name.as_str())
    }
}

/// Stability analysis across the five price scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Modal winner across scenarios, ties broken by scenario order.
    pub stable_crop: Option<String>,
    /// How many of the five scenarios agree on `stable_crop` (0-5).
    pub stability: u8,
    /// Per-scenario results in fixed order: -20%, -10%, base, +10%, +20%.
    pub scenario_results: Vec<RecommendationResult>,
}
