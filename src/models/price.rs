use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AgroPlanError, Result};

/// How trustworthy a resolved price is. High-confidence prices come from an
/// explicit manual entry and are never perturbed by scenario multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved price with provenance. `value` is always >= 0; resolution
/// never fails, it only degrades in confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub value: f64,
    pub source_label: String,
    pub confidence: Confidence,
}

impl PriceQuote {
    pub fn new(value: f64, source_label: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            value,
            source_label: source_label.into(),
            confidence,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.value > 0.0
    }
}

/// Manual/CSV price override for one crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualPrice {
    pub price_eur_t: f64,
    pub source_type: String,
    pub as_of: Option<NaiveDate>,
}

impl ManualPrice {
    pub fn new(price_eur_t: f64, source_type: impl Into<String>) -> Result<Self> {
        if !price_eur_t.is_finite() || price_eur_t < 0.0 {
            return Err(AgroPlanError::InvalidPrice(format!(
                "price_eur_t must be non-negative, got {}",
                price_eur_t
            )));
        }
        Ok(Self {
            price_eur_t,
            source_type: source_type.into(),
            as_of: None,
        })
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }

    pub fn from_volatility(volatility_pct: f64) -> Self {
        if volatility_pct < 5.0 {
            RiskLevel::Low
        } else if volatility_pct <= 12.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spread of observed prices as a percentage of their mean. Needs at least
/// three samples to say anything.
pub fn price_volatility_pct(prices: &[f64]) -> f64 {
    if prices.len() < 3 {
        return 0.0;
    }
    let max = prices.iter().cloned().fold(f64::MIN, f64::max);
    let min = prices.iter().cloned().fold(f64::MAX, f64::min);
    let avg = prices.iter().sum::<f64>() / prices.len() as f64;
    if avg == 0.0 {
        return 0.0;
    }
    ((max - min) / avg * 100.0 * 10.0).round() / 10.0
}

/// Per-crop market metadata supplied by the price-loading collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceMeta {
    pub volatility_pct: Option<f64>,
    pub risk_level: Option<RiskLevel>,
}

/// Explicit price state threaded through every scoring call. Replaces the
/// hidden module-global caches the engine would otherwise need, keeping
/// calls re-entrant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceContext {
    /// Manual/CSV overrides by crop name ("high" confidence tier).
    pub manual: HashMap<String, ManualPrice>,
    /// Market metadata by crop name (volatility, risk).
    pub meta: HashMap<String, PriceMeta>,
}

impl PriceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manual_price(mut self, crop: impl Into<String>, price: ManualPrice) -> Self {
        self.manual.insert(crop.into(), price);
        self
    }

    pub fn manual_price(&self, crop: &str) -> Option<&ManualPrice> {
        self.manual.get(crop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_volatility(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_volatility(4.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_volatility(5.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(12.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(12.1), RiskLevel::High);
    }

    #[test]
    fn volatility_needs_three_samples() {
        assert_eq!(price_volatility_pct(&[]), 0.0);
        assert_eq!(price_volatility_pct(&[200.0, 220.0]), 0.0);
    }

    #[test]
    fn volatility_is_range_over_mean() {
        // (220 - 180) / 200 * 100 = 20.0
        assert_relative_eq!(
            price_volatility_pct(&[180.0, 200.0, 220.0]),
            20.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn manual_price_rejects_negative_and_non_finite_values() {
        assert!(ManualPrice::new(-50.0, "csv").is_err());
        assert!(ManualPrice::new(f64::NAN, "csv").is_err());
        assert!(ManualPrice::new(0.0, "csv").is_ok());
        assert!(ManualPrice::new(230.0, "csv").is_ok());
    }

    #[test]
    fn quote_usability() {
        assert!(PriceQuote::new(150.0, "catalog", Confidence::Medium).is_usable());
        assert!(!PriceQuote::new(0.0, "group average", Confidence::Low).is_usable());
    }
}
