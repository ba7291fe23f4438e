use std::cmp::Ordering;

use tracing::debug;

use crate::logic::cover::suggest_cover_crop;
use crate::logic::filter::{apply_filters, ScoringOptions};
use crate::logic::prices::{price_in_sane_range, resolve_price};
use crate::logic::profit::calculate_profit;
use crate::logic::sanity;
use crate::models::{
    Catalog, CoverCrop, CoverCropSuggestion, CropGroup, EmptyReason, Exclusion, ExclusionReason,
    Field, FilterStage, PlantingRecord, PriceContext, RecommendationCandidate,
    RecommendationResult, RiskLevel,
};

const TOP_PICKS: usize = 3;

/// Single-field, single-year recommendation engine. Holds immutable
/// references to the catalog, the price context and the cover-crop
/// catalog; every call is pure and safe to run concurrently.
pub struct RecommendationEngine<'a> {
    catalog: &'a Catalog,
    prices: &'a PriceContext,
    cover_crops: &'a [CoverCrop],
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(catalog: &'a Catalog, prices: &'a PriceContext) -> Self {
        Self {
            catalog,
            prices,
            cover_crops: &[],
        }
    }

    pub fn with_cover_crops(mut self, cover_crops: &'a [CoverCrop]) -> Self {
        self.cover_crops = cover_crops;
        self
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn prices(&self) -> &'a PriceContext {
        self.prices
    }

    /// Recommends a crop for `field` in `target_year`: filters candidates,
    /// resolves prices, validates them against group bands, computes
    /// profit, and ranks by total profit (stable on catalog order).
    pub fn recommend(
        &self,
        field: &Field,
        history: &[PlantingRecord],
        target_year: i32,
        opts: &ScoringOptions,
    ) -> RecommendationResult {
        let filter_output = apply_filters(self.catalog, field, history, target_year, opts);
        let mut excluded = filter_output.excluded;

        if let Some(stage) = filter_output.emptied_at {
            return empty_result(
                excluded,
                Vec::new(),
                EmptyReason::NoAllowedCrops { stage },
                empty_stage_message(stage, opts),
            );
        }

        let mut candidates: Vec<RecommendationCandidate> = Vec::new();
        let mut crops_without_price: Vec<String> = Vec::new();

        for name in &filter_output.allowed {
            let Some(crop) = self.catalog.get(name) else {
                continue;
            };

            let quote = resolve_price(crop, self.prices, self.catalog);

            let has_price = quote.is_usable();
            if !has_price {
                crops_without_price.push(name.clone());
                if !opts.include_crops_without_price {
                    excluded.push(Exclusion::new(name, ExclusionReason::NoPrice));
                    continue;
                }
            } else if !price_in_sane_range(crop, quote.value) {
                excluded.push(Exclusion::new(name, ExclusionReason::PriceOutOfRange));
                continue;
            }

            let profit = calculate_profit(field, crop, &quote, field.rent_eur_ha);

            let mut warnings: Vec<String> = Vec::new();
            for code in sanity::check(crop, field.soil) {
                if !code.is_hard_exclude() {
                    warnings.push(format!("Sanity flag: {}", code.as_str()));
                }
            }
            if !has_price {
                warnings.push("No usable price (0 EUR/t)".to_string());
            }
            if crop.cost_eur_ha <= 0.0 {
                warnings.push("No cost data (0 EUR/ha)".to_string());
            }
            if profit.yield_fallback_used {
                warnings.push("No yield data for this soil (mean of other soils used)".to_string());
            }
            if let Some(units) = &profit.units_warning {
                warnings.push(units.clone());
            }

            let meta = self.prices.meta.get(name);
            let volatility_pct = meta
                .and_then(|m| m.volatility_pct)
                .or(Some(crop.group.default_volatility_pct()));
            let risk_level = meta
                .and_then(|m| m.risk_level)
                .or_else(|| volatility_pct.map(RiskLevel::from_volatility))
                .unwrap_or(RiskLevel::Unknown);

            candidates.push(RecommendationCandidate {
                name: name.clone(),
                profit_total: profit.profit_total,
                profit_per_ha: profit.profit_per_ha,
                revenue_total: profit.revenue_total,
                revenue_per_ha: profit.revenue_per_ha,
                cost_total: profit.cost_total,
                cost_per_ha: profit.cost_per_ha,
                sow_months: crop.sow_months.clone(),
                risk_level,
                volatility_pct,
                is_market_crop: crop.is_market_crop,
                yield_fallback_used: profit.yield_fallback_used,
                warnings,
                ph_note: profit.ph_note,
            });
        }

        if candidates.is_empty() {
            let message = if !crops_without_price.is_empty() && !opts.include_crops_without_price {
                format!(
                    "No allowed crops with a usable market price ({} without a price: {})",
                    crops_without_price.len(),
                    summarize(&crops_without_price, 3)
                )
            } else {
                "No allowed crops with a valid price".to_string()
            };
            return empty_result(
                excluded,
                crops_without_price,
                EmptyReason::NoPriceEligibleCrops,
                message,
            );
        }

        // Stable sort keeps catalog order for equal profits.
        candidates.sort_by(|a, b| {
            b.profit_total
                .partial_cmp(&a.profit_total)
                .unwrap_or(Ordering::Equal)
        });

        let elide_vegetables = !opts.include_vegetables;
        let ranked_visible: Vec<&RecommendationCandidate> = candidates
            .iter()
            .filter(|c| !elide_vegetables || !self.is_vegetable(&c.name))
            .collect();
        let top_picks: Vec<RecommendationCandidate> = ranked_visible
            .iter()
            .take(TOP_PICKS)
            .map(|c| (*c).clone())
            .collect();
        let lower_profit: Vec<RecommendationCandidate> = ranked_visible
            .iter()
            .skip(TOP_PICKS)
            .map(|c| (*c).clone())
            .collect();

        let best = candidates[0].clone();
        debug!(
            field = %field.id,
            year = target_year,
            best = %best.name,
            profit = best.profit_total,
            candidates = candidates.len(),
            "recommendation ranked"
        );

        let cover_crop = self.suggest_cover(field, &best);
        let explanation = self.build_explanation(field, &best, &excluded, cover_crop.as_ref());

        RecommendationResult {
            best: Some(best),
            candidates,
            top_picks,
            lower_profit,
            excluded,
            crops_without_price,
            empty: None,
            explanation,
            cover_crop,
        }
    }

    fn is_vegetable(&self, name: &str) -> bool {
        self.catalog
            .get(name)
            .map(|c| c.group == CropGroup::Vegetable)
            .unwrap_or(false)
    }

    fn suggest_cover(
        &self,
        field: &Field,
        best: &RecommendationCandidate,
    ) -> Option<CoverCropSuggestion> {
        let crop = self.catalog.get(&best.name)?;
        let sow_month = *crop.sow_months.first()?;
        let cover = suggest_cover_crop(self.cover_crops, crop.group, sow_month, field.soil)?;
        let cost_total = cover.cost_eur_ha * field.area_ha;
        Some(CoverCropSuggestion {
            name: cover.name.clone(),
            cost_eur_ha: cover.cost_eur_ha,
            cost_total,
            benefits: cover.benefits.clone(),
            sow_months: cover.sow_months.clone(),
            profit_with_cover_total: best.profit_total - cost_total,
        })
    }

    fn build_explanation(
        &self,
        field: &Field,
        best: &RecommendationCandidate,
        excluded: &[Exclusion],
        cover: Option<&CoverCropSuggestion>,
    ) -> String {
        let mut lines = Vec::new();

        let crop = self.catalog.get(&best.name);
        let yield_line = crop
            .and_then(|c| c.yield_t_ha.get(&field.soil))
            .map(|y| format!("Soil: {}, yield: {:.2} t/ha", field.soil, y))
            .unwrap_or_else(|| format!("Soil: {}, yield: no data", field.soil));
        lines.push(yield_line);

        if let Some(crop) = crop {
            let quote = resolve_price(crop, self.prices, self.catalog);
            lines.push(format!(
                "Price: {:.2} EUR/t (source: {}, confidence: {})",
                quote.value, quote.source_label, quote.confidence
            ));
        }

        lines.push(format!(
            "Revenue: {:.2} EUR ({:.2} EUR/ha)",
            best.revenue_total, best.revenue_per_ha
        ));
        lines.push(format!(
            "Cost: {:.2} EUR ({:.2} EUR/ha)",
            best.cost_total, best.cost_per_ha
        ));
        lines.push(format!(
            "Profit: {:.2} EUR ({:.2} EUR/ha)",
            best.profit_total, best.profit_per_ha
        ));

        if let Some(note) = &best.ph_note {
            lines.push(format!("pH penalty: {}", note));
        }

        let rotation_blocked: Vec<&str> = excluded
            .iter()
            .filter(|e| e.reason == ExclusionReason::RotationForbidden)
            .map(|e| e.crop.as_str())
            .collect();
        if !rotation_blocked.is_empty() {
            lines.push(format!(
                "Blocked by rotation: {}",
                summarize_strs(&rotation_blocked, 5)
            ));
        }
        let price_outliers: Vec<&str> = excluded
            .iter()
            .filter(|e| e.reason == ExclusionReason::PriceOutOfRange)
            .map(|e| e.crop.as_str())
            .collect();
        if !price_outliers.is_empty() {
            lines.push(format!(
                "Price outside plausible range: {}",
                summarize_strs(&price_outliers, 5)
            ));
        }

        if let Some(cover) = cover {
            lines.push(format!(
                "Cover crop suggestion: {} ({:.2} EUR/ha, profit with cover {:.2} EUR)",
                cover.name, cover.cost_eur_ha, cover.profit_with_cover_total
            ));
        }

        lines.join("\n")
    }
}

fn empty_result(
    excluded: Vec<Exclusion>,
    crops_without_price: Vec<String>,
    reason: EmptyReason,
    explanation: String,
) -> RecommendationResult {
    RecommendationResult {
        best: None,
        candidates: Vec::new(),
        top_picks: Vec::new(),
        lower_profit: Vec::new(),
        excluded,
        crops_without_price,
        empty: Some(reason),
        explanation,
        cover_crop: None,
    }
}

fn empty_stage_message(stage: FilterStage, opts: &ScoringOptions) -> String {
    let filtered = opts.group_filter.is_some()
        || !matches!(opts.favorites, crate::logic::filter::FavoritesMode::AllCrops);
    match stage {
        FilterStage::Rotation if filtered => {
            "No allowed crops in the selected filters after rotation rules".to_string()
        }
        FilterStage::Rotation => "No allowed crops after rotation rules".to_string(),
        FilterStage::Favorites => "No plantable crops among the selected favorites".to_string(),
        other => format!("No plantable crops left after {}", other),
    }
}

fn summarize(names: &[String], limit: usize) -> String {
    let strs: Vec<&str> = names.iter().map(String::as_str).collect();
    summarize_strs(&strs, limit)
}

fn summarize_strs(names: &[&str], limit: usize) -> String {
    let head = names[..names.len().min(limit)].join(", ");
    if names.len() > limit {
        format!("{}...", head)
    } else {
        head
    }
}
