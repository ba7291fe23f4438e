use rayon::prelude::*;
use tracing::debug;

use crate::logic::filter::ScoringOptions;
use crate::logic::prices::resolve_price;
use crate::logic::scorer::RecommendationEngine;
use crate::models::{
    Catalog, Confidence, CoverCrop, Field, PlantingRecord, PriceContext, RecommendationResult,
    ScenarioResult,
};

/// Price multipliers applied in fixed order: -20%, -10%, base, +10%, +20%.
pub const SCENARIO_MULTIPLIERS: [f64; 5] = [0.8, 0.9, 1.0, 1.1, 1.2];

/// Re-runs the recommendation under the five price scenarios and reports
/// how stable the winner is. High-confidence prices (manual entries) are
/// pinned and never scaled; everything else moves with the multiplier.
///
/// Scenarios are independent and run in parallel; the result vector keeps
/// multiplier order regardless of completion order.
pub fn analyze_scenarios(
    catalog: &Catalog,
    prices: &PriceContext,
    cover_crops: &[CoverCrop],
    field: &Field,
    history: &[PlantingRecord],
    target_year: i32,
    opts: &ScoringOptions,
) -> ScenarioResult {
    // Resolve every base price once; scenarios perturb these resolved
    // values, not the raw catalog entries.
    let base_prices: Vec<(String, f64, Confidence)> = catalog
        .iter()
        .map(|crop| {
            let quote = resolve_price(crop, prices, catalog);
            (crop.name.clone(), quote.value, quote.confidence)
        })
        .collect();

    let scenario_results: Vec<RecommendationResult> = SCENARIO_MULTIPLIERS
        .into_par_iter()
        .map(|multiplier| {
            let mut scenario_catalog = catalog.clone();
            for (name, base, confidence) in &base_prices {
                if *confidence == Confidence::High {
                    continue;
                }
                if let Some(crop) = catalog.get(name) {
                    let mut perturbed = crop.clone();
                    perturbed.price_eur_t = Some(base * multiplier);
                    scenario_catalog.insert(perturbed);
                }
            }
            let engine = RecommendationEngine::new(&scenario_catalog, prices)
                .with_cover_crops(cover_crops);
            engine.recommend(field, history, target_year, opts)
        })
        .collect();

    // Modal winner, ties broken by scenario order (strict > keeps the
    // first-seen crop on equal counts).
    let mut tally: Vec<(String, u8)> = Vec::new();
    for result in &scenario_results {
        if let Some(name) = result.best_name() {
            match tally.iter_mut().find(|(n, _)| n == name) {
                Some((_, count)) => *count += 1,
                None => tally.push((name.to_string(), 1)),
            }
        }
    }
    let mut stable_crop: Option<String> = None;
    let mut stability: u8 = 0;
    for (name, count) in &tally {
        if *count > stability {
            stability = *count;
            stable_crop = Some(name.clone());
        }
    }

    debug!(
        field = %field.id,
        year = target_year,
        stable = stable_crop.as_deref().unwrap_or("-"),
        stability,
        "scenario analysis complete"
    );

    ScenarioResult {
        stable_crop,
        stability,
        scenario_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Crop, CropGroup, ManualPrice, SoilType};
    use approx::assert_relative_eq;

    fn field() -> Field {
        Field::new("f1", "North", 10.0, SoilType::Loam, "anna").unwrap()
    }

    #[test]
    fn dominant_crop_is_stable_in_all_five() {
        let catalog = Catalog::from_crops(vec![
            Crop::new("Wheat", CropGroup::Cereals)
                .with_sow_months(&[9])
                .with_yield(SoilType::Loam, 5.0)
                .with_cost(400.0)
                .unwrap()
                .with_price(200.0),
            Crop::new("Barley", CropGroup::Cereals)
                .with_sow_months(&[4])
                .with_yield(SoilType::Loam, 2.0)
                .with_cost(350.0)
                .unwrap()
                .with_price(180.0),
        ]);
        let ctx = PriceContext::new();
        let result = analyze_scenarios(
            &catalog,
            &ctx,
            &[],
            &field(),
            &[],
            2025,
            &ScoringOptions::default(),
        );
        assert_eq!(result.stable_crop.as_deref(), Some("Wheat"));
        assert_eq!(result.stability, 5);
        assert_eq!(result.scenario_results.len(), 5);
    }

    #[test]
    fn winner_can_flip_under_pessimistic_prices() {
        // Wheat: 1000m - 400 per ha. Barley: 600m - 50 per ha.
        // They cross at m = 0.875, so Barley wins only at m = 0.8.
        let catalog = Catalog::from_crops(vec![
            Crop::new("Wheat", CropGroup::Cereals)
                .with_sow_months(&[9])
                .with_yield(SoilType::Loam, 5.0)
                .with_cost(400.0)
                .unwrap()
                .with_price(200.0),
            Crop::new("Barley", CropGroup::Cereals)
                .with_sow_months(&[4])
                .with_yield(SoilType::Loam, 4.0)
                .with_cost(50.0)
                .unwrap()
                .with_price(150.0),
        ]);
        let ctx = PriceContext::new();
        let result = analyze_scenarios(
            &catalog,
            &ctx,
            &[],
            &field(),
            &[],
            2025,
            &ScoringOptions::default(),
        );
        assert_eq!(result.scenario_results[0].best_name(), Some("Barley"));
        assert_eq!(result.scenario_results[1].best_name(), Some("Wheat"));
        assert_eq!(result.stable_crop.as_deref(), Some("Wheat"));
        assert_eq!(result.stability, 4);
    }

    #[test]
    fn two_way_tie_goes_to_the_earliest_scenario_winner() {
        // Per-ha profit lines: Wheat 1000m - 480, Barley 500m, Rye
        // 2000m - 1620. Winners across the five multipliers come out as
        // Barley, Barley, Wheat, Wheat, Rye: a 2-2 tie that must resolve
        // to Barley, the first to win in scenario order, even though
        // Wheat precedes it in the catalog.
        let catalog = Catalog::from_crops(vec![
            Crop::new("Wheat", CropGroup::Cereals)
                .with_sow_months(&[9])
                .with_yield(SoilType::Loam, 5.0)
                .with_cost(480.0)
                .unwrap()
                .with_price(200.0),
            Crop::new("Barley", CropGroup::Cereals)
                .with_sow_months(&[4])
                .with_yield(SoilType::Loam, 5.0)
                .with_price(100.0),
            Crop::new("Rye", CropGroup::Cereals)
                .with_sow_months(&[9])
                .with_yield(SoilType::Loam, 5.0)
                .with_cost(1620.0)
                .unwrap()
                .with_price(400.0),
        ]);
        let ctx = PriceContext::new();
        let result = analyze_scenarios(
            &catalog,
            &ctx,
            &[],
            &field(),
            &[],
            2025,
            &ScoringOptions::default(),
        );

        let winners: Vec<Option<&str>> = result
            .scenario_results
            .iter()
            .map(|r| r.best_name())
            .collect();
        assert_eq!(
            winners,
            vec![
                Some("Barley"),
                Some("Barley"),
                Some("Wheat"),
                Some("Wheat"),
                Some("Rye")
            ]
        );
        assert_eq!(result.stable_crop.as_deref(), Some("Barley"));
        assert_eq!(result.stability, 2);
    }

    #[test]
    fn manual_prices_are_pinned_across_scenarios() {
        let catalog = Catalog::from_crops(vec![Crop::new("Wheat", CropGroup::Cereals)
            .with_sow_months(&[9])
            .with_yield(SoilType::Loam, 5.0)
            .with_cost(400.0)
            .unwrap()
            .with_price(200.0)]);
        let ctx = PriceContext::new().with_manual_price("Wheat", ManualPrice::new(250.0, "manual").unwrap());
        let result = analyze_scenarios(
            &catalog,
            &ctx,
            &[],
            &field(),
            &[],
            2025,
            &ScoringOptions::default(),
        );
        let pessimistic = result.scenario_results[0].best.as_ref().unwrap();
        let optimistic = result.scenario_results[4].best.as_ref().unwrap();
        assert_relative_eq!(
            pessimistic.profit_total,
            optimistic.profit_total,
            epsilon = 1e-9
        );
    }

    #[test]
    fn middle_scenario_matches_the_base_recommendation() {
        let catalog = Catalog::from_crops(vec![Crop::new("Wheat", CropGroup::Cereals)
            .with_sow_months(&[9])
            .with_yield(SoilType::Loam, 5.0)
            .with_cost(400.0)
            .unwrap()
            .with_price(200.0)]);
        let ctx = PriceContext::new();
        let engine = RecommendationEngine::new(&catalog, &ctx);
        let base = engine.recommend(&field(), &[], 2025, &ScoringOptions::default());

        let result = analyze_scenarios(
            &catalog,
            &ctx,
            &[],
            &field(),
            &[],
            2025,
            &ScoringOptions::default(),
        );
        let middle = result.scenario_results[2].best.as_ref().unwrap();
        assert_relative_eq!(
            middle.profit_total,
            base.best.as_ref().unwrap().profit_total,
            epsilon = 1e-9
        );
    }

    #[test]
    fn all_empty_scenarios_give_no_stable_crop() {
        // Sole crop blocked by rotation in every scenario.
        let catalog = Catalog::from_crops(vec![Crop::new("Wheat", CropGroup::Cereals)
            .with_sow_months(&[9])
            .with_yield(SoilType::Loam, 5.0)
            .with_cost(400.0)
            .unwrap()
            .with_price(200.0)]);
        let ctx = PriceContext::new();
        let history = vec![PlantingRecord::new("f1", 2024, "Wheat")];
        let result = analyze_scenarios(
            &catalog,
            &ctx,
            &[],
            &field(),
            &history,
            2025,
            &ScoringOptions::default(),
        );
        assert_eq!(result.stable_crop, None);
        assert_eq!(result.stability, 0);
    }
}
