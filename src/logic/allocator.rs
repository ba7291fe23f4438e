use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::logic::filter::ScoringOptions;
use crate::logic::scorer::RecommendationEngine;
use crate::models::{AllocationResult, Field, PlantingRecord, RecommendationResult};

/// Gap between a field's top two candidate profits. A small gap means the
/// field has the least margin to give up, so it allocates first; a field
/// with no candidates sorts last.
fn difficulty(result: &RecommendationResult) -> f64 {
    match result.candidates.as_slice() {
        [] => f64::INFINITY,
        [_] => 0.0,
        [first, second, ..] => first.profit_total - second.profit_total,
    }
}

/// Assigns one crop per field for `target_year` under per-crop area caps.
///
/// Candidate scoring runs per field in parallel; the allocation itself is
/// a sequential first-fit pass in ascending difficulty order. A field
/// whose every candidate is capped out keeps its top pick anyway, with a
/// warning. Results come back in input field order.
pub fn allocate_fields(
    engine: &RecommendationEngine,
    fields: &[Field],
    history: &[PlantingRecord],
    target_year: i32,
    opts: &ScoringOptions,
    max_area_per_crop: &HashMap<String, f64>,
) -> Vec<AllocationResult> {
    let scored: Vec<RecommendationResult> = fields
        .par_iter()
        .map(|field| engine.recommend(field, history, target_year, opts))
        .collect();

    let mut order: Vec<usize> = (0..fields.len()).collect();
    order.sort_by(|&a, &b| {
        difficulty(&scored[a])
            .partial_cmp(&difficulty(&scored[b]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut used_area: HashMap<String, f64> = HashMap::new();
    let mut results: Vec<Option<AllocationResult>> = vec![None; fields.len()];

    for index in order {
        let field = &fields[index];
        let result = &scored[index];

        if result.candidates.is_empty() {
            results[index] = Some(AllocationResult {
                field_id: field.id.clone(),
                field_name: field.name.clone(),
                chosen_crop: None,
                profit_total: 0.0,
                profit_per_ha: 0.0,
                warnings: vec![result.explanation.clone()],
            });
            continue;
        }

        let fits = |crop: &str, used: &HashMap<String, f64>| match max_area_per_crop.get(crop) {
            Some(cap) => used.get(crop).copied().unwrap_or(0.0) + field.area_ha <= *cap,
            None => true,
        };

        let mut warnings = Vec::new();
        let chosen = match result
            .candidates
            .iter()
            .find(|c| fits(&c.name, &used_area))
        {
            Some(candidate) => candidate,
            None => {
                // Every candidate is capped out; keep the top pick rather
                // than leaving the field empty.
                let top = &result.candidates[0];
                warnings.push(format!(
                    "Area cap exceeded for {}: all candidates are at capacity",
                    top.name
                ));
                top
            }
        };

        *used_area.entry(chosen.name.clone()).or_insert(0.0) += field.area_ha;
        results[index] = Some(AllocationResult {
            field_id: field.id.clone(),
            field_name: field.name.clone(),
            chosen_crop: Some(chosen.name.clone()),
            profit_total: chosen.profit_total,
            profit_per_ha: chosen.profit_per_ha,
            warnings,
        });
    }

    debug!(
        year = target_year,
        fields = fields.len(),
        crops_used = used_area.len(),
        "allocation complete"
    );

    results.into_iter().flatten().collect()
}
