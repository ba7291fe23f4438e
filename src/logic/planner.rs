use rayon::prelude::*;
use tracing::debug;

use crate::error::{AgroPlanError, Result};
use crate::logic::filter::ScoringOptions;
use crate::logic::scorer::RecommendationEngine;
use crate::models::{
    EvaluatedCandidate, Field, PlanEntry, PlanMethod, PlanResult, PlantingRecord,
    RecommendationCandidate,
};

pub const MAX_PLAN_YEARS: u32 = 10;

fn validate_horizon(years: u32) -> Result<()> {
    if years == 0 || years > MAX_PLAN_YEARS {
        return Err(AgroPlanError::InvalidHorizon(format!(
            "years must be between 1 and {}, got {}",
            MAX_PLAN_YEARS, years
        )));
    }
    Ok(())
}

fn entry_from_candidate(
    year: i32,
    candidate: &RecommendationCandidate,
    explanation: String,
) -> PlanEntry {
    PlanEntry {
        year,
        crop: Some(candidate.name.clone()),
        profit_total: candidate.profit_total,
        profit_per_ha: candidate.profit_per_ha,
        revenue_total: candidate.revenue_total,
        revenue_per_ha: candidate.revenue_per_ha,
        cost_total: candidate.cost_total,
        cost_per_ha: candidate.cost_per_ha,
        sow_months: candidate.sow_months.clone(),
        explanation,
    }
}

/// Picks the best crop year by year, threading each pick back into a
/// working copy of the history so rotation rules see the plan so far.
/// Blocked years produce an entry with no crop and leave the history
/// untouched.
fn greedy_entries(
    engine: &RecommendationEngine,
    field: &Field,
    working: &mut Vec<PlantingRecord>,
    start_year: i32,
    years: u32,
    opts: &ScoringOptions,
) -> Vec<PlanEntry> {
    let mut plan = Vec::with_capacity(years as usize);
    for offset in 0..years {
        let year = start_year + offset as i32;
        let result = engine.recommend(field, working, year, opts);
        match &result.best {
            Some(best) => {
                working.push(PlantingRecord::new(&field.id, year, &best.name));
                plan.push(entry_from_candidate(year, best, result.explanation));
            }
            None => plan.push(PlanEntry::blocked(year, result.explanation)),
        }
    }
    plan
}

fn finish(
    field: &Field,
    start_year: i32,
    years: u32,
    method: PlanMethod,
    plan: Vec<PlanEntry>,
    evaluated_candidates: Vec<EvaluatedCandidate>,
) -> PlanResult {
    let total_profit: f64 = plan.iter().map(|e| e.profit_total).sum();
    let avg_profit_per_ha = total_profit / (field.area_ha * years as f64);
    PlanResult {
        field_id: field.id.clone(),
        field_name: field.name.clone(),
        start_year,
        years,
        method,
        plan,
        total_profit,
        avg_profit_per_ha,
        evaluated_candidates,
    }
}

/// Greedy multi-year plan: each year takes the locally best crop given
/// the history so far.
pub fn plan_years(
    engine: &RecommendationEngine,
    field: &Field,
    history: &[PlantingRecord],
    start_year: i32,
    years: u32,
    opts: &ScoringOptions,
) -> Result<PlanResult> {
    validate_horizon(years)?;
    let mut working = history.to_vec();
    let plan = greedy_entries(engine, field, &mut working, start_year, years, opts);
    debug!(
        field = %field.id,
        start_year,
        years,
        total = plan.iter().map(|e| e.profit_total).sum::<f64>(),
        "greedy plan complete"
    );
    Ok(finish(field, start_year, years, PlanMethod::Greedy, plan, Vec::new()))
}

/// Lookahead plan: branches on the top `k` first-year candidates, plays
/// each branch out greedily over the remaining years, and keeps the branch
/// with the highest simulated total. Branch ties go to the higher-ranked
/// first-year candidate. Falls back to the greedy plan when the first year
/// has no candidates at all.
pub fn plan_years_lookahead(
    engine: &RecommendationEngine,
    field: &Field,
    history: &[PlantingRecord],
    start_year: i32,
    years: u32,
    k: usize,
    opts: &ScoringOptions,
) -> Result<PlanResult> {
    validate_horizon(years)?;

    let first = engine.recommend(field, history, start_year, opts);
    if first.candidates.is_empty() {
        return plan_years(engine, field, history, start_year, years, opts);
    }

    let branch_candidates: Vec<&RecommendationCandidate> =
        first.candidates.iter().take(k.max(1)).collect();

    // Branches are independent simulations over cloned histories.
    let branches: Vec<(Vec<PlanEntry>, f64)> = branch_candidates
        .par_iter()
        .map(|candidate| {
            let mut working = history.to_vec();
            working.push(PlantingRecord::new(&field.id, start_year, &candidate.name));

            let explanation = format!(
                "First-year branch: {} ({:.2} EUR profit)",
                candidate.name, candidate.profit_total
            );
            let mut entries = vec![entry_from_candidate(start_year, candidate, explanation)];
            entries.extend(greedy_entries(
                engine,
                field,
                &mut working,
                start_year + 1,
                years - 1,
                opts,
            ));
            let total: f64 = entries.iter().map(|e| e.profit_total).sum();
            (entries, total)
        })
        .collect();

    // Strict > keeps the earlier (higher-ranked) branch on ties.
    let mut winner = 0;
    for (i, (_, total)) in branches.iter().enumerate() {
        if *total > branches[winner].1 {
            winner = i;
        }
    }

    let mut evaluated_candidates: Vec<EvaluatedCandidate> = branch_candidates
        .iter()
        .zip(&branches)
        .map(|(candidate, (_, total))| EvaluatedCandidate {
            crop: candidate.name.clone(),
            total_profit: *total,
        })
        .collect();
    evaluated_candidates.sort_by(|a, b| {
        b.total_profit
            .partial_cmp(&a.total_profit)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let (plan, total) = branches
        .into_iter()
        .nth(winner)
        .unwrap_or((Vec::new(), 0.0));
    debug!(
        field = %field.id,
        start_year,
        years,
        k = branch_candidates.len(),
        total,
        "lookahead plan complete"
    );

    Ok(finish(
        field,
        start_year,
        years,
        PlanMethod::Lookahead,
        plan,
        evaluated_candidates,
    ))
}
