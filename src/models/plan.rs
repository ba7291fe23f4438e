use serde::{Deserialize, Serialize};

/// One planned year. `crop` is None when rotation or filters blocked
/// every candidate for that year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub year: i32,
    pub crop: Option<String>,
    pub profit_total: f64,
    pub profit_per_ha: f64,
    pub revenue_total: f64,
    pub revenue_per_ha: f64,
    pub cost_total: f64,
    pub cost_per_ha: f64,
    pub sow_months: Vec<u32>,
    pub explanation: String,
}

impl PlanEntry {
    /// Entry for a year with no allowed crop; does not extend the working
    /// history.
    pub fn blocked(year: i32, explanation: impl Into<String>) -> Self {
        Self {
            year,
            crop: None,
            profit_total: 0.0,
            profit_per_ha: 0.0,
            revenue_total: 0.0,
            revenue_per_ha: 0.0,
            cost_total: 0.0,
            cost_per_ha: 0.0,
            sow_months: Vec::new(),
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMethod {
    Greedy,
    Lookahead,
}

/// A first-year candidate evaluated by the lookahead planner, with the
/// total profit of its simulated horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedCandidate {
    pub crop: String,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub field_id: String,
    pub field_name: String,
    pub start_year: i32,
    pub years: u32,
    pub method: PlanMethod,
    pub plan: Vec<PlanEntry>,
    pub total_profit: f64,
    pub avg_profit_per_ha: f64,
    /// Lookahead only: every branch-simulated first-year candidate,
    /// sorted by simulated total profit.
    pub evaluated_candidates: Vec<EvaluatedCandidate>,
}

/// Per-field outcome of the capacity-constrained allocation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    pub field_id: String,
    pub field_name: String,
    pub chosen_crop: Option<String>,
    pub profit_total: f64,
    pub profit_per_ha: f64,
    pub warnings: Vec<String>,
}
