use std::collections::HashSet;

use tracing::debug;

use crate::models::PlantingRecord;

/// Rapeseed family synonyms. Planting any variant blocks all of them for
/// the full rotation window.
const RAPESEED_VARIANTS: [&str; 3] = ["rapeseed", "winter rapeseed", "spring rapeseed"];

/// Years a rapeseed planting stays blocking (target_year-1..target_year-3).
const RAPESEED_WINDOW_YEARS: i32 = 3;

fn is_rapeseed(name: &str) -> bool {
    RAPESEED_VARIANTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name))
}

/// Applies the rotation rules and returns the candidates that remain
/// allowed for `target_year` on `field_id`, in the order given:
///
/// 1. a crop planted in `target_year - 1` cannot repeat;
/// 2. any rapeseed variant planted in the last three years forbids the
///    whole rapeseed family.
///
/// History rows for other fields, or naming crops outside the candidate
/// set, are ignored. Never mutates its inputs.
pub fn allowed_crops(
    history: &[PlantingRecord],
    candidates: &[String],
    target_year: i32,
    field_id: &str,
) -> Vec<String> {
    let candidate_set: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    let field_history: Vec<&PlantingRecord> = history
        .iter()
        .filter(|r| r.field_id == field_id && candidate_set.contains(r.crop.as_str()))
        .collect();

    let mut forbidden: HashSet<String> = HashSet::new();

    // Rule 1: no immediate repeat.
    for record in &field_history {
        if record.year >= target_year - 1 && record.year < target_year {
            forbidden.insert(record.crop.clone());
        }
    }

    // Rule 2: rapeseed family blocked for three years, cross-variant.
    let rapeseed_recent = field_history.iter().any(|r| {
        is_rapeseed(&r.crop) && r.year >= target_year - RAPESEED_WINDOW_YEARS && r.year < target_year
    });
    if rapeseed_recent {
        for name in candidates {
            if is_rapeseed(name) {
                forbidden.insert(name.clone());
            }
        }
    }

    if !forbidden.is_empty() {
        debug!(field = field_id, year = target_year, blocked = forbidden.len(), "rotation rules applied");
    }

    candidates
        .iter()
        .filter(|name| !forbidden.contains(*name))
        .cloned()
        .collect()
}
