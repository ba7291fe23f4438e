use serde::{Deserialize, Serialize};

use crate::models::{Crop, Field, PriceQuote};

/// Plausibility bounds for spotting unit mistakes (kg/ha entered as t/ha,
/// EUR/kg as EUR/t).
const UNITS_WARNING_PROFIT_PER_HA: f64 = 5000.0;
const UNITS_WARNING_REVENUE_PER_HA: f64 = 10_000.0;

const PH_PENALTY_FRACTION: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitResult {
    pub revenue_per_ha: f64,
    pub revenue_total: f64,
    pub cost_per_ha: f64,
    pub cost_total: f64,
    pub profit_per_ha: f64,
    pub profit_total: f64,
    pub yield_t_ha: f64,
    pub yield_fallback_used: bool,
    /// Set when field pH falls outside the crop's range and the 10%
    /// penalty was applied.
    pub ph_note: Option<String>,
    /// Set when the numbers look like a unit mix-up.
    pub units_warning: Option<String>,
}

/// Yield for the field's soil: exact match first, then the mean of the
/// crop's other soil yields (flagged as a fallback), then 0.
fn yield_for_soil(crop: &Crop, field: &Field) -> (f64, bool) {
    if let Some(&value) = crop.yield_t_ha.get(&field.soil) {
        return (value.max(0.0), false);
    }
    let values: Vec<f64> = crop
        .yield_t_ha
        .values()
        .copied()
        .filter(|v| *v > 0.0)
        .collect();
    if values.is_empty() {
        return (0.0, true);
    }
    (values.iter().sum::<f64>() / values.len() as f64, true)
}

/// Computes the full revenue/cost/profit breakdown for one crop on one
/// field. Missing data degrades to zero; this never fails.
///
/// - revenue_per_ha = yield * price (0 for non-market crops)
/// - cost_per_ha = cost_eur_ha + rent_eur_ha
/// - profit scales by area; a flat 10% penalty applies when the field pH
///   is outside the crop's preferred range.
pub fn calculate_profit(
    field: &Field,
    crop: &Crop,
    quote: &PriceQuote,
    rent_eur_ha: f64,
) -> ProfitResult {
    let (yield_t_ha, yield_fallback_used) = yield_for_soil(crop, field);
    let price_eur_t = if quote.value > 0.0 { quote.value } else { 0.0 };
    let cost_eur_ha = if crop.cost_eur_ha > 0.0 {
        crop.cost_eur_ha
    } else {
        0.0
    };
    let area_ha = field.area_ha;

    let revenue_per_ha = if crop.is_market_crop {
        yield_t_ha * price_eur_t
    } else {
        0.0
    };
    let revenue_total = revenue_per_ha * area_ha;

    let cost_per_ha = cost_eur_ha + rent_eur_ha;
    let cost_total = cost_per_ha * area_ha;

    let mut profit_per_ha = revenue_per_ha - cost_per_ha;
    let mut profit_total = profit_per_ha * area_ha;

    let mut ph_note = None;
    if let (Some(ph), Some((ph_min, ph_max))) = (field.ph, crop.ph_range) {
        if ph < ph_min || ph > ph_max {
            profit_total *= 1.0 - PH_PENALTY_FRACTION;
            profit_per_ha *= 1.0 - PH_PENALTY_FRACTION;
            ph_note = Some(format!(
                "pH {:.1} outside preferred range ({:.1}-{:.1}), profit reduced by 10%",
                ph, ph_min, ph_max
            ));
        }
    }

    let units_warning = if profit_per_ha > UNITS_WARNING_PROFIT_PER_HA
        || revenue_per_ha > UNITS_WARNING_REVENUE_PER_HA
    {
        Some(
            "Possible unit mistake (t/ha vs kg/ha or EUR/t vs EUR/kg); check yield and price units"
                .to_string(),
        )
    } else {
        None
    };

    ProfitResult {
        revenue_per_ha,
        revenue_total,
        cost_per_ha,
        cost_total,
        profit_per_ha,
        profit_total,
        yield_t_ha,
        yield_fallback_used,
        ph_note,
        units_warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, CropGroup, SoilType};
    use approx::assert_relative_eq;

    fn field() -> Field {
        Field::new("f1", "North", 10.0, SoilType::Loam, "anna").unwrap()
    }

    fn wheat() -> Crop {
        Crop::new("Wheat", CropGroup::Cereals)
            .with_sow_months(&[9])
            .with_yield(SoilType::Loam, 5.0)
            .with_cost(400.0)
            .unwrap()
    }

    fn quote(value: f64) -> PriceQuote {
        PriceQuote::new(value, "catalog", Confidence::Medium)
    }

    #[test]
    fn worked_example_from_docs() {
        // 10 ha loam, rent 0; wheat 5 t/ha at 200 EUR/t, cost 400 EUR/ha.
        let result = calculate_profit(&field(), &wheat(), &quote(200.0), 0.0);
        assert_relative_eq!(result.profit_per_ha, 600.0, epsilon = 1e-9);
        assert_relative_eq!(result.profit_total, 6000.0, epsilon = 1e-9);
        assert_relative_eq!(result.revenue_total, 10_000.0, epsilon = 1e-9);
        assert!(!result.yield_fallback_used);
    }

    #[test]
    fn profit_total_consistent_with_per_ha() {
        let result = calculate_profit(&field(), &wheat(), &quote(200.0), 50.0);
        assert_relative_eq!(
            result.profit_total,
            result.profit_per_ha * 10.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn missing_soil_falls_back_to_mean() {
        let crop = Crop::new("Rye", CropGroup::Cereals)
            .with_yield(SoilType::Sand, 3.0)
            .with_yield(SoilType::Peat, 5.0)
            .with_cost(300.0)
            .unwrap();
        let result = calculate_profit(&field(), &crop, &quote(150.0), 0.0);
        assert!(result.yield_fallback_used);
        assert_relative_eq!(result.yield_t_ha, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn no_yield_data_degrades_to_zero() {
        let crop = Crop::new("Rye", CropGroup::Cereals).with_cost(300.0).unwrap();
        let result = calculate_profit(&field(), &crop, &quote(150.0), 0.0);
        assert!(result.yield_fallback_used);
        assert_eq!(result.yield_t_ha, 0.0);
        assert_relative_eq!(result.profit_per_ha, -300.0, epsilon = 1e-9);
    }

    #[test]
    fn non_market_crop_earns_nothing() {
        let crop = Crop::new("Grass ley", CropGroup::Other)
            .with_yield(SoilType::Loam, 6.0)
            .with_cost(150.0)
            .unwrap()
            .non_market();
        let result = calculate_profit(&field(), &crop, &quote(100.0), 0.0);
        assert_eq!(result.revenue_total, 0.0);
        assert_relative_eq!(result.profit_per_ha, -150.0, epsilon = 1e-9);
    }

    #[test]
    fn ph_penalty_is_exactly_ten_percent() {
        let crop = wheat().with_ph_range(6.0, 7.5);
        let sour_field = field().with_ph(5.2);

        let base = calculate_profit(&field(), &crop, &quote(200.0), 0.0);
        let penalized = calculate_profit(&sour_field, &crop, &quote(200.0), 0.0);

        assert_relative_eq!(
            penalized.profit_total,
            base.profit_total * 0.9,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            penalized.profit_per_ha,
            base.profit_per_ha * 0.9,
            epsilon = 1e-9
        );
        assert!(penalized.ph_note.is_some());
        assert!(base.ph_note.is_none());
    }

    #[test]
    fn ph_inside_range_is_not_penalized() {
        let crop = wheat().with_ph_range(6.0, 7.5);
        let ok_field = field().with_ph(6.8);
        let result = calculate_profit(&ok_field, &crop, &quote(200.0), 0.0);
        assert!(result.ph_note.is_none());
    }

    #[test]
    fn implausible_numbers_raise_units_warning() {
        let crop = Crop::new("Wheat", CropGroup::Cereals)
            .with_yield(SoilType::Loam, 5.0)
            .with_cost(400.0)
            .unwrap();
        // 5 t/ha at 2500 EUR/t looks like an EUR/kg price typo.
        let result = calculate_profit(&field(), &crop, &quote(2500.0), 0.0);
        assert!(result.units_warning.is_some());
    }
}
