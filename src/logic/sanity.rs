use serde::{Deserialize, Serialize};

use crate::models::{Crop, CropGroup, SoilType};

/// Numeric plausibility flags for catalog data. `YieldTooHigh` and
/// `PriceTooHigh` are hard excludes in the filter pipeline; `CostTooHigh`
/// is advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    YieldTooHigh,
    PriceTooHigh,
    CostTooHigh,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::YieldTooHigh => "yield_too_high",
            WarningCode::PriceTooHigh => "price_too_high",
            WarningCode::CostTooHigh => "cost_too_high",
        }
    }

    pub fn is_hard_exclude(&self) -> bool {
        matches!(self, WarningCode::YieldTooHigh | WarningCode::PriceTooHigh)
    }
}

const MAX_PLAUSIBLE_YIELD_T_HA: f64 = 20.0;
const MAX_PLAUSIBLE_PRICE_EUR_T: f64 = 1200.0;
const MAX_PLAUSIBLE_COST_EUR_HA: f64 = 3000.0;

/// Checks a crop's numbers against plausibility bounds for the given soil.
/// The yield bound only applies to field crops (cereals, oilseed, legumes),
/// where > 20 t/ha almost certainly means a kg/ha entry.
pub fn check(crop: &Crop, soil: SoilType) -> Vec<WarningCode> {
    let mut warnings = Vec::new();

    if let Some(&yield_value) = crop.yield_t_ha.get(&soil) {
        let is_field_crop = matches!(
            crop.group,
            CropGroup::Cereals | CropGroup::Oilseed | CropGroup::Legume
        );
        if is_field_crop && yield_value > MAX_PLAUSIBLE_YIELD_T_HA {
            warnings.push(WarningCode::YieldTooHigh);
        }
    }

    if let Some(price) = crop.price_eur_t {
        if price > MAX_PLAUSIBLE_PRICE_EUR_T {
            warnings.push(WarningCode::PriceTooHigh);
        }
    }

    if crop.cost_eur_ha > MAX_PLAUSIBLE_COST_EUR_HA {
        warnings.push(WarningCode::CostTooHigh);
    }

    warnings
}

/// True when any hard-exclude flag is raised for this crop on this soil.
pub fn fails_hard(crop: &Crop, soil: SoilType) -> bool {
    check(crop, soil).iter().any(WarningCode::is_hard_exclude)
}
