use serde::{Deserialize, Serialize};

use crate::error::{AgroPlanError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Sand,
    Loam,
    Peat,
    Wet,
}

impl SoilType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Sand => "Sand",
            SoilType::Loam => "Loam",
            SoilType::Peat => "Peat",
            SoilType::Wet => "Wet",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sand" | "sandy" => Some(SoilType::Sand),
            "loam" | "loamy" => Some(SoilType::Loam),
            "peat" => Some(SoilType::Peat),
            "wet" => Some(SoilType::Wet),
            _ => None,
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable field snapshot used for one recommendation call.
///
/// Construction enforces the entity contract (positive area, non-negative
/// rent); the engine itself does not re-validate these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub area_ha: f64,
    pub soil: SoilType,
    pub ph: Option<f64>,
    pub rent_eur_ha: f64,
    pub owner: String,
}

impl Field {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        area_ha: f64,
        soil: SoilType,
        owner: impl Into<String>,
    ) -> Result<Self> {
        if !area_ha.is_finite() || area_ha <= 0.0 {
            return Err(AgroPlanError::InvalidField(format!(
                "area_ha must be positive, got {}",
                area_ha
            )));
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            area_ha,
            soil,
            ph: None,
            rent_eur_ha: 0.0,
            owner: owner.into(),
        })
    }

    pub fn with_ph(mut self, ph: f64) -> Self {
        self.ph = Some(ph);
        self
    }

    pub fn with_rent(mut self, rent_eur_ha: f64) -> Result<Self> {
        if !rent_eur_ha.is_finite() || rent_eur_ha < 0.0 {
            return Err(AgroPlanError::InvalidField(format!(
                "rent_eur_ha must be non-negative, got {}",
                rent_eur_ha
            )));
        }
        self.rent_eur_ha = rent_eur_ha;
        Ok(self)
    }
}
