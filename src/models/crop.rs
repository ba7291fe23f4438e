use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AgroPlanError, Result};
use crate::models::SoilType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropGroup {
    Cereals,
    Oilseed,
    Legume,
    Vegetable,
    Other,
}

impl CropGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropGroup::Cereals => "Cereals",
            CropGroup::Oilseed => "Oilseed",
            CropGroup::Legume => "Legume",
            CropGroup::Vegetable => "Vegetable",
            CropGroup::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cereals" | "cereal" | "grain" => Some(CropGroup::Cereals),
            "oilseed" | "oilseeds" => Some(CropGroup::Oilseed),
            "legume" | "legumes" | "pulses" => Some(CropGroup::Legume),
            "vegetable" | "vegetables" => Some(CropGroup::Vegetable),
            "other" => Some(CropGroup::Other),
            _ => None,
        }
    }

    /// Plausible market price band (EUR/t) for crops of this group.
    /// Prices outside the band are treated as data-entry outliers.
    pub fn sane_price_range(&self) -> Option<(f64, f64)> {
        match self {
            CropGroup::Cereals => Some((80.0, 500.0)),
            CropGroup::Oilseed => Some((200.0, 900.0)),
            CropGroup::Legume => Some((150.0, 800.0)),
            CropGroup::Vegetable => Some((50.0, 300.0)),
            CropGroup::Other => None,
        }
    }

    /// Typical year-over-year price swing when no market history is available.
    pub fn default_volatility_pct(&self) -> f64 {
        match self {
            CropGroup::Cereals => 5.0,
            CropGroup::Oilseed => 7.0,
            CropGroup::Legume => 6.0,
            CropGroup::Vegetable => 10.0,
            CropGroup::Other => 5.0,
        }
    }
}

impl std::fmt::Display for CropGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable crop catalog entry. Price overrides are layered on via
/// `PriceQuote` values rather than rebuilding the crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crop {
    pub name: String,
    pub group: CropGroup,
    /// Months (1-12) in which the crop can be sown; empty means not sowable.
    pub sow_months: Vec<u32>,
    /// Expected yield per soil type; soils may be missing.
    pub yield_t_ha: HashMap<SoilType, f64>,
    pub cost_eur_ha: f64,
    /// Base catalog price, if one is known.
    pub price_eur_t: Option<f64>,
    /// Non-market crops (cover crops, grassland) earn no revenue.
    pub is_market_crop: bool,
    pub ph_range: Option<(f64, f64)>,
}

impl Crop {
    pub fn new(name: impl Into<String>, group: CropGroup) -> Self {
        Self {
            name: name.into(),
            group,
            sow_months: Vec::new(),
            yield_t_ha: HashMap::new(),
            cost_eur_ha: 0.0,
            price_eur_t: None,
            is_market_crop: true,
            ph_range: None,
        }
    }

    pub fn with_sow_months(mut self, months: &[u32]) -> Self {
        self.sow_months = months.to_vec();
        self
    }

    pub fn with_yield(mut self, soil: SoilType, yield_t_ha: f64) -> Self {
        self.yield_t_ha.insert(soil, yield_t_ha);
        self
    }

    pub fn with_cost(mut self, cost_eur_ha: f64) -> Result<Self> {
        if !cost_eur_ha.is_finite() || cost_eur_ha < 0.0 {
            return Err(AgroPlanError::InvalidCrop(format!(
                "cost_eur_ha must be non-negative, got {}",
                cost_eur_ha
            )));
        }
        self.cost_eur_ha = cost_eur_ha;
        Ok(self)
    }

    pub fn with_price(mut self, price_eur_t: f64) -> Self {
        self.price_eur_t = Some(price_eur_t);
        self
    }

    pub fn with_ph_range(mut self, min: f64, max: f64) -> Self {
        self.ph_range = Some((min, max));
        self
    }

    pub fn non_market(mut self) -> Self {
        self.is_market_crop = false;
        self
    }
}

/// Insertion-ordered crop collection. Ranking ties keep catalog order, so
/// iteration must be deterministic; a plain HashMap would not be.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CatalogData")]
pub struct Catalog {
    crops: Vec<Crop>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Wire shape of a catalog: just the crop list. The name index is rebuilt
/// on the way in so a deserialized catalog looks up crops immediately.
#[derive(Deserialize)]
struct CatalogData {
    crops: Vec<Crop>,
}

impl From<CatalogData> for Catalog {
    fn from(data: CatalogData) -> Self {
        Catalog::from_crops(data.crops)
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_crops(crops: Vec<Crop>) -> Self {
        let mut catalog = Self::new();
        for crop in crops {
            catalog.insert(crop);
        }
        catalog
    }

    /// Inserts or replaces a crop, keyed by name. Replacement keeps the
    /// crop's original position in iteration order.
    pub fn insert(&mut self, crop: Crop) {
        match self.index.get(&crop.name) {
            Some(&i) => self.crops[i] = crop,
            None => {
                self.index.insert(crop.name.clone(), self.crops.len());
                self.crops.push(crop);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Crop> {
        self.index.get(name).map(|&i| &self.crops[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Crop> {
        self.crops.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.crops.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

/// Cover crop sown after the main crop's harvest window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverCrop {
    pub name: String,
    pub sow_months: Vec<u32>,
    pub benefits: Vec<String>,
    pub cost_eur_ha: f64,
    /// Main-crop groups this cover crop may follow.
    pub allowed_after_groups: Vec<CropGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_group_from_str() {
        assert_eq!(CropGroup::from_str("cereals"), Some(CropGroup::Cereals));
        assert_eq!(CropGroup::from_str("Oilseed"), Some(CropGroup::Oilseed));
        assert_eq!(CropGroup::from_str("VEGETABLES"), Some(CropGroup::Vegetable));
        assert_eq!(CropGroup::from_str("flowers"), None);
    }

    #[test]
    fn sane_price_ranges_by_group() {
        assert_eq!(CropGroup::Cereals.sane_price_range(), Some((80.0, 500.0)));
        assert_eq!(CropGroup::Other.sane_price_range(), None);
    }

    #[test]
    fn catalog_keeps_insertion_order() {
        let catalog = Catalog::from_crops(vec![
            Crop::new("Wheat", CropGroup::Cereals),
            Crop::new("Barley", CropGroup::Cereals),
            Crop::new("Rapeseed", CropGroup::Oilseed),
        ]);
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["Wheat", "Barley", "Rapeseed"]);
        assert!(catalog.contains("Barley"));
        assert!(catalog.get("Oats").is_none());
    }

    #[test]
    fn catalog_insert_replaces_in_place() {
        let mut catalog = Catalog::from_crops(vec![
            Crop::new("Wheat", CropGroup::Cereals),
            Crop::new("Barley", CropGroup::Cereals),
        ]);
        catalog.insert(Crop::new("Wheat", CropGroup::Cereals).with_price(210.0));
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["Wheat", "Barley"]);
        assert_eq!(catalog.get("Wheat").unwrap().price_eur_t, Some(210.0));
    }

    #[test]
    fn deserialized_catalog_has_a_working_index() {
        let catalog = Catalog::from_crops(vec![
            Crop::new("Wheat", CropGroup::Cereals).with_price(200.0),
            Crop::new("Barley", CropGroup::Cereals).with_price(180.0),
        ]);
        let json = serde_json::to_string(&catalog).unwrap();
        let restored: Catalog = serde_json::from_str(&json).unwrap();

        assert!(restored.contains("Wheat"));
        assert_eq!(restored.get("Barley").unwrap().price_eur_t, Some(180.0));
        let names: Vec<&str> = restored.names().collect();
        assert_eq!(names, vec!["Wheat", "Barley"]);
    }

    #[test]
    fn crop_rejects_negative_cost() {
        assert!(Crop::new("Wheat", CropGroup::Cereals).with_cost(-5.0).is_err());
    }
}
