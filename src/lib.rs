//! Crop planning engine for small arable farms.
//!
//! The crate answers one question at three horizons: what should a field
//! grow? [`logic::RecommendationEngine`] scores a single field for a
//! single year (price resolution, profit, rotation rules, filters),
//! [`logic::analyze_scenarios`] stress-tests that answer under price
//! swings, [`logic::plan_years`] and [`logic::plan_years_lookahead`]
//! extend it over a multi-year horizon, and [`logic::allocate_fields`]
//! assigns crops across a whole farm under per-crop area caps.
//!
//! All engine calls are pure over their inputs: prices and market
//! metadata travel in an explicit [`models::PriceContext`], history is
//! never mutated, and equal-profit ties always resolve in catalog order.

pub mod error;
pub mod logic;
pub mod models;

pub use error::{AgroPlanError, Result};
pub use logic::{RecommendationEngine, ScoringOptions};
pub use models::{Catalog, Crop, CropGroup, Field, PlantingRecord, PriceContext, SoilType};
