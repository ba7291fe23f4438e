pub mod allocator;
pub mod cover;
pub mod filter;
pub mod planner;
pub mod prices;
pub mod profit;
pub mod rotation;
pub mod sanity;
pub mod scenarios;
pub mod scorer;

pub use allocator::allocate_fields;
pub use filter::{apply_filters, FavoritesMode, FilterOutput, ScoringOptions};
pub use planner::{plan_years, plan_years_lookahead, MAX_PLAN_YEARS};
pub use prices::{price_in_sane_range, resolve_price};
pub use profit::{calculate_profit, ProfitResult};
pub use rotation::allowed_crops;
pub use scenarios::{analyze_scenarios, SCENARIO_MULTIPLIERS};
pub use scorer::RecommendationEngine;
