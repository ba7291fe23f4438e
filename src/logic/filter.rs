use std::collections::HashSet;

use tracing::debug;

use crate::logic::{rotation, sanity};
use crate::models::{
    Catalog, Crop, CropGroup, Exclusion, ExclusionReason, Field, FilterStage, PlantingRecord,
};

/// How favorite crops shape the candidate set.
#[derive(Debug, Clone, Default)]
pub enum FavoritesMode {
    /// No favorites filtering.
    #[default]
    AllCrops,
    /// Only favorites survive (after any group filtering).
    FavoritesOnly(HashSet<String>),
    /// Union of the group-filtered set and the favorites. Deliberately lets
    /// a favorite outside the chosen group back in; this mirrors observed
    /// behavior and is kept even though a strict group filter might be
    /// expected. Without a group filter it behaves like FavoritesOnly.
    FavoritesPlusGroup(HashSet<String>),
}

#[derive(Debug, Clone, Default)]
pub struct ScoringOptions {
    pub include_vegetables: bool,
    pub include_crops_without_price: bool,
    /// Optional allow-list of groups, applied before the single-group filter.
    pub allowed_groups: Option<Vec<CropGroup>>,
    pub group_filter: Option<CropGroup>,
    pub favorites: FavoritesMode,
}

impl ScoringOptions {
    pub fn with_vegetables(mut self) -> Self {
        self.include_vegetables = true;
        self
    }

    pub fn with_crops_without_price(mut self) -> Self {
        self.include_crops_without_price = true;
        self
    }

    pub fn with_group_filter(mut self, group: CropGroup) -> Self {
        self.group_filter = Some(group);
        self
    }

    pub fn with_allowed_groups(mut self, groups: &[CropGroup]) -> Self {
        self.allowed_groups = Some(groups.to_vec());
        self
    }

    pub fn with_favorites(mut self, favorites: FavoritesMode) -> Self {
        self.favorites = favorites;
        self
    }
}

/// Output of the candidate filter pipeline. `allowed` keeps catalog order;
/// `emptied_at` is set when a stage removed the last candidate.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    pub allowed: Vec<String>,
    pub excluded: Vec<Exclusion>,
    pub emptied_at: Option<FilterStage>,
}

impl FilterOutput {
    fn emptied(excluded: Vec<Exclusion>, stage: FilterStage) -> Self {
        Self {
            allowed: Vec::new(),
            excluded,
            emptied_at: Some(stage),
        }
    }
}

/// Runs the ordered, irreversible filter stages: sow months, sanity hard
/// excludes, vegetables, group filters, favorites, rotation. Each stage
/// shrinks the set and records tagged exclusions.
pub fn apply_filters(
    catalog: &Catalog,
    field: &Field,
    history: &[PlantingRecord],
    target_year: i32,
    opts: &ScoringOptions,
) -> FilterOutput {
    let mut excluded: Vec<Exclusion> = Vec::new();

    // Stage 1: crops with no sow window are not plantable at all.
    let mut current: Vec<&Crop> = Vec::new();
    for crop in catalog.iter() {
        if crop.sow_months.is_empty() {
            excluded.push(Exclusion::new(&crop.name, ExclusionReason::NoSowMonths));
        } else {
            current.push(crop);
        }
    }
    if current.is_empty() {
        return FilterOutput::emptied(excluded, FilterStage::SowMonths);
    }

    // Stage 2: implausible catalog numbers are hard excludes.
    current.retain(|crop| {
        if sanity::fails_hard(crop, field.soil) {
            excluded.push(Exclusion::new(&crop.name, ExclusionReason::SanityFail));
            false
        } else {
            true
        }
    });
    if current.is_empty() {
        return FilterOutput::emptied(excluded, FilterStage::Sanity);
    }

    // Favorites in FavoritesPlusGroup mode are drawn from this point of the
    // pipeline: past the plantability checks, ahead of the cosmetic filters.
    let plantable: Vec<&Crop> = current.clone();

    // Stage 3: vegetables are opt-in.
    if !opts.include_vegetables {
        current.retain(|crop| {
            if crop.group == CropGroup::Vegetable {
                excluded.push(Exclusion::new(&crop.name, ExclusionReason::VegetableExcluded));
                false
            } else {
                true
            }
        });
        if current.is_empty() {
            return FilterOutput::emptied(excluded, FilterStage::Vegetables);
        }
    }

    // Stage 4: group allow-list, then single-group filter.
    if let Some(groups) = &opts.allowed_groups {
        if !groups.is_empty() {
            current.retain(|crop| {
                if groups.contains(&crop.group) {
                    true
                } else {
                    excluded.push(Exclusion::new(&crop.name, ExclusionReason::GroupFilter));
                    false
                }
            });
        }
    }
    if let Some(group) = opts.group_filter {
        current.retain(|crop| {
            if crop.group == group {
                true
            } else {
                excluded.push(Exclusion::new(&crop.name, ExclusionReason::GroupFilter));
                false
            }
        });
    }
    if current.is_empty() {
        return FilterOutput::emptied(excluded, FilterStage::GroupFilter);
    }

    // Stage 5: favorites.
    match &opts.favorites {
        FavoritesMode::AllCrops => {}
        FavoritesMode::FavoritesPlusGroup(favorites) if opts.group_filter.is_some() => {
            // Union the group-filtered set with all plantable favorites,
            // in catalog order. Favorites re-entering here lose their
            // earlier group/vegetable exclusion records.
            let kept: HashSet<&str> = current.iter().map(|c| c.name.as_str()).collect();
            let mut merged = Vec::with_capacity(plantable.len());
            for crop in &plantable {
                if kept.contains(crop.name.as_str()) || favorites.contains(&crop.name) {
                    merged.push(*crop);
                }
            }
            excluded.retain(|e| !(favorites.contains(&e.crop) && !e.reason.is_plantability()));
            current = merged;
        }
        FavoritesMode::FavoritesOnly(favorites)
        | FavoritesMode::FavoritesPlusGroup(favorites) => {
            current.retain(|crop| {
                if favorites.contains(&crop.name) {
                    true
                } else {
                    excluded.push(Exclusion::new(&crop.name, ExclusionReason::FavoritesFilter));
                    false
                }
            });
        }
    }
    if current.is_empty() {
        return FilterOutput::emptied(excluded, FilterStage::Favorites);
    }

    // Stage 6: rotation rules.
    let names: Vec<String> = current.iter().map(|c| c.name.clone()).collect();
    let allowed = rotation::allowed_crops(history, &names, target_year, &field.id);
    let allowed_set: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    for name in &names {
        if !allowed_set.contains(name.as_str()) {
            excluded.push(Exclusion::new(name, ExclusionReason::RotationForbidden));
        }
    }
    debug!(
        field = %field.id,
        year = target_year,
        candidates = allowed.len(),
        excluded = excluded.len(),
        "filter pipeline complete"
    );
    if allowed.is_empty() {
        return FilterOutput::emptied(excluded, FilterStage::Rotation);
    }

    FilterOutput {
        allowed,
        excluded,
        emptied_at: None,
    }
}

impl ExclusionReason {
    /// Reasons tied to whether the crop can physically be planted, as
    /// opposed to preference filters a favorite may override.
    fn is_plantability(&self) -> bool {
        matches!(
            self,
            ExclusionReason::NoSowMonths | ExclusionReason::SanityFail
        )
    }
}
