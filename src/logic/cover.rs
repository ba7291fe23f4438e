use crate::models::{CoverCrop, CropGroup, SoilType};

/// Suggests a cover crop to follow a main crop: the first catalog entry
/// allowed after the main crop's group and sowable in the given month.
/// Purely advisory; an empty catalog or no match returns None.
///
/// The soil parameter is part of the advisory contract but currently
/// unused: the cover catalog carries no per-soil data.
pub fn suggest_cover_crop<'a>(
    catalog: &'a [CoverCrop],
    main_group: CropGroup,
    sow_month: u32,
    _soil: SoilType,
) -> Option<&'a CoverCrop> {
    catalog.iter().find(|cover| {
        cover.allowed_after_groups.contains(&main_group) && cover.sow_months.contains(&sow_month)
    })
}
