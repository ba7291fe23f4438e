use serde::{Deserialize, Serialize};

/// One season's planting on a field. History is an append-only log; the
/// planners build transient copies with virtual records, never mutating
/// the caller's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantingRecord {
    pub field_id: String,
    pub year: i32,
    pub crop: String,
}

impl PlantingRecord {
    pub fn new(field_id: impl Into<String>, year: i32, crop: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            year,
            crop: crop.into(),
        }
    }
}
