//! Listing and category wire types, plus the boundary validation that
//! keeps bad payloads out of the rest of the crate.

use serde::{Deserialize, Serialize};
use tracing::error;

/// One job posting as served by `/api/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[serde(default)]
    pub id: Option<i64>,
    pub company_code: String,
    pub classification_name: String,
    pub employment_type: String,
    pub subject: String,
    /// Leaf category the posting belongs to.
    pub sub_job_name: String,
    #[serde(default)]
    pub company_display_name: Option<String>,
    pub detail_link: String,
    /// Closing date, passed through as the server formats it.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Minimum years of experience. Zero means no experience required.
    #[serde(default)]
    pub experience_min: u32,
    #[serde(default)]
    pub experience_max: Option<u32>,
}

impl JobListing {
    /// Effective upper bound of the experience range, `None` meaning
    /// unbounded. A zero maximum under a positive minimum marks an
    /// open-ended senior role, as does a missing maximum.
    pub fn effective_max(&self) -> Option<u32> {
        match self.experience_max {
            Some(0) if self.experience_min > 0 => None,
            Some(max) => Some(max),
            None => None,
        }
    }
}

/// One leaf of the category taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLeaf {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

/// A category group with its selectable leaves, as served by
/// `/api/category/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "categoryDtls", default)]
    pub leaves: Vec<CategoryLeaf>,
}

/// Boundary validation for listing payloads: anything but an array of
/// well-formed listings is logged and treated as empty.
pub fn listings_from_value(value: serde_json::Value) -> Vec<JobListing> {
    if !value.is_array() {
        error!("listing payload is not an array");
        return Vec::new();
    }
    match serde_json::from_value(value) {
        Ok(listings) => listings,
        Err(err) => {
            error!("listing payload failed validation: {err}");
            Vec::new()
        }
    }
}

/// Same policy for the category taxonomy.
pub fn categories_from_value(value: serde_json::Value) -> Vec<CategoryGroup> {
    if !value.is_array() {
        error!("category payload is not an array");
        return Vec::new();
    }
    match serde_json::from_value(value) {
        Ok(groups) => groups,
        Err(err) => {
            error!("category payload failed validation: {err}");
            Vec::new()
        }
    }
}
