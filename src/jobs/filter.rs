//! Conjunctive listing filter.
//!
//! A listing survives only if every criterion passes. Empty criteria are
//! wildcards, so the default specification restricts nothing except
//! no-experience listings, which are gated behind an explicit opt-in.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ApiError, Result};
use crate::jobs::types::JobListing;

/// Inclusive experience window in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub start: u32,
    pub end: u32,
}

impl ExperienceRange {
    /// `start <= end` is a construction invariant.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(ApiError::InvalidFilter(format!(
                "inverted experience range {start}..{end}"
            )));
        }
        Ok(ExperienceRange { start, end })
    }
}

/// The composite filter specification.
///
/// `categories` maps group names to selected leaf names; matching
/// flattens every group's selection into one membership set, so the
/// grouping carries no meaning beyond presentation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Exact employment type, empty for any.
    pub employment_type: String,
    pub categories: BTreeMap<String, Vec<String>>,
    /// Absent means no experience restriction.
    pub experience_range: Option<ExperienceRange>,
    /// Opt-in for listings requiring no experience at all.
    pub include_no_experience: bool,
    /// Case-insensitive substring, empty for any.
    pub search_query: String,
}

impl FilterSpec {
    /// Boundary validation for specifications that arrived as data
    /// instead of through `ExperienceRange::new`.
    pub fn validate(&self) -> Result<()> {
        if let Some(range) = &self.experience_range {
            if range.start > range.end {
                return Err(ApiError::InvalidFilter(format!(
                    "inverted experience range {}..{}",
                    range.start, range.end
                )));
            }
        }
        Ok(())
    }

    fn flattened_categories(&self) -> BTreeSet<&str> {
        self.categories
            .values()
            .flat_map(|leaves| leaves.iter().map(String::as_str))
            .collect()
    }
}

/// Whether `listing` satisfies every criterion of `spec`. Cheap string
/// checks run before the numeric ones.
pub fn evaluate(listing: &JobListing, spec: &FilterSpec) -> bool {
    matches_employment(listing, spec)
        && matches_category(listing, spec)
        && matches_experience(listing, spec)
        && matches_search(listing, spec)
}

/// Apply `spec` across a listing set, preserving order.
pub fn filter_listings(listings: &[JobListing], spec: &FilterSpec) -> Vec<JobListing> {
    listings
        .iter()
        .filter(|listing| evaluate(listing, spec))
        .cloned()
        .collect()
}

fn matches_employment(listing: &JobListing, spec: &FilterSpec) -> bool {
    spec.employment_type.is_empty() || listing.employment_type == spec.employment_type
}

fn matches_category(listing: &JobListing, spec: &FilterSpec) -> bool {
    let selected = spec.flattened_categories();
    selected.is_empty() || selected.contains(listing.sub_job_name.as_str())
}

fn matches_experience(listing: &JobListing, spec: &FilterSpec) -> bool {
    if listing.experience_min == 0 {
        // No-experience listings answer to the flag alone.
        return spec.include_no_experience;
    }
    match &spec.experience_range {
        None => true,
        Some(range) => {
            let low_enough = listing.experience_min <= range.end;
            let high_enough = match listing.effective_max() {
                None => true,
                Some(max) => max >= range.start,
            };
            low_enough && high_enough
        }
    }
}

fn matches_search(listing: &JobListing, spec: &FilterSpec) -> bool {
    if spec.search_query.is_empty() {
        return true;
    }
    let needle = spec.search_query.to_lowercase();
    let hit = |text: &str| text.to_lowercase().contains(&needle);
    hit(&listing.subject)
        || listing
            .company_display_name
            .as_deref()
            .is_some_and(|name| hit(name))
        || hit(&listing.sub_job_name)
}
