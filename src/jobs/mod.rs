//! Listings: retrieval, caching, filtering, and the board facade that
//! ties them to a company selection.

pub mod board;
pub mod cache;
pub mod filter;
pub mod types;

pub use board::JobBoard;
pub use cache::JobCache;
pub use filter::{evaluate, filter_listings, ExperienceRange, FilterSpec};
pub use types::{CategoryGroup, CategoryLeaf, JobListing};

use tracing::error;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};

/// The category taxonomy from the unauthenticated catalog endpoint.
/// Non-array payloads are logged and yield an empty taxonomy.
pub async fn fetch_categories(config: &ApiConfig) -> Result<Vec<CategoryGroup>> {
    let client = config.http_client();
    let response = client
        .get(config.endpoint("/api/category/list"))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::from_status(status));
    }

    let body = response.text().await?;
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => Ok(types::categories_from_value(value)),
        Err(err) => {
            error!("category payload is not JSON: {err}");
            Ok(Vec::new())
        }
    }
}
