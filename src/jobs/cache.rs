//! Per-company listing cache.
//!
//! One fetch per company per process lifetime: a populated entry is
//! never invalidated or refreshed. Malformed 2xx payloads populate
//! their entry as empty (after logging), while transport and HTTP
//! failures leave the entry untouched so a later call can retry.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, error};

use crate::company::Company;
use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::jobs::types::{self, JobListing};

pub struct JobCache {
    config: ApiConfig,
    client: reqwest::Client,
    entries: Mutex<HashMap<Company, Vec<JobListing>>>,
}

impl JobCache {
    pub fn new(config: ApiConfig) -> Self {
        let client = config.http_client();
        JobCache {
            config,
            client,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Listings for `company`, fetched on first use and served from the
    /// cache afterwards.
    pub async fn get(&self, company: Company) -> Result<Vec<JobListing>> {
        if let Some(hit) = self.lookup(company) {
            debug!("cache hit for {company}");
            return Ok(hit);
        }

        let listings = self.fetch(company).await?;
        let mut entries = self.entries.lock().unwrap();
        // If a concurrent fetch for the same company got here first, its
        // entry stands and this one is discarded.
        Ok(entries.entry(company).or_insert(listings).clone())
    }

    /// Whether an entry exists, populated or empty.
    pub fn contains(&self, company: Company) -> bool {
        self.entries.lock().unwrap().contains_key(&company)
    }

    fn lookup(&self, company: Company) -> Option<Vec<JobListing>> {
        self.entries.lock().unwrap().get(&company).cloned()
    }

    async fn fetch(&self, company: Company) -> Result<Vec<JobListing>> {
        debug!("fetching listings for {company}");
        let response = self
            .client
            .get(self.config.endpoint("/api/list"))
            .query(&[("company", company.code())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }

        let body = response.text().await?;
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => Ok(types::listings_from_value(value)),
            Err(err) => {
                error!("listing payload for {company} is not JSON: {err}");
                Ok(Vec::new())
            }
        }
    }
}
