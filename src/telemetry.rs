//! Fire-and-forget click logging.
//!
//! A click beacon is spawned and forgotten: the caller never waits on it
//! and no failure here can affect the browsing flow. The returned handle
//! exists for process teardown and tests; dropping it is the norm.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::ApiConfig;
use crate::jobs::types::JobListing;

const CLICK_PATH: &str = "/api/log/job_history";
const CLICK_TIMEOUT: Duration = Duration::from_secs(5);

/// Report that `listing` was opened.
pub fn record_click(config: &ApiConfig, listing: &JobListing) -> JoinHandle<()> {
    let client = config.clone().with_timeout(CLICK_TIMEOUT).http_client();
    let url = config.endpoint(CLICK_PATH);
    let anno_id = listing.id.map(|id| id.to_string()).unwrap_or_default();
    let subject = listing.subject.clone();

    tokio::spawn(async move {
        let result = client
            .get(url)
            .query(&[("anno_id", anno_id.as_str()), ("anno_subject", &subject)])
            .send()
            .await;
        match result {
            Ok(response) => debug!("click beacon answered {}", response.status()),
            Err(err) => debug!("click beacon failed: {err}"),
        }
    })
}
