//! Session facade over selection, cache, and filter.
//!
//! The board owns which company is active and which filter applies.
//! Every selection change bumps a generation counter; a fetch carries
//! the generation current at dispatch and its result is dropped when a
//! newer selection superseded it mid-flight. Stale results still land
//! in the cache under their own company, they are just not presented.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::company::Company;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::jobs::cache::JobCache;
use crate::jobs::filter::{self, FilterSpec};
use crate::jobs::types::JobListing;

pub struct JobBoard {
    cache: JobCache,
    state: Mutex<BoardState>,
    generation: AtomicU64,
}

struct BoardState {
    active: Company,
    filter: FilterSpec,
}

impl JobBoard {
    pub fn new(config: ApiConfig) -> Self {
        JobBoard {
            cache: JobCache::new(config),
            state: Mutex::new(BoardState {
                active: Company::Naver,
                filter: FilterSpec::default(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Make `company` the active selection, superseding any fetch still
    /// in flight. Returns the new generation.
    pub fn select(&self, company: Company) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.active = company;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("selected {company} (generation {generation})");
        generation
    }

    pub fn active(&self) -> Company {
        self.state.lock().unwrap().active
    }

    /// Replace the filter. The specification is validated first.
    pub fn set_filter(&self, filter: FilterSpec) -> Result<()> {
        filter.validate()?;
        self.state.lock().unwrap().filter = filter;
        Ok(())
    }

    pub fn filter(&self) -> FilterSpec {
        self.state.lock().unwrap().filter.clone()
    }

    /// Listings for the active company, or `None` when a selection change
    /// superseded this call while its fetch was in flight.
    pub async fn listings(&self) -> Result<Option<Vec<JobListing>>> {
        let (company, stamp) = self.snapshot();
        self.listings_snapshot(company, stamp).await
    }

    /// The active company's listings with the filter applied.
    pub async fn filtered(&self) -> Result<Option<Vec<JobListing>>> {
        let Some(listings) = self.listings().await? else {
            return Ok(None);
        };
        let filter = self.filter();
        Ok(Some(filter::filter_listings(&listings, &filter)))
    }

    /// Prefetch several companies at once. Failures are logged per
    /// company and do not abort the rest.
    pub async fn warm(&self, companies: &[Company]) {
        let fetches = companies
            .iter()
            .map(|&company| async move { (company, self.cache.get(company).await) });
        for (company, result) in join_all(fetches).await {
            if let Err(err) = result {
                warn!("prefetch for {company} failed: {err}");
            }
        }
    }

    fn snapshot(&self) -> (Company, u64) {
        let state = self.state.lock().unwrap();
        (state.active, self.generation.load(Ordering::SeqCst))
    }

    async fn listings_snapshot(
        &self,
        company: Company,
        stamp: u64,
    ) -> Result<Option<Vec<JobListing>>> {
        let listings = self.cache.get(company).await?;
        if self.generation.load(Ordering::SeqCst) != stamp {
            debug!("dropping superseded listings for {company}");
            return Ok(None);
        }
        Ok(Some(listings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::filter::ExperienceRange;
    use mockito::Matcher;

    fn body(subject: &str, min: u32, max: u32) -> String {
        format!(
            r#"[{{
                "id": 1,
                "companyCode": "X",
                "classificationName": "Tech",
                "employmentType": "정규",
                "subject": "{subject}",
                "subJobName": "Backend",
                "companyDisplayName": null,
                "detailLink": "https://example.com/1",
                "endDate": null,
                "experienceMin": {min},
                "experienceMax": {max}
            }}]"#
        )
    }

    fn listing_mock(
        server: &mut mockito::Server,
        company: Company,
        body: String,
    ) -> mockito::Mock {
        server
            .mock("GET", "/api/list")
            .match_query(Matcher::UrlEncoded(
                "company".into(),
                company.code().into(),
            ))
            .with_status(200)
            .with_body(body)
            .expect(1)
    }

    #[tokio::test]
    async fn test_listings_follow_the_selection() {
        let mut server = mockito::Server::new_async().await;
        let naver = listing_mock(&mut server, Company::Naver, body("네이버 공고", 2, 5))
            .create_async()
            .await;
        let kakao = listing_mock(&mut server, Company::Kakao, body("카카오 공고", 1, 3))
            .create_async()
            .await;

        let board = JobBoard::new(ApiConfig::new(server.url()));
        assert_eq!(board.active(), Company::Naver);

        let listings = board.listings().await.unwrap().unwrap();
        assert_eq!(listings[0].subject, "네이버 공고");

        board.select(Company::Kakao);
        let listings = board.listings().await.unwrap().unwrap();
        assert_eq!(listings[0].subject, "카카오 공고");

        naver.assert_async().await;
        kakao.assert_async().await;
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_dropped_but_still_cached() {
        let mut server = mockito::Server::new_async().await;
        let naver = listing_mock(&mut server, Company::Naver, body("네이버 공고", 2, 5))
            .create_async()
            .await;

        let board = JobBoard::new(ApiConfig::new(server.url()));
        let stamp = board.select(Company::Naver);
        // a newer selection lands while the Naver fetch is in flight
        board.select(Company::Kakao);

        let stale = board
            .listings_snapshot(Company::Naver, stamp)
            .await
            .unwrap();
        assert_eq!(stale, None);

        // the dropped result still populated the Naver entry
        board.select(Company::Naver);
        let listings = board.listings().await.unwrap().unwrap();
        assert_eq!(listings[0].subject, "네이버 공고");
        naver.assert_async().await;
    }

    #[tokio::test]
    async fn test_filtered_applies_the_active_spec() {
        let mut server = mockito::Server::new_async().await;
        listing_mock(&mut server, Company::Naver, body("백엔드 서버 개발자", 3, 6))
            .create_async()
            .await;

        let board = JobBoard::new(ApiConfig::new(server.url()));
        board
            .set_filter(FilterSpec {
                search_query: "서버".to_string(),
                experience_range: Some(ExperienceRange::new(2, 5).unwrap()),
                ..FilterSpec::default()
            })
            .unwrap();
        assert_eq!(board.filtered().await.unwrap().unwrap().len(), 1);

        board
            .set_filter(FilterSpec {
                search_query: "프론트".to_string(),
                ..FilterSpec::default()
            })
            .unwrap();
        assert_eq!(board.filtered().await.unwrap().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_filter_is_rejected_and_keeps_the_old_one() {
        let server = mockito::Server::new_async().await;
        let board = JobBoard::new(ApiConfig::new(server.url()));

        board
            .set_filter(FilterSpec {
                search_query: "서버".to_string(),
                ..FilterSpec::default()
            })
            .unwrap();

        let bad = FilterSpec {
            experience_range: Some(ExperienceRange { start: 9, end: 1 }),
            ..FilterSpec::default()
        };
        assert!(board.set_filter(bad).is_err());
        assert_eq!(board.filter().search_query, "서버");
    }

    #[tokio::test]
    async fn test_warm_prefetches_concurrently_and_tolerates_failures() {
        let mut server = mockito::Server::new_async().await;
        let naver = listing_mock(&mut server, Company::Naver, body("네이버 공고", 2, 5))
            .create_async()
            .await;
        let toss = server
            .mock("GET", "/api/list")
            .match_query(Matcher::UrlEncoded("company".into(), "TOSS".into()))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let board = JobBoard::new(ApiConfig::new(server.url()));
        board.warm(&[Company::Naver, Company::Toss]).await;

        naver.assert_async().await;
        toss.assert_async().await;

        // warmed entry serves without another request
        let listings = board.listings().await.unwrap().unwrap();
        assert_eq!(listings[0].subject, "네이버 공고");
        naver.assert_async().await;
    }
}
