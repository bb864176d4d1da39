//! Bearer-authenticated request dispatch.
//!
//! Every call reads the current access token from the shared session,
//! sends, and on a 401 refreshes the pair under the process-wide gate
//! before sending the identical request exactly once more. The second
//! outcome is final: a second 401 tears the session down.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::refresh::TokenRefresher;
use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::session::SessionHandle;

/// The methods the client dispatches. The set is closed; anything else
/// is unrepresentable rather than a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl Method {
    /// Methods whose body is sent with the JSON content type.
    fn sets_json_header(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    /// DELETE may carry a body but never the JSON content-type header.
    fn accepts_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch | Method::Delete)
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

/// HTTP client for endpoints that require a bearer token.
pub struct AuthenticatedClient {
    config: ApiConfig,
    client: reqwest::Client,
    session: Arc<SessionHandle>,
    refresher: TokenRefresher,
}

impl AuthenticatedClient {
    pub fn new(config: ApiConfig, session: Arc<SessionHandle>) -> Self {
        let client = config.http_client();
        let refresher = TokenRefresher::new(config.clone(), session.clone());
        AuthenticatedClient {
            config,
            client,
            session,
            refresher,
        }
    }

    pub fn session(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::Get, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::Post, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::Put, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::Patch, path, Some(serde_json::to_value(body)?))
            .await
    }

    /// DELETE with an optional body, matching the upstream contract.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        self.request(Method::Delete, path, body).await
    }

    /// HEAD carries no decodable body; the status is the answer.
    pub async fn head(&self, path: &str) -> Result<reqwest::StatusCode> {
        let response = self.dispatch(Method::Head, path, None).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        Ok(status)
    }

    /// Issue a request and decode its JSON body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let response = self.dispatch(method, path, body).await?;
        Self::decode(response).await
    }

    /// The auth core: send with the current token, refresh on 401, send
    /// once more. Responses other than 401 pass through untouched.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let url = self.config.endpoint(path);

        let Some(token) = self.session.access_token() else {
            debug!("authenticated call to {url} with no access token");
            self.session.logout();
            return Err(ApiError::NotAuthenticated);
        };

        let first = self.send(method, &url, body.as_ref(), &token).await?;
        if first.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(first);
        }

        debug!("401 from {url}, refreshing token");
        self.ensure_refreshed(&token).await?;
        let Some(token) = self.session.access_token() else {
            return Err(ApiError::NotAuthenticated);
        };

        // Second and final attempt. Another 401 means the rotated pair is
        // no good either; the session ends here.
        let second = self.send(method, &url, body.as_ref(), &token).await?;
        if second.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("{url} rejected a freshly refreshed token");
            self.session.logout();
            return Err(ApiError::AuthExpired);
        }
        Ok(second)
    }

    /// Refresh under the gate, unless a concurrent caller already rotated
    /// the pair while this one was waiting.
    async fn ensure_refreshed(&self, stale_token: &str) -> Result<()> {
        let _gate = self.session.refresh_gate().await;
        if self.session.access_token().as_deref() != Some(stale_token) {
            debug!("token already rotated by a concurrent refresh");
            return Ok(());
        }
        self.refresher.refresh().await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        token: &str,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method.as_reqwest(), url)
            .header("Authorization", format!("Bearer {token}"));

        if let Some(body) = body {
            if method.sets_json_header() {
                request = request.json(body);
            } else if method.accepts_body() {
                request = request.body(serde_json::to_vec(body)?);
            }
        }

        Ok(request.send().await?)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
