//! The refresh-token exchange.
//!
//! One round trip against `POST /api/auth/refresh`: the refresh token
//! rides in the bearer header and again in the body next to the user
//! identity, and a fresh pair comes back. Any failure here is terminal
//! for the session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::session::{SessionHandle, UserProfile};

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
    user: Option<&'a UserProfile>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

/// Exchanges the stored refresh token for a new pair.
pub struct TokenRefresher {
    config: ApiConfig,
    client: reqwest::Client,
    session: Arc<SessionHandle>,
}

impl TokenRefresher {
    pub fn new(config: ApiConfig, session: Arc<SessionHandle>) -> Self {
        let client = config.http_client();
        TokenRefresher {
            config,
            client,
            session,
        }
    }

    /// Perform one refresh round trip, persisting the rotated pair on
    /// success. A missing refresh token, a rejection, or an unusable
    /// response all destroy the session. Callers serialize refreshes
    /// through the session's gate; this method does not take it itself.
    pub async fn refresh(&self) -> Result<()> {
        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(self.fail("no refresh token stored".to_string()));
        };
        let user = self.session.user();

        let response = self
            .client
            .post(self.config.endpoint("/api/auth/refresh"))
            .header("Authorization", format!("Bearer {refresh_token}"))
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
                user: user.as_ref(),
            })
            .send()
            .await;

        let pair = match response {
            Ok(res) if res.status().is_success() => {
                let body = res.text().await.map_err(|err| self.fail(err.to_string()))?;
                serde_json::from_str::<RefreshResponse>(&body)
                    .map_err(|err| self.fail(err.to_string()))?
            }
            Ok(res) => return Err(self.fail(format!("HTTP {}", res.status().as_u16()))),
            Err(err) => return Err(self.fail(err.to_string())),
        };

        self.session
            .install_tokens(&pair.access_token, &pair.refresh_token)?;
        debug!("token pair rotated");
        Ok(())
    }

    /// Record the failure, tear the session down, and produce the error.
    fn fail(&self, reason: String) -> ApiError {
        warn!("token refresh failed: {reason}");
        self.session.logout();
        ApiError::RefreshFailed(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use mockito::Matcher;
    use serde_json::json;

    fn handle_in(dir: &tempfile::TempDir) -> Arc<SessionHandle> {
        SessionHandle::new(SessionStore::at(dir.path().join("session.json")))
    }

    fn user() -> UserProfile {
        UserProfile {
            name: "민지".to_string(),
            user_id: 7,
        }
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_persists_the_pair() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let session = handle_in(&dir);
        session.login("jwt-old", "refresh-old", user()).unwrap();

        let mock = server
            .mock("POST", "/api/auth/refresh")
            .match_header("authorization", "Bearer refresh-old")
            .match_body(Matcher::Json(json!({
                "refreshToken": "refresh-old",
                "user": { "name": "민지", "userId": 7 },
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"accessToken":"jwt-new","refreshToken":"refresh-new"}"#)
            .expect(1)
            .create_async()
            .await;

        let refresher = TokenRefresher::new(ApiConfig::new(server.url()), session.clone());
        refresher.refresh().await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.access_token().as_deref(), Some("jwt-new"));
        assert_eq!(session.refresh_token().as_deref(), Some("refresh-new"));
        assert_eq!(session.user(), Some(user()));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_without_a_request() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let session = handle_in(&dir);

        let refresher = TokenRefresher::new(ApiConfig::new(server.url()), session.clone());
        let err = refresher.refresh().await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(_)));
        assert!(!session.authenticated());
    }

    #[tokio::test]
    async fn test_rejected_refresh_destroys_the_session() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let session = handle_in(&dir);
        session.login("jwt-old", "refresh-old", user()).unwrap();

        let mock = server
            .mock("POST", "/api/auth/refresh")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let refresher = TokenRefresher::new(ApiConfig::new(server.url()), session.clone());
        let err = refresher.refresh().await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::RefreshFailed(_)));
        assert!(!session.authenticated());
        assert_eq!(session.access_token(), None);
        assert_eq!(session.refresh_token(), None);
    }

    #[tokio::test]
    async fn test_unusable_refresh_body_destroys_the_session() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let session = handle_in(&dir);
        session.login("jwt-old", "refresh-old", user()).unwrap();

        server
            .mock("POST", "/api/auth/refresh")
            .with_status(200)
            .with_body(r#"{"unexpected":"shape"}"#)
            .create_async()
            .await;

        let refresher = TokenRefresher::new(ApiConfig::new(server.url()), session.clone());
        let err = refresher.refresh().await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(_)));
        assert!(!session.authenticated());
    }
}
