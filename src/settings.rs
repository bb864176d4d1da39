//! User subscription settings.
//!
//! The read and write shapes are deliberately different, matching the
//! server: reads nest identity under `userInfo` and carry a single
//! `careerYear`, writes flatten the email to the top level and send
//! `selectedCareerYears`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::AuthenticatedClient;
use crate::company::Company;
use crate::error::Result;

const SETTINGS_PATH: &str = "/api/user/settings";

/// Identity block of the settings document. The server attaches more
/// fields here; only the email is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsUserInfo {
    pub email: String,
}

/// Settings document as read from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_info: SettingsUserInfo,
    #[serde(default)]
    pub subscribed_services: Vec<String>,
    #[serde(default)]
    pub selected_job_roles: Vec<String>,
    #[serde(default)]
    pub career_year: Option<u32>,
}

impl UserSettings {
    /// Subscribed companies, skipping keys this build does not know.
    pub fn subscribed_companies(&self) -> Vec<Company> {
        self.subscribed_services
            .iter()
            .filter_map(|key| match key.parse() {
                Ok(company) => Some(company),
                Err(_) => {
                    warn!("unknown subscription key in settings: {key}");
                    None
                }
            })
            .collect()
    }
}

/// Save payload. Subscriptions serialize as lowercase keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub email: String,
    pub subscribed_services: Vec<Company>,
    pub selected_job_roles: Vec<String>,
    pub selected_career_years: Vec<u32>,
}

/// Server acknowledgement for a save.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveOutcome {
    pub success: bool,
}

/// Read the signed-in user's settings.
pub async fn fetch_settings(client: &AuthenticatedClient) -> Result<UserSettings> {
    client.get(SETTINGS_PATH).await
}

/// Replace the signed-in user's settings.
pub async fn save_settings(
    client: &AuthenticatedClient,
    update: &SettingsUpdate,
) -> Result<SaveOutcome> {
    client.post(SETTINGS_PATH, update).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::session::{SessionHandle, SessionStore, UserProfile};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    fn client_for(server: &mockito::Server, dir: &tempfile::TempDir) -> AuthenticatedClient {
        let session = SessionHandle::new(SessionStore::at(dir.path().join("session.json")));
        session
            .login(
                "jwt-1",
                "refresh-1",
                UserProfile {
                    name: "다영".to_string(),
                    user_id: 5,
                },
            )
            .unwrap();
        AuthenticatedClient::new(ApiConfig::new(server.url()), session)
    }

    #[tokio::test]
    async fn test_fetch_parses_the_read_shape() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let mock = server
            .mock("GET", "/api/user/settings")
            .match_header("authorization", "Bearer jwt-1")
            .with_status(200)
            .with_body(
                r#"{
                    "userInfo": {"email": "dayoung@example.com", "provider": "kakao"},
                    "subscribedServices": ["naver", "toss", "unicorn"],
                    "selectedJobRoles": ["Backend", "ML"],
                    "careerYear": 4
                }"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, &dir);
        let settings = fetch_settings(&client).await.unwrap();

        mock.assert_async().await;
        assert_eq!(settings.user_info.email, "dayoung@example.com");
        assert_eq!(settings.selected_job_roles, vec!["Backend", "ML"]);
        assert_eq!(settings.career_year, Some(4));
        // the unknown "unicorn" key is skipped, not fatal
        assert_eq!(
            settings.subscribed_companies(),
            vec![Company::Naver, Company::Toss]
        );
    }

    #[tokio::test]
    async fn test_fetch_tolerates_missing_lists() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        server
            .mock("GET", "/api/user/settings")
            .with_status(200)
            .with_body(r#"{"userInfo": {"email": "a@b.c"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, &dir);
        let settings = fetch_settings(&client).await.unwrap();
        assert!(settings.subscribed_services.is_empty());
        assert!(settings.selected_job_roles.is_empty());
        assert_eq!(settings.career_year, None);
    }

    #[tokio::test]
    async fn test_save_sends_the_write_shape() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let mock = server
            .mock("POST", "/api/user/settings")
            .match_header("authorization", "Bearer jwt-1")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "email": "dayoung@example.com",
                "subscribedServices": ["kakao", "karrot"],
                "selectedJobRoles": ["Backend"],
                "selectedCareerYears": [3, 4],
            })))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, &dir);
        let outcome = save_settings(
            &client,
            &SettingsUpdate {
                email: "dayoung@example.com".to_string(),
                subscribed_services: vec![Company::Kakao, Company::Karrot],
                selected_job_roles: vec!["Backend".to_string()],
                selected_career_years: vec![3, 4],
            },
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert!(outcome.success);
    }
}
