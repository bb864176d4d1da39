//! Provider token exchange at login.
//!
//! The browser half of the Kakao OAuth dance happens outside this crate;
//! callers arrive here holding a provider access token and leave with a
//! stored session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::session::{SessionHandle, UserProfile};

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "accessToken")]
    access_token: &'a str,
}

/// Note the asymmetry: the access token comes back as `token` here,
/// not `accessToken` as in the refresh exchange.
#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    nickname: String,
    #[serde(rename = "userId")]
    user_id: i64,
}

/// Exchange a Kakao access token for an app session and persist it.
pub async fn kakao_login(
    config: &ApiConfig,
    session: &Arc<SessionHandle>,
    provider_token: &str,
) -> Result<UserProfile> {
    let client = config.http_client();
    let response = client
        .post(config.endpoint("/api/kakaoLogin"))
        .json(&LoginRequest {
            access_token: provider_token,
        })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::from_status(status));
    }
    let body = response.text().await?;
    let login: LoginResponse = serde_json::from_str(&body)?;

    let user = UserProfile {
        name: login.nickname,
        user_id: login.user_id,
    };
    session.login(&login.token, &login.refresh_token, user.clone())?;
    info!("logged in as {}", user.name);
    Ok(user)
}
