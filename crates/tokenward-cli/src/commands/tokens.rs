use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokenward_auth::types::redact;
use tokenward_auth::{RefreshToken, TokenService};

use crate::cli::{AuthenticateArgs, RefreshArgs, RotateArgs, SessionsArgs, UserArgs};
use crate::output::print_json;

/// Session as listed to an operator; the refresh token itself is redacted.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub token_prefix: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl From<&RefreshToken> for SessionSummary {
    fn from(token: &RefreshToken) -> Self {
        Self {
            id: token.id.to_string(),
            token_prefix: redact(&token.token).to_string(),
            created_at: token.created_at,
            expires_at: token.expires_at,
        }
    }
}

pub async fn issue(service: &TokenService, args: &UserArgs) -> Result<()> {
    let pair = service.request_tokens(&args.user).await?;
    print_json(&pair)
}

pub async fn refresh(service: &TokenService, args: &RefreshArgs) -> Result<()> {
    let pair = service
        .refresh_access_token(&args.user, &args.access, &args.refresh)
        .await?;
    print_json(&pair)
}

pub async fn rotate(service: &TokenService, args: &RotateArgs) -> Result<()> {
    let token = service.refresh_refresh_token(&args.user, &args.refresh).await?;
    print_json(&json!({
        "refreshToken": token.token,
        "rotated": token.token != args.refresh,
        "expiresAt": token.expires_at.format(&Rfc3339)?,
    }))
}

pub async fn authenticate(service: &TokenService, args: &AuthenticateArgs) -> Result<()> {
    let token = service.authenticate(&args.user, &args.access).await?;
    print_json(&json!({
        "userId": token.user_id,
        "authenticated": true,
        "expiresAt": token.expires_at.format(&Rfc3339)?,
    }))
}

pub async fn logout(service: &TokenService, args: &RotateArgs) -> Result<()> {
    service.logout(&args.user, &args.refresh).await?;
    print_json(&json!({ "loggedOut": true }))
}

pub async fn logout_all(service: &TokenService, args: &UserArgs) -> Result<()> {
    let revoked = service.logout_all(&args.user).await?;
    print_json(&json!({ "revoked": revoked }))
}

pub async fn sessions(service: &TokenService, args: &SessionsArgs) -> Result<()> {
    let sessions = service.active_sessions(&args.user, args.limit).await?;
    let summaries: Vec<SessionSummary> = sessions.iter().map(SessionSummary::from).collect();
    print_json(&summaries)
}
