//! Scripted token lifecycle over an in-memory store and a simulated clock.
//!
//! Each step prints one JSON object so the output can be followed or piped
//! into `jq`.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
use tokenward_auth::{AuthError, AuthResult, ManualClock, TokenService};

use crate::config::AppConfig;
use crate::output::print_json;

fn step<T: serde::Serialize>(name: &str, result: &AuthResult<T>) -> Result<Value> {
    Ok(match result {
        Ok(value) => json!({ "step": name, "ok": serde_json::to_value(value)? }),
        Err(e) => error_step(name, e),
    })
}

fn error_step(name: &str, e: &AuthError) -> Value {
    json!({ "step": name, "error": e.to_string(), "code": e.error_code() })
}

fn to_time(duration: std::time::Duration) -> Result<Duration> {
    Duration::try_from(duration).context("duration out of range")
}

pub async fn run(cfg: &AppConfig, user: &str) -> Result<()> {
    let start = OffsetDateTime::now_utc();
    let clock = Arc::new(ManualClock::new(start));
    let service = TokenService::new(
        tokenward_db_memory::create_token_store(),
        clock.clone(),
        cfg.tokens.clone(),
    )
    .context("invalid token configuration")?;

    let access_validity = to_time(cfg.tokens.access_token_validity)?;
    let rotation_point = to_time(cfg.tokens.refresh_token_validity)?
        - to_time(cfg.tokens.refresh_token_refresh_threshold)?
        + Duration::seconds(1);

    let issued = service.request_tokens(user).await?;
    print_json(&step("issue", &Ok::<_, AuthError>(&issued))?)?;

    let unchanged = service
        .refresh_access_token(user, &issued.access_token, &issued.refresh_token)
        .await;
    print_json(&step("refresh-immediately", &unchanged)?)?;

    clock.advance(access_validity + Duration::seconds(1));
    let renewed = service
        .refresh_access_token(user, &issued.access_token, &issued.refresh_token)
        .await?;
    print_json(&step("refresh-after-expiry", &Ok::<_, AuthError>(&renewed))?)?;

    // A second client still holding the first access token retries.
    clock.advance(Duration::seconds(1));
    let retry = service
        .refresh_access_token(user, &issued.access_token, &issued.refresh_token)
        .await;
    print_json(&step("retry-within-grace", &retry)?)?;

    clock.set(start + rotation_point);
    let rotated = service
        .refresh_access_token(user, &renewed.access_token, &renewed.refresh_token)
        .await?;
    print_json(&step("refresh-near-refresh-expiry", &Ok::<_, AuthError>(&rotated))?)?;

    let replay = service
        .refresh_refresh_token(user, &issued.refresh_token)
        .await;
    print_json(&step("replay-rotated-refresh-token", &replay)?)?;

    let sessions = service.active_sessions(user, 10).await.map(|s| s.len());
    print_json(&step("active-sessions", &sessions)?)?;

    Ok(())
}
