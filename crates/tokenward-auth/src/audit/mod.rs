//! Security event audit logging.
//!
//! Every rejected token is reported here with a stable anomaly tag so that
//! log pipelines can alert on replay and theft patterns:
//!
//! - `fabricated` - token string not known to the store
//! - `cross-user` - token presented on behalf of a different user
//! - `expired` - refresh token past its expiry
//! - `revoked-reuse` - revoked token presented again
//! - `stale-reuse` - superseded access token used outside the grace window
//! - `binding-mismatch` - access token belongs to a different refresh token
//! - `revoked-chain` - access token whose refresh token was revoked
//!
//! Events are emitted on the `tokenward::audit` tracing target. Token
//! strings are never logged in full.

use std::fmt;

use tracing::{debug, info, warn};

use crate::types::TokenType;

/// Tracing target used for all audit events.
pub const AUDIT_TARGET: &str = "tokenward::audit";

/// Classes of anomalous token use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenAnomaly {
    /// The presented token does not exist.
    Fabricated,
    /// The token is owned by a different user than the caller claims.
    CrossUser,
    /// The refresh token is past its expiry.
    Expired,
    /// A revoked token was presented.
    RevokedReuse,
    /// A superseded access token was presented outside the grace window.
    StaleReuse,
    /// The access token was not spawned by the presented refresh token.
    BindingMismatch,
    /// The access token's refresh token has been revoked or is gone.
    RevokedChain,
}

impl TokenAnomaly {
    /// Stable diagnostic tag for this anomaly.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fabricated => "fabricated",
            Self::CrossUser => "cross-user",
            Self::Expired => "expired",
            Self::RevokedReuse => "revoked-reuse",
            Self::StaleReuse => "stale-reuse",
            Self::BindingMismatch => "binding-mismatch",
            Self::RevokedChain => "revoked-chain",
        }
    }

    /// Whether this anomaly implies an attacker holding tokens they should
    /// not have. Routine conditions (expiry, logged-out chains) are not.
    #[must_use]
    pub fn is_attack(&self) -> bool {
        !matches!(self, Self::Expired | Self::RevokedChain)
    }
}

impl fmt::Display for TokenAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Records a rejected token.
///
/// `revoked` is the number of refresh tokens revoked in response, or `None`
/// when the revocation itself failed. The field is omitted in that case.
pub fn record_anomaly(
    anomaly: TokenAnomaly,
    token_type: TokenType,
    user_id: &str,
    token_prefix: Option<&str>,
    revoked: Option<u64>,
) {
    if anomaly.is_attack() {
        warn!(
            target: AUDIT_TARGET,
            anomaly = anomaly.tag(),
            token_type = %token_type,
            user_id,
            token_prefix = token_prefix.unwrap_or("-"),
            revoked,
            "Token rejected, revocation cascade applied"
        );
    } else {
        info!(
            target: AUDIT_TARGET,
            anomaly = anomaly.tag(),
            token_type = %token_type,
            user_id,
            token_prefix = token_prefix.unwrap_or("-"),
            revoked,
            "Token rejected"
        );
    }
}

/// Token lifecycle events that are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A new refresh/access pair was issued at login.
    Issued,
    /// A new access token was minted for an existing chain.
    AccessTokenRenewed,
    /// A refresh token was replaced because it neared expiry.
    RefreshTokenRotated,
    /// A superseded access token was accepted inside the grace window.
    GraceAccepted,
    /// A user ended one or all sessions.
    LoggedOut,
}

impl LifecycleEvent {
    /// Stable name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::AccessTokenRenewed => "access-renewed",
            Self::RefreshTokenRotated => "refresh-rotated",
            Self::GraceAccepted => "grace-accepted",
            Self::LoggedOut => "logged-out",
        }
    }
}

/// Records a lifecycle event.
pub fn record_event(event: LifecycleEvent, user_id: &str, token_prefix: &str) {
    debug!(
        target: AUDIT_TARGET,
        event = event.name(),
        user_id,
        token_prefix,
        "Token lifecycle event"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LogCapture;

    #[test]
    fn test_anomaly_tags() {
        assert_eq!(TokenAnomaly::Fabricated.tag(), "fabricated");
        assert_eq!(TokenAnomaly::CrossUser.tag(), "cross-user");
        assert_eq!(TokenAnomaly::Expired.tag(), "expired");
        assert_eq!(TokenAnomaly::RevokedReuse.tag(), "revoked-reuse");
        assert_eq!(TokenAnomaly::StaleReuse.tag(), "stale-reuse");
        assert_eq!(TokenAnomaly::BindingMismatch.tag(), "binding-mismatch");
        assert_eq!(TokenAnomaly::RevokedChain.to_string(), "revoked-chain");
    }

    #[test]
    fn test_attack_classification() {
        assert!(TokenAnomaly::Fabricated.is_attack());
        assert!(TokenAnomaly::CrossUser.is_attack());
        assert!(TokenAnomaly::RevokedReuse.is_attack());
        assert!(TokenAnomaly::StaleReuse.is_attack());
        assert!(TokenAnomaly::BindingMismatch.is_attack());
        assert!(!TokenAnomaly::Expired.is_attack());
        assert!(!TokenAnomaly::RevokedChain.is_attack());
    }

    #[test]
    fn test_attack_logged_as_warning() {
        let logs = LogCapture::new();
        let _guard = logs.install();

        record_anomaly(
            TokenAnomaly::StaleReuse,
            TokenType::Access,
            "user-1",
            Some("abcd1234"),
            Some(3),
        );

        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains(AUDIT_TARGET));
        assert!(output.contains("anomaly=\"stale-reuse\""));
        assert!(output.contains("token_prefix=\"abcd1234\""));
        assert!(output.contains("revoked=3"));
    }

    #[test]
    fn test_failed_revocation_omits_count() {
        let logs = LogCapture::new();
        let _guard = logs.install();

        record_anomaly(TokenAnomaly::Fabricated, TokenType::Refresh, "user-1", None, None);

        let output = logs.contents();
        assert!(output.contains("anomaly=\"fabricated\""));
        assert!(output.contains("token_prefix=\"-\""));
        assert!(!output.contains("revoked="));
    }

    #[test]
    fn test_routine_rejection_and_events_logged_below_warn() {
        let logs = LogCapture::new();
        let _guard = logs.install();

        record_anomaly(TokenAnomaly::Expired, TokenType::Refresh, "user-1", Some("abcd1234"), Some(1));
        record_event(LifecycleEvent::Issued, "user-1", "abcd1234");

        let output = logs.contents();
        assert!(!output.contains("WARN"));
        assert!(output.contains("INFO"));
        assert!(output.contains("anomaly=\"expired\""));
        assert!(output.contains("event=\"issued\""));
    }
}
