//! Test doubles shared by the engine's unit tests.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::subscriber::DefaultGuard;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::TokenStore;
use crate::types::{AccessToken, NewAccessToken, NewRefreshToken, RefreshToken};

#[derive(Default)]
struct Tables {
    // Insertion order doubles as creation order.
    access: Vec<AccessToken>,
    refresh: Vec<RefreshToken>,
    bulk_revocations: Vec<Vec<String>>,
}

/// Mock token store for testing.
#[derive(Default)]
pub(crate) struct MockTokenStore {
    tables: RwLock<Tables>,
    failing: AtomicBool,
    failing_revocations: AtomicBool,
}

impl MockTokenStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a storage error.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes only the revocation calls fail; lookups keep working.
    pub(crate) fn set_failing_revocations(&self, failing: bool) {
        self.failing_revocations.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn access_token(&self, token: &str) -> Option<AccessToken> {
        let tables = self.tables.read().unwrap();
        tables.access.iter().find(|t| t.token == token).cloned()
    }

    pub(crate) fn refresh_token(&self, token: &str) -> Option<RefreshToken> {
        let tables = self.tables.read().unwrap();
        tables.refresh.iter().find(|t| t.token == token).cloned()
    }

    pub(crate) fn refresh_tokens_of(&self, user_id: &str) -> Vec<RefreshToken> {
        let tables = self.tables.read().unwrap();
        tables
            .refresh
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub(crate) fn access_tokens_of_chain(&self, refresh_token_id: Uuid) -> Vec<AccessToken> {
        let tables = self.tables.read().unwrap();
        tables
            .access
            .iter()
            .filter(|t| t.refresh_token == refresh_token_id)
            .cloned()
            .collect()
    }

    /// Every bulk revocation issued, in order, with the user ids it covered.
    pub(crate) fn bulk_revocations(&self) -> Vec<Vec<String>> {
        self.tables.read().unwrap().bulk_revocations.clone()
    }

    fn check(&self) -> AuthResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::storage("mock store unavailable"));
        }
        Ok(())
    }

    fn check_revocation(&self) -> AuthResult<()> {
        self.check()?;
        if self.failing_revocations.load(Ordering::SeqCst) {
            return Err(AuthError::storage("mock revocation failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MockTokenStore {
    async fn find_access_token(&self, token: &str) -> AuthResult<Option<AccessToken>> {
        self.check()?;
        Ok(self.access_token(token))
    }

    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        self.check()?;
        Ok(self.refresh_token(token))
    }

    async fn find_refresh_token_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshToken>> {
        self.check()?;
        let tables = self.tables.read().unwrap();
        Ok(tables.refresh.iter().find(|t| t.id == id).cloned())
    }

    async fn create_access_token(&self, token: &NewAccessToken) -> AuthResult<AccessToken> {
        self.check()?;
        let mut tables = self.tables.write().unwrap();
        if tables.access.iter().any(|t| t.token == token.token) {
            return Err(AuthError::storage("duplicate access token"));
        }
        let created = token.clone().into_token();
        tables.access.push(created.clone());
        Ok(created)
    }

    async fn create_refresh_token(&self, token: &NewRefreshToken) -> AuthResult<RefreshToken> {
        self.check()?;
        let mut tables = self.tables.write().unwrap();
        if tables.refresh.iter().any(|t| t.token == token.token) {
            return Err(AuthError::storage("duplicate refresh token"));
        }
        let created = token.clone().into_token();
        tables.refresh.push(created.clone());
        Ok(created)
    }

    async fn revoke_refresh_token(&self, token: &str) -> AuthResult<RefreshToken> {
        self.check_revocation()?;
        let mut tables = self.tables.write().unwrap();
        let record = tables
            .refresh
            .iter_mut()
            .find(|t| t.token == token)
            .ok_or_else(|| AuthError::storage("refresh token not found"))?;
        record.revoked = true;
        Ok(record.clone())
    }

    async fn revoke_refresh_tokens_for_users(&self, user_ids: &[String]) -> AuthResult<u64> {
        self.check_revocation()?;
        let mut tables = self.tables.write().unwrap();
        tables.bulk_revocations.push(user_ids.to_vec());
        let mut count = 0u64;
        for token in tables.refresh.iter_mut() {
            if user_ids.contains(&token.user_id) && !token.revoked {
                token.revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn latest_access_tokens(
        &self,
        refresh_token_id: Uuid,
        limit: usize,
    ) -> AuthResult<Vec<AccessToken>> {
        self.check()?;
        let tables = self.tables.read().unwrap();
        Ok(tables
            .access
            .iter()
            .rev()
            .filter(|t| t.refresh_token == refresh_token_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn latest_refresh_tokens(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AuthResult<Vec<RefreshToken>> {
        self.check()?;
        let tables = self.tables.read().unwrap();
        Ok(tables
            .refresh
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Collects formatted log output of the current thread.
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Routes every event on this thread into the buffer until the guard
    /// is dropped.
    pub(crate) fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Audit lines carrying `anomaly="<tag>"`.
    pub(crate) fn anomaly_count(&self, tag: &str) -> usize {
        let needle = format!("anomaly=\"{tag}\"");
        self.contents()
            .lines()
            .filter(|line| line.contains(&needle))
            .count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
