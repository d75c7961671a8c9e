use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokenward_auth::{
    AccessToken, AuthError, AuthResult, NewAccessToken, NewRefreshToken, RefreshToken, TokenStore,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A record plus the insertion sequence that breaks `created_at` ties.
#[derive(Debug, Clone)]
struct Entry<T> {
    seq: u64,
    record: T,
}

#[derive(Debug, Default)]
struct Tables {
    /// Access tokens keyed by token string.
    access: HashMap<String, Entry<AccessToken>>,
    /// Refresh tokens keyed by token string.
    refresh: HashMap<String, Entry<RefreshToken>>,
    /// Refresh token id -> token string.
    refresh_ids: HashMap<Uuid, String>,
}

/// Sorts newest first and keeps at most `limit` records.
fn newest_first<T: Clone>(
    mut entries: Vec<&Entry<T>>,
    created_at: impl Fn(&T) -> OffsetDateTime,
    limit: usize,
) -> Vec<T> {
    entries.sort_by(|a, b| {
        (created_at(&b.record), b.seq).cmp(&(created_at(&a.record), a.seq))
    });
    entries
        .into_iter()
        .take(limit)
        .map(|e| e.record.clone())
        .collect()
}

/// In-memory token store.
///
/// Both tables sit behind a single `RwLock`, so every write (including a
/// multi-user bulk revocation) is atomic with respect to readers.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tables: Arc<RwLock<Tables>>,
    sequence: AtomicU64,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of stored access tokens.
    pub async fn access_token_count(&self) -> usize {
        self.tables.read().await.access.len()
    }

    /// Number of stored refresh tokens.
    pub async fn refresh_token_count(&self) -> usize {
        self.tables.read().await.refresh.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn find_access_token(&self, token: &str) -> AuthResult<Option<AccessToken>> {
        let tables = self.tables.read().await;
        Ok(tables.access.get(token).map(|e| e.record.clone()))
    }

    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let tables = self.tables.read().await;
        Ok(tables.refresh.get(token).map(|e| e.record.clone()))
    }

    async fn find_refresh_token_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshToken>> {
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_ids
            .get(&id)
            .and_then(|token| tables.refresh.get(token))
            .map(|e| e.record.clone()))
    }

    async fn create_access_token(&self, token: &NewAccessToken) -> AuthResult<AccessToken> {
        let mut tables = self.tables.write().await;
        if tables.access.contains_key(&token.token) {
            return Err(AuthError::storage("Conflict: access token already exists"));
        }
        if !tables.refresh_ids.contains_key(&token.refresh_token) {
            return Err(AuthError::storage(format!(
                "Invalid input: unknown refresh token {}",
                token.refresh_token
            )));
        }

        let record = token.clone().into_token();
        let entry = Entry {
            seq: self.next_seq(),
            record: record.clone(),
        };
        tables.access.insert(record.token.clone(), entry);
        Ok(record)
    }

    async fn create_refresh_token(&self, token: &NewRefreshToken) -> AuthResult<RefreshToken> {
        let mut tables = self.tables.write().await;
        if tables.refresh.contains_key(&token.token) || tables.refresh_ids.contains_key(&token.id)
        {
            return Err(AuthError::storage("Conflict: refresh token already exists"));
        }

        let record = token.clone().into_token();
        let entry = Entry {
            seq: self.next_seq(),
            record: record.clone(),
        };
        tables.refresh_ids.insert(record.id, record.token.clone());
        tables.refresh.insert(record.token.clone(), entry);
        Ok(record)
    }

    async fn revoke_refresh_token(&self, token: &str) -> AuthResult<RefreshToken> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .refresh
            .get_mut(token)
            .ok_or_else(|| AuthError::storage("Not found: refresh token"))?;
        entry.record.revoked = true;
        Ok(entry.record.clone())
    }

    async fn revoke_refresh_tokens_for_users(&self, user_ids: &[String]) -> AuthResult<u64> {
        let mut tables = self.tables.write().await;
        let mut revoked = 0;
        for entry in tables.refresh.values_mut() {
            if !entry.record.revoked && user_ids.contains(&entry.record.user_id) {
                entry.record.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn latest_access_tokens(
        &self,
        refresh_token_id: Uuid,
        limit: usize,
    ) -> AuthResult<Vec<AccessToken>> {
        let tables = self.tables.read().await;
        let chain = tables
            .access
            .values()
            .filter(|e| e.record.refresh_token == refresh_token_id)
            .collect();
        Ok(newest_first(chain, |t| t.created_at, limit))
    }

    async fn latest_refresh_tokens(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AuthResult<Vec<RefreshToken>> {
        let tables = self.tables.read().await;
        let owned = tables
            .refresh
            .values()
            .filter(|e| e.record.user_id == user_id)
            .collect();
        Ok(newest_first(owned, |t| t.created_at, limit))
    }
}
