//! Grant table
//!
//! Implements the permission gate in front of the broker. Grants are keyed by the
//! exact token string the owner handed out.

use log::{info, warn};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::{BrokerError, BrokerResult};

/// What a grant allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantPermission {
    Read,
    ReadWrite,
}

impl GrantPermission {
    pub fn allows_write(&self) -> bool {
        matches!(self, GrantPermission::ReadWrite)
    }
}

impl fmt::Display for GrantPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantPermission::Read => f.write_str("ro"),
            GrantPermission::ReadWrite => f.write_str("rw"),
        }
    }
}

/// A live permission for one token.
#[derive(Debug, Clone)]
pub struct Grant {
    pub token: String,
    pub permission: GrantPermission,
    pub expires_at: Instant,
}

impl Grant {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// Shared table of grants.
#[derive(Debug, Default)]
pub struct GrantTable {
    grants: RwLock<HashMap<String, Grant>>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `permission` on `token` for `ttl`, replacing any earlier grant.
    ///
    /// Expired grants are dropped on the way in, so the table stays bounded by the
    /// number of live shares.
    pub async fn grant(&self, token: &str, permission: GrantPermission, ttl: Duration) -> Grant {
        let now = Instant::now();
        let grant = Grant {
            token: token.to_string(),
            permission,
            expires_at: now + ttl,
        };
        let mut grants = self.grants.write().await;
        grants.retain(|_, g| !g.is_expired(now));
        grants.insert(token.to_string(), grant.clone());
        drop(grants);
        info!("Granted {} on {} for {}s", permission, token, ttl.as_secs());
        grant
    }

    /// Returns whether a grant was removed.
    pub async fn revoke(&self, token: &str) -> bool {
        let removed = self.grants.write().await.remove(token).is_some();
        if removed {
            info!("Revoked grant on {}", token);
        }
        removed
    }

    /// Checks that a live grant covers `token`, with write permission if needed.
    pub async fn check(&self, token: &str, needs_write: bool) -> BrokerResult<()> {
        let grants = self.grants.read().await;
        let now = Instant::now();

        match grants.get(token) {
            Some(grant) if grant.is_expired(now) => {
                warn!("Expired grant used for {}", token);
                Err(BrokerError::AccessDenied(format!("Grant expired for {}", token)))
            }
            Some(grant) if needs_write && !grant.permission.allows_write() => {
                warn!("Write attempted with read-only grant on {}", token);
                Err(BrokerError::AccessDenied(format!(
                    "Grant for {} is read-only",
                    token
                )))
            }
            Some(_) => Ok(()),
            None => Err(BrokerError::AccessDenied(format!("No grant for {}", token))),
        }
    }

    /// Unexpired grants, soonest expiry first.
    pub async fn active(&self) -> Vec<Grant> {
        let now = Instant::now();
        let mut live: Vec<Grant> = self
            .grants
            .read()
            .await
            .values()
            .filter(|g| !g.is_expired(now))
            .cloned()
            .collect();
        live.sort_by_key(|g| g.expires_at);
        live
    }

    /// Drops expired grants and returns how many were removed.
    pub async fn prune(&self) -> usize {
        let now = Instant::now();
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|_, g| !g.is_expired(now));
        before - grants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "content://rax/files/a.txt";

    #[tokio::test]
    async fn test_ungranted_token_is_denied() {
        let table = GrantTable::new();
        assert!(matches!(
            table.check(TOKEN, false).await,
            Err(BrokerError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_read_grant_blocks_writes() {
        let table = GrantTable::new();
        table
            .grant(TOKEN, GrantPermission::Read, Duration::from_secs(60))
            .await;

        assert!(table.check(TOKEN, false).await.is_ok());
        assert!(matches!(
            table.check(TOKEN, true).await,
            Err(BrokerError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_grant_is_denied_and_pruned() {
        let table = GrantTable::new();
        table
            .grant(TOKEN, GrantPermission::ReadWrite, Duration::ZERO)
            .await;

        assert!(table.check(TOKEN, false).await.is_err());
        assert!(table.active().await.is_empty());
        assert_eq!(table.prune().await, 1);
        assert_eq!(table.prune().await, 0);
    }

    #[tokio::test]
    async fn test_new_grant_drops_expired_entries() {
        let table = GrantTable::new();
        table
            .grant("content://rax/files/old.txt", GrantPermission::Read, Duration::ZERO)
            .await;
        table
            .grant(TOKEN, GrantPermission::Read, Duration::from_secs(60))
            .await;

        assert_eq!(table.prune().await, 0);
        assert_eq!(table.active().await.len(), 1);
    }

    #[tokio::test]
    async fn test_revoke() {
        let table = GrantTable::new();
        table
            .grant(TOKEN, GrantPermission::ReadWrite, Duration::from_secs(60))
            .await;
        assert!(table.check(TOKEN, true).await.is_ok());

        assert!(table.revoke(TOKEN).await);
        assert!(!table.revoke(TOKEN).await);
        assert!(table.check(TOKEN, false).await.is_err());
    }

    #[tokio::test]
    async fn test_grant_is_exact_token_match() {
        let table = GrantTable::new();
        table
            .grant(TOKEN, GrantPermission::Read, Duration::from_secs(60))
            .await;
        assert!(table.check("content://rax/files/%61.txt", false).await.is_err());
    }
}
