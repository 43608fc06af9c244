use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

/// Revocation list keyed by `jti`.
///
/// Each entry carries the revoked token's own expiry; once that moment has
/// passed the signature check rejects the token anyway, so the entry is dead
/// weight and is dropped. Expired entries are evicted lazily on lookup and
/// opportunistically on insert, which keeps the list bounded by the number of
/// live revoked tokens without a background sweeper.
#[derive(Clone, Default)]
pub struct RevocationList {
    inner: Arc<DashMap<String, u64>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Record a jti as revoked until `exp` (seconds since the epoch).
    pub fn revoke(&self, jti: impl Into<String>, exp: u64) {
        self.prune();
        let jti = jti.into();
        tracing::debug!(%jti, exp, "token revoked");
        self.inner.insert(jti, exp);
    }

    /// Whether the jti is currently revoked. An entry whose expiry has passed
    /// counts as absent and is removed.
    pub fn is_revoked(&self, jti: &str) -> bool {
        if let Some(entry) = self.inner.get(jti) {
            if *entry.value() > now_secs() {
                return true;
            }
            drop(entry);
            self.inner.remove(jti);
        }
        false
    }

    /// Drop every entry whose expiry has passed.
    pub fn prune(&self) {
        let now = now_secs();
        self.inner.retain(|_, exp| *exp > now);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
