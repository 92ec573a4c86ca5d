// Session gate - Cached identity checks for admin routes
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// External identity provider that owns authentication.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the token is not a live session.
    async fn verify(&self, token: &str) -> anyhow::Result<Option<SessionUser>>;
}

struct CachedSession {
    user: SessionUser,
    expires_at: Instant,
}

/// Read-through cache in front of the identity provider. Only confirmed
/// sessions are cached; the LRU capacity bounds memory.
#[derive(Clone)]
pub struct SessionGate {
    provider: Arc<dyn IdentityProvider>,
    cache: Arc<Mutex<LruCache<String, CachedSession>>>,
    ttl: Duration,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn IdentityProvider>, ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            provider,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }

    pub async fn authenticate(&self, token: &str) -> anyhow::Result<Option<SessionUser>> {
        if let Some(user) = self.cached(token) {
            return Ok(Some(user));
        }

        let verified = self.provider.verify(token).await?;
        match &verified {
            Some(user) => {
                tracing::debug!("Session verified for user {}", user.id);
                if let Ok(mut cache) = self.cache.lock() {
                    cache.put(
                        token.to_string(),
                        CachedSession {
                            user: user.clone(),
                            expires_at: Instant::now() + self.ttl,
                        },
                    );
                }
            }
            None => tracing::debug!("Session rejected by identity provider"),
        }
        Ok(verified)
    }

    fn cached(&self, token: &str) -> Option<SessionUser> {
        let mut cache = self.cache.lock().ok()?;
        let expired = match cache.get(token) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.user.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            cache.pop(token);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn verify(&self, token: &str) -> anyhow::Result<Option<SessionUser>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if token.starts_with("ok-") {
                Ok(Some(SessionUser {
                    id: token.to_string(),
                    email: None,
                }))
            } else {
                Ok(None)
            }
        }
    }

    fn gate(provider: Arc<CountingProvider>, capacity: usize) -> SessionGate {
        SessionGate::new(
            provider,
            Duration::from_secs(60),
            NonZeroUsize::new(capacity).unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_until_ttl() {
        let provider = Arc::new(CountingProvider::default());
        let gate = gate(provider.clone(), 8);

        assert!(gate.authenticate("ok-a").await.unwrap().is_some());
        assert!(gate.authenticate("ok-a").await.unwrap().is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(gate.authenticate("ok-a").await.unwrap().is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_not_cached() {
        let provider = Arc::new(CountingProvider::default());
        let gate = gate(provider.clone(), 8);

        assert!(gate.authenticate("bad").await.unwrap().is_none());
        assert!(gate.authenticate("bad").await.unwrap().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest() {
        let provider = Arc::new(CountingProvider::default());
        let gate = gate(provider.clone(), 1);

        gate.authenticate("ok-a").await.unwrap();
        gate.authenticate("ok-b").await.unwrap();
        gate.authenticate("ok-a").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}
