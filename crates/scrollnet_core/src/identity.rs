//! crates/scrollnet_core/src/identity.rs
//!
//! Resolves the acting identity for every interaction in a session.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::Identity;
use crate::ports::{AuthProvider, DegradedEvent, TelemetrySink};

/// Hands out the authenticated user when there is one, otherwise a single
/// anonymous id that stays fixed for the life of the resolver (one session).
pub struct SessionIdentityResolver {
    auth: Arc<dyn AuthProvider>,
    telemetry: Arc<dyn TelemetrySink>,
    anonymous: OnceCell<Uuid>,
}

impl SessionIdentityResolver {
    pub fn new(auth: Arc<dyn AuthProvider>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            auth,
            telemetry,
            anonymous: OnceCell::new(),
        }
    }

    /// Restores a previously issued anonymous id instead of minting one.
    pub fn with_anonymous_id(mut self, id: Uuid) -> Self {
        self.anonymous = OnceCell::new_with(Some(id));
        self
    }

    pub async fn resolve(&self) -> Identity {
        match self.auth.current_user().await {
            Ok(Some(user)) if !user.id.trim().is_empty() => {
                return Identity::Authenticated { id: user.id };
            }
            Ok(Some(_)) => self.telemetry.record(DegradedEvent::IdentityResolutionFailure {
                reason: "auth provider returned a blank user id".to_string(),
            }),
            Ok(None) => {}
            Err(e) => self.telemetry.record(DegradedEvent::IdentityResolutionFailure {
                reason: e.to_string(),
            }),
        }
        Identity::Anonymous {
            id: self.anonymous_id().await,
        }
    }

    /// The session's anonymous id. Concurrent first calls share one generation.
    pub async fn anonymous_id(&self) -> Uuid {
        *self
            .anonymous
            .get_or_init(|| async {
                let id = Uuid::new_v4();
                debug!(anonymous_id = %id, "generated anonymous session identity");
                id
            })
            .await
    }

    /// Discards the cached anonymous id and mints a fresh one.
    ///
    /// Duplicate suppression restarts for this session from here on.
    pub fn regenerate(&mut self) -> Uuid {
        let previous = self.anonymous.take();
        let id = Uuid::new_v4();
        self.anonymous = OnceCell::new_with(Some(id));
        info!(previous = ?previous, anonymous_id = %id, "regenerated anonymous session identity");
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{AuthUser, PortError, PortResult};
    use crate::telemetry::RecordingTelemetry;
    use async_trait::async_trait;

    struct FixedAuth(Option<AuthUser>);

    #[async_trait]
    impl AuthProvider for FixedAuth {
        async fn current_user(&self) -> PortResult<Option<AuthUser>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenAuth;

    #[async_trait]
    impl AuthProvider for BrokenAuth {
        async fn current_user(&self) -> PortResult<Option<AuthUser>> {
            Err(PortError::Unavailable("auth down".to_string()))
        }
    }

    fn resolver(
        auth: impl AuthProvider + 'static,
    ) -> (SessionIdentityResolver, RecordingTelemetry) {
        let telemetry = RecordingTelemetry::new();
        (
            SessionIdentityResolver::new(Arc::new(auth), Arc::new(telemetry.clone())),
            telemetry,
        )
    }

    #[tokio::test]
    async fn authenticated_user_wins() {
        let (resolver, _) = resolver(FixedAuth(Some(AuthUser {
            id: "user-42".to_string(),
            token: "t".to_string(),
        })));
        assert_eq!(
            resolver.resolve().await,
            Identity::Authenticated {
                id: "user-42".to_string()
            }
        );
    }

    #[tokio::test]
    async fn anonymous_identity_is_stable_within_a_session() {
        let (resolver, _) = resolver(FixedAuth(None));
        let first = resolver.resolve().await;
        let second = resolver.resolve().await;
        assert!(first.is_anonymous());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn separate_sessions_get_separate_anonymous_ids() {
        let (a, _) = resolver(FixedAuth(None));
        let (b, _) = resolver(FixedAuth(None));
        assert_ne!(a.resolve().await, b.resolve().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_share_one_id() {
        let (resolver, _) = resolver(FixedAuth(None));
        let resolver = Arc::new(resolver);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve().await })
            })
            .collect();

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn auth_failure_falls_back_to_anonymous_and_is_reported() {
        let (resolver, telemetry) = resolver(BrokenAuth);
        assert!(resolver.resolve().await.is_anonymous());
        assert!(matches!(
            telemetry.events().as_slice(),
            [DegradedEvent::IdentityResolutionFailure { .. }]
        ));
    }

    #[tokio::test]
    async fn blank_user_id_is_treated_as_a_resolution_failure() {
        let (resolver, telemetry) = resolver(FixedAuth(Some(AuthUser {
            id: "  ".to_string(),
            token: String::new(),
        })));
        assert!(resolver.resolve().await.is_anonymous());
        assert_eq!(telemetry.events().len(), 1);
    }

    #[tokio::test]
    async fn seeded_id_is_reused_and_regenerate_replaces_it() {
        let seed = Uuid::new_v4();
        let (resolver, _) = resolver(FixedAuth(None));
        let mut resolver = resolver.with_anonymous_id(seed);
        assert_eq!(resolver.resolve().await, Identity::Anonymous { id: seed });

        let fresh = resolver.regenerate();
        assert_ne!(fresh, seed);
        assert_eq!(resolver.resolve().await, Identity::Anonymous { id: fresh });
    }
}
