//! Authentication session: token persistence and the observable current user.
//!
//! A thin wrapper over the auth endpoints and durable storage. Tokens and the
//! signed-in user snapshot live under the `auth.*` key namespace, disjoint
//! from the cart's. Every session change republishes the current user on a
//! `watch` channel.

use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{instrument, warn};

use mercadito_core::{AuthResponse, LoginRequest, RegisterRequest, User};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::storage::{Storage, keys};

/// Token pair returned by the refresh endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

/// Body for the token refresh endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

/// Session service over the auth endpoints.
pub struct AuthSession {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    publisher: watch::Sender<Option<User>>,
}

impl AuthSession {
    /// Rehydrate the session from durable storage.
    ///
    /// A missing or corrupt persisted user snapshot reads as signed out.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        let user = storage.get(keys::CURRENT_USER).and_then(|raw| {
            serde_json::from_str::<User>(&raw)
                .map_err(|e| {
                    warn!(error = %e, "persisted user snapshot is corrupt, signing out");
                    e
                })
                .ok()
        });
        let (publisher, _) = watch::channel(user);

        Self {
            api,
            storage,
            publisher,
        }
    }

    /// Register a new account and open a session.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let response: AuthResponse = self.api.post_data("auth/register", request).await?;
        Ok(self.open_session(response))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<User, ApiError> {
        let response: AuthResponse = self.api.post_data("auth/login", request).await?;
        Ok(self.open_session(response))
    }

    /// Exchange the stored refresh token for a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when no refresh token is stored, and
    /// propagates the underlying request error otherwise.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let refresh_token = self
            .storage
            .get(keys::REFRESH_TOKEN)
            .ok_or_else(|| ApiError::Rejected("no refresh token stored".to_string()))?;

        let pair: TokenPair = self
            .api
            .post_data("auth/refresh", &RefreshBody { refresh_token })
            .await?;

        self.storage.set(keys::ACCESS_TOKEN, &pair.access_token);
        self.storage.set(keys::REFRESH_TOKEN, &pair.refresh_token);
        Ok(())
    }

    /// Drop the session: remove tokens and the user snapshot, publish
    /// signed-out state. Purely local; the backend keeps no session state.
    pub fn logout(&self) {
        self.storage.remove(keys::ACCESS_TOKEN);
        self.storage.remove(keys::REFRESH_TOKEN);
        self.storage.remove(keys::CURRENT_USER);
        self.publisher.send_replace(None);
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.publisher.borrow().clone()
    }

    /// Whether an access token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.storage.get(keys::ACCESS_TOKEN).is_some()
    }

    /// Whether the signed-in user may use admin operations.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current_user()
            .is_some_and(|user| user.role.is_admin())
    }

    /// The stored access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.storage.get(keys::ACCESS_TOKEN).map(SecretString::from)
    }

    /// Subscribe to the published current user.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.publisher.subscribe()
    }

    fn open_session(&self, response: AuthResponse) -> User {
        self.storage.set(keys::ACCESS_TOKEN, &response.access_token);
        self.storage
            .set(keys::REFRESH_TOKEN, &response.refresh_token);
        match serde_json::to_string(&response.user) {
            Ok(serialized) => self.storage.set(keys::CURRENT_USER, &serialized),
            Err(e) => warn!(error = %e, "failed to serialize user snapshot"),
        }
        self.publisher.send_replace(Some(response.user.clone()));
        response.user
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::MemoryStorage;
    use mercadito_core::{CityId, Role, UserId};

    fn session_with(storage: Arc<dyn Storage>) -> AuthSession {
        let config = ClientConfig::new("https://api.example.com/v1/".parse().unwrap());
        let api = ApiClient::new(&config, Arc::clone(&storage)).unwrap();
        AuthSession::new(api, storage)
    }

    fn user(role: Role) -> User {
        User {
            id: Some(UserId::new("u1")),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            city: CityId::new("c1"),
            role,
            active: Some(true),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_fresh_session_is_signed_out() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        assert!(session.current_user().is_none());
        assert!(!session.is_authenticated());
        assert!(!session.is_admin());
    }

    #[test]
    fn test_persisted_user_is_rehydrated() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(
            keys::CURRENT_USER,
            &serde_json::to_string(&user(Role::Manager)).unwrap(),
        );
        storage.set(keys::ACCESS_TOKEN, "tok");

        let session = session_with(storage);
        assert_eq!(session.current_user().unwrap().name, "Ada");
        assert!(session.is_authenticated());
        assert!(session.is_admin());
    }

    #[test]
    fn test_corrupt_user_snapshot_reads_as_signed_out() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(keys::CURRENT_USER, "{broken");

        let session = session_with(storage);
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_logout_clears_all_auth_keys_and_publishes() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(keys::ACCESS_TOKEN, "at");
        storage.set(keys::REFRESH_TOKEN, "rt");
        storage.set(
            keys::CURRENT_USER,
            &serde_json::to_string(&user(Role::User)).unwrap(),
        );
        // A cart entry in the same store must be untouched by logout.
        storage.set(keys::CART_ITEMS, "[]");

        let session = session_with(Arc::clone(&storage));
        let mut rx = session.subscribe();
        assert!(rx.borrow_and_update().is_some());

        session.logout();

        assert!(storage.get(keys::ACCESS_TOKEN).is_none());
        assert!(storage.get(keys::REFRESH_TOKEN).is_none());
        assert!(storage.get(keys::CURRENT_USER).is_none());
        assert_eq!(storage.get(keys::CART_ITEMS), Some("[]".to_string()));
        assert!(rx.borrow_and_update().is_none());
        assert!(!session.is_authenticated());
    }
}
