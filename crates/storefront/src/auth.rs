//! Authenticated session holder.
//!
//! Two states: anonymous, or authenticated with a user record and bearer
//! token. Login and register exchange credentials for `{token, user}`,
//! persist both under fixed storage keys, and install the token on the
//! gateway. Restoration on startup trusts a persisted token without a
//! server round-trip; corrupt persisted user data discards the whole
//! session rather than half-restoring it.

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info, warn};

use coralcart_core::{Email, EmailError};

use crate::gateway::{ApiError, Credentials, Gateway, Registration, User};
use crate::storage::{LocalStore, keys};

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format, rejected before any network call.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too short, rejected before any network call.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// The gateway rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already exists for this email.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Any other gateway failure.
    #[error("gateway error: {0}")]
    Gateway(ApiError),
}

/// The current session: anonymous, or a user plus bearer token.
#[derive(Clone, Default)]
pub struct Session {
    user: Option<User>,
    token: Option<SecretString>,
}

impl Session {
    /// An anonymous (guest) session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated session.
    #[must_use]
    pub fn authenticated(user: User, token: SecretString) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
        }
    }

    /// Whether a bearer token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Holds the session and drives the login/register/logout flows.
pub struct AuthService<G> {
    gateway: Arc<G>,
    store: LocalStore,
    session: Session,
}

impl<G: Gateway> AuthService<G> {
    /// Create the service. Call [`restore`](Self::restore) before use to
    /// pick up a persisted session.
    pub fn new(gateway: Arc<G>, store: LocalStore) -> Self {
        Self {
            gateway,
            store,
            session: Session::anonymous(),
        }
    }

    /// Restore a persisted session, if one exists and is intact.
    ///
    /// The persisted token is trusted without a server-side check. A token
    /// with a missing or corrupt user record means the persisted state is
    /// inconsistent; both entries are dropped and the session stays
    /// anonymous.
    pub fn restore(&mut self) {
        let token: Option<String> = self.store.get(keys::AUTH_TOKEN);
        let Some(token) = token else {
            debug!("no persisted token, starting anonymous");
            return;
        };

        match self.store.get::<User>(keys::CURRENT_USER) {
            Some(user) => {
                debug!(user_id = %user.id, "restored session from storage");
                let token = SecretString::from(token);
                self.gateway.set_auth_token(Some(token.clone()));
                self.session = Session::authenticated(user, token);
            }
            None => {
                warn!("persisted token without a readable user record, discarding session");
                self.store.remove(keys::AUTH_TOKEN);
                self.store.remove(keys::CURRENT_USER);
            }
        }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed email (no network call is made),
    /// rejected credentials, or any other gateway failure.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = Credentials {
            email: Email::parse(email)?,
            password: password.to_string(),
        };

        let grant = self
            .gateway
            .login(&credentials)
            .await
            .map_err(|error| match error {
                ApiError::Unauthorized(_) | ApiError::NotFound(_) => AuthError::InvalidCredentials,
                other => AuthError::Gateway(other),
            })?;

        info!(user_id = %grant.user.id, "logged in");
        let user = grant.user.clone();
        self.install(grant.user, grant.token);
        Ok(user)
    }

    /// Register a new account and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed email or short password (no
    /// network call is made), a duplicate account, or any other gateway
    /// failure.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        let registration = Registration {
            name: name.to_string(),
            email: Email::parse(email)?,
            password: password.to_string(),
        };

        let grant = self
            .gateway
            .register(&registration)
            .await
            .map_err(|error| match error {
                ApiError::Status { status: 409, .. } => AuthError::UserAlreadyExists,
                other => AuthError::Gateway(other),
            })?;

        info!(user_id = %grant.user.id, "registered and logged in");
        let user = grant.user.clone();
        self.install(grant.user, grant.token);
        Ok(user)
    }

    /// End the session: clear persisted identity and the gateway token.
    ///
    /// The cart engine's `clear_on_logout` must run as well so a guest
    /// never sees the previous user's cart; the [`crate::Storefront`]
    /// facade wires the two together.
    pub fn logout(&mut self) {
        if let Some(user) = &self.session.user {
            info!(user_id = %user.id, "logged out");
        }
        self.store.remove(keys::AUTH_TOKEN);
        self.store.remove(keys::CURRENT_USER);
        self.gateway.set_auth_token(None);
        self.session = Session::anonymous();
    }

    fn install(&mut self, user: User, token: String) {
        self.store.set(keys::AUTH_TOKEN, &token);
        self.store.set(keys::CURRENT_USER, &user);
        let token = SecretString::from(token);
        self.gateway.set_auth_token(Some(token.clone()));
        self.session = Session::authenticated(user, token);
    }

    /// The current session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeGateway, temp_dir};

    fn service() -> AuthService<FakeGateway> {
        let store = LocalStore::open(temp_dir()).unwrap();
        AuthService::new(Arc::new(FakeGateway::new()), store)
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let mut auth = service();
        auth.login("sam@example.com", "hunter22").await.unwrap();
        assert!(auth.is_authenticated());
        assert!(auth.store.get::<String>(keys::AUTH_TOKEN).is_some());
        assert!(auth.store.get::<User>(keys::CURRENT_USER).is_some());
    }

    #[tokio::test]
    async fn test_malformed_email_makes_no_network_call() {
        let mut auth = service();
        let gateway = Arc::clone(&auth.gateway);
        let result = auth.login("not-an-email", "hunter22").await;
        assert!(matches!(result, Err(AuthError::InvalidEmail(_))));
        assert_eq!(gateway.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_short_password_rejected_locally() {
        let mut auth = service();
        let result = auth.register("Sam", "sam@example.com", "abc").await;
        assert!(matches!(result, Err(AuthError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let dir = temp_dir();
        {
            let store = LocalStore::open(&dir).unwrap();
            let mut auth = AuthService::new(Arc::new(FakeGateway::new()), store);
            auth.login("sam@example.com", "hunter22").await.unwrap();
        }

        let store = LocalStore::open(&dir).unwrap();
        let mut auth = AuthService::new(Arc::new(FakeGateway::new()), store);
        auth.restore();
        assert!(auth.is_authenticated());
        assert_eq!(auth.current_user().unwrap().email, "sam@example.com");
    }

    #[tokio::test]
    async fn test_restore_discards_corrupt_user() {
        let dir = temp_dir();
        let store = LocalStore::open(&dir).unwrap();
        store.set(keys::AUTH_TOKEN, &"tok-1".to_string());
        std::fs::write(dir.join("current_user.json"), "{broken").unwrap();

        let mut auth = AuthService::new(Arc::new(FakeGateway::new()), store);
        auth.restore();
        assert!(!auth.is_authenticated());
        assert!(!auth.store.contains(keys::AUTH_TOKEN));
        assert!(!auth.store.contains(keys::CURRENT_USER));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let mut auth = service();
        auth.login("sam@example.com", "hunter22").await.unwrap();
        auth.logout();
        assert!(!auth.is_authenticated());
        assert!(!auth.store.contains(keys::AUTH_TOKEN));
        assert!(!auth.store.contains(keys::CURRENT_USER));
    }
}
