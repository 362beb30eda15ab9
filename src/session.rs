use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_AUTH_ERROR: &str = "Authentication failed";

pub type IdentityFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// What an identity provider reports back for sign-in and sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub success: bool,
    pub user_id: Option<String>,
    pub error_message: Option<String>,
}

impl AuthOutcome {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            success: true,
            user_id: Some(user_id.into()),
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            user_id: None,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub user_id: String,
    pub email: String,
}

pub trait IdentityProvider: Send + Sync {
    fn validate_credentials(&self, email: &str, password: &str) -> AppResult<()> {
        if email.trim().is_empty() {
            return Err(AppError::Validation("Enter Email".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Enter Password".to_string()));
        }
        Ok(())
    }
    fn sign_in(&self, email: &str, password: &str) -> IdentityFuture<AuthOutcome>;
    fn sign_up(&self, email: &str, password: &str) -> IdentityFuture<AuthOutcome>;
    fn sign_out(&self) -> IdentityFuture<Result<(), String>>;
}

#[derive(Clone)]
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    current: Arc<Mutex<Option<UserSession>>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<UserSession> {
        self.provider.validate_credentials(email, password)?;
        let outcome = self.provider.sign_in(email.trim(), password).await;
        self.accept(email, outcome).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<UserSession> {
        self.provider.validate_credentials(email, password)?;
        let outcome = self.provider.sign_up(email.trim(), password).await;
        self.accept(email, outcome).await
    }

    /// Restores a session persisted by the host from an earlier sign-in.
    pub async fn resume(&self, session: UserSession) {
        let mut current = self.current.lock().await;
        *current = Some(session);
    }

    /// Clears the local session first; provider failures are only logged.
    pub async fn sign_out(&self) {
        let previous = self.current.lock().await.take();
        if let Err(error) = self.provider.sign_out().await {
            tracing::warn!(
                error = %error,
                user_id = previous.as_ref().map(|session| session.user_id.as_str()).unwrap_or_default(),
                "identity provider sign-out failed"
            );
        }
    }

    pub async fn current_user(&self) -> Option<UserSession> {
        self.current.lock().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.lock().await.is_some()
    }

    pub async fn require_user(&self) -> AppResult<UserSession> {
        self.current_user()
            .await
            .ok_or_else(|| AppError::Auth("Not signed in".to_string()))
    }

    async fn accept(&self, email: &str, outcome: AuthOutcome) -> AppResult<UserSession> {
        match outcome {
            AuthOutcome {
                success: true,
                user_id: Some(user_id),
                ..
            } => {
                let session = UserSession {
                    user_id,
                    email: email.trim().to_string(),
                };
                let mut current = self.current.lock().await;
                *current = Some(session.clone());
                tracing::info!(user_id = %session.user_id, "signed in");
                Ok(session)
            }
            AuthOutcome { error_message, .. } => Err(AppError::Auth(
                error_message.unwrap_or_else(|| DEFAULT_AUTH_ERROR.to_string()),
            )),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{AuthOutcome, IdentityFuture, IdentityProvider, SessionManager, UserSession};
    use crate::errors::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory provider keyed by email; user ids are `uid-<email>`.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        accounts: Mutex<HashMap<String, String>>,
        pub(crate) sign_outs: AtomicUsize,
        pub(crate) fail_sign_out: bool,
    }

    impl FakeProvider {
        pub(crate) fn with_account(email: &str, password: &str) -> Self {
            let provider = Self::default();
            provider
                .accounts
                .lock()
                .expect("accounts")
                .insert(email.to_string(), password.to_string());
            provider
        }
    }

    impl IdentityProvider for FakeProvider {
        fn sign_in(&self, email: &str, password: &str) -> IdentityFuture<AuthOutcome> {
            let outcome = match self.accounts.lock().expect("accounts").get(email) {
                Some(stored) if stored == password => AuthOutcome::signed_in(format!("uid-{email}")),
                Some(_) => AuthOutcome::failed("The password is invalid."),
                None => AuthOutcome {
                    success: false,
                    user_id: None,
                    error_message: None,
                },
            };
            Box::pin(async move { outcome })
        }

        fn sign_up(&self, email: &str, password: &str) -> IdentityFuture<AuthOutcome> {
            let mut accounts = self.accounts.lock().expect("accounts");
            let outcome = if accounts.contains_key(email) {
                AuthOutcome::failed("The email address is already in use.")
            } else {
                accounts.insert(email.to_string(), password.to_string());
                AuthOutcome::signed_in(format!("uid-{email}"))
            };
            Box::pin(async move { outcome })
        }

        fn sign_out(&self) -> IdentityFuture<Result<(), String>> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail_sign_out {
                Err("network unavailable".to_string())
            } else {
                Ok(())
            };
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn sign_in_records_session_from_provider() {
        let sessions = SessionManager::new(Arc::new(FakeProvider::with_account("a@b.c", "pw")));
        let session = sessions.sign_in(" a@b.c ", "pw").await.expect("sign in");
        assert_eq!(session.user_id, "uid-a@b.c");
        assert_eq!(session.email, "a@b.c");
        assert!(sessions.is_signed_in().await);
        assert_eq!(sessions.require_user().await.expect("user"), session);
    }

    #[tokio::test]
    async fn provider_message_is_surfaced_verbatim() {
        let sessions = SessionManager::new(Arc::new(FakeProvider::with_account("a@b.c", "pw")));
        let error = sessions.sign_in("a@b.c", "wrong").await.expect_err("bad password");
        assert!(matches!(error, AppError::Auth(ref message) if message == "The password is invalid."));

        let error = sessions.sign_in("nobody@b.c", "pw").await.expect_err("unknown user");
        assert_eq!(error.user_message(), "Authentication failed");
        assert!(!sessions.is_signed_in().await);
    }

    #[tokio::test]
    async fn empty_credentials_fail_validation_before_provider() {
        let sessions = SessionManager::new(Arc::new(FakeProvider::default()));
        let error = sessions.sign_up("  ", "pw").await.expect_err("empty email");
        assert!(matches!(error, AppError::Validation(_)));
        let error = sessions.sign_up("a@b.c", "").await.expect_err("empty password");
        assert_eq!(error.user_message(), "Enter Password");
    }

    #[tokio::test]
    async fn sign_up_then_duplicate_sign_up_fails() {
        let sessions = SessionManager::new(Arc::new(FakeProvider::default()));
        sessions.sign_up("new@b.c", "pw").await.expect("sign up");
        let error = sessions.sign_up("new@b.c", "pw").await.expect_err("duplicate");
        assert_eq!(error.user_message(), "The email address is already in use.");
    }

    #[tokio::test]
    async fn sign_out_clears_session_even_when_provider_fails() {
        let provider = Arc::new(FakeProvider {
            fail_sign_out: true,
            ..FakeProvider::default()
        });
        let sessions = SessionManager::new(provider.clone());
        sessions
            .resume(UserSession {
                user_id: "uid-1".to_string(),
                email: "a@b.c".to_string(),
            })
            .await;

        sessions.sign_out().await;
        assert!(sessions.current_user().await.is_none());
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
        assert!(sessions.require_user().await.is_err());
    }
}
