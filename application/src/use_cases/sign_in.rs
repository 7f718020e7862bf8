//! Sign-in use case
//!
//! Magic-link login: request a link by email, then exchange the link's token
//! for a user. The signed-in user id is remembered in a [`SessionStore`].

use crate::ports::auth::AuthPort;
use crate::ports::backend_error::BackendError;
use crate::ports::session_store::SessionStore;
use bestself_domain::{NewUser, User};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SignInError {
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    #[error("Sign-in failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Could not store the session: {0}")]
    Storage(#[from] io::Error),
}

pub struct SignInUseCase {
    auth: Arc<dyn AuthPort>,
    store: Arc<dyn SessionStore>,
}

impl SignInUseCase {
    pub fn new(auth: Arc<dyn AuthPort>, store: Arc<dyn SessionStore>) -> Self {
        Self { auth, store }
    }

    pub async fn request_link(&self, email: &str) -> Result<(), SignInError> {
        let email = validate_email(email)?;
        self.auth.request_magic_link(email).await?;
        info!("Sign-in link requested");
        Ok(())
    }

    /// Exchange a magic-link token and remember the user
    pub async fn verify(&self, token: &str) -> Result<User, SignInError> {
        let user = self.auth.verify(token.trim()).await?;
        self.store.save_user_id(&user.id)?;
        info!("Signed in as {}", user.id);
        Ok(user)
    }

    pub async fn register(&self, name: Option<&str>, email: &str) -> Result<User, SignInError> {
        let email = validate_email(email)?;
        let user = self
            .auth
            .register(&NewUser {
                name: name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
                email: email.to_string(),
            })
            .await?;
        self.store.save_user_id(&user.id)?;
        Ok(user)
    }

    pub fn remembered_user_id(&self) -> Result<Option<String>, SignInError> {
        Ok(self.store.load_user_id()?)
    }

    pub fn sign_out(&self) -> Result<(), SignInError> {
        self.store.clear()?;
        info!("Signed out");
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<&str, SignInError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(SignInError::InvalidEmail(email.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    struct FakeAuth;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: None,
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }

    #[async_trait]
    impl AuthPort for FakeAuth {
        async fn request_magic_link(&self, _email: &str) -> Result<(), BackendError> {
            Ok(())
        }

        async fn verify(&self, token: &str) -> Result<User, BackendError> {
            match token {
                "good" => Ok(user("u7", "sam@example.com")),
                _ => Err(BackendError::Rejected {
                    status: 401,
                    message: "expired link".to_string(),
                }),
            }
        }

        async fn register(&self, new: &NewUser) -> Result<User, BackendError> {
            let mut u = user("u8", &new.email);
            u.name = new.name.clone();
            Ok(u)
        }
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<Option<String>>);

    impl SessionStore for MemoryStore {
        fn load_user_id(&self) -> io::Result<Option<String>> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn save_user_id(&self, user_id: &str) -> io::Result<()> {
            *self.0.lock().unwrap() = Some(user_id.to_string());
            Ok(())
        }

        fn clear(&self) -> io::Result<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    fn use_case() -> SignInUseCase {
        SignInUseCase::new(Arc::new(FakeAuth), Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn test_verify_remembers_user() {
        let sign_in = use_case();
        assert_eq!(sign_in.remembered_user_id().unwrap(), None);
        let user = sign_in.verify(" good\n").await.unwrap();
        assert_eq!(user.id, "u7");
        assert_eq!(sign_in.remembered_user_id().unwrap().as_deref(), Some("u7"));

        sign_in.sign_out().unwrap();
        assert_eq!(sign_in.remembered_user_id().unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_token_keeps_store_empty() {
        let sign_in = use_case();
        let err = sign_in.verify("stale").await.unwrap_err();
        assert!(matches!(err, SignInError::Backend(_)));
        assert_eq!(sign_in.remembered_user_id().unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_email() {
        let sign_in = use_case();
        for email in ["", "sam", "@example.com", "sam@localhost"] {
            assert!(matches!(
                sign_in.request_link(email).await,
                Err(SignInError::InvalidEmail(_))
            ));
        }
        assert!(sign_in.request_link("sam@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_blank_name() {
        let sign_in = use_case();
        let user = sign_in.register(Some("  "), "kim@example.com").await.unwrap();
        assert_eq!(user.name, None);
        assert_eq!(sign_in.remembered_user_id().unwrap().as_deref(), Some("u8"));
    }
}
