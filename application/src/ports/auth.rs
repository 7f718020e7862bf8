//! Magic-link authentication port

use crate::ports::backend_error::BackendError;
use async_trait::async_trait;
use bestself_domain::{NewUser, User};

#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Ask the backend to email a sign-in link
    async fn request_magic_link(&self, email: &str) -> Result<(), BackendError>;

    /// Exchange the token from the link for the signed-in user
    async fn verify(&self, token: &str) -> Result<User, BackendError>;

    async fn register(&self, user: &NewUser) -> Result<User, BackendError>;
}
