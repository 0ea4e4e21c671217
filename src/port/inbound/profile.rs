//! Creator-profile capability consumed by the market service.

use async_trait::async_trait;

use crate::domain::{PublicUser, Username};
use crate::error::Result;

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// `MarketError::UserNotFound` if the handle is unknown.
    async fn ensure_user_exists(&self, username: &Username) -> Result<()>;

    async fn public_user(&self, username: &Username) -> Result<PublicUser>;
}
