//! User registration and public profiles.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::user::MAX_PROFILE_LINKS;
use crate::domain::{Amount, NewUser, Profile, PublicUser, User, Username};
use crate::error::{MarketError, Result};
use crate::port::inbound::{CancelToken, ProfileDirectory};
use crate::port::outbound::{Clock, UserStore};

const MAX_DISPLAY_NAME_LEN: usize = 50;

/// Registration request.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub display_name: String,
    pub emoji: String,
    pub description: String,
    pub links: Vec<String>,
}

pub struct ProfileService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    initial_balance: Amount,
}

impl<S: UserStore> ProfileService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, initial_balance: Amount) -> Self {
        Self {
            store,
            clock,
            initial_balance,
        }
    }

    /// Create an account funded with the initial balance.
    pub async fn register(&self, request: Registration, cancel: &CancelToken) -> Result<User> {
        let username = Username::parse(&request.username).ok_or_else(|| MarketError::InvalidInput {
            reason: format!(
                "username must be 1-{} characters of a-z, 0-9 or _",
                Username::MAX_LEN
            ),
        })?;

        let display_name = match request.display_name.trim() {
            "" => username.to_string(),
            name => name.to_string(),
        };
        if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(MarketError::InvalidInput {
                reason: format!("display name must be at most {MAX_DISPLAY_NAME_LEN} characters"),
            }
            .into());
        }

        let links: Vec<String> = request
            .links
            .into_iter()
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty())
            .collect();
        if links.len() > MAX_PROFILE_LINKS {
            return Err(MarketError::InvalidInput {
                reason: format!("at most {MAX_PROFILE_LINKS} links allowed"),
            }
            .into());
        }

        let new_user = NewUser {
            username,
            profile: Profile {
                display_name,
                emoji: request.emoji.trim().to_string(),
                description: request.description.trim().to_string(),
                links,
            },
            initial_balance: self.initial_balance,
            created_at: self.clock.now(),
        };
        let user = self.store.insert_user(new_user, cancel).await?;
        info!(user = %user.username, balance = user.balance, "User registered");
        Ok(user)
    }

    pub async fn user(&self, username: &Username) -> Result<Option<User>> {
        self.store.user(username).await
    }
}

#[async_trait]
impl<S: UserStore + 'static> ProfileDirectory for ProfileService<S> {
    async fn ensure_user_exists(&self, username: &Username) -> Result<()> {
        match self.store.user(username).await? {
            Some(_) => Ok(()),
            None => Err(MarketError::UserNotFound {
                username: username.clone(),
            }
            .into()),
        }
    }

    async fn public_user(&self, username: &Username) -> Result<PublicUser> {
        self.store
            .user(username)
            .await?
            .map(|user| user.to_public())
            .ok_or_else(|| {
                MarketError::UserNotFound {
                    username: username.clone(),
                }
                .into()
            })
    }
}
