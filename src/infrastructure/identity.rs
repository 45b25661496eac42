//! Identity provider: who is signed in

use crate::domain::UserId;
use crate::error::{Result, VjourError};
use crate::infrastructure::config::UserConfig;

/// Overrides the configured user; an empty value signs out
pub const USER_ENV: &str = "VJOUR_USER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<String>,
}

pub trait IdentityProvider {
    fn current_user(&self) -> Option<CurrentUser>;

    fn require_user(&self) -> Result<CurrentUser> {
        self.current_user().ok_or(VjourError::NotSignedIn)
    }
}

/// Identity taken from the journal config, overridable via `VJOUR_USER`
#[derive(Debug, Clone)]
pub struct ConfigIdentity {
    user: Option<CurrentUser>,
}

impl ConfigIdentity {
    pub fn new(user: &UserConfig) -> Self {
        let configured = CurrentUser {
            id: user.id,
            email: user.email.clone(),
        };

        let user = match std::env::var(USER_ENV) {
            Ok(raw) => Self::from_override(&raw, configured),
            Err(_) => Some(configured),
        };
        ConfigIdentity { user }
    }

    fn from_override(raw: &str, configured: CurrentUser) -> Option<CurrentUser> {
        let id: UserId = raw.parse().ok()?;
        if id == configured.id {
            Some(configured)
        } else {
            Some(CurrentUser { id, email: None })
        }
    }
}

impl IdentityProvider for ConfigIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}

/// Fixed identity, for embedding and tests
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Option<CurrentUser>);

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        self.0.clone()
    }
}
