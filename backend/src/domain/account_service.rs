//! Registration, login and profile management.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::ports::{PasswordHasher, TokenError, TokenIssuer, UserRepository};
use super::service_support::map_repository_error;
use super::{
    Error, IssuedToken, LoginCredentials, Principal, ProfileUpdate, Registration, Role,
    StoredUser, User, UserId,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub user: User,
}

/// Account use-cases.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Wire the service to its ports.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
        }
    }

    /// Create a client account.
    pub async fn register(&self, registration: Registration) -> Result<User, Error> {
        if self
            .users
            .find_by_email(registration.email())
            .await
            .map_err(map_repository_error)?
            .is_some()
        {
            return Err(Error::conflict("email is already registered"));
        }
        let user = self.create_account(&registration, Role::Client).await?;
        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Create the bootstrap administrator unless the email is already taken.
    ///
    /// Returns `None` when an account with that email exists; an existing
    /// non-admin account is left untouched.
    pub async fn ensure_admin(&self, registration: Registration) -> Result<Option<User>, Error> {
        if let Some(existing) = self
            .users
            .find_by_email(registration.email())
            .await
            .map_err(map_repository_error)?
        {
            if existing.user.role != Role::Admin {
                warn!(user_id = %existing.user.id, "bootstrap admin email belongs to a non-admin account");
            }
            return Ok(None);
        }
        let user = self.create_account(&registration, Role::Admin).await?;
        info!(user_id = %user.id, "bootstrap admin created");
        Ok(Some(user))
    }

    /// Check credentials and issue a bearer token.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let stored = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_CREDENTIALS))?;
        let verified = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .map_err(|err| Error::internal(err.to_string()))?;
        if !verified {
            warn!(user_id = %stored.user.id, "login rejected");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        let token = self
            .tokens
            .issue(Principal {
                user_id: stored.user.id,
                role: stored.user.role,
            })
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(LoginOutcome {
            token,
            user: stored.user,
        })
    }

    async fn create_account(&self, registration: &Registration, role: Role) -> Result<User, Error> {
        let password_hash = self
            .hasher
            .hash(registration.password())
            .map_err(|err| Error::internal(err.to_string()))?;
        let user = User {
            id: UserId::random(),
            email: registration.email().clone(),
            display_name: registration.display_name().clone(),
            role,
            locale: registration.locale(),
            phone: None,
            created_at: self.clock.utc(),
        };
        self.users
            .create(&StoredUser {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(map_repository_error)?;
        Ok(user)
    }

    /// Resolve a bearer token to the account's current identity.
    pub async fn authenticate_token(&self, token: &str) -> Result<Principal, Error> {
        let claimed = self.tokens.verify(token).map_err(|err| match err {
            TokenError::Expired => Error::unauthorized("token expired"),
            TokenError::Invalid { .. } => Error::unauthorized("invalid token"),
            TokenError::Signing { message } => Error::internal(message),
        })?;
        self.principal_for(claimed.user_id).await
    }

    /// Identity of `user_id` with its current role; unknown accounts are
    /// treated as signed out.
    pub async fn principal_for(&self, user_id: UserId) -> Result<Principal, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))?;
        Ok(Principal {
            user_id: user.id,
            role: user.role,
        })
    }

    /// Current account.
    pub async fn me(&self, user_id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))
    }

    /// Apply a profile edit.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, Error> {
        let mut user = self.me(user_id).await?;
        if let Some(name) = update.display_name {
            user.display_name = name;
        }
        if let Some(locale) = update.locale {
            user.locale = locale;
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        self.users
            .update_profile(&user)
            .await
            .map_err(map_repository_error)?;
        Ok(user)
    }
}
