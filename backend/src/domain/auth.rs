//! Authentication primitives such as login credentials and registrations.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::{DisplayName, Email, Locale, Role, UserId, UserValidationError};

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length in characters.
pub const PASSWORD_MAX: usize = 128;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was not a valid address.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password length outside the accepted bounds.
    PasswordLength,
    /// Display name failed validation.
    DisplayName(UserValidationError),
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordLength => write!(
                f,
                "password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
            ),
            Self::DisplayName(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

impl CredentialsValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "email",
            Self::EmptyPassword | Self::PasswordLength => "password",
            Self::DisplayName(_) => "displayName",
        }
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised (trimmed, lowercased).
/// - `password` is non-empty and keeps caller-provided whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email).map_err(|_| CredentialsValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for lookups.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: Email,
    password: Zeroizing<String>,
    display_name: DisplayName,
    locale: Locale,
}

impl Registration {
    /// Validate every registration field.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
        locale: Locale,
    ) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email).map_err(|_| CredentialsValidationError::InvalidEmail)?;
        let length = password.chars().count();
        if length == 0 {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length) {
            return Err(CredentialsValidationError::PasswordLength);
        }
        let display_name =
            DisplayName::new(display_name).map_err(CredentialsValidationError::DisplayName)?;
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
            display_name,
            locale,
        })
    }

    /// Normalised email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plain-text password, zeroised on drop.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Public name.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Preferred language.
    pub fn locale(&self) -> Locale {
        self.locale
    }
}

/// Identity carried by a verified bearer token or session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Authenticated account.
    pub user_id: UserId,
    /// Role at the time the token was issued.
    pub role: Role,
}

impl Principal {
    /// Whether the principal administers the marketplace.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `forbidden` unless the principal holds `role`. Admins pass
    /// every role check.
    pub fn require(&self, role: Role) -> Result<(), super::Error> {
        if self.role == role || self.is_admin() {
            Ok(())
        } else {
            Err(super::Error::forbidden(format!("{role} role required")))
        }
    }
}

/// Successful login outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Signed bearer token.
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}
