//! Marketplace accounts.

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Locale, UserId};

/// Validation errors for user-facing account fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Email does not look like `local@domain`.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Display name blank or out of bounds.
    #[error("display name must be between {min} and {max} characters")]
    DisplayNameLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
    },
    /// Phone number contains unexpected characters.
    #[error("phone number must contain 7 to 15 digits with an optional leading +")]
    InvalidPhone,
    /// Role string not recognised.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Account role. Every account starts as a client; admins promote providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Books services.
    Client,
    /// Offers services; assigned on application approval.
    Provider,
    /// Moderates providers and listings.
    Admin,
}

impl Role {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Provider => "provider",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalised (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "layla@example.com")]
pub struct Email(String);

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

impl Email {
    /// Validate and normalise an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.len() > 254 || !is_plausible_email(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Minimum display name length in characters.
pub const DISPLAY_NAME_MIN: usize = 2;
/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Trimmed display name; Arabic and Latin scripts are both accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "Layla Haddad")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a display name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if !(DISPLAY_NAME_MIN..=DISPLAY_NAME_MAX).contains(&length) {
            return Err(UserValidationError::DisplayNameLength {
                min: DISPLAY_NAME_MIN,
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Contact phone number with separators stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "+966501234567")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a phone number, dropping spaces, dashes, and parentheses.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let compact: String = raw
            .as_ref()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(UserValidationError::InvalidPhone);
        }
        Ok(Self(compact))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Registered account as exposed to clients. The password hash never leaves
/// the persistence layer except through [`StoredUser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account identifier.
    pub id: UserId,
    /// Login address.
    pub email: Email,
    /// Public name.
    pub display_name: DisplayName,
    /// Current role.
    pub role: Role,
    /// Preferred language.
    pub locale: Locale,
    /// Optional contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneNumber>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may act with `role` privileges. Admins pass every check.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role || self.role == Role::Admin
    }
}

/// User together with the password hash, used only by authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    /// Account data.
    pub user: User,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New display name.
    pub display_name: Option<DisplayName>,
    /// New preferred language.
    pub locale: Option<Locale>,
    /// New phone number.
    pub phone: Option<PhoneNumber>,
}
