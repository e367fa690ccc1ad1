//! Requests from clients to become providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ApplicationId, Category, PhoneNumber, UserId};

/// Maximum business name length.
pub const BUSINESS_NAME_MAX: usize = 120;
/// Maximum bio length.
pub const BIO_MAX: usize = 2000;
/// Maximum number of categories per application.
pub const CATEGORIES_MAX: usize = 10;
/// Maximum admin decision reason length.
pub const DECISION_REASON_MAX: usize = 500;

/// Validation failures for applications and decisions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplicationValidationError {
    #[error("businessName must be between 2 and {BUSINESS_NAME_MAX} characters")]
    BusinessName,
    #[error("bio must be at most {BIO_MAX} characters")]
    BioTooLong,
    #[error("categories must list between 1 and {CATEGORIES_MAX} valid slugs")]
    Categories,
    #[error("phone number must contain 7 to 15 digits with an optional leading +")]
    Phone,
    #[error("reason must not be empty and at most {DECISION_REASON_MAX} characters")]
    Reason,
}

impl ApplicationValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::BusinessName => "businessName",
            Self::BioTooLong => "bio",
            Self::Categories => "categories",
            Self::Phone => "phone",
            Self::Reason => "reason",
        }
    }
}

/// Review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown application status: {other}")),
        }
    }
}

/// Provider application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub business_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub categories: Vec<Category>,
    pub phone: PhoneNumber,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Validated application submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub business_name: String,
    pub bio: Option<String>,
    pub categories: Vec<Category>,
    pub phone: PhoneNumber,
}

impl ApplicationDraft {
    /// Validate and normalise; duplicate categories collapse.
    pub fn new(
        business_name: &str,
        bio: Option<&str>,
        categories: &[String],
        phone: &str,
    ) -> Result<Self, ApplicationValidationError> {
        let business_name = business_name.trim();
        if !(2..=BUSINESS_NAME_MAX).contains(&business_name.chars().count()) {
            return Err(ApplicationValidationError::BusinessName);
        }
        let bio = bio.map(str::trim).filter(|b| !b.is_empty());
        if bio.is_some_and(|b| b.chars().count() > BIO_MAX) {
            return Err(ApplicationValidationError::BioTooLong);
        }
        let mut parsed = categories
            .iter()
            .map(Category::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ApplicationValidationError::Categories)?;
        parsed.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        parsed.dedup();
        if parsed.is_empty() || parsed.len() > CATEGORIES_MAX {
            return Err(ApplicationValidationError::Categories);
        }
        let phone = PhoneNumber::new(phone).map_err(|_| ApplicationValidationError::Phone)?;
        Ok(Self {
            business_name: business_name.to_owned(),
            bio: bio.map(str::to_owned),
            categories: parsed,
            phone,
        })
    }
}

/// Admin verdict on a pending application or listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

impl Decision {
    /// Build a rejection, validating the reason.
    pub fn reject(reason: &str) -> Result<Self, ApplicationValidationError> {
        let reason = reason.trim();
        if reason.is_empty() || reason.chars().count() > DECISION_REASON_MAX {
            return Err(ApplicationValidationError::Reason);
        }
        Ok(Self::Reject {
            reason: reason.to_owned(),
        })
    }
}
