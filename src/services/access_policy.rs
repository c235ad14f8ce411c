//! Download gate for shared files.
//!
//! Checks run in a fixed order and the first failure wins: expiry, then the
//! download limit, then the password. The decision is a pure function of
//! the record, the supplied password and the clock.

use chrono::{DateTime, Utc};

use crate::db::FileRecord;
use crate::services::credentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Expired,
    LimitReached,
    PasswordRequired,
    WrongPassword,
}

impl DenialReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::LimitReached => "limit_reached",
            Self::PasswordRequired => "password_required",
            Self::WrongPassword => "wrong_password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(DenialReason),
}

impl AccessDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decide whether `file` may be downloaded right now.
///
/// A `download_limit` of zero denies every attempt.
#[must_use]
pub fn validate_access(
    file: &FileRecord,
    supplied_password: Option<&str>,
    now: DateTime<Utc>,
) -> AccessDecision {
    if let Some(expiry) = file.expiry_date
        && expiry < now
    {
        return AccessDecision::Denied(DenialReason::Expired);
    }

    if let Some(limit) = file.download_limit
        && file.download_count >= limit
    {
        return AccessDecision::Denied(DenialReason::LimitReached);
    }

    if let Some(hash) = &file.password_hash {
        let Some(password) = supplied_password else {
            return AccessDecision::Denied(DenialReason::PasswordRequired);
        };

        if !credentials::verify_password(password, hash) {
            return AccessDecision::Denied(DenialReason::WrongPassword);
        }
    }

    AccessDecision::Allowed
}
