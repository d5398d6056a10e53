//! Caller identity and capability.
//!
//! Capability is derived once per request from the verified token subject and
//! the role stored on the user record. There is no hierarchy beyond the two
//! roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Stored user record. The id is the subject of the caller's identity token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields pushed by the credential service on sign-in.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Whether the email is on the configured administrator list
    pub grant_admin: bool,
}

/// Capability of the current caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Anonymous,
    Authenticated(User),
    Administrator(User),
}

impl Access {
    pub fn from_user(user: User) -> Self {
        match user.role {
            Role::Admin => Self::Administrator(user),
            Role::User => Self::Authenticated(user),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) | Self::Administrator(user) => Some(user),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Administrator(_))
    }

    pub fn require_user(&self) -> Result<&User, LedgerError> {
        self.user()
            .ok_or_else(|| LedgerError::Unauthenticated("Authentication required".to_string()))
    }

    pub fn require_admin(&self) -> Result<&User, LedgerError> {
        match self {
            Self::Administrator(user) => Ok(user),
            Self::Authenticated(_) => Err(LedgerError::Forbidden(
                "Access denied: admin privileges required".to_string(),
            )),
            Self::Anonymous => Err(LedgerError::Unauthenticated(
                "Authentication required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "sam@example.com".to_string(),
            name: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_from_role() {
        assert!(Access::from_user(user(Role::Admin)).is_admin());
        assert!(!Access::from_user(user(Role::User)).is_admin());
    }

    #[test]
    fn test_require_admin() {
        let err = Access::Anonymous.require_admin().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);

        let err = Access::from_user(user(Role::User))
            .require_admin()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        assert!(Access::from_user(user(Role::Admin)).require_admin().is_ok());
    }
}
