//! Claims and the claim status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::item::{ItemKind, ItemRef, ItemStatus};
use crate::media::MediaUpload;

/// Claim status.
///
/// ```text
/// pending ──► verified ──► returned
///    │                        ▲
///    ├────────────────────────┘
///    └──► rejected
/// ```
///
/// `returned` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Verified,
    Returned,
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Pending,
        ClaimStatus::Verified,
        ClaimStatus::Returned,
        ClaimStatus::Rejected,
    ];

    /// Statuses an administrator may request.
    pub const DECISIONS: [ClaimStatus; 3] = [
        ClaimStatus::Verified,
        ClaimStatus::Returned,
        ClaimStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Returned => "returned",
            Self::Rejected => "rejected",
        }
    }

    /// Outgoing edges of the transition table.
    pub fn allowed_targets(self) -> &'static [ClaimStatus] {
        match self {
            Self::Pending => &[Self::Verified, Self::Returned, Self::Rejected],
            Self::Verified => &[Self::Returned],
            Self::Returned | Self::Rejected => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// Check a requested transition against the table.
    pub fn transition_to(self, target: ClaimStatus) -> Result<ClaimStatus, LedgerError> {
        if self == target {
            return Err(LedgerError::AlreadyInStatus(self));
        }
        if !self.allowed_targets().contains(&target) {
            return Err(LedgerError::InvalidTransition {
                from: self,
                to: target,
            });
        }
        Ok(target)
    }

    /// Item status a claim entering this status forces on its item.
    pub fn item_effect(self) -> Option<ItemStatus> {
        match self {
            Self::Verified => Some(ItemStatus::Claimed),
            Self::Returned => Some(ItemStatus::Closed),
            Self::Pending | Self::Rejected => None,
        }
    }

    /// Parse an administrator decision; `pending` is not a valid target.
    pub fn parse_decision(raw: &str) -> Result<ClaimStatus, LedgerError> {
        raw.parse::<ClaimStatus>()
            .ok()
            .filter(|status| Self::DECISIONS.contains(status))
            .ok_or_else(|| {
                LedgerError::validation("Status must be one of: verified, returned, rejected")
            })
    }

    /// Parse a listing filter value; any status is accepted.
    pub fn parse_filter(raw: &str) -> Result<ClaimStatus, LedgerError> {
        raw.parse::<ClaimStatus>().map_err(|_| {
            LedgerError::validation("Status must be one of: pending, verified, returned, rejected")
        })
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "returned" => Ok(Self::Returned),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown claim status '{other}'")),
        }
    }
}

/// Stored claim record.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub id: Uuid,
    pub item: ItemRef,
    pub claimer_id: Uuid,
    pub status: ClaimStatus,
    pub verification_details: Option<String>,
    pub claimed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Claim as submitted by a caller, before validation.
#[derive(Debug, Clone, Default)]
pub struct ClaimSubmission {
    pub item_type: Option<String>,
    pub item_id: Option<String>,
    pub verification_details: Option<String>,
    /// Proof media in submission order
    pub proof: Vec<MediaUpload>,
}

/// Administrator decision on a claim, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClaimDecision {
    /// One of `verified`, `returned`, `rejected`
    #[cfg_attr(feature = "openapi", schema(example = "verified"))]
    pub status: Option<String>,
    /// Optional note replacing the stored verification details
    #[serde(default)]
    pub verification_details: Option<String>,
}

/// Validated claim ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub id: Uuid,
    pub item: ItemRef,
    pub claimer_id: Uuid,
    pub verification_details: Option<String>,
}

/// A status change the store applies atomically together with its item effect.
#[derive(Debug, Clone)]
pub struct ClaimTransition {
    pub claim_id: Uuid,
    /// Status observed when the transition was validated
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    pub verification_details: Option<String>,
    pub item: ItemRef,
    pub item_status: Option<ItemStatus>,
}

/// Read-only claim listing filter.
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub claimer_id: Option<Uuid>,
    pub status: Option<ClaimStatus>,
    pub item_type: Option<ItemKind>,
}

impl ClaimFilter {
    pub fn matches(&self, claim: &Claim) -> bool {
        self.claimer_id.map_or(true, |id| id == claim.claimer_id)
            && self.status.map_or(true, |s| s == claim.status)
            && self.item_type.map_or(true, |k| k == claim.item.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use ClaimStatus::*;

        let allowed = [
            (Pending, Verified),
            (Pending, Returned),
            (Pending, Rejected),
            (Verified, Returned),
        ];

        for from in ClaimStatus::ALL {
            for to in ClaimStatus::ALL {
                let result = from.transition_to(to);
                if allowed.contains(&(from, to)) {
                    assert_eq!(result.unwrap(), to, "{from} -> {to} should be allowed");
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(
                        err.kind(),
                        crate::error::ErrorKind::Conflict,
                        "{from} -> {to} should be a conflict"
                    );
                }
            }
        }
    }

    #[test]
    fn test_self_transition_is_reported_distinctly() {
        let err = ClaimStatus::Verified
            .transition_to(ClaimStatus::Verified)
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyInStatus(ClaimStatus::Verified)));
        assert_eq!(err.to_string(), "Claim is already verified");
    }

    #[test]
    fn test_invalid_transition_names_both_statuses() {
        let err = ClaimStatus::Returned
            .transition_to(ClaimStatus::Verified)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot transition claim from returned to verified"
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ClaimStatus::Returned.is_terminal());
        assert!(ClaimStatus::Rejected.is_terminal());
        assert!(!ClaimStatus::Pending.is_terminal());
        assert!(!ClaimStatus::Verified.is_terminal());
    }

    #[test]
    fn test_item_effects() {
        assert_eq!(ClaimStatus::Verified.item_effect(), Some(ItemStatus::Claimed));
        assert_eq!(ClaimStatus::Returned.item_effect(), Some(ItemStatus::Closed));
        assert_eq!(ClaimStatus::Rejected.item_effect(), None);
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(
            ClaimStatus::parse_decision("returned").unwrap(),
            ClaimStatus::Returned
        );
        assert!(ClaimStatus::parse_decision("pending").is_err());
        assert!(ClaimStatus::parse_decision("approved").is_err());
        assert!(ClaimStatus::parse_filter("pending").is_ok());
    }
}
