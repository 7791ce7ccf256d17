use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codes;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalTargetType {
    Project,
    Proposal,
    UserRegistration,
    Contract,
}

impl ApprovalTargetType {
    pub const ALL: [ApprovalTargetType; 4] = [
        ApprovalTargetType::Project,
        ApprovalTargetType::Proposal,
        ApprovalTargetType::UserRegistration,
        ApprovalTargetType::Contract,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalTargetType::Project => "PROJECT",
            ApprovalTargetType::Proposal => "PROPOSAL",
            ApprovalTargetType::UserRegistration => "USER_REGISTRATION",
            ApprovalTargetType::Contract => "CONTRACT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproverRole {
    Manager,
    Admin,
    SeniorAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Delegated,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 4] = [
        ApprovalStatus::Pending,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
        ApprovalStatus::Delegated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
            ApprovalStatus::Delegated => "DELEGATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    Budget,
    Requirements,
    Timeline,
    Quality,
    Other,
}

/// A generic workflow-request wrapper referencing its target by
/// (target_type, target_id). Only PENDING requests may be approved,
/// rejected, reassigned, or escalated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub id: String,
    pub approval_code: String,
    pub target_type: ApprovalTargetType,
    pub target_id: String,
    pub workflow_step: i32,
    pub approver_id: Option<String>,
    pub approver_role: ApproverRole,
    pub status: ApprovalStatus,
    pub comment: Option<String>,
    pub rejection_reason: Option<RejectionReason>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub delegated_to: Option<String>,
}

impl Approval {
    pub fn request(
        target_type: ApprovalTargetType,
        target_id: String,
        workflow_step: i32,
        approver_role: ApproverRole,
        approver_id: Option<String>,
    ) -> Self {
        Approval {
            id: Uuid::new_v4().to_string(),
            approval_code: codes::approval_code(),
            target_type,
            target_id,
            workflow_step,
            approver_id,
            approver_role,
            status: ApprovalStatus::Pending,
            comment: None,
            rejection_reason: None,
            requested_at: Utc::now(),
            processed_at: None,
            delegated_to: None,
        }
    }

    pub fn approve(
        &mut self,
        approver_id: String,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        self.ensure_pending("approved")?;
        self.status = ApprovalStatus::Approved;
        self.approver_id = Some(approver_id);
        self.processed_at = Some(now);
        self.comment = comments;
        Ok(())
    }

    pub fn reject(
        &mut self,
        approver_id: String,
        reason: Option<String>,
        rejection_reason: Option<RejectionReason>,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        self.ensure_pending("rejected")?;
        self.status = ApprovalStatus::Rejected;
        self.approver_id = Some(approver_id);
        self.processed_at = Some(now);
        self.comment = reason;
        self.rejection_reason = rejection_reason;
        Ok(())
    }

    /// Reassigns the approver field only; the request stays PENDING.
    pub fn assign_approver(&mut self, approver_id: String) -> Result<(), ApiError> {
        self.ensure_pending("reassigned")?;
        self.approver_id = Some(approver_id);
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> Result<(), ApiError> {
        if self.status != ApprovalStatus::Pending {
            return Err(ApiError::InvalidState(format!(
                "Only pending approvals can be {}",
                action
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_approval() -> Approval {
        Approval::request(
            ApprovalTargetType::Project,
            "7".to_string(),
            1,
            ApproverRole::Admin,
            Some("admin-1".to_string()),
        )
    }

    #[test]
    fn request_starts_pending_with_code() {
        let a = pending_approval();
        assert_eq!(a.status, ApprovalStatus::Pending);
        assert!(a.approval_code.starts_with("APV"));
        assert!(a.processed_at.is_none());
    }

    #[test]
    fn approve_stamps_processed_fields() {
        let mut a = pending_approval();
        let now = Utc::now();
        a.approve("admin-2".into(), Some("ok".into()), now).unwrap();
        assert_eq!(a.status, ApprovalStatus::Approved);
        assert_eq!(a.processed_at, Some(now));
        assert_eq!(a.approver_id.as_deref(), Some("admin-2"));
        assert_eq!(a.comment.as_deref(), Some("ok"));
    }

    #[test]
    fn approve_and_reject_are_mutually_exclusive_terminals() {
        let now = Utc::now();

        let mut a = pending_approval();
        a.approve("admin-1".into(), None, now).unwrap();
        assert!(matches!(
            a.reject("admin-1".into(), None, None, now),
            Err(ApiError::InvalidState(_))
        ));
        assert!(a.approve("admin-1".into(), None, now).is_err());

        let mut b = pending_approval();
        b.reject(
            "admin-1".into(),
            Some("over budget".into()),
            Some(RejectionReason::Budget),
            now,
        )
        .unwrap();
        assert_eq!(b.status, ApprovalStatus::Rejected);
        assert_eq!(b.rejection_reason, Some(RejectionReason::Budget));
        assert!(b.approve("admin-1".into(), None, now).is_err());
    }

    #[test]
    fn only_pending_requests_can_be_reassigned() {
        let mut a = pending_approval();
        a.assign_approver("admin-9".into()).unwrap();
        assert_eq!(a.approver_id.as_deref(), Some("admin-9"));
        assert_eq!(a.status, ApprovalStatus::Pending);

        a.approve("admin-9".into(), None, Utc::now()).unwrap();
        assert!(a.assign_approver("admin-3".into()).is_err());
    }
}
