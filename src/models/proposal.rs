use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Draft,
    Submitted,
    UnderReview,
    Negotiating,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 7] = [
        ProposalStatus::Draft,
        ProposalStatus::Submitted,
        ProposalStatus::UnderReview,
        ProposalStatus::Negotiating,
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
        ProposalStatus::Withdrawn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Submitted => "SUBMITTED",
            ProposalStatus::UnderReview => "UNDER_REVIEW",
            ProposalStatus::Negotiating => "NEGOTIATING",
            ProposalStatus::Accepted => "ACCEPTED",
            ProposalStatus::Rejected => "REJECTED",
            ProposalStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

/// A freelancer's bid on a project. At most one proposal per
/// (project, proposer) pair; the handler enforces that with an existence
/// check before insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub proposal_code: String,
    pub project_id: String,
    pub proposer_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub approach_methodology: Option<String>,
    pub deliverables: Option<Vec<String>>,
    pub price: f64,
    pub currency: String,
    pub delivery_days: i32,
    pub milestones: Option<Vec<String>>,
    pub payment_terms: Option<String>,
    pub warranty_period: Option<i32>,
    pub status: ProposalStatus,
    pub attachment_files: Option<Vec<String>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn editable(&self) -> bool {
        self.status == ProposalStatus::Draft
    }

    /// DRAFT -> SUBMITTED after field validation. The caller bumps the
    /// parent project's proposal_count on success.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), ApiError> {
        if self.status != ProposalStatus::Draft {
            return Err(ApiError::InvalidState(
                "Only draft proposals can be submitted".to_string(),
            ));
        }
        self.validate_for_submission()?;
        self.status = ProposalStatus::Submitted;
        self.submitted_at = Some(now);
        Ok(())
    }

    /// SUBMITTED -> UNDER_REVIEW.
    pub fn review(&mut self) -> Result<(), ApiError> {
        if self.status != ProposalStatus::Submitted {
            return Err(ApiError::InvalidState(
                "Only submitted proposals can be reviewed".to_string(),
            ));
        }
        self.status = ProposalStatus::UnderReview;
        Ok(())
    }

    /// UNDER_REVIEW -> NEGOTIATING.
    pub fn start_negotiation(&mut self) -> Result<(), ApiError> {
        if self.status != ProposalStatus::UnderReview {
            return Err(ApiError::InvalidState(
                "Only proposals under review can start negotiation".to_string(),
            ));
        }
        self.status = ProposalStatus::Negotiating;
        Ok(())
    }

    /// UNDER_REVIEW or NEGOTIATING -> ACCEPTED.
    pub fn accept(&mut self) -> Result<(), ApiError> {
        if self.status != ProposalStatus::UnderReview && self.status != ProposalStatus::Negotiating
        {
            return Err(ApiError::InvalidState(
                "Proposal cannot be accepted in current status".to_string(),
            ));
        }
        self.status = ProposalStatus::Accepted;
        Ok(())
    }

    /// Rejectable from any non-terminal status.
    pub fn reject(&mut self) -> Result<(), ApiError> {
        if matches!(
            self.status,
            ProposalStatus::Accepted | ProposalStatus::Rejected | ProposalStatus::Withdrawn
        ) {
            return Err(ApiError::InvalidState(
                "Proposal cannot be rejected in current status".to_string(),
            ));
        }
        self.status = ProposalStatus::Rejected;
        Ok(())
    }

    /// Accepted proposals cannot be withdrawn.
    pub fn withdraw(&mut self) -> Result<(), ApiError> {
        if self.status == ProposalStatus::Accepted {
            return Err(ApiError::InvalidState(
                "Accepted proposals cannot be withdrawn".to_string(),
            ));
        }
        self.status = ProposalStatus::Withdrawn;
        Ok(())
    }

    pub fn deletable(&self) -> bool {
        matches!(
            self.status,
            ProposalStatus::Draft | ProposalStatus::Withdrawn
        )
    }

    fn validate_for_submission(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("Proposal title is required".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(ApiError::Validation(
                "Proposal content is required".to_string(),
            ));
        }
        if self.price <= 0.0 {
            return Err(ApiError::Validation(
                "Proposal price must be greater than zero".to_string(),
            ));
        }
        if self.delivery_days <= 0 {
            return Err(ApiError::Validation(
                "Delivery days must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_proposal() -> Proposal {
    let now = Utc::now();
    Proposal {
        id: "proposal-1".to_string(),
        proposal_code: "PRP-202608-001".to_string(),
        project_id: "project-1".to_string(),
        proposer_id: "freelancer-1".to_string(),
        title: "Storefront rebuild plan".to_string(),
        summary: None,
        content: "Three sprints, weekly demos".to_string(),
        approach_methodology: None,
        deliverables: None,
        price: 1000.0,
        currency: "KRW".to_string(),
        delivery_days: 5,
        milestones: None,
        payment_terms: None,
        warranty_period: None,
        status: ProposalStatus::Draft,
        attachment_files: None,
        submitted_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_validates_required_fields() {
        let now = Utc::now();

        let mut p = sample_proposal();
        p.price = 0.0;
        assert!(matches!(p.submit(now), Err(ApiError::Validation(_))));
        assert_eq!(p.status, ProposalStatus::Draft);

        let mut p = sample_proposal();
        p.delivery_days = 0;
        assert!(matches!(p.submit(now), Err(ApiError::Validation(_))));

        let mut p = sample_proposal();
        p.content = "   ".to_string();
        assert!(matches!(p.submit(now), Err(ApiError::Validation(_))));

        let mut p = sample_proposal();
        p.title = String::new();
        assert!(matches!(p.submit(now), Err(ApiError::Validation(_))));
    }

    #[test]
    fn submit_transitions_draft_to_submitted() {
        let mut p = sample_proposal();
        let now = Utc::now();
        p.submit(now).unwrap();
        assert_eq!(p.status, ProposalStatus::Submitted);
        assert_eq!(p.submitted_at, Some(now));

        // not submittable twice
        assert!(matches!(p.submit(now), Err(ApiError::InvalidState(_))));
    }

    #[test]
    fn review_then_negotiate_then_accept() {
        let mut p = sample_proposal();
        p.submit(Utc::now()).unwrap();
        p.review().unwrap();
        assert_eq!(p.status, ProposalStatus::UnderReview);
        p.start_negotiation().unwrap();
        assert_eq!(p.status, ProposalStatus::Negotiating);
        p.accept().unwrap();
        assert_eq!(p.status, ProposalStatus::Accepted);
    }

    #[test]
    fn accept_requires_review_or_negotiating() {
        let mut p = sample_proposal();
        assert!(p.accept().is_err());
        p.submit(Utc::now()).unwrap();
        assert!(p.accept().is_err());
        p.review().unwrap();
        assert!(p.accept().is_ok());
    }

    #[test]
    fn reject_fails_from_terminal_states() {
        let mut p = sample_proposal();
        p.submit(Utc::now()).unwrap();
        p.review().unwrap();
        p.accept().unwrap();
        assert!(matches!(p.reject(), Err(ApiError::InvalidState(_))));

        let mut p = sample_proposal();
        p.reject().unwrap();
        assert!(p.reject().is_err());

        let mut p = sample_proposal();
        p.withdraw().unwrap();
        assert!(p.reject().is_err());
    }

    #[test]
    fn accepted_proposals_cannot_be_withdrawn() {
        let mut p = sample_proposal();
        p.submit(Utc::now()).unwrap();
        p.review().unwrap();
        p.accept().unwrap();
        assert!(matches!(p.withdraw(), Err(ApiError::InvalidState(_))));
    }

    #[test]
    fn only_draft_or_withdrawn_are_deletable() {
        let mut p = sample_proposal();
        assert!(p.deletable());
        p.submit(Utc::now()).unwrap();
        assert!(!p.deletable());
        p.withdraw().unwrap();
        assert!(p.deletable());
    }
}
