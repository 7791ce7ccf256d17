use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectCategory {
    Web,
    Mobile,
    System,
    Design,
    Consulting,
}

impl ProjectCategory {
    pub const ALL: [ProjectCategory; 5] = [
        ProjectCategory::Web,
        ProjectCategory::Mobile,
        ProjectCategory::System,
        ProjectCategory::Design,
        ProjectCategory::Consulting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectCategory::Web => "WEB",
            ProjectCategory::Mobile => "MOBILE",
            ProjectCategory::System => "SYSTEM",
            ProjectCategory::Design => "DESIGN",
            ProjectCategory::Consulting => "CONSULTING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Draft,
    Published,
    InBidding,
    Awarded,
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 7] = [
        ProjectStatus::Draft,
        ProjectStatus::Published,
        ProjectStatus::InBidding,
        ProjectStatus::Awarded,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Draft => "DRAFT",
            ProjectStatus::Published => "PUBLISHED",
            ProjectStatus::InBidding => "IN_BIDDING",
            ProjectStatus::Awarded => "AWARDED",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

/// A client's job posting. Lifecycle:
/// DRAFT -> PUBLISHED -> IN_BIDDING -> AWARDED -> IN_PROGRESS -> COMPLETED,
/// with CANCELLED reachable from anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub project_code: String,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub client_id: String,
    pub created_by: String,
    pub category: ProjectCategory,
    pub priority: ProjectPriority,
    pub status: ProjectStatus,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub currency: String,
    pub deadline: Option<DateTime<Utc>>,
    pub bidding_deadline: Option<DateTime<Utc>>,
    pub required_skills: Option<Vec<String>>,
    pub attachment_files: Option<Vec<String>>,
    pub view_count: i64,
    pub proposal_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Only DRAFT projects may publish.
    pub fn publish(&mut self) -> Result<(), ApiError> {
        if self.status != ProjectStatus::Draft {
            return Err(ApiError::InvalidState(
                "Only draft projects can be published".to_string(),
            ));
        }
        self.status = ProjectStatus::Published;
        Ok(())
    }

    /// Only PUBLISHED projects may enter bidding. A missing bidding
    /// deadline defaults to seven days out.
    pub fn start_bidding(&mut self, now: DateTime<Utc>) -> Result<(), ApiError> {
        if self.status != ProjectStatus::Published {
            return Err(ApiError::InvalidState(
                "Only published projects can start bidding".to_string(),
            ));
        }
        self.status = ProjectStatus::InBidding;
        if self.bidding_deadline.is_none() {
            self.bidding_deadline = Some(now + Duration::days(7));
        }
        Ok(())
    }

    /// Only IN_BIDDING projects may be awarded. Winner existence is checked
    /// by the caller; awarding does not create a contract.
    pub fn award(&mut self) -> Result<(), ApiError> {
        if self.status != ProjectStatus::InBidding {
            return Err(ApiError::InvalidState(
                "Only bidding projects can be awarded".to_string(),
            ));
        }
        self.status = ProjectStatus::Awarded;
        Ok(())
    }

    // complete and cancel are deliberately unguarded.
    pub fn complete(&mut self) {
        self.status = ProjectStatus::Completed;
    }

    pub fn cancel(&mut self) {
        self.status = ProjectStatus::Cancelled;
    }

    pub fn deletable(&self) -> bool {
        matches!(self.status, ProjectStatus::Draft | ProjectStatus::Cancelled)
    }
}

#[cfg(test)]
pub(crate) fn sample_project() -> Project {
    let now = Utc::now();
    Project {
        id: "project-1".to_string(),
        project_code: "PRJ-202608-001".to_string(),
        title: "Marketplace revamp".to_string(),
        description: "Rebuild the storefront".to_string(),
        requirements: None,
        client_id: "client-1".to_string(),
        created_by: "client-1".to_string(),
        category: ProjectCategory::Web,
        priority: ProjectPriority::Medium,
        status: ProjectStatus::Draft,
        budget_min: Some(1_000.0),
        budget_max: Some(5_000.0),
        currency: "KRW".to_string(),
        deadline: None,
        bidding_deadline: None,
        required_skills: None,
        attachment_files: None,
        view_count: 0,
        proposal_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_requires_draft() {
        let mut project = sample_project();
        let before = project.clone();

        assert!(project.publish().is_ok());
        assert_eq!(project.status, ProjectStatus::Published);
        // no other field changes
        assert_eq!(project.title, before.title);
        assert_eq!(project.view_count, before.view_count);
        assert_eq!(project.proposal_count, before.proposal_count);

        let err = project.publish().unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[test]
    fn start_bidding_requires_published_and_defaults_deadline() {
        let mut project = sample_project();
        assert!(matches!(
            project.start_bidding(Utc::now()),
            Err(ApiError::InvalidState(_))
        ));

        project.publish().unwrap();
        let now = Utc::now();
        project.start_bidding(now).unwrap();
        assert_eq!(project.status, ProjectStatus::InBidding);
        assert_eq!(project.bidding_deadline, Some(now + Duration::days(7)));
    }

    #[test]
    fn start_bidding_keeps_explicit_deadline() {
        let mut project = sample_project();
        let explicit = Utc::now() + Duration::days(3);
        project.bidding_deadline = Some(explicit);
        project.publish().unwrap();
        project.start_bidding(Utc::now()).unwrap();
        assert_eq!(project.bidding_deadline, Some(explicit));
    }

    #[test]
    fn award_requires_in_bidding() {
        let mut project = sample_project();
        assert!(project.award().is_err());

        project.publish().unwrap();
        project.start_bidding(Utc::now()).unwrap();
        project.award().unwrap();
        assert_eq!(project.status, ProjectStatus::Awarded);
    }

    #[test]
    fn complete_and_cancel_are_unguarded() {
        let mut project = sample_project();
        project.complete();
        assert_eq!(project.status, ProjectStatus::Completed);
        project.cancel();
        assert_eq!(project.status, ProjectStatus::Cancelled);
    }

    #[test]
    fn only_draft_or_cancelled_are_deletable() {
        let mut project = sample_project();
        assert!(project.deletable());
        project.publish().unwrap();
        assert!(!project.deletable());
        project.cancel();
        assert!(project.deletable());
    }

    #[test]
    fn status_round_trips_through_serde() {
        let json = serde_json::to_string(&ProjectStatus::InBidding).unwrap();
        assert_eq!(json, "\"IN_BIDDING\"");
        let back: ProjectStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProjectStatus::InBidding);
    }
}
