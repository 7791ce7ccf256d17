use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Active,
    Completed,
    Terminated,
    Suspended,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 5] = [
        ContractStatus::Draft,
        ContractStatus::Active,
        ContractStatus::Completed,
        ContractStatus::Terminated,
        ContractStatus::Suspended,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Draft => "DRAFT",
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Completed => "COMPLETED",
            ContractStatus::Terminated => "TERMINATED",
            ContractStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

/// Binds a project, its winning proposal, the client and the contractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub contract_code: String,
    pub project_id: String,
    pub proposal_id: String,
    pub client_id: String,
    pub contractor_id: String,
    pub final_price: f64,
    pub currency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_schedule: Option<String>,
    pub terms_and_conditions: Option<String>,
    pub status: ContractStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    /// DRAFT -> ACTIVE, stamping signed_at.
    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<(), ApiError> {
        if self.status != ContractStatus::Draft {
            return Err(ApiError::InvalidState(
                "Only draft contracts can be activated".to_string(),
            ));
        }
        self.status = ContractStatus::Active;
        self.signed_at = Some(now);
        Ok(())
    }

    /// ACTIVE -> COMPLETED, stamping completed_at.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), ApiError> {
        if self.status != ContractStatus::Active {
            return Err(ApiError::InvalidState(
                "Only active contracts can be completed".to_string(),
            ));
        }
        self.status = ContractStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// ACTIVE or SUSPENDED -> TERMINATED.
    pub fn terminate(&mut self) -> Result<(), ApiError> {
        if self.status != ContractStatus::Active && self.status != ContractStatus::Suspended {
            return Err(ApiError::InvalidState(
                "Only active or suspended contracts can be terminated".to_string(),
            ));
        }
        self.status = ContractStatus::Terminated;
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<(), ApiError> {
        if self.status != ContractStatus::Active {
            return Err(ApiError::InvalidState(
                "Only active contracts can be suspended".to_string(),
            ));
        }
        self.status = ContractStatus::Suspended;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), ApiError> {
        if self.status != ContractStatus::Suspended {
            return Err(ApiError::InvalidState(
                "Only suspended contracts can be resumed".to_string(),
            ));
        }
        self.status = ContractStatus::Active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft_contract() -> Contract {
        let now = Utc::now();
        Contract {
            id: "contract-1".to_string(),
            contract_code: "CTR-202608-001".to_string(),
            project_id: "project-1".to_string(),
            proposal_id: "proposal-1".to_string(),
            client_id: "client-1".to_string(),
            contractor_id: "freelancer-1".to_string(),
            final_price: 950.0,
            currency: "KRW".to_string(),
            start_date: now,
            end_date: now + Duration::days(30),
            payment_schedule: None,
            terms_and_conditions: None,
            status: ContractStatus::Draft,
            signed_at: None,
            completed_at: None,
            created_at: now,
        }
    }

    #[test]
    fn lifecycle_draft_active_completed() {
        let mut c = draft_contract();
        let now = Utc::now();
        c.activate(now).unwrap();
        assert_eq!(c.status, ContractStatus::Active);
        assert_eq!(c.signed_at, Some(now));
        assert!(c.activate(now).is_err());

        c.complete(now).unwrap();
        assert_eq!(c.status, ContractStatus::Completed);
        assert_eq!(c.completed_at, Some(now));
        assert!(c.terminate().is_err());
    }

    #[test]
    fn suspend_resume_terminate() {
        let mut c = draft_contract();
        c.activate(Utc::now()).unwrap();
        c.suspend().unwrap();
        assert!(c.suspend().is_err());
        c.resume().unwrap();
        c.suspend().unwrap();
        c.terminate().unwrap();
        assert_eq!(c.status, ContractStatus::Terminated);
    }

    #[test]
    fn draft_cannot_complete_or_terminate() {
        let mut c = draft_contract();
        assert!(c.complete(Utc::now()).is_err());
        assert!(c.terminate().is_err());
        assert!(c.resume().is_err());
    }
}
