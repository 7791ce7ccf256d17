use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Proposal, ProposalStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationStatus {
    Pending,
    Accepted,
    Rejected,
    Countered,
}

impl NegotiationStatus {
    pub const ALL: [NegotiationStatus; 4] = [
        NegotiationStatus::Pending,
        NegotiationStatus::Accepted,
        NegotiationStatus::Rejected,
        NegotiationStatus::Countered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NegotiationStatus::Pending => "PENDING",
            NegotiationStatus::Accepted => "ACCEPTED",
            NegotiationStatus::Rejected => "REJECTED",
            NegotiationStatus::Countered => "COUNTERED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

/// One round of the counter-offer protocol anchored to a proposal. Round
/// numbers per proposal form a strictly increasing sequence starting at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Negotiation {
    pub id: String,
    pub proposal_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub round_number: i32,
    pub price: f64,
    pub delivery_days: i32,
    pub message: Option<String>,
    pub status: NegotiationStatus,
    pub created_at: DateTime<Utc>,
}

pub struct NegotiationOffer {
    pub price: f64,
    pub delivery_days: i32,
    pub message: Option<String>,
}

impl Negotiation {
    /// Opens round 1 on a proposal that is SUBMITTED or UNDER_REVIEW, and
    /// moves the proposal to NEGOTIATING.
    pub fn open(
        proposal: &mut Proposal,
        from_user_id: String,
        to_user_id: String,
        offer: NegotiationOffer,
    ) -> Result<Negotiation, ApiError> {
        if proposal.status != ProposalStatus::Submitted
            && proposal.status != ProposalStatus::UnderReview
        {
            return Err(ApiError::InvalidState(
                "Cannot negotiate on proposal with current status".to_string(),
            ));
        }
        proposal.status = ProposalStatus::Negotiating;

        Ok(Negotiation {
            id: Uuid::new_v4().to_string(),
            proposal_id: proposal.id.clone(),
            from_user_id,
            to_user_id,
            round_number: 1,
            price: offer.price,
            delivery_days: offer.delivery_days,
            message: offer.message,
            status: NegotiationStatus::Pending,
            created_at: Utc::now(),
        })
    }

    /// Answers a PENDING round with a counter-offer: this round becomes
    /// COUNTERED and a fresh PENDING round with the next number is
    /// returned. The new round must itself be acceptable, so it starts
    /// PENDING rather than inheriting COUNTERED.
    pub fn counter(
        &mut self,
        from_user_id: String,
        offer: NegotiationOffer,
    ) -> Result<Negotiation, ApiError> {
        if self.status != NegotiationStatus::Pending {
            return Err(ApiError::InvalidState(
                "Can only counter pending negotiations".to_string(),
            ));
        }
        self.status = NegotiationStatus::Countered;

        Ok(Negotiation {
            id: Uuid::new_v4().to_string(),
            proposal_id: self.proposal_id.clone(),
            // the counter goes back to whoever sent the round being answered
            to_user_id: self.from_user_id.clone(),
            from_user_id,
            round_number: self.round_number + 1,
            price: offer.price,
            delivery_days: offer.delivery_days,
            message: offer.message,
            status: NegotiationStatus::Pending,
            created_at: Utc::now(),
        })
    }

    /// Accepting a PENDING round writes its terms back onto the proposal
    /// and marks the proposal ACCEPTED.
    pub fn accept(&mut self, proposal: &mut Proposal) -> Result<(), ApiError> {
        if self.status != NegotiationStatus::Pending {
            return Err(ApiError::InvalidState(
                "Can only accept pending negotiations".to_string(),
            ));
        }
        self.status = NegotiationStatus::Accepted;
        proposal.price = self.price;
        proposal.delivery_days = self.delivery_days;
        proposal.status = ProposalStatus::Accepted;
        Ok(())
    }

    /// PENDING -> REJECTED; no side effect on the proposal.
    pub fn reject(&mut self) -> Result<(), ApiError> {
        if self.status != NegotiationStatus::Pending {
            return Err(ApiError::InvalidState(
                "Can only reject pending negotiations".to_string(),
            ));
        }
        self.status = NegotiationStatus::Rejected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proposal::sample_proposal;

    fn offer(price: f64, days: i32) -> NegotiationOffer {
        NegotiationOffer {
            price,
            delivery_days: days,
            message: None,
        }
    }

    #[test]
    fn open_requires_submitted_or_under_review() {
        let mut proposal = sample_proposal();
        // DRAFT proposal cannot be negotiated
        let err = Negotiation::open(
            &mut proposal,
            "client-1".into(),
            "freelancer-1".into(),
            offer(900.0, 5),
        );
        assert!(matches!(err, Err(ApiError::InvalidState(_))));
        assert_eq!(proposal.status, ProposalStatus::Draft);

        proposal.submit(Utc::now()).unwrap();
        let n = Negotiation::open(
            &mut proposal,
            "client-1".into(),
            "freelancer-1".into(),
            offer(900.0, 5),
        )
        .unwrap();
        assert_eq!(n.round_number, 1);
        assert_eq!(n.status, NegotiationStatus::Pending);
        assert_eq!(proposal.status, ProposalStatus::Negotiating);
    }

    #[test]
    fn counter_marks_exactly_one_prior_round() {
        let mut proposal = sample_proposal();
        proposal.submit(Utc::now()).unwrap();
        let mut first = Negotiation::open(
            &mut proposal,
            "client-1".into(),
            "freelancer-1".into(),
            offer(900.0, 5),
        )
        .unwrap();

        let second = first.counter("freelancer-1".into(), offer(950.0, 5)).unwrap();
        assert_eq!(first.status, NegotiationStatus::Countered);
        assert_eq!(second.status, NegotiationStatus::Pending);
        assert_eq!(second.round_number, 2);
        assert_eq!(second.to_user_id, "client-1");

        // a countered round cannot be countered again
        assert!(first.counter("freelancer-1".into(), offer(960.0, 5)).is_err());
    }

    #[test]
    fn rounds_increase_strictly_from_one() {
        let mut proposal = sample_proposal();
        proposal.submit(Utc::now()).unwrap();
        let mut round = Negotiation::open(
            &mut proposal,
            "client-1".into(),
            "freelancer-1".into(),
            offer(900.0, 5),
        )
        .unwrap();
        assert_eq!(round.round_number, 1);
        for expected in 2..6 {
            round = round.counter("other".into(), offer(900.0, 5)).unwrap();
            assert_eq!(round.round_number, expected);
        }
    }

    #[test]
    fn accept_writes_terms_back_onto_proposal() {
        let mut proposal = sample_proposal();
        proposal.submit(Utc::now()).unwrap();
        let mut first = Negotiation::open(
            &mut proposal,
            "client-1".into(),
            "freelancer-1".into(),
            offer(900.0, 7),
        )
        .unwrap();
        let mut second = first.counter("freelancer-1".into(), offer(950.0, 6)).unwrap();

        second.accept(&mut proposal).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Accepted);
        assert_eq!(proposal.price, 950.0);
        assert_eq!(proposal.delivery_days, 6);
        assert_eq!(second.status, NegotiationStatus::Accepted);
    }

    #[test]
    fn accept_twice_fails() {
        let mut proposal = sample_proposal();
        proposal.submit(Utc::now()).unwrap();
        let mut n = Negotiation::open(
            &mut proposal,
            "client-1".into(),
            "freelancer-1".into(),
            offer(900.0, 5),
        )
        .unwrap();
        n.accept(&mut proposal).unwrap();
        assert!(matches!(
            n.accept(&mut proposal),
            Err(ApiError::InvalidState(_))
        ));
    }

    #[test]
    fn reject_has_no_proposal_side_effect() {
        let mut proposal = sample_proposal();
        proposal.submit(Utc::now()).unwrap();
        let mut n = Negotiation::open(
            &mut proposal,
            "client-1".into(),
            "freelancer-1".into(),
            offer(900.0, 5),
        )
        .unwrap();
        let price_before = proposal.price;
        n.reject().unwrap();
        assert_eq!(n.status, NegotiationStatus::Rejected);
        assert_eq!(proposal.status, ProposalStatus::Negotiating);
        assert_eq!(proposal.price, price_before);
        assert!(n.reject().is_err());
    }

    // end-to-end: create project -> bidding -> proposal -> negotiate ->
    // counter -> accept, per the workflow the API drives.
    #[test]
    fn full_negotiation_scenario() {
        use crate::models::project::sample_project;

        let mut project = sample_project();
        project.publish().unwrap();
        project.start_bidding(Utc::now()).unwrap();

        let mut proposal = sample_proposal();
        proposal.price = 1000.0;
        proposal.delivery_days = 5;
        proposal.submit(Utc::now()).unwrap();

        let proposer_id = proposal.proposer_id.clone();
        let mut first = Negotiation::open(
            &mut proposal,
            project.client_id.clone(),
            proposer_id,
            offer(900.0, 5),
        )
        .unwrap();
        let mut counter = first
            .counter(proposal.proposer_id.clone(), offer(950.0, 5))
            .unwrap();
        counter.accept(&mut proposal).unwrap();

        assert_eq!(proposal.status, ProposalStatus::Accepted);
        assert_eq!(proposal.price, 950.0);
        assert_eq!(proposal.delivery_days, counter.delivery_days);
    }
}
