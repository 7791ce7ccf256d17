use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ProjectCreated,
    ProposalReceived,
    ApprovalRequest,
    ContractSigned,
    PaymentDue,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelatedType {
    Project,
    Proposal,
    Contract,
    User,
    Board,
}

/// Fire-and-forget message for a recipient, optionally linking a related
/// entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub sender_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_type: Option<RelatedType>,
    pub related_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: String,
        sender_id: Option<String>,
        kind: NotificationType,
        title: String,
        message: String,
        related: Option<(RelatedType, String)>,
    ) -> Self {
        let (related_type, related_id) = match related {
            Some((t, id)) => (Some(t), Some(id)),
            None => (None, None),
        };
        Notification {
            id: Uuid::new_v4().to_string(),
            recipient_id,
            sender_id,
            kind,
            title,
            message,
            related_type,
            related_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
