mod approval;
mod board;
mod contract;
mod negotiation;
mod notification;
pub(crate) mod project;
pub(crate) mod proposal;
mod system_setting;
mod user;

pub use approval::{
    Approval, ApprovalStatus, ApprovalTargetType, ApproverRole, RejectionReason,
};
pub use board::{build_reply_tree, Board, BoardCategory, Comment, CommentNode, PostStatus};
pub use contract::{Contract, ContractStatus};
pub use negotiation::{Negotiation, NegotiationOffer, NegotiationStatus};
pub use notification::{Notification, NotificationType, RelatedType};
pub use project::{Project, ProjectCategory, ProjectPriority, ProjectStatus};
pub use proposal::{Proposal, ProposalStatus};
pub use system_setting::SystemSetting;
pub use user::{User, UserRole, UserStatus};
