// src/approvals.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{doc, to_document, Document};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::error::ApiError;
use crate::models::{
    Approval, ApprovalStatus, ApprovalTargetType, ApproverRole, Notification, NotificationType,
    RejectionReason, User,
};
use crate::pagination::PageParams;

#[derive(Debug, Deserialize)]
pub struct CreateApprovalRequest {
    pub target_type: String,
    pub target_id: String,
    pub workflow_step: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectApprovalRequest {
    pub reason: Option<String>,
    pub rejection_reason: Option<RejectionReason>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub approver_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalQuery {
    pub status: Option<String>,
    pub target_type: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

async fn fetch_approval(data: &AppState, id: &str) -> Result<Approval, ApiError> {
    data.mongodb
        .approvals()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Approval", id))
}

async fn persist(data: &AppState, approval: &Approval) -> Result<(), ApiError> {
    let set_doc = to_document(approval)?;
    data.mongodb
        .approvals()
        .update_one(doc! { "id": &approval.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

/// Post-approval hooks by target type. These only record the decision for
/// now; flipping the target entity stays a manual follow-up.
fn dispatch_approved(approval: &Approval) {
    match approval.target_type {
        ApprovalTargetType::Project => {
            info!("Project {} approved", approval.target_id);
        }
        ApprovalTargetType::Proposal => {
            info!("Proposal {} approved", approval.target_id);
        }
        ApprovalTargetType::UserRegistration => {
            info!("User registration {} approved", approval.target_id);
        }
        ApprovalTargetType::Contract => {
            info!("Contract {} approved", approval.target_id);
        }
    }
}

/// POST /api/approvals
/// There is no routing hierarchy; new requests go to the first ADMIN.
pub async fn create_approval(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateApprovalRequest>,
) -> Result<HttpResponse, ApiError> {
    let requester_id = current_user(&req)?;
    let payload = payload.into_inner();

    let target_type = ApprovalTargetType::parse(&payload.target_type).ok_or_else(|| {
        ApiError::Validation(format!("Unknown target type: {}", payload.target_type))
    })?;

    let admin: Option<User> = data
        .mongodb
        .users()
        .find_one(doc! { "role": "ADMIN" })
        .await?;
    let approver_id = admin.as_ref().map(|u| u.id.clone());

    let approval = Approval::request(
        target_type,
        payload.target_id,
        payload.workflow_step.unwrap_or(1),
        ApproverRole::Admin,
        approver_id.clone(),
    );
    data.mongodb.approvals().insert_one(&approval).await?;
    info!(
        "Approval {} requested for {} {}",
        approval.approval_code,
        target_type.as_str(),
        approval.target_id
    );

    if let Some(approver_id) = approver_id {
        let notification = Notification::new(
            approver_id.clone(),
            Some(requester_id),
            NotificationType::ApprovalRequest,
            "Approval requested".to_string(),
            format!(
                "Approval {} is waiting for your decision",
                approval.approval_code
            ),
            None,
        );
        if let Err(e) = data.mongodb.notifications().insert_one(&notification).await {
            warn!("failed to notify approver {}: {}", approver_id, e);
        }
    } else {
        warn!(
            "No admin available to assign approval {}",
            approval.approval_code
        );
    }

    Ok(HttpResponse::Ok().json(approval))
}

fn search_filter(query: &ApprovalQuery) -> Document {
    let mut filter = doc! {};
    if let Some(status) = query.status.as_deref().and_then(ApprovalStatus::parse) {
        filter.insert("status", status.as_str());
    }
    if let Some(target_type) = query
        .target_type
        .as_deref()
        .and_then(ApprovalTargetType::parse)
    {
        filter.insert("target_type", target_type.as_str());
    }
    filter
}

/// GET /api/approvals
pub async fn search_approvals(
    data: web::Data<AppState>,
    query: web::Query<ApprovalQuery>,
) -> Result<HttpResponse, ApiError> {
    let approvals: Vec<Approval> = data
        .mongodb
        .approvals()
        .find(search_filter(&query))
        .sort(doc! { "requested_at": -1 })
        .skip(query.page.skip())
        .limit(query.page.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(approvals))
}

/// GET /api/approvals/pending
pub async fn list_pending(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let approvals: Vec<Approval> = data
        .mongodb
        .approvals()
        .find(doc! { "status": "PENDING" })
        .sort(doc! { "requested_at": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(approvals))
}

/// GET /api/approvals/{id}
pub async fn get_approval(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let approval = fetch_approval(&data, &id).await?;
    Ok(HttpResponse::Ok().json(approval))
}

/// POST /api/approvals/{id}/approve
pub async fn approve(
    req: HttpRequest,
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<ApproveRequest>,
) -> Result<HttpResponse, ApiError> {
    let approver_id = current_user(&req)?;
    let mut approval = fetch_approval(&data, &id).await?;
    approval.approve(approver_id, payload.comments.clone(), Utc::now())?;
    persist(&data, &approval).await?;
    dispatch_approved(&approval);
    Ok(HttpResponse::Ok().json(approval))
}

/// POST /api/approvals/{id}/reject
pub async fn reject(
    req: HttpRequest,
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<RejectApprovalRequest>,
) -> Result<HttpResponse, ApiError> {
    let approver_id = current_user(&req)?;
    let mut approval = fetch_approval(&data, &id).await?;
    approval.reject(
        approver_id,
        payload.reason.clone(),
        payload.rejection_reason,
        Utc::now(),
    )?;
    persist(&data, &approval).await?;
    info!("Approval {} rejected", approval.approval_code);
    Ok(HttpResponse::Ok().json(approval))
}

/// POST /api/approvals/{id}/assign
pub async fn assign_approver(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<AssignRequest>,
) -> Result<HttpResponse, ApiError> {
    let approver: Option<User> = data
        .mongodb
        .users()
        .find_one(doc! { "id": &payload.approver_id })
        .await?;
    if approver.is_none() {
        return Err(ApiError::not_found("User", &payload.approver_id));
    }

    let mut approval = fetch_approval(&data, &id).await?;
    approval.assign_approver(payload.approver_id.clone())?;
    persist(&data, &approval).await?;
    info!(
        "Approval {} assigned to {}",
        approval.approval_code, payload.approver_id
    );
    Ok(HttpResponse::Ok().json(approval))
}

/// POST /api/approvals/{id}/escalate
/// Moves a pending request to any admin other than the current approver.
pub async fn escalate(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut approval = fetch_approval(&data, &id).await?;

    let mut filter = doc! { "role": "ADMIN" };
    if let Some(current) = &approval.approver_id {
        filter.insert("id", doc! { "$ne": current });
    }
    let other_admin: User = data
        .mongodb
        .users()
        .find_one(filter)
        .await?
        .ok_or_else(|| ApiError::InvalidState("No other admin to escalate to".to_string()))?;

    approval.assign_approver(other_admin.id.clone())?;
    persist(&data, &approval).await?;
    info!(
        "Approval {} escalated to {}",
        approval.approval_code, other_admin.username
    );
    Ok(HttpResponse::Ok().json(approval))
}

/// GET /api/approvals/statistics
pub async fn approval_statistics(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let approvals = data.mongodb.approvals();

    let mut status_counts = serde_json::Map::new();
    for status in ApprovalStatus::ALL {
        let count = approvals
            .count_documents(doc! { "status": status.as_str() })
            .await?;
        status_counts.insert(status.as_str().to_lowercase(), count.into());
    }

    let mut target_counts = serde_json::Map::new();
    for target_type in ApprovalTargetType::ALL {
        let count = approvals
            .count_documents(doc! { "target_type": target_type.as_str() })
            .await?;
        target_counts.insert(target_type.as_str().to_lowercase(), count.into());
    }

    let total = approvals.count_documents(doc! {}).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "totalApprovals": total,
        "statusCounts": status_counts,
        "targetTypeCounts": target_counts,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_filter_is_ignored() {
        let query = ApprovalQuery {
            status: Some("BOGUS".into()),
            target_type: None,
            page: PageParams::default(),
        };
        assert_eq!(search_filter(&query), doc! {});

        let query = ApprovalQuery {
            status: Some("pending".into()),
            target_type: Some("user_registration".into()),
            page: PageParams::default(),
        };
        assert_eq!(
            search_filter(&query),
            doc! { "status": "PENDING", "target_type": "USER_REGISTRATION" }
        );
    }
}
