// src/proposals.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{doc, to_document, Document};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::codes;
use crate::error::ApiError;
use crate::models::{
    Notification, NotificationType, Project, ProjectStatus, Proposal, ProposalStatus, RelatedType,
};
use crate::pagination::PageParams;

#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    pub project_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub approach_methodology: Option<String>,
    pub deliverables: Option<Vec<String>>,
    pub price: f64,
    pub currency: Option<String>,
    pub delivery_days: i32,
    pub milestones: Option<Vec<String>>,
    pub payment_terms: Option<String>,
    pub warranty_period: Option<i32>,
    pub attachment_files: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProposalRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub approach_methodology: Option<String>,
    pub deliverables: Option<Vec<String>>,
    pub price: Option<f64>,
    pub delivery_days: Option<i32>,
    pub milestones: Option<Vec<String>>,
    pub payment_terms: Option<String>,
    pub warranty_period: Option<i32>,
    pub attachment_files: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ProposalQuery {
    pub project_id: Option<String>,
    pub proposer_id: Option<String>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

async fn fetch_proposal(data: &AppState, id: &str) -> Result<Proposal, ApiError> {
    data.mongodb
        .proposals()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Proposal", id))
}

async fn persist(data: &AppState, proposal: &mut Proposal) -> Result<(), ApiError> {
    proposal.updated_at = Utc::now();
    let set_doc = to_document(proposal)?;
    data.mongodb
        .proposals()
        .update_one(doc! { "id": &proposal.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

fn search_filter(query: &ProposalQuery) -> Document {
    let mut filter = doc! {};
    if let Some(project_id) = &query.project_id {
        filter.insert("project_id", project_id);
    }
    if let Some(proposer_id) = &query.proposer_id {
        filter.insert("proposer_id", proposer_id);
    }
    if let Some(status) = query.status.as_deref().and_then(ProposalStatus::parse) {
        filter.insert("status", status.as_str());
    }
    filter
}

/// GET /api/proposals
pub async fn search_proposals(
    data: web::Data<AppState>,
    query: web::Query<ProposalQuery>,
) -> Result<HttpResponse, ApiError> {
    let proposals: Vec<Proposal> = data
        .mongodb
        .proposals()
        .find(search_filter(&query))
        .sort(doc! { "created_at": -1 })
        .skip(query.page.skip())
        .limit(query.page.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(proposals))
}

/// GET /api/proposals/{id}
pub async fn get_proposal(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let proposal = fetch_proposal(&data, &id).await?;
    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals
/// The parent project must be IN_BIDDING, and a proposer gets at most one
/// proposal per project.
pub async fn create_proposal(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateProposalRequest>,
) -> Result<HttpResponse, ApiError> {
    let proposer_id = current_user(&req)?;
    let payload = payload.into_inner();

    let project: Project = data
        .mongodb
        .projects()
        .find_one(doc! { "id": &payload.project_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Project", &payload.project_id))?;

    if project.status != ProjectStatus::InBidding {
        return Err(ApiError::InvalidState(
            "Project is not accepting proposals".to_string(),
        ));
    }

    let duplicate = data
        .mongodb
        .proposals()
        .find_one(doc! { "project_id": &project.id, "proposer_id": &proposer_id })
        .await?;
    if duplicate.is_some() {
        return Err(ApiError::Conflict(
            "Proposer has already submitted a proposal for this project".to_string(),
        ));
    }

    let count = data.mongodb.proposals().count_documents(doc! {}).await?;
    let now = Utc::now();
    let proposal = Proposal {
        id: Uuid::new_v4().to_string(),
        proposal_code: codes::proposal_code(count),
        project_id: project.id.clone(),
        proposer_id,
        title: payload.title,
        summary: payload.summary,
        content: payload.content,
        approach_methodology: payload.approach_methodology,
        deliverables: payload.deliverables,
        price: payload.price,
        currency: payload.currency.unwrap_or_else(|| "KRW".to_string()),
        delivery_days: payload.delivery_days,
        milestones: payload.milestones,
        payment_terms: payload.payment_terms,
        warranty_period: payload.warranty_period,
        status: ProposalStatus::Draft,
        attachment_files: payload.attachment_files,
        submitted_at: None,
        created_at: now,
        updated_at: now,
    };

    data.mongodb.proposals().insert_one(&proposal).await?;
    info!(
        "Proposal created: {} for project {}",
        proposal.proposal_code, project.project_code
    );
    Ok(HttpResponse::Ok().json(proposal))
}

/// PUT /api/proposals/{id}
pub async fn update_proposal(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<UpdateProposalRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut proposal = fetch_proposal(&data, &id).await?;
    if !proposal.editable() {
        return Err(ApiError::InvalidState(
            "Only draft proposals can be updated".to_string(),
        ));
    }

    if let Some(title) = payload.title.clone() {
        proposal.title = title;
    }
    if let Some(summary) = payload.summary.clone() {
        proposal.summary = Some(summary);
    }
    if let Some(content) = payload.content.clone() {
        proposal.content = content;
    }
    if let Some(approach) = payload.approach_methodology.clone() {
        proposal.approach_methodology = Some(approach);
    }
    if let Some(deliverables) = payload.deliverables.clone() {
        proposal.deliverables = Some(deliverables);
    }
    if let Some(price) = payload.price {
        proposal.price = price;
    }
    if let Some(delivery_days) = payload.delivery_days {
        proposal.delivery_days = delivery_days;
    }
    if let Some(milestones) = payload.milestones.clone() {
        proposal.milestones = Some(milestones);
    }
    if let Some(payment_terms) = payload.payment_terms.clone() {
        proposal.payment_terms = Some(payment_terms);
    }
    if let Some(warranty_period) = payload.warranty_period {
        proposal.warranty_period = Some(warranty_period);
    }
    if let Some(attachment_files) = payload.attachment_files.clone() {
        proposal.attachment_files = Some(attachment_files);
    }

    persist(&data, &mut proposal).await?;
    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals/{id}/submit
/// On success the parent project's proposal_count goes up by exactly one,
/// and the project's client is notified.
pub async fn submit_proposal(
    req: HttpRequest,
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let actor = current_user(&req)?;
    let mut proposal = fetch_proposal(&data, &id).await?;
    proposal.submit(Utc::now())?;
    persist(&data, &mut proposal).await?;

    data.mongodb
        .projects()
        .update_one(
            doc! { "id": &proposal.project_id },
            doc! { "$inc": { "proposal_count": 1 } },
        )
        .await?;
    info!("Proposal {} submitted", proposal.proposal_code);

    if let Ok(Some(project)) = data
        .mongodb
        .projects()
        .find_one(doc! { "id": &proposal.project_id })
        .await
    {
        let notification = Notification::new(
            project.client_id.clone(),
            Some(actor),
            NotificationType::ProposalReceived,
            "New proposal received".to_string(),
            format!(
                "Proposal {} was submitted for project {}",
                proposal.proposal_code, project.project_code
            ),
            Some((RelatedType::Proposal, proposal.id.clone())),
        );
        // fire-and-forget: a lost notification must not fail the submit
        if let Err(e) = data.mongodb.notifications().insert_one(&notification).await {
            warn!("failed to notify client {}: {}", project.client_id, e);
        }
    }

    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals/{id}/review
pub async fn review_proposal(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut proposal = fetch_proposal(&data, &id).await?;
    proposal.review()?;
    persist(&data, &mut proposal).await?;
    info!("Proposal {} under review", proposal.proposal_code);
    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals/{id}/start-negotiation
pub async fn start_negotiation(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut proposal = fetch_proposal(&data, &id).await?;
    proposal.start_negotiation()?;
    persist(&data, &mut proposal).await?;
    info!("Proposal {} negotiation started", proposal.proposal_code);
    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals/{id}/accept
pub async fn accept_proposal(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut proposal = fetch_proposal(&data, &id).await?;
    proposal.accept()?;
    persist(&data, &mut proposal).await?;
    info!("Proposal {} accepted", proposal.proposal_code);
    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals/{id}/reject
pub async fn reject_proposal(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<RejectRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut proposal = fetch_proposal(&data, &id).await?;
    proposal.reject()?;
    persist(&data, &mut proposal).await?;
    info!(
        "Proposal {} rejected. Reason: {}",
        proposal.proposal_code,
        payload.reason.as_deref().unwrap_or("none given")
    );
    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals/{id}/withdraw
pub async fn withdraw_proposal(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut proposal = fetch_proposal(&data, &id).await?;
    proposal.withdraw()?;
    persist(&data, &mut proposal).await?;
    info!("Proposal {} withdrawn by proposer", proposal.proposal_code);
    Ok(HttpResponse::Ok().json(proposal))
}

/// DELETE /api/proposals/{id}
pub async fn delete_proposal(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let proposal = fetch_proposal(&data, &id).await?;
    if !proposal.deletable() {
        return Err(ApiError::InvalidState(
            "Only draft or withdrawn proposals can be deleted".to_string(),
        ));
    }
    data.mongodb
        .proposals()
        .delete_one(doc! { "id": &proposal.id })
        .await?;
    info!("Proposal {} deleted", proposal.proposal_code);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": proposal.id })))
}

/// GET /api/proposals/statistics
pub async fn proposal_statistics(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let proposals = data.mongodb.proposals();

    let mut status_counts = serde_json::Map::new();
    for status in ProposalStatus::ALL {
        let count = proposals
            .count_documents(doc! { "status": status.as_str() })
            .await?;
        status_counts.insert(status.as_str().to_lowercase(), count.into());
    }

    let total = proposals.count_documents(doc! {}).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "totalProposals": total,
        "statusCounts": status_counts,
    })))
}
