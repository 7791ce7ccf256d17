// src/contracts.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use futures_util::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{doc, to_document};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::codes;
use crate::error::ApiError;
use crate::models::{
    Contract, ContractStatus, Notification, NotificationType, Project, Proposal, ProposalStatus,
    RelatedType,
};
use crate::pagination::PageParams;

#[derive(Debug, Deserialize)]
pub struct CreateContractRequest {
    pub project_id: String,
    pub proposal_id: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub payment_schedule: Option<String>,
    pub terms_and_conditions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TerminateRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContractQuery {
    pub status: Option<String>,
    pub client_id: Option<String>,
    pub contractor_id: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

async fn fetch_contract(data: &AppState, id: &str) -> Result<Contract, ApiError> {
    data.mongodb
        .contracts()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Contract", id))
}

async fn persist(data: &AppState, contract: &Contract) -> Result<(), ApiError> {
    let set_doc = to_document(contract)?;
    data.mongodb
        .contracts()
        .update_one(doc! { "id": &contract.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

/// POST /api/contracts
/// The proposal must be ACCEPTED and belong to the named project; parties
/// and the final price are copied from the pair.
pub async fn create_contract(
    data: web::Data<AppState>,
    payload: web::Json<CreateContractRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let project: Project = data
        .mongodb
        .projects()
        .find_one(doc! { "id": &payload.project_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Project", &payload.project_id))?;
    let proposal: Proposal = data
        .mongodb
        .proposals()
        .find_one(doc! { "id": &payload.proposal_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Proposal", &payload.proposal_id))?;

    if proposal.project_id != project.id {
        return Err(ApiError::Validation(
            "Proposal does not belong to the project".to_string(),
        ));
    }
    if proposal.status != ProposalStatus::Accepted {
        return Err(ApiError::InvalidState(
            "Only accepted proposals can be contracted".to_string(),
        ));
    }

    let count = data.mongodb.contracts().count_documents(doc! {}).await?;
    let now = Utc::now();
    let start_date = payload.start_date.unwrap_or(now);
    let contract = Contract {
        id: Uuid::new_v4().to_string(),
        contract_code: codes::contract_code(count),
        project_id: project.id.clone(),
        proposal_id: proposal.id.clone(),
        client_id: project.client_id.clone(),
        contractor_id: proposal.proposer_id.clone(),
        final_price: proposal.price,
        currency: proposal.currency.clone(),
        start_date,
        end_date: payload
            .end_date
            .unwrap_or_else(|| start_date + Duration::days(proposal.delivery_days as i64)),
        payment_schedule: payload.payment_schedule,
        terms_and_conditions: payload.terms_and_conditions,
        status: ContractStatus::Draft,
        signed_at: None,
        completed_at: None,
        created_at: now,
    };

    data.mongodb.contracts().insert_one(&contract).await?;
    info!(
        "Contract {} drafted for project {} / proposal {}",
        contract.contract_code, project.project_code, proposal.proposal_code
    );
    Ok(HttpResponse::Ok().json(contract))
}

/// GET /api/contracts
pub async fn search_contracts(
    data: web::Data<AppState>,
    query: web::Query<ContractQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut filter = doc! {};
    if let Some(status) = query.status.as_deref().and_then(ContractStatus::parse) {
        filter.insert("status", status.as_str());
    }
    if let Some(client_id) = &query.client_id {
        filter.insert("client_id", client_id);
    }
    if let Some(contractor_id) = &query.contractor_id {
        filter.insert("contractor_id", contractor_id);
    }

    let contracts: Vec<Contract> = data
        .mongodb
        .contracts()
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(query.page.skip())
        .limit(query.page.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(contracts))
}

/// GET /api/contracts/{id}
pub async fn get_contract(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let contract = fetch_contract(&data, &id).await?;
    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/activate
/// Signing the contract notifies both parties.
pub async fn activate_contract(
    req: HttpRequest,
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let actor = current_user(&req)?;
    let mut contract = fetch_contract(&data, &id).await?;
    contract.activate(Utc::now())?;
    persist(&data, &contract).await?;
    info!("Contract {} signed", contract.contract_code);

    for recipient in [&contract.client_id, &contract.contractor_id] {
        let notification = Notification::new(
            recipient.clone(),
            Some(actor.clone()),
            NotificationType::ContractSigned,
            "Contract signed".to_string(),
            format!("Contract {} is now active", contract.contract_code),
            Some((RelatedType::Contract, contract.id.clone())),
        );
        if let Err(e) = data.mongodb.notifications().insert_one(&notification).await {
            warn!("failed to notify {}: {}", recipient, e);
        }
    }

    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/complete
pub async fn complete_contract(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut contract = fetch_contract(&data, &id).await?;
    contract.complete(Utc::now())?;
    persist(&data, &contract).await?;
    info!("Contract {} completed", contract.contract_code);
    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/terminate
pub async fn terminate_contract(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<TerminateRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut contract = fetch_contract(&data, &id).await?;
    contract.terminate()?;
    persist(&data, &contract).await?;
    info!(
        "Contract {} terminated. Reason: {}",
        contract.contract_code,
        payload.reason.as_deref().unwrap_or("none given")
    );
    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/suspend
pub async fn suspend_contract(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut contract = fetch_contract(&data, &id).await?;
    contract.suspend()?;
    persist(&data, &contract).await?;
    info!("Contract {} suspended", contract.contract_code);
    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/resume
pub async fn resume_contract(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut contract = fetch_contract(&data, &id).await?;
    contract.resume()?;
    persist(&data, &contract).await?;
    info!("Contract {} resumed", contract.contract_code);
    Ok(HttpResponse::Ok().json(contract))
}
