// src/negotiations.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, to_document};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::error::ApiError;
use crate::models::{Negotiation, NegotiationOffer, Proposal};

#[derive(Debug, Deserialize)]
pub struct OpenNegotiationRequest {
    pub proposal_id: String,
    pub to_user_id: String,
    pub price: f64,
    pub delivery_days: i32,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CounterOfferRequest {
    pub price: f64,
    pub delivery_days: i32,
    pub message: Option<String>,
}

async fn fetch_negotiation(data: &AppState, id: &str) -> Result<Negotiation, ApiError> {
    data.mongodb
        .negotiations()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Negotiation", id))
}

async fn fetch_proposal(data: &AppState, id: &str) -> Result<Proposal, ApiError> {
    data.mongodb
        .proposals()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Proposal", id))
}

async fn persist_negotiation(data: &AppState, negotiation: &Negotiation) -> Result<(), ApiError> {
    let set_doc = to_document(negotiation)?;
    data.mongodb
        .negotiations()
        .update_one(doc! { "id": &negotiation.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

async fn persist_proposal(data: &AppState, proposal: &mut Proposal) -> Result<(), ApiError> {
    proposal.updated_at = Utc::now();
    let set_doc = to_document(proposal)?;
    data.mongodb
        .proposals()
        .update_one(doc! { "id": &proposal.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

/// POST /api/negotiations
/// Opens round 1 on a proposal; the proposal moves to NEGOTIATING.
pub async fn open_negotiation(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<OpenNegotiationRequest>,
) -> Result<HttpResponse, ApiError> {
    let from_user_id = current_user(&req)?;
    let payload = payload.into_inner();

    let mut proposal = fetch_proposal(&data, &payload.proposal_id).await?;
    let negotiation = Negotiation::open(
        &mut proposal,
        from_user_id,
        payload.to_user_id,
        NegotiationOffer {
            price: payload.price,
            delivery_days: payload.delivery_days,
            message: payload.message,
        },
    )?;

    data.mongodb.negotiations().insert_one(&negotiation).await?;
    persist_proposal(&data, &mut proposal).await?;
    info!(
        "Negotiation opened on proposal {} (round {})",
        proposal.proposal_code, negotiation.round_number
    );
    Ok(HttpResponse::Ok().json(negotiation))
}

/// POST /api/negotiations/{id}/counter
/// The answered round becomes COUNTERED; the response is the new PENDING
/// round addressed back to the previous sender.
pub async fn counter_offer(
    req: HttpRequest,
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<CounterOfferRequest>,
) -> Result<HttpResponse, ApiError> {
    let from_user_id = current_user(&req)?;
    let payload = payload.into_inner();

    let mut negotiation = fetch_negotiation(&data, &id).await?;
    let next_round = negotiation.counter(
        from_user_id,
        NegotiationOffer {
            price: payload.price,
            delivery_days: payload.delivery_days,
            message: payload.message,
        },
    )?;

    persist_negotiation(&data, &negotiation).await?;
    data.mongodb.negotiations().insert_one(&next_round).await?;
    info!(
        "Counter-offer on proposal {} (round {})",
        next_round.proposal_id, next_round.round_number
    );
    Ok(HttpResponse::Ok().json(next_round))
}

/// POST /api/negotiations/{id}/accept
/// The accepted round's terms are written back onto the proposal, which
/// becomes ACCEPTED.
pub async fn accept_negotiation(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut negotiation = fetch_negotiation(&data, &id).await?;
    let mut proposal = fetch_proposal(&data, &negotiation.proposal_id).await?;

    negotiation.accept(&mut proposal)?;
    persist_negotiation(&data, &negotiation).await?;
    persist_proposal(&data, &mut proposal).await?;
    info!(
        "Negotiation round {} accepted on proposal {} at {}",
        negotiation.round_number, proposal.proposal_code, negotiation.price
    );
    Ok(HttpResponse::Ok().json(negotiation))
}

/// POST /api/negotiations/{id}/reject
pub async fn reject_negotiation(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut negotiation = fetch_negotiation(&data, &id).await?;
    negotiation.reject()?;
    persist_negotiation(&data, &negotiation).await?;
    info!(
        "Negotiation round {} rejected on proposal {}",
        negotiation.round_number, negotiation.proposal_id
    );
    Ok(HttpResponse::Ok().json(negotiation))
}

/// GET /api/negotiations/proposal/{proposal_id}
/// Full history in round order.
pub async fn list_by_proposal(
    data: web::Data<AppState>,
    proposal_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let rounds: Vec<Negotiation> = data
        .mongodb
        .negotiations()
        .find(doc! { "proposal_id": proposal_id.as_str() })
        .sort(doc! { "round_number": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(rounds))
}
