// src/users.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, to_document, Document};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::{User, UserRole, UserStatus};
use crate::pagination::PageParams;
use crate::projects::regex_escape;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub keyword: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SuspendRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub business_type: Option<String>,
    pub profile_image: Option<String>,
    pub introduction: Option<String>,
    pub skills: Option<Vec<String>>,
}

async fn fetch_user(data: &AppState, id: &str) -> Result<User, ApiError> {
    data.mongodb
        .users()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))
}

async fn persist(data: &AppState, user: &mut User) -> Result<(), ApiError> {
    user.updated_at = Utc::now();
    let set_doc = to_document(user)?;
    data.mongodb
        .users()
        .update_one(doc! { "id": &user.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

fn search_filter(query: &UserQuery) -> Document {
    let mut filter = doc! {};
    if let Some(role) = query.role.as_deref().and_then(UserRole::parse) {
        filter.insert("role", role.as_str());
    }
    if let Some(status) = query.status.as_deref().and_then(UserStatus::parse) {
        filter.insert("status", status.as_str());
    }
    if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.is_empty()) {
        let pattern = regex_escape(keyword);
        filter.insert(
            "$or",
            vec![
                doc! { "username": { "$regex": &pattern, "$options": "i" } },
                doc! { "email": { "$regex": &pattern, "$options": "i" } },
                doc! { "company_name": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }
    filter
}

/// GET /api/users
pub async fn search_users(
    data: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ApiError> {
    let users: Vec<User> = data
        .mongodb
        .users()
        .find(search_filter(&query))
        .sort(doc! { "created_at": -1 })
        .skip(query.page.skip())
        .limit(query.page.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/users/{id}
pub async fn get_user(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = fetch_user(&data, &id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// PUT /api/users/{id}
pub async fn update_profile(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut user = fetch_user(&data, &id).await?;

    if let Some(phone) = payload.phone.clone() {
        user.phone = Some(phone);
    }
    if let Some(company_name) = payload.company_name.clone() {
        user.company_name = Some(company_name);
    }
    if let Some(business_type) = payload.business_type.clone() {
        user.business_type = Some(business_type);
    }
    if let Some(profile_image) = payload.profile_image.clone() {
        user.profile_image = Some(profile_image);
    }
    if let Some(introduction) = payload.introduction.clone() {
        user.introduction = Some(introduction);
    }
    if let Some(skills) = payload.skills.clone() {
        user.skills = Some(skills);
    }

    persist(&data, &mut user).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/users/{id}/activate
pub async fn activate_user(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut user = fetch_user(&data, &id).await?;
    if user.status == UserStatus::Withdrawn {
        return Err(ApiError::InvalidState(
            "Withdrawn users cannot be reactivated".to_string(),
        ));
    }
    user.status = UserStatus::Active;
    persist(&data, &mut user).await?;
    info!("User {} activated", user.username);
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/users/{id}/suspend
pub async fn suspend_user(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<SuspendRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut user = fetch_user(&data, &id).await?;
    if user.status != UserStatus::Active {
        return Err(ApiError::InvalidState(
            "Only active users can be suspended".to_string(),
        ));
    }
    user.status = UserStatus::Suspended;
    persist(&data, &mut user).await?;
    info!(
        "User {} suspended. Reason: {}",
        user.username,
        payload.reason.as_deref().unwrap_or("none given")
    );
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/users/{id}/withdraw
pub async fn withdraw_user(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut user = fetch_user(&data, &id).await?;
    user.status = UserStatus::Withdrawn;
    persist(&data, &mut user).await?;
    info!("User {} withdrawn", user.username);
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/users/{id}/role
pub async fn change_role(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<ChangeRoleRequest>,
) -> Result<HttpResponse, ApiError> {
    let role = UserRole::parse(&payload.role)
        .ok_or_else(|| ApiError::Validation(format!("Unknown role: {}", payload.role)))?;
    let mut user = fetch_user(&data, &id).await?;
    user.role = role;
    persist(&data, &mut user).await?;
    info!("User {} role changed to {}", user.username, role.as_str());
    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = fetch_user(&data, &id).await?;
    data.mongodb
        .users()
        .delete_one(doc! { "id": &user.id })
        .await?;
    info!("User {} deleted", user.username);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": user.id })))
}

/// GET /api/users/statistics
pub async fn user_statistics(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = data.mongodb.users();

    let mut status_counts = serde_json::Map::new();
    for status in UserStatus::ALL {
        let count = users
            .count_documents(doc! { "status": status.as_str() })
            .await?;
        status_counts.insert(status.as_str().to_lowercase(), count.into());
    }

    let mut role_counts = serde_json::Map::new();
    for role in UserRole::ALL {
        let count = users
            .count_documents(doc! { "role": role.as_str() })
            .await?;
        role_counts.insert(role.as_str().to_lowercase(), count.into());
    }

    let total = users.count_documents(doc! {}).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "totalUsers": total,
        "statusCounts": status_counts,
        "roleCounts": role_counts,
    })))
}
