// src/notifications.rs

use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::error::ApiError;
use crate::models::Notification;
use crate::pagination::PageParams;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    #[serde(flatten)]
    pub page: PageParams,
}

/// GET /api/notifications
/// The caller's own notifications, newest first.
pub async fn list_my_notifications(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = current_user(&req)?;
    let mut filter = doc! { "recipient_id": &user_id };
    if query.unread_only.unwrap_or(false) {
        filter.insert("is_read", false);
    }

    let notifications: Vec<Notification> = data
        .mongodb
        .notifications()
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(query.page.skip())
        .limit(query.page.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user_id = current_user(&req)?;
    let count = data
        .mongodb
        .notifications()
        .count_documents(doc! { "recipient_id": &user_id, "is_read": false })
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "unreadCount": count })))
}

/// POST /api/notifications/{id}/read
/// Scoped to the caller so one user cannot mark another's notification.
pub async fn mark_read(
    req: HttpRequest,
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = current_user(&req)?;
    let result = data
        .mongodb
        .notifications()
        .update_one(
            doc! { "id": id.as_str(), "recipient_id": &user_id },
            doc! { "$set": { "is_read": true } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::not_found("Notification", &id));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "read": id.as_str() })))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user_id = current_user(&req)?;
    let result = data
        .mongodb
        .notifications()
        .update_many(
            doc! { "recipient_id": &user_id, "is_read": false },
            doc! { "$set": { "is_read": true } },
        )
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "marked": result.modified_count })))
}
