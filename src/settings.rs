// src/settings.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, to_document};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::error::ApiError;
use crate::models::SystemSetting;

#[derive(Debug, Deserialize)]
pub struct SettingQuery {
    pub category: Option<String>,
    pub public_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertSettingRequest {
    pub category: String,
    pub setting_key: String,
    pub setting_value: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

/// GET /api/admin/settings
pub async fn list_settings(
    data: web::Data<AppState>,
    query: web::Query<SettingQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut filter = doc! {};
    if let Some(category) = &query.category {
        filter.insert("category", category);
    }
    if query.public_only.unwrap_or(false) {
        filter.insert("is_public", true);
    }

    let settings: Vec<SystemSetting> = data
        .mongodb
        .system_settings()
        .find(filter)
        .sort(doc! { "category": 1, "setting_key": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// PUT /api/admin/settings
/// Creates or overwrites the row for (category, setting_key).
pub async fn upsert_setting(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<UpsertSettingRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = current_user(&req)?;
    let payload = payload.into_inner();

    let existing = data
        .mongodb
        .system_settings()
        .find_one(doc! { "category": &payload.category, "setting_key": &payload.setting_key })
        .await?;

    let setting = SystemSetting {
        id: existing
            .as_ref()
            .map(|s| s.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        category: payload.category,
        setting_key: payload.setting_key,
        setting_value: payload.setting_value,
        description: payload
            .description
            .or_else(|| existing.as_ref().and_then(|s| s.description.clone())),
        is_public: payload
            .is_public
            .unwrap_or_else(|| existing.as_ref().map(|s| s.is_public).unwrap_or(false)),
        updated_by: Some(actor),
        updated_at: Utc::now(),
    };

    let set_doc = to_document(&setting)?;
    data.mongodb
        .system_settings()
        .update_one(
            doc! { "category": &setting.category, "setting_key": &setting.setting_key },
            doc! { "$set": set_doc },
        )
        .upsert(true)
        .await?;
    info!(
        "Setting {}/{} updated",
        setting.category, setting.setting_key
    );
    Ok(HttpResponse::Ok().json(setting))
}
