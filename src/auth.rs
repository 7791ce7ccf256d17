// src/auth.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::info;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct SignupInfo {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInfo {
    pub username: String,
    pub password: String,
}

pub fn create_jwt(user_id: &str, secret: &str) -> Result<String, ApiError> {
    let expiration = Utc::now() + Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| ApiError::Internal(format!("JWT encoding failed: {}", e)))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// The acting user id, inserted into request extensions by the
/// authentication middleware. Every state-changing handler resolves its
/// actor here rather than inside the workflow logic.
pub fn current_user(req: &HttpRequest) -> Result<String, ApiError> {
    req.extensions()
        .get::<String>()
        .cloned()
        .ok_or(ApiError::Unauthorized)
}

/// POST /auth/signup
/// Creates a PENDING user; activation is an admin decision.
pub async fn signup(
    data: web::Data<AppState>,
    signup_info: web::Json<SignupInfo>,
) -> Result<HttpResponse, ApiError> {
    let users = data.mongodb.users();

    if users
        .find_one(doc! { "username": &signup_info.username })
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Username already exists: {}",
            signup_info.username
        )));
    }
    if users
        .find_one(doc! { "email": &signup_info.email })
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Email already exists: {}",
            signup_info.email
        )));
    }

    let hashed_password = hash(&signup_info.password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?;

    let new_user = User::register(
        signup_info.username.clone(),
        signup_info.email.clone(),
        hashed_password,
    );
    users.insert_one(&new_user).await?;
    info!("User registered: {} ({})", new_user.username, new_user.id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user_id": new_user.id,
        "status": new_user.status,
    })))
}

/// POST /auth/login
pub async fn login(
    data: web::Data<AppState>,
    login_info: web::Json<LoginInfo>,
) -> Result<HttpResponse, ApiError> {
    let users = data.mongodb.users();
    let user = users
        .find_one(doc! { "username": &login_info.username })
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify(&login_info.password, &user.password).unwrap_or(false) {
        return Err(ApiError::Unauthorized);
    }

    let token = create_jwt(&user.id, &data.config.jwt_secret)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "token": token,
        "user_id": user.id,
        "role": user.role,
        "status": user.status,
    })))
}
