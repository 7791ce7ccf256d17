// src/main.rs

mod app_state;
mod approvals;
mod auth;
mod boards;
mod codes;
mod config;
mod contracts;
mod db;
mod error;
mod models;
mod negotiations;
mod notifications;
mod pagination;
mod projects;
mod proposals;
mod settings;
mod users;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http,
    middleware::Logger,
    web, App, Error, HttpMessage, HttpResponse, HttpServer,
};
use env_logger::Env;
use futures_util::future::{ok, Ready};
use log::info;

use crate::app_state::AppState;
use crate::auth::{login, signup, validate_jwt};

#[derive(Debug, Clone)]
pub struct Authentication {
    jwt_secret: String,
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware {
            service,
            jwt_secret: self.jwt_secret.clone(),
        })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Extract "Bearer <token>" from the Authorization header if present
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    match validate_jwt(token.trim(), &self.jwt_secret) {
                        Ok(claims) => {
                            // user id as a string extension, read by current_user()
                            req.extensions_mut().insert(claims.sub);
                        }
                        Err(e) => {
                            let (req_parts, _payload) = req.into_parts();
                            let resp = HttpResponse::Unauthorized()
                                .json(serde_json::json!({
                                    "error": "UNAUTHORIZED",
                                    "message": format!("Invalid token: {}", e),
                                }))
                                .map_into_boxed_body();
                            let srv_resp = ServiceResponse::new(req_parts, resp);
                            return Box::pin(async move { Ok(srv_resp) });
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config.mongo_uri, &config.database_name).await);

    let bind_addr = config.bind_addr.clone();
    let frontend_origin = config.frontend_origin.clone();
    let jwt_secret = config.jwt_secret.clone();

    info!("Server running at http://{}", bind_addr);
    info!("Allowed CORS origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication {
                jwt_secret: jwt_secret.clone(),
            })
            .app_data(web::Data::new(AppState {
                mongodb: mongodb.clone(),
                config: config.clone(),
            }))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login)),
            )
            .service(
                web::scope("/api/users")
                    // fixed paths before the {id} catch-all
                    .route("/statistics", web::get().to(users::user_statistics))
                    .route("", web::get().to(users::search_users))
                    .route("/{id}", web::get().to(users::get_user))
                    .route("/{id}", web::put().to(users::update_profile))
                    .route("/{id}", web::delete().to(users::delete_user))
                    .route("/{id}/activate", web::post().to(users::activate_user))
                    .route("/{id}/suspend", web::post().to(users::suspend_user))
                    .route("/{id}/withdraw", web::post().to(users::withdraw_user))
                    .route("/{id}/role", web::post().to(users::change_role)),
            )
            .service(
                web::scope("/api/projects")
                    .route("/bidding", web::get().to(projects::list_active_bidding))
                    .route("/statistics", web::get().to(projects::project_statistics))
                    .route("", web::get().to(projects::search_projects))
                    .route("", web::post().to(projects::create_project))
                    .route("/{id}", web::get().to(projects::get_project))
                    .route("/{id}", web::put().to(projects::update_project))
                    .route("/{id}", web::delete().to(projects::delete_project))
                    .route("/{id}/publish", web::post().to(projects::publish_project))
                    .route("/{id}/start-bidding", web::post().to(projects::start_bidding))
                    .route("/{id}/award", web::post().to(projects::award_project))
                    .route("/{id}/complete", web::post().to(projects::complete_project))
                    .route("/{id}/cancel", web::post().to(projects::cancel_project)),
            )
            .service(
                web::scope("/api/proposals")
                    .route("/statistics", web::get().to(proposals::proposal_statistics))
                    .route("", web::get().to(proposals::search_proposals))
                    .route("", web::post().to(proposals::create_proposal))
                    .route("/{id}", web::get().to(proposals::get_proposal))
                    .route("/{id}", web::put().to(proposals::update_proposal))
                    .route("/{id}", web::delete().to(proposals::delete_proposal))
                    .route("/{id}/submit", web::post().to(proposals::submit_proposal))
                    .route("/{id}/review", web::post().to(proposals::review_proposal))
                    .route(
                        "/{id}/start-negotiation",
                        web::post().to(proposals::start_negotiation),
                    )
                    .route("/{id}/accept", web::post().to(proposals::accept_proposal))
                    .route("/{id}/reject", web::post().to(proposals::reject_proposal))
                    .route("/{id}/withdraw", web::post().to(proposals::withdraw_proposal)),
            )
            .service(
                web::scope("/api/negotiations")
                    .route("", web::post().to(negotiations::open_negotiation))
                    .route(
                        "/proposal/{proposal_id}",
                        web::get().to(negotiations::list_by_proposal),
                    )
                    .route("/{id}/counter", web::post().to(negotiations::counter_offer))
                    .route("/{id}/accept", web::post().to(negotiations::accept_negotiation))
                    .route("/{id}/reject", web::post().to(negotiations::reject_negotiation)),
            )
            .service(
                web::scope("/api/approvals")
                    .route("/pending", web::get().to(approvals::list_pending))
                    .route("/statistics", web::get().to(approvals::approval_statistics))
                    .route("", web::get().to(approvals::search_approvals))
                    .route("", web::post().to(approvals::create_approval))
                    .route("/{id}", web::get().to(approvals::get_approval))
                    .route("/{id}/approve", web::post().to(approvals::approve))
                    .route("/{id}/reject", web::post().to(approvals::reject))
                    .route("/{id}/assign", web::post().to(approvals::assign_approver))
                    .route("/{id}/escalate", web::post().to(approvals::escalate)),
            )
            .service(
                web::scope("/api/contracts")
                    .route("", web::get().to(contracts::search_contracts))
                    .route("", web::post().to(contracts::create_contract))
                    .route("/{id}", web::get().to(contracts::get_contract))
                    .route("/{id}/activate", web::post().to(contracts::activate_contract))
                    .route("/{id}/complete", web::post().to(contracts::complete_contract))
                    .route("/{id}/terminate", web::post().to(contracts::terminate_contract))
                    .route("/{id}/suspend", web::post().to(contracts::suspend_contract))
                    .route("/{id}/resume", web::post().to(contracts::resume_contract)),
            )
            .service(
                web::scope("/api/boards")
                    .route("", web::get().to(boards::search_boards))
                    .route("", web::post().to(boards::create_board))
                    .route("/{id}", web::get().to(boards::get_board))
                    .route("/{id}", web::put().to(boards::update_board))
                    .route("/{id}", web::delete().to(boards::delete_board))
                    .route("/{id}/pin", web::post().to(boards::pin_board))
                    .route("/{id}/unpin", web::post().to(boards::unpin_board))
                    .route("/{id}/feature", web::post().to(boards::feature_board))
                    .route("/{id}/like", web::post().to(boards::like_board))
                    .route("/{id}/comments", web::get().to(boards::list_comments)),
            )
            .service(
                web::scope("/api/comments")
                    .route("", web::post().to(boards::create_comment))
                    .route("/{id}", web::put().to(boards::update_comment))
                    .route("/{id}", web::delete().to(boards::delete_comment))
                    .route("/{id}/like", web::post().to(boards::like_comment)),
            )
            .service(
                web::scope("/api/notifications")
                    .route("", web::get().to(notifications::list_my_notifications))
                    .route("/unread-count", web::get().to(notifications::unread_count))
                    .route("/read-all", web::post().to(notifications::mark_all_read))
                    .route("/{id}/read", web::post().to(notifications::mark_read)),
            )
            .service(
                web::scope("/api/admin/settings")
                    .route("", web::get().to(settings::list_settings))
                    .route("", web::put().to(settings::upsert_setting)),
            )
    })
    .bind(&bind_addr)?
    .run()
    .await
}
