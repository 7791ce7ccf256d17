// src/projects.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, to_bson, to_document, Document};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::codes;
use crate::error::ApiError;
use crate::models::{Project, ProjectCategory, ProjectPriority, ProjectStatus, User};
use crate::pagination::PageParams;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub category: ProjectCategory,
    pub priority: Option<ProjectPriority>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub currency: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub bidding_deadline: Option<DateTime<Utc>>,
    pub required_skills: Option<Vec<String>>,
    pub attachment_files: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub category: Option<ProjectCategory>,
    pub priority: Option<ProjectPriority>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub bidding_deadline: Option<DateTime<Utc>>,
    pub required_skills: Option<Vec<String>>,
    pub attachment_files: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub client_id: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Deserialize)]
pub struct AwardRequest {
    pub winner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

async fn fetch_project(data: &AppState, id: &str) -> Result<Project, ApiError> {
    data.mongodb
        .projects()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Project", id))
}

async fn persist(data: &AppState, project: &mut Project) -> Result<(), ApiError> {
    project.updated_at = Utc::now();
    let set_doc = to_document(project)?;
    data.mongodb
        .projects()
        .update_one(doc! { "id": &project.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

/// Optional equality/substring predicates composed conjunctively; invalid
/// enum values are ignored rather than rejected.
fn search_filter(query: &ProjectQuery) -> Document {
    let mut filter = doc! {};
    if let Some(status) = query.status.as_deref().and_then(ProjectStatus::parse) {
        filter.insert("status", status.as_str());
    }
    if let Some(category) = query.category.as_deref().and_then(ProjectCategory::parse) {
        filter.insert("category", category.as_str());
    }
    if let Some(client_id) = &query.client_id {
        filter.insert("client_id", client_id);
    }
    if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        let pattern = regex_escape(keyword.trim());
        let matcher = doc! { "$regex": &pattern, "$options": "i" };
        filter.insert(
            "$or",
            vec![
                doc! { "title": matcher.clone() },
                doc! { "description": matcher.clone() },
                doc! { "requirements": matcher },
            ],
        );
    }
    filter
}

// Keyword searches are substring matches; escape regex metacharacters so
// user input cannot change the query shape.
pub(crate) fn regex_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// GET /api/projects
pub async fn search_projects(
    data: web::Data<AppState>,
    query: web::Query<ProjectQuery>,
) -> Result<HttpResponse, ApiError> {
    let projects: Vec<Project> = data
        .mongodb
        .projects()
        .find(search_filter(&query))
        .sort(doc! { "created_at": -1 })
        .skip(query.page.skip())
        .limit(query.page.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// GET /api/projects/bidding
/// Deadline filtering happens lazily at read time; nothing expires rows.
pub async fn list_active_bidding(
    data: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, ApiError> {
    let now = to_bson(&Utc::now())?;
    let filter = doc! {
        "status": ProjectStatus::InBidding.as_str(),
        "bidding_deadline": { "$gt": now },
    };
    let projects: Vec<Project> = data
        .mongodb
        .projects()
        .find(filter)
        .sort(doc! { "bidding_deadline": 1 })
        .skip(query.skip())
        .limit(query.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// POST /api/projects
pub async fn create_project(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateProjectRequest>,
) -> Result<HttpResponse, ApiError> {
    let client_id = current_user(&req)?;
    let payload = payload.into_inner();

    let count = data.mongodb.projects().count_documents(doc! {}).await?;
    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4().to_string(),
        project_code: codes::project_code(count),
        title: payload.title,
        description: payload.description,
        requirements: payload.requirements,
        client_id: client_id.clone(),
        created_by: client_id,
        category: payload.category,
        priority: payload.priority.unwrap_or(ProjectPriority::Medium),
        status: ProjectStatus::Draft,
        budget_min: payload.budget_min,
        budget_max: payload.budget_max,
        currency: payload.currency.unwrap_or_else(|| "KRW".to_string()),
        deadline: payload.deadline,
        bidding_deadline: payload.bidding_deadline,
        required_skills: payload.required_skills,
        attachment_files: payload.attachment_files,
        view_count: 0,
        proposal_count: 0,
        created_at: now,
        updated_at: now,
    };

    data.mongodb.projects().insert_one(&project).await?;
    info!("Project created: {}", project.project_code);
    Ok(HttpResponse::Ok().json(project))
}

/// GET /api/projects/{id}
/// Reading a project bumps its view count ($inc keeps it atomic).
pub async fn get_project(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    data.mongodb
        .projects()
        .update_one(doc! { "id": &id }, doc! { "$inc": { "view_count": 1 } })
        .await?;
    let project = fetch_project(&data, &id).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// PUT /api/projects/{id}
pub async fn update_project(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<UpdateProjectRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut project = fetch_project(&data, &id).await?;

    if let Some(title) = payload.title.clone() {
        project.title = title;
    }
    if let Some(description) = payload.description.clone() {
        project.description = description;
    }
    if let Some(requirements) = payload.requirements.clone() {
        project.requirements = Some(requirements);
    }
    if let Some(category) = payload.category {
        project.category = category;
    }
    if let Some(priority) = payload.priority {
        project.priority = priority;
    }
    if let Some(budget_min) = payload.budget_min {
        project.budget_min = Some(budget_min);
    }
    if let Some(budget_max) = payload.budget_max {
        project.budget_max = Some(budget_max);
    }
    if let Some(deadline) = payload.deadline {
        project.deadline = Some(deadline);
    }
    if let Some(bidding_deadline) = payload.bidding_deadline {
        project.bidding_deadline = Some(bidding_deadline);
    }
    if let Some(required_skills) = payload.required_skills.clone() {
        project.required_skills = Some(required_skills);
    }
    if let Some(attachment_files) = payload.attachment_files.clone() {
        project.attachment_files = Some(attachment_files);
    }

    persist(&data, &mut project).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// POST /api/projects/{id}/publish
pub async fn publish_project(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut project = fetch_project(&data, &id).await?;
    project.publish()?;
    persist(&data, &mut project).await?;
    info!("Project {} published", project.project_code);
    Ok(HttpResponse::Ok().json(project))
}

/// POST /api/projects/{id}/start-bidding
pub async fn start_bidding(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut project = fetch_project(&data, &id).await?;
    project.start_bidding(Utc::now())?;
    persist(&data, &mut project).await?;
    info!("Project {} bidding started", project.project_code);
    Ok(HttpResponse::Ok().json(project))
}

/// POST /api/projects/{id}/award
/// Awarding records the decision only; contract creation is a separate
/// call against /api/contracts.
pub async fn award_project(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<AwardRequest>,
) -> Result<HttpResponse, ApiError> {
    let winner: User = data
        .mongodb
        .users()
        .find_one(doc! { "id": &payload.winner_id })
        .await?
        .ok_or_else(|| ApiError::not_found("Winner", &payload.winner_id))?;

    let mut project = fetch_project(&data, &id).await?;
    project.award()?;
    persist(&data, &mut project).await?;
    info!(
        "Project {} awarded to user {}",
        project.project_code, winner.username
    );
    Ok(HttpResponse::Ok().json(project))
}

/// POST /api/projects/{id}/complete
pub async fn complete_project(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut project = fetch_project(&data, &id).await?;
    project.complete();
    persist(&data, &mut project).await?;
    info!("Project {} completed", project.project_code);
    Ok(HttpResponse::Ok().json(project))
}

/// POST /api/projects/{id}/cancel
pub async fn cancel_project(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<CancelRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut project = fetch_project(&data, &id).await?;
    project.cancel();
    persist(&data, &mut project).await?;
    info!(
        "Project {} cancelled. Reason: {}",
        project.project_code,
        payload.reason.as_deref().unwrap_or("none given")
    );
    Ok(HttpResponse::Ok().json(project))
}

/// DELETE /api/projects/{id}
pub async fn delete_project(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let project = fetch_project(&data, &id).await?;
    if !project.deletable() {
        return Err(ApiError::InvalidState(
            "Only draft or cancelled projects can be deleted".to_string(),
        ));
    }
    data.mongodb
        .projects()
        .delete_one(doc! { "id": &project.id })
        .await?;
    info!("Project {} deleted", project.project_code);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": project.id })))
}

/// GET /api/projects/statistics
pub async fn project_statistics(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let projects = data.mongodb.projects();

    let mut status_counts = serde_json::Map::new();
    for status in ProjectStatus::ALL {
        let count = projects
            .count_documents(doc! { "status": status.as_str() })
            .await?;
        status_counts.insert(status.as_str().to_lowercase(), count.into());
    }

    let mut category_counts = serde_json::Map::new();
    for category in ProjectCategory::ALL {
        let count = projects
            .count_documents(doc! { "category": category.as_str() })
            .await?;
        category_counts.insert(category.as_str().to_lowercase(), count.into());
    }

    let total = projects.count_documents(doc! {}).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "totalProjects": total,
        "statusCounts": status_counts,
        "categoryCounts": category_counts,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_escape_neutralizes_metacharacters() {
        assert_eq!(regex_escape("a.b*c"), "a\\.b\\*c");
        assert_eq!(regex_escape("plain words"), "plain words");
        assert_eq!(regex_escape("(x|y)"), "\\(x\\|y\\)");
    }

    #[test]
    fn search_filter_ignores_invalid_enum_values() {
        let query = ProjectQuery {
            status: Some("NOT_A_STATUS".to_string()),
            category: Some("web".to_string()),
            keyword: None,
            client_id: None,
            page: PageParams::default(),
        };
        let filter = search_filter(&query);
        assert!(!filter.contains_key("status"));
        assert_eq!(filter.get_str("category").unwrap(), "WEB");
    }

    #[test]
    fn search_filter_combines_predicates_conjunctively() {
        let query = ProjectQuery {
            status: Some("draft".to_string()),
            category: None,
            keyword: Some("storefront".to_string()),
            client_id: Some("client-1".to_string()),
            page: PageParams::default(),
        };
        let filter = search_filter(&query);
        assert_eq!(filter.get_str("status").unwrap(), "DRAFT");
        assert_eq!(filter.get_str("client_id").unwrap(), "client-1");
        assert!(filter.get_array("$or").unwrap().len() == 3);
    }
}
