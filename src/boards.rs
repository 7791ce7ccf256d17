// src/boards.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, to_document, Document};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::error::ApiError;
use crate::models::{build_reply_tree, Board, BoardCategory, Comment, PostStatus};
use crate::pagination::PageParams;
use crate::projects::regex_escape;

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub category: String,
    pub title: String,
    pub content: String,
    pub attachment_files: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBoardRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub attachment_files: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub author_id: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub board_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub is_secret: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

async fn fetch_board(data: &AppState, id: &str) -> Result<Board, ApiError> {
    data.mongodb
        .boards()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Board", id))
}

async fn fetch_comment(data: &AppState, id: &str) -> Result<Comment, ApiError> {
    data.mongodb
        .comments()
        .find_one(doc! { "id": id })
        .await?
        .ok_or_else(|| ApiError::not_found("Comment", id))
}

async fn persist_board(data: &AppState, board: &mut Board) -> Result<(), ApiError> {
    board.updated_at = Utc::now();
    let set_doc = to_document(board)?;
    data.mongodb
        .boards()
        .update_one(doc! { "id": &board.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

async fn persist_comment(data: &AppState, comment: &mut Comment) -> Result<(), ApiError> {
    comment.updated_at = Utc::now();
    let set_doc = to_document(comment)?;
    data.mongodb
        .comments()
        .update_one(doc! { "id": &comment.id }, doc! { "$set": set_doc })
        .await?;
    Ok(())
}

fn search_filter(query: &BoardQuery) -> Document {
    // deleted posts never show up in listings
    let mut filter = doc! { "status": { "$ne": "DELETED" } };
    if let Some(category) = query.category.as_deref().and_then(BoardCategory::parse) {
        filter.insert("category", category.as_str());
    }
    if let Some(author_id) = &query.author_id {
        filter.insert("author_id", author_id);
    }
    if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.is_empty()) {
        let pattern = regex_escape(keyword);
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": &pattern, "$options": "i" } },
                doc! { "content": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }
    filter
}

/// GET /api/boards
/// Pinned posts first, then newest.
pub async fn search_boards(
    data: web::Data<AppState>,
    query: web::Query<BoardQuery>,
) -> Result<HttpResponse, ApiError> {
    let boards: Vec<Board> = data
        .mongodb
        .boards()
        .find(search_filter(&query))
        .sort(doc! { "is_pinned": -1, "created_at": -1 })
        .skip(query.page.skip())
        .limit(query.page.limit())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(boards))
}

/// GET /api/boards/{id}
pub async fn get_board(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    data.mongodb
        .boards()
        .update_one(doc! { "id": id.as_str() }, doc! { "$inc": { "view_count": 1 } })
        .await?;
    let board = fetch_board(&data, &id).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// POST /api/boards
pub async fn create_board(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateBoardRequest>,
) -> Result<HttpResponse, ApiError> {
    let author_id = current_user(&req)?;
    let payload = payload.into_inner();

    let category = BoardCategory::parse(&payload.category)
        .ok_or_else(|| ApiError::Validation(format!("Unknown category: {}", payload.category)))?;

    let now = Utc::now();
    let board = Board {
        id: Uuid::new_v4().to_string(),
        category,
        title: payload.title,
        content: payload.content,
        author_id,
        is_pinned: false,
        is_featured: false,
        view_count: 0,
        like_count: 0,
        comment_count: 0,
        attachment_files: payload.attachment_files,
        tags: payload.tags,
        status: PostStatus::Active,
        created_at: now,
        updated_at: now,
    };

    data.mongodb.boards().insert_one(&board).await?;
    info!("Board post {} created in {}", board.id, category.as_str());
    Ok(HttpResponse::Ok().json(board))
}

/// PUT /api/boards/{id}
pub async fn update_board(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<UpdateBoardRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut board = fetch_board(&data, &id).await?;
    if board.status == PostStatus::Deleted {
        return Err(ApiError::InvalidState(
            "Deleted posts cannot be updated".to_string(),
        ));
    }

    if let Some(title) = payload.title.clone() {
        board.title = title;
    }
    if let Some(content) = payload.content.clone() {
        board.content = content;
    }
    if let Some(attachment_files) = payload.attachment_files.clone() {
        board.attachment_files = Some(attachment_files);
    }
    if let Some(tags) = payload.tags.clone() {
        board.tags = Some(tags);
    }

    persist_board(&data, &mut board).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// DELETE /api/boards/{id} (soft delete)
pub async fn delete_board(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut board = fetch_board(&data, &id).await?;
    board.status = PostStatus::Deleted;
    persist_board(&data, &mut board).await?;
    info!("Board post {} soft-deleted", board.id);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": board.id })))
}

/// POST /api/boards/{id}/pin
pub async fn pin_board(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut board = fetch_board(&data, &id).await?;
    board.is_pinned = true;
    persist_board(&data, &mut board).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// POST /api/boards/{id}/unpin
pub async fn unpin_board(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut board = fetch_board(&data, &id).await?;
    board.is_pinned = false;
    persist_board(&data, &mut board).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// POST /api/boards/{id}/feature
pub async fn feature_board(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut board = fetch_board(&data, &id).await?;
    board.is_featured = true;
    persist_board(&data, &mut board).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// POST /api/boards/{id}/like
pub async fn like_board(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let result = data
        .mongodb
        .boards()
        .update_one(doc! { "id": id.as_str() }, doc! { "$inc": { "like_count": 1 } })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::not_found("Board", &id));
    }
    let board = fetch_board(&data, &id).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// GET /api/boards/{id}/comments
/// Returns the reply tree; soft-deleted leaves are filtered out, deleted
/// comments with surviving replies stay as placeholders.
pub async fn list_comments(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let comments: Vec<Comment> = data
        .mongodb
        .comments()
        .find(doc! { "board_id": id.as_str() })
        .sort(doc! { "created_at": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(build_reply_tree(comments)))
}

/// POST /api/comments
/// A reply's parent must exist and sit on the same board.
pub async fn create_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let author_id = current_user(&req)?;
    let payload = payload.into_inner();

    let board = fetch_board(&data, &payload.board_id).await?;
    if let Some(parent_id) = &payload.parent_id {
        let parent = fetch_comment(&data, parent_id).await?;
        if parent.board_id != board.id {
            return Err(ApiError::Validation(
                "Parent comment belongs to another board".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        board_id: board.id.clone(),
        parent_id: payload.parent_id,
        author_id,
        content: payload.content,
        like_count: 0,
        is_secret: payload.is_secret.unwrap_or(false),
        status: PostStatus::Active,
        created_at: now,
        updated_at: now,
    };

    data.mongodb.comments().insert_one(&comment).await?;
    data.mongodb
        .boards()
        .update_one(
            doc! { "id": &board.id },
            doc! { "$inc": { "comment_count": 1 } },
        )
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// PUT /api/comments/{id}
pub async fn update_comment(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut comment = fetch_comment(&data, &id).await?;
    if comment.status == PostStatus::Deleted {
        return Err(ApiError::InvalidState(
            "Deleted comments cannot be updated".to_string(),
        ));
    }
    comment.content = payload.content.clone();
    persist_comment(&data, &mut comment).await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// DELETE /api/comments/{id}
/// A comment with replies stays in place as a DELETED placeholder so the
/// thread keeps its shape; a leaf comment is removed outright. Either way
/// the board's comment_count drops by one.
pub async fn delete_comment(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut comment = fetch_comment(&data, &id).await?;

    let reply_count = data
        .mongodb
        .comments()
        .count_documents(doc! { "parent_id": &comment.id })
        .await?;
    if reply_count > 0 {
        comment.status = PostStatus::Deleted;
        comment.content = String::new();
        persist_comment(&data, &mut comment).await?;
    } else {
        data.mongodb
            .comments()
            .delete_one(doc! { "id": &comment.id })
            .await?;
    }

    data.mongodb
        .boards()
        .update_one(
            doc! { "id": &comment.board_id },
            doc! { "$inc": { "comment_count": -1 } },
        )
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": comment.id })))
}

/// POST /api/comments/{id}/like
pub async fn like_comment(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let result = data
        .mongodb
        .comments()
        .update_one(doc! { "id": id.as_str() }, doc! { "$inc": { "like_count": 1 } })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::not_found("Comment", &id));
    }
    let comment = fetch_comment(&data, &id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_always_excludes_deleted_posts() {
        let query = BoardQuery {
            category: Some("qna".into()),
            keyword: None,
            author_id: None,
            page: PageParams::default(),
        };
        let filter = search_filter(&query);
        assert_eq!(
            filter.get_document("status").unwrap(),
            &doc! { "$ne": "DELETED" }
        );
        assert_eq!(filter.get_str("category").unwrap(), "QNA");
    }

    #[test]
    fn keyword_filter_searches_title_and_content() {
        let query = BoardQuery {
            category: None,
            keyword: Some("refund".into()),
            author_id: None,
            page: PageParams::default(),
        };
        let filter = search_filter(&query);
        assert_eq!(filter.get_array("$or").unwrap().len(), 2);
    }
}
