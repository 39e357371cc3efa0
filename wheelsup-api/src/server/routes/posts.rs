use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use wheelsup_common::model::{
    Id, ModelValidationError,
    comment::{CommentDraft, CreateComment},
    post::{CreatePost, EnrichedPost, PostDraft, PostMarker},
    presence::{PresenceState, PresenceToggle},
};
use wheelsup_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_post(toggle_like)
        .typed_post(create_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct CreatePostPath();

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<EnrichedPost>)> {
    let post = CreatePost::new(user.user_id(), draft).map_err(ModelValidationError::from)?;
    let id = db.create_post(&post).await?;

    let post = db
        .enriched_post(id, Some(user.user_id()))
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct GetPostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    GetPostPath { id }: GetPostPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<EnrichedPost>> {
    let post = db
        .enriched_post(id, viewer.map(|viewer| viewer.user_id()))
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/like", rejection(ServerError))]
struct LikePath {
    id: Id<PostMarker>,
}

async fn toggle_like(
    LikePath { id }: LikePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<PresenceState>> {
    let state = db
        .toggle_presence(PresenceToggle::Like {
            user: user.user_id(),
            post: id,
        })
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(state))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct CommentsPath {
    id: Id<PostMarker>,
}

/// Appends a comment and replies with the post and its updated thread.
async fn create_comment(
    CommentsPath { id }: CommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<CommentDraft>,
) -> Result<(StatusCode, Json<EnrichedPost>)> {
    db.create_post_comment(&CreateComment {
        target: id,
        author: user.user_id(),
        content: draft.content,
    })
    .await?
    .ok_or(ServerError::PostByIdNotFound(id))?;

    let post = db
        .enriched_post(id, Some(user.user_id()))
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok((StatusCode::CREATED, Json(post)))
}
