use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use wheelsup_common::model::{
    Id,
    feed::{FeedOrder, FeedScope},
    post::EnrichedPost,
    presence::{PresenceState, PresenceToggle},
    user::{Profile, ProfileUpdate, User, UserMarker},
};
use wheelsup_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_user)
        .typed_get(get_user_posts)
        .typed_put(update_profile)
        .typed_post(toggle_follow)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}", rejection(ServerError))]
struct GetUserPath {
    id: Id<UserMarker>,
}

async fn get_user(
    GetUserPath { id }: GetUserPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<Profile>> {
    let profile = db
        .fetch_profile(id, viewer.map(|viewer| viewer.user_id()))
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(profile))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/posts", rejection(ServerError))]
struct GetUserPostsPath {
    id: Id<UserMarker>,
}

async fn get_user_posts(
    GetUserPostsPath { id }: GetUserPostsPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<Vec<EnrichedPost>>> {
    if db.fetch_user(id).await?.is_none() {
        return Err(ServerError::UserByIdNotFound(id));
    }

    let posts = db
        .assemble_feed(
            viewer.map(|viewer| viewer.user_id()),
            FeedScope::ByAuthor(id),
            FeedOrder::RecencyDescending,
        )
        .await?;

    Ok(Json(posts))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/me", rejection(ServerError))]
struct OwnProfilePath();

async fn update_profile(
    OwnProfilePath(): OwnProfilePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let updated = db
        .update_profile(user.user_id(), &update)
        .await?
        .ok_or(ServerError::UserByIdNotFound(user.user_id()))?;

    Ok(Json(updated))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/follow", rejection(ServerError))]
struct FollowPath {
    id: Id<UserMarker>,
}

async fn toggle_follow(
    FollowPath { id }: FollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<PresenceState>> {
    let state = db
        .toggle_presence(PresenceToggle::Follow {
            follower: user.user_id(),
            followee: id,
        })
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(state))
}
