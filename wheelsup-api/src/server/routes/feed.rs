use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wheelsup_common::model::{
    feed::{FeedOrder, FeedScope},
    post::EnrichedPost,
    user::UserSummary,
};
use wheelsup_db::client::DbClient;

const EXPLORE_USERS: u32 = 10;
const EXPLORE_POSTS: u32 = 10;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_feed)
        .typed_get(get_explore)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct FeedQuery {
    #[serde(default)]
    order: FeedOrder,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct Explore {
    users: Vec<UserSummary>,
    posts: Vec<EnrichedPost>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feed", rejection(ServerError))]
struct FeedPath();

async fn get_feed(
    FeedPath(): FeedPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<EnrichedPost>>> {
    let posts = db
        .assemble_feed(
            viewer.map(|viewer| viewer.user_id()),
            FeedScope::All,
            query.order,
        )
        .await?;

    Ok(Json(posts))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/explore", rejection(ServerError))]
struct ExplorePath();

async fn get_explore(
    ExplorePath(): ExplorePath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<Explore>> {
    let users = db.recent_users(EXPLORE_USERS).await?;
    let posts = db
        .assemble_feed(
            viewer.map(|viewer| viewer.user_id()),
            FeedScope::Random(EXPLORE_POSTS),
            FeedOrder::Unordered,
        )
        .await?;

    Ok(Json(Explore { users, posts }))
}
