use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wheelsup_common::model::notification::Notification;
use wheelsup_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_notifications)
        .typed_get(get_notification_count)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct NotificationCount {
    count: u64,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications", rejection(ServerError))]
struct NotificationsPath();

async fn get_notifications(
    NotificationsPath(): NotificationsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Notification>>> {
    let notifications = db.notifications_for(user.user_id()).await?;

    Ok(Json(notifications))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications/count", rejection(ServerError))]
struct NotificationCountPath();

async fn get_notification_count(
    NotificationCountPath(): NotificationCountPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<NotificationCount>> {
    let count = db.notification_count(user.user_id()).await?;

    Ok(Json(NotificationCount { count }))
}
