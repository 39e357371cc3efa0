use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use wheelsup_common::model::{
    Id,
    message::{ConversationPartner, CreateMessage, Message, MessageDraft},
    user::UserMarker,
};
use wheelsup_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_inbox)
        .typed_get(get_conversation)
        .typed_post(send_message)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/messages", rejection(ServerError))]
struct InboxPath();

async fn get_inbox(
    InboxPath(): InboxPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ConversationPartner>>> {
    let partners = db.inbox(user.user_id()).await?;

    Ok(Json(partners))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/messages/{user_id}", rejection(ServerError))]
struct ConversationPath {
    user_id: Id<UserMarker>,
}

async fn get_conversation(
    ConversationPath { user_id }: ConversationPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Message>>> {
    if db.fetch_user(user_id).await?.is_none() {
        return Err(ServerError::UserByIdNotFound(user_id));
    }

    let messages = db.conversation(user.user_id(), user_id).await?;

    Ok(Json(messages))
}

/// Sends a message and replies with the whole conversation including it.
async fn send_message(
    ConversationPath { user_id }: ConversationPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<MessageDraft>,
) -> Result<(StatusCode, Json<Vec<Message>>)> {
    db.send_message(&CreateMessage {
        sender: user.user_id(),
        receiver: user_id,
        text: draft.text,
    })
    .await?
    .ok_or(ServerError::UserByIdNotFound(user_id))?;

    let messages = db.conversation(user.user_id(), user_id).await?;

    Ok((StatusCode::CREATED, Json(messages)))
}
