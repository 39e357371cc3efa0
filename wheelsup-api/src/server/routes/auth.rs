use crate::server::{
    AuthConfig, Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info};
use wheelsup_common::model::{
    Id,
    auth::{AuthToken, Authentication, PasswordDigest},
    user::{CreateUser, DisplayName, Email, UserMarker, UserSummary},
};
use wheelsup_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(register)
        .typed_post(login)
        .typed_post(logout)
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Registration {
    email: Email,
    password: String,
    name: DisplayName,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Credentials {
    email: Email,
    password: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct Session {
    user_id: Id<UserMarker>,
    token: String,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/register", rejection(ServerError))]
struct RegisterPath();

async fn register(
    RegisterPath(): RegisterPath,
    State(db): State<Arc<DbClient>>,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<UserSummary>)> {
    if registration.password.is_empty() {
        return Err(ServerError::EmptyPassword);
    }

    let password_digest = PasswordDigest::hash(&registration.password)?;
    let id = db
        .create_user(&CreateUser {
            email: registration.email,
            name: registration.name.clone(),
            password_digest,
        })
        .await?;

    info!(user_id = %id, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(UserSummary {
            id,
            name: registration.name,
        }),
    ))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/login", rejection(ServerError))]
struct LoginPath();

async fn login(
    LoginPath(): LoginPath,
    State(db): State<Arc<DbClient>>,
    State(auth): State<AuthConfig>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Session>> {
    let (user_id, digest) = db
        .fetch_credentials(&credentials.email)
        .await?
        .ok_or(ServerError::InvalidCredentials)?;

    if !digest.verify(&credentials.password) {
        debug!(%user_id, "Rejecting login with wrong password");
        return Err(ServerError::InvalidCredentials);
    }

    let token = AuthToken::generate_random(user_id);
    db.create_auth(&Authentication {
        user: user_id,
        token_hash: token.hash()?,
        created_at: OffsetDateTime::now_utc(),
        expires_after: auth.token_lifetime,
    })
    .await?;

    Ok(Json(Session {
        user_id,
        token: token.as_token_str(),
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/logout", rejection(ServerError))]
struct LogoutPath();

async fn logout(
    LogoutPath(): LogoutPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    db.delete_auth(user.token_hash()).await?;

    debug!(user_id = %user.user_id(), "Signed out");
    Ok(StatusCode::NO_CONTENT)
}
