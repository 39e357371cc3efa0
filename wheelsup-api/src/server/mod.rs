use crate::server::blob::{BlobError, BlobStore};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use extract::Json;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;
use wheelsup_common::{
    model::{
        Id, ModelValidationError,
        auth::{AuthTokenDecodeError, AuthTokenHashError, PasswordDigestError},
        blob::BlobRef,
        post::PostMarker,
        trip::TripMarker,
        user::UserMarker,
    },
    util::PositiveDuration,
};
use wheelsup_db::client::{DbClient, DbError};

mod auth;
pub mod blob;
mod extract;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct AuthConfig {
    /// Lifetime of newly issued tokens. `None` issues tokens that never expire.
    pub token_lifetime: Option<PositiveDuration>,
}

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub blob_store: Arc<dyn BlobStore>,
    pub auth: AuthConfig,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("Request body rejected: {0}")]
    BodyRejection(#[from] BytesRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided auth token could not be decoded: {0}")]
    InvalidAuthToken(#[from] AuthTokenDecodeError),
    #[error("The auth token could not be hashed: {0}")]
    AuthTokenHash(#[from] AuthTokenHashError),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error("This action requires a signed in user")]
    NotAuthenticated,
    #[error("Email or password is incorrect")]
    InvalidCredentials,
    #[error("The password must not be empty")]
    EmptyPassword,
    #[error(transparent)]
    PasswordDigest(#[from] PasswordDigestError),
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("User with id {0} was not found.")]
    UserByIdNotFound(Id<UserMarker>),
    #[error("Trip with id {0} was not found.")]
    TripByIdNotFound(Id<TripMarker>),
    #[error("Upload {0} was not found.")]
    BlobNotFound(BlobRef),
    #[error(transparent)]
    Blob(#[from] BlobError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::UserByIdNotFound(_)
            | ServerError::TripByIdNotFound(_)
            | ServerError::BlobNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidAuthToken(_)
            | ServerError::InvalidToken
            | ServerError::NotAuthenticated
            | ServerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServerError::JsonRejection(rejection) => rejection.status(),
            ServerError::BodyRejection(rejection) => rejection.status(),
            ServerError::QueryRejection(_)
            | ServerError::Validation(_)
            | ServerError::EmptyPassword => StatusCode::BAD_REQUEST,
            ServerError::Database(DbError::EmailTaken(_) | DbError::ConstraintRace) => {
                StatusCode::CONFLICT
            }
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::AuthTokenHash(_)
            | ServerError::PasswordDigest(_)
            | ServerError::Blob(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Server-side failures are not described.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "Internal server error".to_owned()
        } else {
            self.to_string()
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.public_message(),
        };
        (status, Json(error_response)).into_response()
    }
}
