use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    blob::BlobStore,
    extract::{Json, Query},
};
use axum::{
    body::{Body, Bytes},
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    routing::{RouterExt, TypedPath},
};
use headers::ContentType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::info;
use wheelsup_common::model::blob::BlobRef;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(upload)
        .typed_get(download)
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct UploadQuery {
    name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct Upload {
    reference: BlobRef,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/uploads", rejection(ServerError))]
struct UploadPath();

async fn upload(
    UploadPath(): UploadPath,
    State(blob_store): State<Arc<dyn BlobStore>>,
    user: AuthenticatedUser,
    Query(query): Query<UploadQuery>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Upload>)> {
    let reference = blob_store.store(&query.name, &body?).await?;

    info!(user_id = %user.user_id(), %reference, "Stored upload");
    Ok((StatusCode::CREATED, Json(Upload { reference })))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/uploads/{reference}", rejection(ServerError))]
struct DownloadPath {
    reference: BlobRef,
}

async fn download(
    DownloadPath { reference }: DownloadPath,
    State(blob_store): State<Arc<dyn BlobStore>>,
) -> Result<Response> {
    let reader = blob_store
        .open(&reference)
        .await?
        .ok_or_else(|| ServerError::BlobNotFound(reference.clone()))?;

    let content_type = content_type_of(&reference);
    Ok((
        TypedHeader(content_type),
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}

fn content_type_of(reference: &BlobRef) -> ContentType {
    let extension = reference
        .get()
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => ContentType::png(),
        Some("jpg" | "jpeg") => ContentType::jpeg(),
        _ => ContentType::octet_stream(),
    }
}

#[cfg(test)]
mod tests {
    use crate::server::routes::uploads::content_type_of;
    use headers::ContentType;
    use wheelsup_common::model::blob::BlobRef;

    #[test]
    fn content_types_by_extension() {
        let of = |reference: &str| content_type_of(&BlobRef::new(reference.to_owned()).unwrap());

        assert_eq!(of("00ff-van.PNG"), ContentType::png());
        assert_eq!(of("00ff-van.jpeg"), ContentType::jpeg());
        assert_eq!(of("00ff-van.jpg"), ContentType::jpeg());
        assert_eq!(of("00ff-route.gpx"), ContentType::octet_stream());
        assert_eq!(of("00ff-upload"), ContentType::octet_stream());
    }
}
