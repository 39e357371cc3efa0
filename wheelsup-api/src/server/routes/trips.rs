use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use wheelsup_common::model::{
    Id,
    comment::{CommentDraft, CreateComment},
    presence::{PresenceState, PresenceToggle},
    trip::{CreateTrip, Trip, TripDetails, TripDraft, TripMarker},
};
use wheelsup_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_trips)
        .typed_post(create_trip)
        .typed_get(get_trip)
        .typed_post(toggle_rsvp)
        .typed_post(create_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/trips", rejection(ServerError))]
struct TripsPath();

async fn get_trips(
    TripsPath(): TripsPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<Vec<Trip>>> {
    let trips = db.trips(viewer.map(|viewer| viewer.user_id())).await?;

    Ok(Json(trips))
}

async fn create_trip(
    TripsPath(): TripsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<TripDraft>,
) -> Result<(StatusCode, Json<TripDetails>)> {
    let id = db
        .create_trip(&CreateTrip {
            author: user.user_id(),
            draft,
        })
        .await?;

    let trip = db
        .trip_details(id, Some(user.user_id()))
        .await?
        .ok_or(ServerError::TripByIdNotFound(id))?;

    Ok((StatusCode::CREATED, Json(trip)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/trips/{id}", rejection(ServerError))]
struct GetTripPath {
    id: Id<TripMarker>,
}

async fn get_trip(
    GetTripPath { id }: GetTripPath,
    State(db): State<Arc<DbClient>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<TripDetails>> {
    let trip = db
        .trip_details(id, viewer.map(|viewer| viewer.user_id()))
        .await?
        .ok_or(ServerError::TripByIdNotFound(id))?;

    Ok(Json(trip))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/trips/{id}/rsvp", rejection(ServerError))]
struct RsvpPath {
    id: Id<TripMarker>,
}

async fn toggle_rsvp(
    RsvpPath { id }: RsvpPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<PresenceState>> {
    let state = db
        .toggle_presence(PresenceToggle::Rsvp {
            user: user.user_id(),
            trip: id,
        })
        .await?
        .ok_or(ServerError::TripByIdNotFound(id))?;

    Ok(Json(state))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/trips/{id}/comments", rejection(ServerError))]
struct TripCommentsPath {
    id: Id<TripMarker>,
}

async fn create_comment(
    TripCommentsPath { id }: TripCommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<CommentDraft>,
) -> Result<(StatusCode, Json<TripDetails>)> {
    db.create_trip_comment(&CreateComment {
        target: id,
        author: user.user_id(),
        content: draft.content,
    })
    .await?
    .ok_or(ServerError::TripByIdNotFound(id))?;

    let trip = db
        .trip_details(id, Some(user.user_id()))
        .await?
        .ok_or(ServerError::TripByIdNotFound(id))?;

    Ok((StatusCode::CREATED, Json(trip)))
}
