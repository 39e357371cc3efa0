use crate::{
    client::{DbClient, Result},
    record::{CommentRecord, TripRecord},
};
use sqlx::{query_as, query_scalar};
use time::OffsetDateTime;
use tracing::debug;
use wheelsup_common::model::{
    Id,
    comment::{CreateComment, TripComment, TripCommentMarker},
    trip::{CreateTrip, Trip, TripDetails, TripMarker},
    user::UserMarker,
};

/// Trips with organizer, attendee count and whether the viewer bound first is attending.
const TRIPS_SELECT: &str = "
    SELECT
        trips.trip_id,
        trips.title,
        trips.description,
        trips.trip_date,
        trips.location,
        users.user_id,
        users.name,
        (SELECT COUNT(*) FROM trip_rsvps WHERE trip_rsvps.trip_id = trips.trip_id) AS rsvp_count,
        EXISTS (
            SELECT 1 FROM trip_rsvps
            WHERE trip_rsvps.trip_id = trips.trip_id AND trip_rsvps.user_id = ?
        ) AS attending
    FROM
        trips JOIN users ON users.user_id = trips.user_id
    ";

impl DbClient {
    pub async fn create_trip(&self, trip: &CreateTrip) -> Result<Id<TripMarker>> {
        let trip_id = query_scalar::<_, i64>(
            "
            INSERT INTO trips (user_id, title, description, trip_date, location)
            VALUES (?, ?, ?, ?, ?)
            RETURNING trip_id
            ",
        )
        .bind(trip.author.get())
        .bind(trip.draft.title.get())
        .bind(trip.draft.description.get())
        .bind(trip.draft.date)
        .bind(trip.draft.location.get())
        .fetch_one(&self.pool)
        .await?;

        debug!(trip_id, author = %trip.author, "Created trip");
        Ok(trip_id.into())
    }

    /// The trip board, soonest trip first.
    pub async fn trips(&self, viewer: Option<Id<UserMarker>>) -> Result<Vec<Trip>> {
        let records = query_as::<_, TripRecord>(&format!(
            "{TRIPS_SELECT} ORDER BY trips.trip_date, trips.trip_id"
        ))
        .bind(viewer.map(Id::get))
        .fetch_all(&self.pool)
        .await?;

        let trips = records
            .into_iter()
            .map(Trip::try_from)
            .collect::<Result<_, _>>()?;
        Ok(trips)
    }

    pub async fn trip_details(
        &self,
        trip_id: Id<TripMarker>,
        viewer: Option<Id<UserMarker>>,
    ) -> Result<Option<TripDetails>> {
        let mut tx = self.pool.begin().await?;

        let record = query_as::<_, TripRecord>(&format!(
            "{TRIPS_SELECT} WHERE trips.trip_id = ?"
        ))
        .bind(viewer.map(Id::get))
        .bind(trip_id.get())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let comments = query_as::<_, CommentRecord>(
            "
            SELECT
                trip_comments.comment_id,
                trip_comments.trip_id AS parent_id,
                trip_comments.content,
                trip_comments.created_at,
                users.user_id,
                users.name
            FROM
                trip_comments JOIN users ON users.user_id = trip_comments.user_id
            WHERE
                trip_comments.trip_id = ?
            ORDER BY
                trip_comments.created_at, trip_comments.comment_id
            ",
        )
        .bind(trip_id.get())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(TripDetails {
            trip: record.try_into()?,
            comments: comments
                .into_iter()
                .map(TripComment::try_from)
                .collect::<Result<_, _>>()?,
        }))
    }

    /// Appends a comment to a trip. Returns `None` if the trip does not exist.
    pub async fn create_trip_comment(
        &self,
        comment: &CreateComment<TripMarker>,
    ) -> Result<Option<Id<TripCommentMarker>>> {
        let comment_id = query_scalar::<_, i64>(
            "
            INSERT INTO trip_comments (trip_id, user_id, content, created_at)
            SELECT trip_id, ?, ?, ? FROM trips WHERE trip_id = ?
            RETURNING comment_id
            ",
        )
        .bind(comment.author.get())
        .bind(comment.content.get())
        .bind(OffsetDateTime::now_utc())
        .bind(comment.target.get())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(comment_id) = comment_id {
            debug!(comment_id, trip_id = %comment.target, "Created trip comment");
        }
        Ok(comment_id.map(Into::into))
    }
}
