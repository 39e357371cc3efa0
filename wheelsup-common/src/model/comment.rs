use crate::{
    model::{
        Id,
        user::{UserMarker, UserSummary},
    },
    util::bounded_text,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostCommentMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct TripCommentMarker;

bounded_text!(CommentText: "comment", 1..=2000);

/// An append-only comment on a post or a trip. `Marker` is the comment table's id marker.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(bound = "")]
pub struct Comment<Marker> {
    pub id: Id<Marker>,
    pub author: UserSummary,
    pub content: CommentText,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub type PostComment = Comment<PostCommentMarker>;
pub type TripComment = Comment<TripCommentMarker>;

/// A new comment on the entity identified by `target`.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateComment<Target> {
    pub target: Id<Target>,
    pub author: Id<UserMarker>,
    pub content: CommentText,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct CommentDraft {
    pub content: CommentText,
}
