use crate::model::{Id, post::EnrichedPost, user::UserMarker};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Which posts a feed is assembled from.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum FeedScope {
    All,
    ByAuthor(Id<UserMarker>),
    /// A store-random sample of at most this many posts.
    Random(u32),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrder {
    #[default]
    RecencyDescending,
    Unordered,
}

/// Sorts newest first. Posts created at the same instant are ordered by id, highest first.
pub fn sort_recent_first(posts: &mut [EnrichedPost]) {
    posts.sort_by_key(|enriched| Reverse((enriched.post.created_at, enriched.post.id)));
}
