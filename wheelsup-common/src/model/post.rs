use crate::{
    model::{
        Id,
        blob::BlobRef,
        comment::PostComment,
        user::{UserMarker, UserSummary},
    },
    util::bounded_text,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

bounded_text!(
    /// Post body. May be empty when the post carries an image.
    PostText: "post", 0..=2000
);

impl PostText {
    fn empty() -> Self {
        Self(String::new())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A post needs either text or an image")]
pub struct EmptyPostError;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: UserSummary,
    pub content: PostText,
    pub image_ref: Option<BlobRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A post joined with its derived like count and its comment thread in creation order.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct EnrichedPost {
    #[serde(flatten)]
    pub post: Post,
    pub like_count: u64,
    pub liked_by_viewer: bool,
    pub comments: Vec<PostComment>,
}

/// Body of a new post as submitted by its author.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct PostDraft {
    #[serde(default = "PostText::empty")]
    pub content: PostText,
    #[serde(default)]
    pub image_ref: Option<BlobRef>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub content: PostText,
    pub image_ref: Option<BlobRef>,
}

impl CreatePost {
    pub fn new(author: Id<UserMarker>, draft: PostDraft) -> Result<Self, EmptyPostError> {
        if draft.content.is_empty() && draft.image_ref.is_none() {
            return Err(EmptyPostError);
        }

        Ok(Self {
            author,
            content: draft.content,
            image_ref: draft.image_ref,
        })
    }
}
