use crate::model::{Id, post::PostMarker, user::UserSummary};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
pub enum NotificationKind {
    #[serde(rename = "liked your post")]
    Like,
    #[serde(rename = "commented on your post")]
    Comment,
    #[serde(rename = "followed you")]
    Follow,
}

impl NotificationKind {
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            NotificationKind::Like => "liked your post",
            NotificationKind::Comment => "commented on your post",
            NotificationKind::Follow => "followed you",
        }
    }
}

/// Something another user did to the recipient's content or account.
///
/// Follow events have neither a subject post nor a timestamp. Like events carry the liked
/// post's creation time since likes themselves are not timed.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Notification {
    pub subject_post: Option<Id<PostMarker>>,
    pub actor: UserSummary,
    #[serde(rename = "verb")]
    pub kind: NotificationKind,
    #[serde(with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}
