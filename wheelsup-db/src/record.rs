use sqlx::FromRow;
use time::{Date, Duration, OffsetDateTime};
use wheelsup_common::model::{
    ModelValidationError,
    auth::Authentication,
    blob::BlobRef,
    comment::{Comment, CommentText},
    message::{ConversationPartner, Message, MessageText},
    notification::{Notification, NotificationKind},
    post::{EnrichedPost, Post, PostText},
    trip::{Trip, TripDescription, TripLocation, TripTitle},
    user::{DisplayName, ProfileText, User, UserSummary},
};

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub vehicle: Option<String>,
    pub skills: Option<String>,
    pub avatar_ref: Option<String>,
    pub cover_ref: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserSummaryRecord {
    pub user_id: i64,
    pub name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CredentialsRecord {
    pub user_id: i64,
    pub password_digest: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_after_seconds: Option<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub content: String,
    pub image_ref: Option<String>,
    pub created_at: OffsetDateTime,
    pub user_id: i64,
    pub name: String,
    pub like_count: i64,
    pub liked_by_viewer: bool,
}

/// A post or trip comment. `parent_id` is the post or trip it belongs to.
#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: i64,
    pub parent_id: i64,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub user_id: i64,
    pub name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct NotificationRecord {
    pub post_id: Option<i64>,
    pub user_id: i64,
    pub name: String,
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct TripRecord {
    pub trip_id: i64,
    pub title: String,
    pub description: String,
    pub trip_date: Date,
    pub location: String,
    pub user_id: i64,
    pub name: String,
    pub rsvp_count: i64,
    pub attending: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct MessageRecord {
    pub message_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PartnerRecord {
    pub user_id: i64,
    pub name: String,
    pub last_message_at: OffsetDateTime,
}

fn summary(user_id: i64, name: String) -> Result<UserSummary, ModelValidationError> {
    Ok(UserSummary {
        id: user_id.into(),
        name: DisplayName::new(name)?,
    })
}

fn profile_text(text: Option<String>) -> Result<Option<ProfileText>, ModelValidationError> {
    Ok(text.map(ProfileText::new).transpose()?)
}

fn blob_ref(reference: Option<String>) -> Result<Option<BlobRef>, ModelValidationError> {
    Ok(reference.map(BlobRef::new).transpose()?)
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.into(),
            name: DisplayName::new(value.name)?,
            bio: profile_text(value.bio)?,
            location: profile_text(value.location)?,
            vehicle: profile_text(value.vehicle)?,
            skills: profile_text(value.skills)?,
            avatar_ref: blob_ref(value.avatar_ref)?,
            cover_ref: blob_ref(value.cover_ref)?,
        })
    }
}

impl TryFrom<UserSummaryRecord> for UserSummary {
    type Error = ModelValidationError;

    fn try_from(value: UserSummaryRecord) -> Result<Self, Self::Error> {
        summary(value.user_id, value.name)
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            token_hash: value.token_hash.try_into()?,
            created_at: value.created_at,
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}

impl TryFrom<PostRecord> for EnrichedPost {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            post: Post {
                id: value.post_id.into(),
                author: summary(value.user_id, value.name)?,
                content: PostText::new(value.content)?,
                image_ref: blob_ref(value.image_ref)?,
                created_at: value.created_at,
            },
            like_count: value.like_count.cast_unsigned(),
            liked_by_viewer: value.liked_by_viewer,
            comments: Vec::new(),
        })
    }
}

impl<Marker> TryFrom<CommentRecord> for Comment<Marker> {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.into(),
            author: summary(value.user_id, value.name)?,
            content: CommentText::new(value.content)?,
            created_at: value.created_at,
        })
    }
}

impl NotificationRecord {
    pub(crate) fn into_notification(
        self,
        kind: NotificationKind,
    ) -> Result<Notification, ModelValidationError> {
        Ok(Notification {
            subject_post: self.post_id.map(Into::into),
            actor: summary(self.user_id, self.name)?,
            kind,
            timestamp: self.created_at,
        })
    }
}

impl TryFrom<TripRecord> for Trip {
    type Error = ModelValidationError;

    fn try_from(value: TripRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.trip_id.into(),
            author: summary(value.user_id, value.name)?,
            title: TripTitle::new(value.title)?,
            description: TripDescription::new(value.description)?,
            date: value.trip_date,
            location: TripLocation::new(value.location)?,
            rsvp_count: value.rsvp_count.cast_unsigned(),
            attending: value.attending,
        })
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = ModelValidationError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.message_id.into(),
            sender: value.sender_id.into(),
            receiver: value.receiver_id.into(),
            text: MessageText::new(value.content)?,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<PartnerRecord> for ConversationPartner {
    type Error = ModelValidationError;

    fn try_from(value: PartnerRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: summary(value.user_id, value.name)?,
            last_message_at: value.last_message_at,
        })
    }
}
