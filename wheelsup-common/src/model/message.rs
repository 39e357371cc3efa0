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
pub struct MessageMarker;

bounded_text!(MessageText: "message", 1..=2000);

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Message {
    pub id: Id<MessageMarker>,
    pub sender: Id<UserMarker>,
    pub receiver: Id<UserMarker>,
    pub text: MessageText,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct MessageDraft {
    pub text: MessageText,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateMessage {
    pub sender: Id<UserMarker>,
    pub receiver: Id<UserMarker>,
    pub text: MessageText,
}

/// An inbox entry: someone the user has exchanged messages with.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct ConversationPartner {
    pub user: UserSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_at: OffsetDateTime,
}
