use crate::{
    model::{Id, auth::PasswordDigest, blob::BlobRef},
    util::bounded_text,
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

pub const EMAIL_MAX_LEN: usize = 254;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

bounded_text!(DisplayName: "display name", 1..=50);
bounded_text!(
    /// Free-form profile field: bio, location, vehicle or skills.
    ProfileText: "profile field", 0..=500
);

/// The public part of a user, as shown next to posts, comments and notifications.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct UserSummary {
    pub id: Id<UserMarker>,
    pub name: DisplayName,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub name: DisplayName,
    pub bio: Option<ProfileText>,
    pub location: Option<ProfileText>,
    pub vehicle: Option<ProfileText>,
    pub skills: Option<ProfileText>,
    pub avatar_ref: Option<BlobRef>,
    pub cover_ref: Option<BlobRef>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub follower_count: u64,
    pub following_count: u64,
    pub followed_by_viewer: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateUser {
    pub email: Email,
    pub name: DisplayName,
    pub password_digest: PasswordDigest,
}

/// A profile edit. Text fields are overwritten as given, images are only replaced when present.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub bio: Option<ProfileText>,
    pub location: Option<ProfileText>,
    pub vehicle: Option<ProfileText>,
    pub skills: Option<ProfileText>,
    pub avatar_ref: Option<BlobRef>,
    pub cover_ref: Option<BlobRef>,
}

/// A lower-cased email address with a non-empty local part and domain.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The email address is invalid: {0}")]
pub struct InvalidEmailError(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, InvalidEmailError> {
        let email = email.into();
        let normalized = email.trim().to_lowercase();

        let well_formed = match normalized.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        };

        if well_formed
            && normalized.chars().count() <= EMAIL_MAX_LEN
            && !normalized.contains(char::is_whitespace)
        {
            Ok(Email(normalized))
        } else {
            Err(InvalidEmailError(email))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Email::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Email"))
    }
}
