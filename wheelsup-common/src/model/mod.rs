pub mod auth;
pub mod blob;
pub mod comment;
pub mod feed;
pub mod message;
pub mod notification;
pub mod post;
pub mod presence;
pub mod trip;
pub mod user;

use crate::{
    model::{
        auth::InvalidAuthTokenHashError, blob::InvalidBlobRefError, post::EmptyPostError,
        user::InvalidEmailError,
    },
    util::{InvalidTextError, NonPositiveDurationError},
};
use derive_where::derive_where;
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Email(#[from] InvalidEmailError),
    #[error(transparent)]
    Text(#[from] InvalidTextError),
    #[error(transparent)]
    BlobRef(#[from] InvalidBlobRefError),
    #[error(transparent)]
    EmptyPost(#[from] EmptyPostError),
    #[error(transparent)]
    NonPositiveDuration(#[from] NonPositiveDurationError),
    #[error(transparent)]
    TokenHash(#[from] InvalidAuthTokenHashError),
}

/// Row id of an entity, tagged with the entity kind so ids of different tables don't mix.
#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<Marker>(i64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<i64> for Id<Marker> {
    fn from(value: i64) -> Self {
        Id::new(value)
    }
}

impl<Marker> From<Id<Marker>> for i64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}
