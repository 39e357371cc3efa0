use crate::{
    model::{
        Id,
        comment::TripComment,
        user::{UserMarker, UserSummary},
    },
    util::bounded_text,
};
use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct TripMarker;

bounded_text!(TripTitle: "trip title", 1..=100);
bounded_text!(TripDescription: "trip description", 0..=2000);
bounded_text!(TripLocation: "trip location", 0..=100);

time::serde::format_description!(trip_date, Date, "[year]-[month]-[day]");

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Trip {
    pub id: Id<TripMarker>,
    pub author: UserSummary,
    pub title: TripTitle,
    pub description: TripDescription,
    #[serde(with = "trip_date")]
    pub date: Date,
    pub location: TripLocation,
    pub rsvp_count: u64,
    pub attending: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct TripDetails {
    #[serde(flatten)]
    pub trip: Trip,
    pub comments: Vec<TripComment>,
}

/// Trip as submitted on the board by its organizer.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct TripDraft {
    pub title: TripTitle,
    #[serde(default = "TripDescription::empty")]
    pub description: TripDescription,
    #[serde(with = "trip_date")]
    pub date: Date,
    #[serde(default = "TripLocation::empty")]
    pub location: TripLocation,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateTrip {
    pub author: Id<UserMarker>,
    pub draft: TripDraft,
}

impl TripDescription {
    fn empty() -> Self {
        Self(String::new())
    }
}

impl TripLocation {
    fn empty() -> Self {
        Self(String::new())
    }
}
