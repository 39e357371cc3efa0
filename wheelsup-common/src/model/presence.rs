use crate::model::{Id, post::PostMarker, trip::TripMarker, user::UserMarker};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceKind {
    Like,
    Follow,
    Rsvp,
}

/// A binary relation between an acting user and a target, flipped by each toggle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum PresenceToggle {
    Like {
        user: Id<UserMarker>,
        post: Id<PostMarker>,
    },
    Follow {
        follower: Id<UserMarker>,
        followee: Id<UserMarker>,
    },
    Rsvp {
        user: Id<UserMarker>,
        trip: Id<TripMarker>,
    },
}

impl PresenceToggle {
    #[must_use]
    pub fn kind(self) -> PresenceKind {
        match self {
            PresenceToggle::Like { .. } => PresenceKind::Like,
            PresenceToggle::Follow { .. } => PresenceKind::Follow,
            PresenceToggle::Rsvp { .. } => PresenceKind::Rsvp,
        }
    }

    #[must_use]
    pub fn actor(self) -> Id<UserMarker> {
        match self {
            PresenceToggle::Like { user, .. } | PresenceToggle::Rsvp { user, .. } => user,
            PresenceToggle::Follow { follower, .. } => follower,
        }
    }

    /// Raw row id of the target (post, followee or trip).
    #[must_use]
    pub fn target(self) -> i64 {
        match self {
            PresenceToggle::Like { post, .. } => post.get(),
            PresenceToggle::Follow { followee, .. } => followee.get(),
            PresenceToggle::Rsvp { trip, .. } => trip.get(),
        }
    }
}

/// Outcome of a toggle: whether the pair is now present, and how many actors the target has.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
pub struct PresenceState {
    pub kind: PresenceKind,
    pub active: bool,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        presence::{PresenceKind, PresenceState, PresenceToggle},
    };

    #[test]
    fn toggle_parts() {
        let follow = PresenceToggle::Follow {
            follower: Id::new(1),
            followee: Id::new(2),
        };
        assert_eq!(follow.kind(), PresenceKind::Follow);
        assert_eq!(follow.actor(), Id::new(1));
        assert_eq!(follow.target(), 2);

        let rsvp = PresenceToggle::Rsvp {
            user: Id::new(3),
            trip: Id::new(9),
        };
        assert_eq!(rsvp.kind(), PresenceKind::Rsvp);
        assert_eq!(rsvp.actor(), Id::new(3));
        assert_eq!(rsvp.target(), 9);
    }

    #[test]
    fn state_serialization() {
        let state = PresenceState {
            kind: PresenceKind::Like,
            active: true,
            count: 3,
        };
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            r#"{"kind":"like","active":true,"count":3}"#
        );
    }
}
