use crate::client::{DbClient, DbError, Result};
use sqlx::query_scalar;
use tracing::debug;
use wheelsup_common::model::{
    Id,
    presence::{PresenceKind, PresenceState, PresenceToggle},
    user::UserMarker,
};

/// Statements for one presence table. Every statement binds the actor before the target.
struct PresenceStatements {
    /// Inserts the pair only if the target exists; a present pair is left untouched.
    insert: &'static str,
    delete: &'static str,
    active: &'static str,
    /// Binds only the target.
    count: &'static str,
}

impl PresenceStatements {
    fn of(kind: PresenceKind) -> &'static Self {
        match kind {
            PresenceKind::Like => &LIKES,
            PresenceKind::Follow => &FOLLOWS,
            PresenceKind::Rsvp => &TRIP_RSVPS,
        }
    }
}

static LIKES: PresenceStatements = PresenceStatements {
    insert: "
        INSERT INTO likes (user_id, post_id)
        SELECT ?, post_id FROM posts WHERE post_id = ?
        ON CONFLICT DO NOTHING
        ",
    delete: "DELETE FROM likes WHERE user_id = ? AND post_id = ?",
    active: "SELECT EXISTS (SELECT 1 FROM likes WHERE user_id = ? AND post_id = ?)",
    count: "SELECT COUNT(*) FROM likes WHERE post_id = ?",
};

static FOLLOWS: PresenceStatements = PresenceStatements {
    insert: "
        INSERT INTO follows (follower_id, followee_id)
        SELECT ?, user_id FROM users WHERE user_id = ?
        ON CONFLICT DO NOTHING
        ",
    delete: "DELETE FROM follows WHERE follower_id = ? AND followee_id = ?",
    active: "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)",
    count: "SELECT COUNT(*) FROM follows WHERE followee_id = ?",
};

static TRIP_RSVPS: PresenceStatements = PresenceStatements {
    insert: "
        INSERT INTO trip_rsvps (user_id, trip_id)
        SELECT ?, trip_id FROM trips WHERE trip_id = ?
        ON CONFLICT DO NOTHING
        ",
    delete: "DELETE FROM trip_rsvps WHERE user_id = ? AND trip_id = ?",
    active: "SELECT EXISTS (SELECT 1 FROM trip_rsvps WHERE user_id = ? AND trip_id = ?)",
    count: "SELECT COUNT(*) FROM trip_rsvps WHERE trip_id = ?",
};

impl DbClient {
    /// Flips the presence of the pair and returns the resulting state.
    ///
    /// Returns `None` if the target does not exist. The insert and the fallback delete run in
    /// one transaction that starts with a write, so concurrent toggles of the same pair
    /// serialize on the database write lock.
    pub async fn toggle_presence(&self, toggle: PresenceToggle) -> Result<Option<PresenceState>> {
        let statements = PresenceStatements::of(toggle.kind());
        let actor = toggle.actor().get();
        let target = toggle.target();

        let mut tx = self.pool.begin().await.map_err(DbError::from_contended)?;

        let inserted = sqlx::query(statements.insert)
            .bind(actor)
            .bind(target)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_contended)?
            .rows_affected()
            > 0;

        if !inserted {
            let deleted = sqlx::query(statements.delete)
                .bind(actor)
                .bind(target)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from_contended)?
                .rows_affected();

            // Neither inserted nor deleted: the target is missing.
            if deleted == 0 {
                return Ok(None);
            }
        }

        let count = query_scalar::<_, i64>(statements.count)
            .bind(target)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from_contended)?;

        tx.commit().await.map_err(DbError::from_contended)?;

        let state = PresenceState {
            kind: toggle.kind(),
            active: inserted,
            count: count.cast_unsigned(),
        };
        debug!(?toggle, active = state.active, count = state.count, "Toggled presence");
        Ok(Some(state))
    }

    /// Whether the actor of `toggle` is currently present on its target.
    pub async fn presence_active(&self, toggle: PresenceToggle) -> Result<bool> {
        let statements = PresenceStatements::of(toggle.kind());

        let active = query_scalar::<_, bool>(statements.active)
            .bind(toggle.actor().get())
            .bind(toggle.target())
            .fetch_one(&self.pool)
            .await?;

        Ok(active)
    }

    pub async fn follower_count(&self, user: Id<UserMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>(FOLLOWS.count)
            .bind(user.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.cast_unsigned())
    }

    pub async fn following_count(&self, user: Id<UserMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.cast_unsigned())
    }
}
