use crate::{
    client::{DbClient, DbError, Result},
    record::{CredentialsRecord, UserRecord, UserSummaryRecord},
};
use sqlx::{query_as, query_scalar};
use tracing::debug;
use wheelsup_common::model::{
    Id,
    auth::PasswordDigest,
    presence::PresenceToggle,
    user::{CreateUser, Email, Profile, ProfileUpdate, User, UserMarker, UserSummary},
};

impl DbClient {
    /// Registers a new user. An already registered email yields [`DbError::EmailTaken`].
    pub async fn create_user(&self, user: &CreateUser) -> Result<Id<UserMarker>> {
        let inserted = query_scalar::<_, i64>(
            "
            INSERT INTO users (email, password_digest, name)
            VALUES (?, ?, ?)
            RETURNING user_id
            ",
        )
        .bind(user.email.get())
        .bind(user.password_digest.get())
        .bind(user.name.get())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user_id) => {
                debug!(user_id, "Registered user");
                Ok(user_id.into())
            }
            Err(err) if DbError::is_unique_violation(&err) => {
                Err(DbError::EmailTaken(user.email.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                user_id, name, bio, location, vehicle, skills, avatar_ref, cover_ref
            FROM
                users
            WHERE
                user_id = ?
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Id<UserMarker>, PasswordDigest)>> {
        let record = query_as::<_, CredentialsRecord>(
            "
            SELECT
                user_id, password_digest
            FROM
                users
            WHERE
                email = ?
            ",
        )
        .bind(email.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(|record| {
            (
                record.user_id.into(),
                PasswordDigest::from_stored(record.password_digest),
            )
        }))
    }

    /// Applies a profile edit and returns the updated user, or `None` if the user is absent.
    pub async fn update_profile(
        &self,
        user_id: Id<UserMarker>,
        update: &ProfileUpdate,
    ) -> Result<Option<User>> {
        let updated = sqlx::query(
            "
            UPDATE users
            SET
                bio = ?,
                location = ?,
                vehicle = ?,
                skills = ?,
                avatar_ref = COALESCE(?, avatar_ref),
                cover_ref = COALESCE(?, cover_ref)
            WHERE
                user_id = ?
            ",
        )
        .bind(update.bio.as_ref().map(|text| text.get()))
        .bind(update.location.as_ref().map(|text| text.get()))
        .bind(update.vehicle.as_ref().map(|text| text.get()))
        .bind(update.skills.as_ref().map(|text| text.get()))
        .bind(update.avatar_ref.as_ref().map(|blob| blob.get()))
        .bind(update.cover_ref.as_ref().map(|blob| blob.get()))
        .bind(user_id.get())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        debug!(%user_id, "Updated profile");
        self.fetch_user(user_id).await
    }

    /// The most recently registered users, newest first.
    pub async fn recent_users(&self, limit: u32) -> Result<Vec<UserSummary>> {
        let records = query_as::<_, UserSummaryRecord>(
            "
            SELECT
                user_id, name
            FROM
                users
            ORDER BY
                user_id DESC
            LIMIT ?
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let users = records
            .into_iter()
            .map(UserSummary::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }

    /// A user together with follow counts and whether `viewer` follows them.
    pub async fn fetch_profile(
        &self,
        user_id: Id<UserMarker>,
        viewer: Option<Id<UserMarker>>,
    ) -> Result<Option<Profile>> {
        let Some(user) = self.fetch_user(user_id).await? else {
            return Ok(None);
        };

        let followed_by_viewer = match viewer {
            Some(viewer) => {
                self.presence_active(PresenceToggle::Follow {
                    follower: viewer,
                    followee: user_id,
                })
                .await?
            }
            None => false,
        };

        Ok(Some(Profile {
            user,
            follower_count: self.follower_count(user_id).await?,
            following_count: self.following_count(user_id).await?,
            followed_by_viewer,
        }))
    }
}
