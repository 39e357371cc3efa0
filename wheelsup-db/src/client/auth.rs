use crate::{
    client::{DbClient, Result},
    record::AuthenticationRecord,
};
use sqlx::query_as;
use tracing::debug;
use wheelsup_common::model::auth::{AuthTokenHash, Authentication};

impl DbClient {
    pub async fn create_auth(&self, authentication: &Authentication) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO authentications (token_hash, user_id, created_at, expires_after_seconds)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(&authentication.token_hash.0[..])
        .bind(authentication.user.get())
        .bind(authentication.created_at)
        .bind(
            authentication
                .expires_after
                .map(|expires_after| expires_after.whole_seconds()),
        )
        .execute(&self.pool)
        .await?;

        debug!(user_id = %authentication.user, "Stored authentication");
        Ok(())
    }

    pub async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                user_id, token_hash, created_at, expires_after_seconds
            FROM
                authentications
            WHERE
                token_hash = ?
            ",
        )
        .bind(&token_hash.0[..])
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    /// Removes the authentication for `token_hash`. Returns whether one existed.
    pub async fn delete_auth(&self, token_hash: &AuthTokenHash) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM authentications WHERE token_hash = ?")
            .bind(&token_hash.0[..])
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::testing;
    use time::{Duration, OffsetDateTime};
    use wheelsup_common::{
        model::auth::{AUTH_TOKEN_HASH_LEN, AuthTokenHash, Authentication},
        util::PositiveDuration,
    };

    #[tokio::test]
    async fn store_fetch_delete() {
        let db = testing::client().await;
        let ada = testing::user(&db, "ada").await;

        let authentication = Authentication {
            user: ada,
            token_hash: AuthTokenHash(Box::new([7; AUTH_TOKEN_HASH_LEN])),
            created_at: OffsetDateTime::now_utc().replace_nanosecond(0).unwrap(),
            expires_after: PositiveDuration::new(Duration::days(30)),
        };
        db.create_auth(&authentication).await.unwrap();

        let fetched = db
            .fetch_auth(&authentication.token_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, authentication);

        let unknown = AuthTokenHash(Box::new([8; AUTH_TOKEN_HASH_LEN]));
        assert!(db.fetch_auth(&unknown).await.unwrap().is_none());

        assert!(db.delete_auth(&authentication.token_hash).await.unwrap());
        assert!(!db.delete_auth(&authentication.token_hash).await.unwrap());
        assert!(
            db.fetch_auth(&authentication.token_hash)
                .await
                .unwrap()
                .is_none()
        );
    }
}
