mod auth;
mod feed;
mod messages;
mod notifications;
mod posts;
mod presence;
mod trips;
mod users;

use sqlx::{
    SqlitePool,
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tracing::info;
use wheelsup_common::model::{ModelValidationError, user::Email};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("The email address {} is already registered", .0.get())]
    EmailTaken(Email),
    #[error("A concurrent write on the same relation could not be serialized")]
    ConstraintRace,
    #[error("Applying migrations failed: {0}")]
    Migrate(#[from] MigrateError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// Maps lock timeouts to [`DbError::ConstraintRace`]; everything else stays a driver error.
    pub(crate) fn from_contended(err: sqlx::Error) -> Self {
        let busy_or_locked = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED));

        if busy_or_locked {
            DbError::ConstraintRace
        } else {
            DbError::Sqlx(err)
        }
    }

    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct DbOptions {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct DbClient {
    pool: SqlitePool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `options.url` and applies pending migrations.
    pub async fn connect(options: &DbOptions) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(&options.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(options.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect_options)
            .await?;

        let client = Self::new(pool);
        client.migrate().await?;

        info!(url = %options.url, "Connected to database");
        Ok(client)
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::client::DbClient;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use wheelsup_common::model::{
        Id,
        auth::PasswordDigest,
        comment::{CommentText, CreateComment},
        post::{CreatePost, PostMarker, PostText},
        user::{CreateUser, DisplayName, Email, UserMarker},
    };

    /// Digests are opaque to the store, so tests skip the Argon2 work.
    pub(crate) const TEST_DIGEST: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGVzdHNhbHQ$dGVzdGhhc2g";

    /// A fresh in-memory database. A single connection keeps every query on the same database.
    pub(crate) async fn client() -> DbClient {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .unwrap();

        let client = DbClient::new(pool);
        client.migrate().await.unwrap();
        client
    }

    pub(crate) async fn user(db: &DbClient, name: &str) -> Id<UserMarker> {
        db.create_user(&CreateUser {
            email: Email::new(format!("{name}@wheelsup.test")).unwrap(),
            name: DisplayName::new(name).unwrap(),
            password_digest: PasswordDigest::from_stored(TEST_DIGEST.to_owned()),
        })
        .await
        .unwrap()
    }

    pub(crate) async fn post(db: &DbClient, author: Id<UserMarker>, text: &str) -> Id<PostMarker> {
        db.create_post(&CreatePost {
            author,
            content: PostText::new(text).unwrap(),
            image_ref: None,
        })
        .await
        .unwrap()
    }

    pub(crate) async fn comment(
        db: &DbClient,
        post: Id<PostMarker>,
        author: Id<UserMarker>,
        text: &str,
    ) {
        db.create_post_comment(&CreateComment {
            target: post,
            author,
            content: CommentText::new(text).unwrap(),
        })
        .await
        .unwrap()
        .unwrap();
    }
}
