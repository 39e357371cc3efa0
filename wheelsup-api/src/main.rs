use crate::server::{AuthConfig, ServerState, blob::LocalBlobStore};
use axum::extract::DefaultBodyLimit;
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::signal::ctrl_c;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wheelsup_common::util::PositiveDuration;
use wheelsup_db::client::{DbClient, DbError, DbOptions};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("The token lifetime must be positive, got {0} seconds")]
    TokenLifetime(u64),
    #[error("Error opening database: {0}")]
    Database(#[from] DbError),
    #[error("Error creating upload directory: {0}")]
    UploadDir(std::io::Error),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: String,
    #[serde(default = "Env::default_database_max_connections")]
    database_max_connections: u32,
    #[serde(default = "Env::default_database_busy_timeout_ms")]
    database_busy_timeout_ms: u64,
    #[serde(default = "Env::default_upload_dir")]
    upload_dir: PathBuf,
    #[serde(default = "Env::default_max_upload_bytes")]
    max_upload_bytes: usize,
    token_lifetime_seconds: Option<u64>,
}

impl Env {
    fn default_database_max_connections() -> u32 {
        8
    }

    fn default_database_busy_timeout_ms() -> u64 {
        5000
    }

    fn default_upload_dir() -> PathBuf {
        PathBuf::from("uploads")
    }

    fn default_max_upload_bytes() -> usize {
        10 * 1024 * 1024
    }

    fn token_lifetime(&self) -> Result<Option<PositiveDuration>, InitError> {
        self.token_lifetime_seconds
            .map(|seconds| {
                PositiveDuration::from_seconds(seconds).ok_or(InitError::TokenLifetime(seconds))
            })
            .transpose()
    }
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wheelsup_api=debug,\
                wheelsup_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = ctrl_c().await {
            error!(%err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!(%err, "Failed to listen for terminate signal");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let db_client = DbClient::connect(&DbOptions {
        url: env.database_url.clone(),
        max_connections: env.database_max_connections,
        busy_timeout: Duration::from_millis(env.database_busy_timeout_ms),
    })
    .await?;

    let blob_store = LocalBlobStore::create(env.upload_dir.clone())
        .await
        .map_err(InitError::UploadDir)?;
    info!(upload_dir = %blob_store.dir().display(), "Storing uploads");

    let state = ServerState {
        db_client: Arc::new(db_client),
        blob_store: Arc::new(blob_store),
        auth: AuthConfig {
            token_lifetime: env.token_lifetime()?,
        },
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes()
        .layer(DefaultBodyLimit::max(env.max_upload_bytes))
        .layer(tracing_layer)
        .with_state(state);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    info!("Server shut down");
    Ok(())
}
