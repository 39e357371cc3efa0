use async_trait::async_trait;
use std::{
    fmt::Debug,
    io::ErrorKind,
    path::{Path, PathBuf},
    pin::Pin,
};
use thiserror::Error;
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
};
use tracing::{debug, warn};
use wheelsup_common::model::blob::{BlobRef, InvalidBlobRefError};

/// Longest sanitized file name kept after the random prefix.
const MAX_FILE_NAME_LEN: usize = 100;
const FALLBACK_FILE_NAME: &str = "upload";

pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    InvalidReference(#[from] InvalidBlobRefError),
}

/// Storage for uploaded files. Contents are opaque; only the returned reference is kept.
#[async_trait]
pub trait BlobStore: Debug + Send + Sync {
    async fn store(&self, original_name: &str, contents: &[u8]) -> Result<BlobRef, BlobError>;

    /// Opens a stored blob for reading, or `None` if nothing is stored under `reference`.
    async fn open(&self, reference: &BlobRef) -> Result<Option<BlobReader>, BlobError>;
}

/// Files in a single directory, named `{random hex}-{sanitized original name}`.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct LocalBlobStore {
    dir: PathBuf,
}

impl LocalBlobStore {
    pub async fn create(dir: PathBuf) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, original_name: &str, contents: &[u8]) -> Result<BlobRef, BlobError> {
        let prefix: u64 = rand::random();
        let reference = BlobRef::new(format!(
            "{prefix:016x}-{}",
            sanitize_file_name(original_name)
        ))?;

        let path = self.dir.join(reference.get());
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        write_or_remove(file, &path, contents).await?;

        debug!(%reference, bytes = contents.len(), "Stored blob");
        Ok(reference)
    }

    async fn open(&self, reference: &BlobRef) -> Result<Option<BlobReader>, BlobError> {
        match File::open(self.dir.join(reference.get())).await {
            Ok(file) => {
                let reader: BlobReader = Box::pin(file);
                Ok(Some(reader))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Writes `contents` to the freshly created file at `path`, removing the file if the write fails.
async fn write_or_remove<W>(mut writer: W, path: &Path, contents: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(contents).await?;
        writer.flush().await
    }
    .await;

    if let Err(err) = written {
        drop(writer);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), %remove_err, "Failed to remove partial blob");
        }
        return Err(err);
    }

    Ok(())
}

/// Reduces a client supplied name to its last path segment made of `[A-Za-z0-9._-]`.
fn sanitize_file_name(original_name: &str) -> String {
    let last_segment = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let sanitized: String = last_segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .skip_while(|c| *c == '.')
        .take(MAX_FILE_NAME_LEN)
        .collect();

    if sanitized.is_empty() {
        FALLBACK_FILE_NAME.to_owned()
    } else {
        sanitized
    }
}
