use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;

pub const BLOB_REF_MAX_LEN: usize = 160;

/// Opaque reference to a stored file, embedded verbatim in posts and profiles.
///
/// Restricted to ASCII alphanumerics, `-`, `_` and `.` (not leading), so a reference can be
/// used as a file name without escaping the storage directory.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct BlobRef(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The blob reference is invalid: {0}")]
pub struct InvalidBlobRefError(String);

impl BlobRef {
    pub fn new(reference: String) -> Result<Self, InvalidBlobRefError> {
        let valid = !reference.is_empty()
            && reference.len() <= BLOB_REF_MAX_LEN
            && !reference.starts_with('.')
            && reference
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if valid {
            Ok(Self(reference))
        } else {
            Err(InvalidBlobRefError(reference))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BlobRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        BlobRef::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"BlobRef"))
    }
}
