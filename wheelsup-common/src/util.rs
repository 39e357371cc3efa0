use thiserror::Error;
use time::Duration;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Default, Hash)]
pub struct PositiveDuration(Duration);

impl PositiveDuration {
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        duration.is_positive().then_some(Self(duration))
    }

    #[must_use]
    pub fn from_seconds(seconds: u64) -> Option<Self> {
        i64::try_from(seconds)
            .ok()
            .and_then(|seconds| Self::new(Duration::seconds(seconds)))
    }

    #[must_use]
    pub fn get(&self) -> Duration {
        self.0
    }

    #[must_use]
    pub fn whole_seconds(&self) -> i64 {
        self.0.whole_seconds()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The duration is not positive: {0}")]
pub struct NonPositiveDurationError(Duration);

impl TryFrom<Duration> for PositiveDuration {
    type Error = NonPositiveDurationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NonPositiveDurationError(value))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
#[error("The {field} must be between {min} and {max} characters long, got {len}")]
pub struct InvalidTextError {
    pub field: &'static str,
    pub min: usize,
    pub max: usize,
    pub len: usize,
}

/// Trims `text` and checks that the remaining character count lies in `min..=max`.
pub(crate) fn bounded(
    text: String,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<String, InvalidTextError> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();

    if !(min..=max).contains(&len) {
        return Err(InvalidTextError {
            field,
            min,
            max,
            len,
        });
    }

    if trimmed.len() == text.len() {
        Ok(text)
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Declares a trimmed, length-checked string newtype that validates on deserialization.
macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident: $field:literal, $min:literal..=$max:literal) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const MIN_LEN: usize = $min;
            pub const MAX_LEN: usize = $max;

            pub fn new(text: impl Into<String>) -> Result<Self, $crate::util::InvalidTextError> {
                $crate::util::bounded(text.into(), $field, $min, $max).map(Self)
            }

            #[must_use]
            pub fn get(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let inner = <String as serde::Deserialize<'de>>::deserialize(deserializer)?;
                Self::new(inner).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use bounded_text;
