//! Song record and input shapes

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Message reported when a required field is missing on add
pub const REQUIRED_FIELDS_MESSAGE: &str = "Title and added_by are required";

/// A song submitted to the playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    /// Opaque image bytes, base64 in JSON
    #[serde(default, with = "picture_base64")]
    pub picture: Option<Vec<u8>>,
    pub added_by: String,
    pub votes: i64,
    #[serde(default)]
    pub url: Option<String>,
}

/// Input for adding a song
#[derive(Debug, Clone, Default)]
pub struct NewSong {
    pub title: String,
    pub added_by: String,
    pub picture: Option<Vec<u8>>,
    pub url: Option<String>,
}

impl NewSong {
    pub fn new(title: impl Into<String>, added_by: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            added_by: added_by.into(),
            ..Default::default()
        }
    }

    pub fn with_picture(mut self, picture: Vec<u8>) -> Self {
        self.picture = Some(picture);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Reject blank title or submitter; values are never rewritten
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.title) || is_blank(&self.added_by) {
            return Err(Error::ValidationFailed(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        Ok(())
    }
}

/// Partial update for an existing song
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct SongUpdate {
    pub title: Option<String>,
    pub picture: Option<Vec<u8>>,
    pub url: Option<String>,
}

impl SongUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.picture.is_none() && self.url.is_none()
    }

    /// Checked before any lookup so an empty update never touches the store
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::NoFieldsProvided);
        }
        if self.title.as_deref().is_some_and(is_blank) {
            return Err(Error::ValidationFailed("Title cannot be empty".to_string()));
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, song: &mut Song) {
        if let Some(title) = self.title {
            song.title = title;
        }
        if let Some(picture) = self.picture {
            song.picture = Some(picture);
        }
        if let Some(url) = self.url {
            song.url = Some(url);
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Serde adapter keeping picture bytes binary-safe in JSON
pub mod picture_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(picture: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match picture {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom))
            .transpose()
    }
}
