//! Song playlist endpoints
//!
//! JSON in, JSON out. Pictures travel base64-encoded in JSON bodies and as
//! raw bytes from `/song_picture/:id`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use jukevote_common::{NewSong, Song, SongUpdate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Body of POST /add_song
///
/// Missing fields deserialize as absent so the store reports the
/// validation failure instead of the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct AddSongRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub added_by: Option<String>,
    /// Base64-encoded image
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of PUT /edit_song/:id
#[derive(Debug, Default, Deserialize)]
pub struct EditSongRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub message: &'static str,
    pub song: Song,
}

#[derive(Debug, Serialize)]
pub struct SongsResponse {
    pub songs: Vec<Song>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /add_song
pub async fn add_song(
    State(state): State<AppState>,
    payload: Result<Json<AddSongRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SongResponse>)> {
    let Json(request) = payload?;

    let new_song = NewSong {
        title: request.title.unwrap_or_default(),
        added_by: request.added_by.unwrap_or_default(),
        picture: decode_picture(request.picture)?,
        url: request.url,
    };

    let song = state.store.add(new_song).await?;
    info!(id = song.id, added_by = %song.added_by, "Song added: {}", song.title);

    Ok((
        StatusCode::CREATED,
        Json(SongResponse {
            message: "Song added successfully",
            song,
        }),
    ))
}

/// GET /get_songs
///
/// Highest votes first; ties keep submission order.
pub async fn get_songs(State(state): State<AppState>) -> ApiResult<Json<SongsResponse>> {
    let songs = state.store.list().await?;
    Ok(Json(SongsResponse { songs }))
}

/// POST /vote_song/:id
pub async fn vote_song(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SongResponse>> {
    let id = song_id(id)?;
    let song = state.store.vote(id).await?;
    info!(id, votes = song.votes, "Vote recorded");

    Ok(Json(SongResponse {
        message: "Vote added",
        song,
    }))
}

/// PUT /edit_song/:id
pub async fn edit_song(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EditSongRequest>, JsonRejection>,
) -> ApiResult<Json<SongResponse>> {
    let id = song_id(id)?;
    let Json(request) = payload?;

    let update = SongUpdate {
        title: request.title,
        picture: decode_picture(request.picture)?,
        url: request.url,
    };

    let song = state.store.edit(id, update).await?;
    info!(id, "Song updated");

    Ok(Json(SongResponse {
        message: "Song updated",
        song,
    }))
}

/// DELETE /delete_song/:id
pub async fn delete_song(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = song_id(id)?;
    state.store.delete(id).await?;
    info!(id, "Song deleted");

    Ok(Json(MessageResponse {
        message: "Song deleted",
    }))
}

/// GET /song_picture/:id
///
/// Raw picture bytes. 404 when the song is unknown or has no picture.
pub async fn get_song_picture(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Response> {
    let id = song_id(id)?;
    let song = state.store.get(id).await?;

    let picture = song.picture.ok_or(ApiError::NoPicture)?;
    let content_type = sniff_image_type(&picture);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        picture,
    )
        .into_response())
}

/// Ids are integers; anything else names no song.
fn song_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id).map_err(|_| ApiError::SongNotFound)
}

/// Empty string means no picture
fn decode_picture(encoded: Option<String>) -> ApiResult<Option<Vec<u8>>> {
    match encoded {
        Some(s) if !s.is_empty() => STANDARD
            .decode(s.as_bytes())
            .map(Some)
            .map_err(|e| ApiError::BadRequest(format!("picture is not valid base64: {}", e))),
        _ => Ok(None),
    }
}

/// Content type from the leading magic bytes
pub fn sniff_image_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
        "image/png"
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}
