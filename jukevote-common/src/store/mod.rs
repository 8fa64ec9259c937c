//! Song storage contract and its backends
//!
//! Both backends honor the same guarantees:
//! - ids are assigned on add and never reused, even after delete
//! - `list` orders by votes descending, ties by id ascending
//! - every mutation is visible to the next `list` before it returns
//! - operations on a missing id fail with [`Error::NotFound`](crate::Error::NotFound)

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::models::{NewSong, Song, SongUpdate};
use crate::Result;

/// Song repository interface
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Validate and store a new song with zero votes
    ///
    /// # Errors
    /// - `ValidationFailed` if title or added_by is blank
    async fn add(&self, song: NewSong) -> Result<Song>;

    /// All songs, most voted first
    async fn list(&self) -> Result<Vec<Song>>;

    /// Find a song by id
    async fn get(&self, id: i64) -> Result<Song>;

    /// Add exactly one vote
    async fn vote(&self, id: i64) -> Result<Song>;

    /// Overwrite the provided fields of a song
    ///
    /// # Errors
    /// - `NoFieldsProvided` if the update is empty (checked before lookup)
    /// - `ValidationFailed` if a blank title is provided
    /// - `NotFound` if no song has this id
    async fn edit(&self, id: i64, update: SongUpdate) -> Result<Song>;

    /// Remove a song permanently
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Ordering shared by both backends
pub(crate) fn sort_for_listing(songs: &mut [Song]) {
    songs.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: i64, votes: i64) -> Song {
        Song {
            id,
            title: format!("Song {id}"),
            picture: None,
            added_by: "Alice".to_string(),
            votes,
            url: None,
        }
    }

    #[test]
    fn test_sort_votes_desc_then_id_asc() {
        let mut songs = vec![song(3, 1), song(1, 1), song(2, 5), song(4, 0)];
        sort_for_listing(&mut songs);

        let ids: Vec<i64> = songs.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }
}
