//! Process-lifetime song store

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::{sort_for_listing, SongStore};
use crate::models::{NewSong, Song, SongUpdate};
use crate::{Error, Result};

#[derive(Debug)]
struct Inner {
    next_id: i64,
    songs: Vec<Song>,
}

/// In-memory store guarded by a single store-wide lock
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                songs: Vec::new(),
            }),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn find_mut(&mut self, id: i64) -> Result<&mut Song> {
        self.songs
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(Error::NotFound(id))
    }
}

#[async_trait]
impl SongStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self, song), fields(title = %song.title), level = "debug")]
    async fn add(&self, song: NewSong) -> Result<Song> {
        song.validate()?;

        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let song = Song {
            id,
            title: song.title,
            picture: song.picture,
            added_by: song.added_by,
            votes: 0,
            url: song.url,
        };
        inner.songs.push(song.clone());
        debug!(id, "song added");

        Ok(song)
    }

    async fn list(&self) -> Result<Vec<Song>> {
        let mut songs = self.inner.lock().await.songs.clone();
        sort_for_listing(&mut songs);
        Ok(songs)
    }

    async fn get(&self, id: i64) -> Result<Song> {
        let mut inner = self.inner.lock().await;
        inner.find_mut(id).map(|s| s.clone())
    }

    async fn vote(&self, id: i64) -> Result<Song> {
        let mut inner = self.inner.lock().await;
        let song = inner.find_mut(id)?;
        song.votes += 1;
        debug!(id, votes = song.votes, "vote recorded");
        Ok(song.clone())
    }

    async fn edit(&self, id: i64, update: SongUpdate) -> Result<Song> {
        update.validate()?;

        let mut inner = self.inner.lock().await;
        let song = inner.find_mut(id)?;
        update.apply_to(song);
        debug!(id, "song edited");
        Ok(song.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.songs.len();
        inner.songs.retain(|s| s.id != id);
        if inner.songs.len() == before {
            return Err(Error::NotFound(id));
        }
        debug!(id, "song deleted");
        Ok(())
    }
}
