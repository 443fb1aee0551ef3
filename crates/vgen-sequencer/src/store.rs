//! Document persistence for sequences and single videos.
//!
//! [`DocumentStore`] is implemented by Firestore for deployments and by an
//! in-memory map for local demos and tests. Sequence writes are conditional
//! on the version that was read; [`mutate_sequence`] wraps that in a
//! read-modify-write loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use vgen_firestore::{FirestoreClient, SequenceRepository, Versioned, VideoRepository};
use vgen_models::{GenerationStatus, Sequence, SequenceId, VideoGeneration, VideoId};

use crate::error::{SequencerError, SequencerResult};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_sequence(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
    ) -> SequencerResult<Option<Versioned<Sequence>>>;

    /// Newest first.
    async fn list_sequences(&self, user_id: &str) -> SequencerResult<Vec<Sequence>>;

    async fn create_sequence(&self, sequence: &Sequence) -> SequencerResult<()>;

    /// Write `sequence`. With a version, fails with
    /// [`SequencerError::WriteConflict`] if the stored copy moved on.
    async fn save_sequence(&self, sequence: &Sequence, version: Option<&str>) -> SequencerResult<()>;

    async fn delete_sequence(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<()>;

    async fn get_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<Option<VideoGeneration>>;

    /// Newest first.
    async fn list_videos(
        &self,
        user_id: &str,
        status: Option<GenerationStatus>,
        limit: Option<usize>,
    ) -> SequencerResult<Vec<VideoGeneration>>;

    async fn create_video(&self, video: &VideoGeneration) -> SequencerResult<()>;

    async fn save_video(&self, video: &VideoGeneration) -> SequencerResult<()>;

    async fn delete_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<()>;

    /// Readiness probe.
    async fn ping(&self) -> SequencerResult<()>;
}

/// Load, change and conditionally save a sequence, retrying when another
/// writer got there first.
///
/// `apply` may run more than once and must only touch the sequence it is
/// given. An error from `apply` aborts without writing.
pub async fn mutate_sequence<T, F>(
    store: &dyn DocumentStore,
    user_id: &str,
    sequence_id: &SequenceId,
    max_attempts: u32,
    mut apply: F,
) -> SequencerResult<(Sequence, T)>
where
    F: FnMut(&mut Sequence) -> SequencerResult<T> + Send,
    T: Send,
{
    let mut attempt = 1;
    loop {
        let Versioned { mut value, version } = store
            .get_sequence(user_id, sequence_id)
            .await?
            .ok_or_else(|| SequencerError::not_found(format!("Sequence {}", sequence_id)))?;

        let output = apply(&mut value)?;

        match store.save_sequence(&value, version.as_deref()).await {
            Ok(()) => return Ok((value, output)),
            Err(e) if e.is_write_conflict() && attempt < max_attempts => {
                debug!(sequence_id = %sequence_id, attempt, "Sequence changed underneath, re-reading");
                attempt += 1;
            }
            Err(e) => {
                if e.is_write_conflict() {
                    warn!(sequence_id = %sequence_id, attempts = attempt, "Giving up on contended sequence write");
                }
                return Err(e);
            }
        }
    }
}

/// Firestore-backed store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn sequences(&self, user_id: &str) -> SequenceRepository {
        SequenceRepository::new(self.client.clone(), user_id)
    }

    fn videos(&self, user_id: &str) -> VideoRepository {
        VideoRepository::new(self.client.clone(), user_id)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_sequence(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
    ) -> SequencerResult<Option<Versioned<Sequence>>> {
        Ok(self.sequences(user_id).get_versioned(sequence_id).await?)
    }

    async fn list_sequences(&self, user_id: &str) -> SequencerResult<Vec<Sequence>> {
        Ok(self.sequences(user_id).list().await?)
    }

    async fn create_sequence(&self, sequence: &Sequence) -> SequencerResult<()> {
        Ok(self.sequences(&sequence.user_id).create(sequence).await?)
    }

    async fn save_sequence(&self, sequence: &Sequence, version: Option<&str>) -> SequencerResult<()> {
        let repo = self.sequences(&sequence.user_id);
        let result = match version {
            Some(version) => repo.save_if_unchanged(sequence, version).await,
            None => repo.save(sequence).await,
        };
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_precondition_failed() => Err(SequencerError::WriteConflict(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_sequence(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<()> {
        Ok(self.sequences(user_id).delete(sequence_id).await?)
    }

    async fn get_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<Option<VideoGeneration>> {
        Ok(self.videos(user_id).get(video_id).await?)
    }

    async fn list_videos(
        &self,
        user_id: &str,
        status: Option<GenerationStatus>,
        limit: Option<usize>,
    ) -> SequencerResult<Vec<VideoGeneration>> {
        Ok(self.videos(user_id).list(status, limit).await?)
    }

    async fn create_video(&self, video: &VideoGeneration) -> SequencerResult<()> {
        Ok(self.videos(&video.user_id).create(video).await?)
    }

    async fn save_video(&self, video: &VideoGeneration) -> SequencerResult<()> {
        Ok(self.videos(&video.user_id).save(video).await?)
    }

    async fn delete_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<()> {
        Ok(self.videos(user_id).delete(video_id).await?)
    }

    async fn ping(&self) -> SequencerResult<()> {
        Ok(self.client.ping().await?)
    }
}

type DocKey = (String, String);

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    sequences: RwLock<HashMap<DocKey, (Sequence, u64)>>,
    videos: RwLock<HashMap<DocKey, VideoGeneration>>,
    clock: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn key(user_id: &str, id: &str) -> DocKey {
        (user_id.to_string(), id.to_string())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_sequence(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
    ) -> SequencerResult<Option<Versioned<Sequence>>> {
        let sequences = self.sequences.read().await;
        Ok(sequences
            .get(&Self::key(user_id, sequence_id.as_str()))
            .map(|(sequence, version)| Versioned {
                value: sequence.clone(),
                version: Some(version.to_string()),
            }))
    }

    async fn list_sequences(&self, user_id: &str) -> SequencerResult<Vec<Sequence>> {
        let sequences = self.sequences.read().await;
        let mut list: Vec<Sequence> = sequences
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .map(|(_, (sequence, _))| sequence.clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn create_sequence(&self, sequence: &Sequence) -> SequencerResult<()> {
        let version = self.tick();
        let mut sequences = self.sequences.write().await;
        let key = Self::key(&sequence.user_id, sequence.id.as_str());
        if sequences.contains_key(&key) {
            return Err(SequencerError::conflict(format!("Sequence {} already exists", sequence.id)));
        }
        sequences.insert(key, (sequence.clone(), version));
        Ok(())
    }

    async fn save_sequence(&self, sequence: &Sequence, version: Option<&str>) -> SequencerResult<()> {
        let next = self.tick();
        let mut sequences = self.sequences.write().await;
        let key = Self::key(&sequence.user_id, sequence.id.as_str());
        if let Some(expected) = version {
            let current = sequences.get(&key).map(|(_, v)| v.to_string());
            if current.as_deref() != Some(expected) {
                return Err(SequencerError::WriteConflict(format!(
                    "sequence {} changed concurrently",
                    sequence.id
                )));
            }
        }
        sequences.insert(key, (sequence.clone(), next));
        Ok(())
    }

    async fn delete_sequence(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<()> {
        self.sequences
            .write()
            .await
            .remove(&Self::key(user_id, sequence_id.as_str()));
        Ok(())
    }

    async fn get_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<Option<VideoGeneration>> {
        Ok(self
            .videos
            .read()
            .await
            .get(&Self::key(user_id, video_id.as_str()))
            .cloned())
    }

    async fn list_videos(
        &self,
        user_id: &str,
        status: Option<GenerationStatus>,
        limit: Option<usize>,
    ) -> SequencerResult<Vec<VideoGeneration>> {
        let videos = self.videos.read().await;
        let mut list: Vec<VideoGeneration> = videos
            .iter()
            .filter(|((uid, _), v)| uid == user_id && status.map_or(true, |s| v.status == s))
            .map(|(_, v)| v.clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            list.truncate(limit);
        }
        Ok(list)
    }

    async fn create_video(&self, video: &VideoGeneration) -> SequencerResult<()> {
        self.videos
            .write()
            .await
            .insert(Self::key(&video.user_id, video.id.as_str()), video.clone());
        Ok(())
    }

    async fn save_video(&self, video: &VideoGeneration) -> SequencerResult<()> {
        self.create_video(video).await
    }

    async fn delete_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<()> {
        self.videos
            .write()
            .await
            .remove(&Self::key(user_id, video_id.as_str()));
        Ok(())
    }

    async fn ping(&self) -> SequencerResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conditional_save_detects_stale_version() {
        let store = MemoryStore::new();
        let sequence = Sequence::new("u1", "Launch teaser", None);
        store.create_sequence(&sequence).await.unwrap();

        let first = store.get_sequence("u1", &sequence.id).await.unwrap().unwrap();
        let second = store.get_sequence("u1", &sequence.id).await.unwrap().unwrap();

        store
            .save_sequence(&first.value, first.version.as_deref())
            .await
            .unwrap();
        let err = store
            .save_sequence(&second.value, second.version.as_deref())
            .await
            .unwrap_err();
        assert!(err.is_write_conflict());
    }

    #[tokio::test]
    async fn test_mutate_applies_and_returns_output() {
        let store = MemoryStore::new();
        let sequence = Sequence::new("u1", "Launch teaser", None);
        store.create_sequence(&sequence).await.unwrap();

        let (updated, old_title) = mutate_sequence(&store, "u1", &sequence.id, 3, |seq| {
            Ok(std::mem::replace(&mut seq.title, "Renamed".to_string()))
        })
        .await
        .unwrap();

        assert_eq!(old_title, "Launch teaser");
        assert_eq!(updated.title, "Renamed");
        let stored = store.get_sequence("u1", &sequence.id).await.unwrap().unwrap();
        assert_eq!(stored.value.title, "Renamed");
    }

    #[tokio::test]
    async fn test_mutate_error_does_not_write() {
        let store = MemoryStore::new();
        let sequence = Sequence::new("u1", "Launch teaser", None);
        store.create_sequence(&sequence).await.unwrap();
        let before = store.get_sequence("u1", &sequence.id).await.unwrap().unwrap();

        let result: SequencerResult<(Sequence, ())> =
            mutate_sequence(&store, "u1", &sequence.id, 3, |seq| {
                seq.title = "Should not persist".into();
                Err(SequencerError::conflict("nope"))
            })
            .await;
        assert!(result.is_err());

        let after = store.get_sequence("u1", &sequence.id).await.unwrap().unwrap();
        assert_eq!(after.version, before.version);
        assert_eq!(after.value.title, "Launch teaser");
    }

    #[tokio::test]
    async fn test_mutate_missing_sequence() {
        let store = MemoryStore::new();
        let err = mutate_sequence(&store, "u1", &SequenceId::from("missing"), 3, |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, SequencerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sequences_are_scoped_per_user() {
        let store = MemoryStore::new();
        let sequence = Sequence::new("u1", "Mine", None);
        store.create_sequence(&sequence).await.unwrap();

        assert!(store.get_sequence("u2", &sequence.id).await.unwrap().is_none());
        assert!(store.list_sequences("u2").await.unwrap().is_empty());
        assert_eq!(store.list_sequences("u1").await.unwrap().len(), 1);
    }
}
