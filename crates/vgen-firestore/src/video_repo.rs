//! Repository for single-clip generations at `users/{uid}/videos/{video_id}`.

use tracing::info;

use vgen_models::{GenerationStatus, VideoGeneration, VideoId};

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::types::encode_fields;

pub struct VideoRepository {
    client: FirestoreClient,
    user_id: String,
}

impl VideoRepository {
    pub fn new(client: FirestoreClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }

    fn collection(&self) -> String {
        format!("users/{}/videos", self.user_id)
    }

    pub async fn get(&self, video_id: &VideoId) -> FirestoreResult<Option<VideoGeneration>> {
        match self.client.get_document(&self.collection(), video_id.as_str()).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, video: &VideoGeneration) -> FirestoreResult<()> {
        self.client
            .create_document(&self.collection(), video.id.as_str(), encode_fields(video)?)
            .await?;
        info!(video_id = %video.id, user_id = %self.user_id, "Created video record");
        Ok(())
    }

    pub async fn save(&self, video: &VideoGeneration) -> FirestoreResult<()> {
        self.client
            .set_document(&self.collection(), video.id.as_str(), encode_fields(video)?, None)
            .await?;
        Ok(())
    }

    /// Newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<GenerationStatus>,
        limit: Option<usize>,
    ) -> FirestoreResult<Vec<VideoGeneration>> {
        let docs = self.client.list_all_documents(&self.collection()).await?;
        let mut videos = docs
            .iter()
            .map(|d| d.decode::<VideoGeneration>())
            .collect::<FirestoreResult<Vec<_>>>()?;

        if let Some(status) = status {
            videos.retain(|v| v.status == status);
        }
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            videos.truncate(limit);
        }
        Ok(videos)
    }

    pub async fn delete(&self, video_id: &VideoId) -> FirestoreResult<()> {
        self.client
            .delete_document(&self.collection(), video_id.as_str())
            .await?;
        info!(video_id = %video_id, user_id = %self.user_id, "Deleted video record");
        Ok(())
    }
}
