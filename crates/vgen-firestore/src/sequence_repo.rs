//! Repository for sequence documents.
//!
//! A sequence and all of its scenes are one document at
//! `users/{uid}/sequences/{sequence_id}`, so every mutation (including a
//! reorder) is a single write.

use tracing::info;

use vgen_models::{Sequence, SequenceId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_conflict;
use crate::types::encode_fields;

/// A record with the store version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    /// Firestore `updateTime` of the document when read
    pub version: Option<String>,
}

pub struct SequenceRepository {
    client: FirestoreClient,
    user_id: String,
}

impl SequenceRepository {
    pub fn new(client: FirestoreClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }

    fn collection(&self) -> String {
        format!("users/{}/sequences", self.user_id)
    }

    pub async fn get(&self, sequence_id: &SequenceId) -> FirestoreResult<Option<Sequence>> {
        Ok(self.get_versioned(sequence_id).await?.map(|v| v.value))
    }

    pub async fn get_versioned(&self, sequence_id: &SequenceId) -> FirestoreResult<Option<Versioned<Sequence>>> {
        let doc = self
            .client
            .get_document(&self.collection(), sequence_id.as_str())
            .await?;

        match doc {
            Some(doc) => Ok(Some(Versioned {
                value: doc.decode()?,
                version: doc.update_time,
            })),
            None => Ok(None),
        }
    }

    pub async fn create(&self, sequence: &Sequence) -> FirestoreResult<()> {
        let fields = encode_fields(sequence)?;
        self.client
            .create_document(&self.collection(), sequence.id.as_str(), fields)
            .await?;
        info!(sequence_id = %sequence.id, user_id = %self.user_id, "Created sequence");
        Ok(())
    }

    /// Overwrite the stored sequence. Returns the new version.
    pub async fn save(&self, sequence: &Sequence) -> FirestoreResult<Option<String>> {
        let fields = encode_fields(sequence)?;
        let doc = self
            .client
            .set_document(&self.collection(), sequence.id.as_str(), fields, None)
            .await?;
        Ok(doc.update_time)
    }

    /// Overwrite only if the stored document is still at `version`.
    pub async fn save_if_unchanged(&self, sequence: &Sequence, version: &str) -> FirestoreResult<Option<String>> {
        let fields = encode_fields(sequence)?;
        let result = self
            .client
            .set_document(&self.collection(), sequence.id.as_str(), fields, Some(version))
            .await;

        match result {
            Ok(doc) => Ok(doc.update_time),
            Err(e) if e.is_precondition_failed() => {
                record_conflict("sequences");
                Err(FirestoreError::PreconditionFailed(format!(
                    "sequence {} changed concurrently",
                    sequence.id
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// All of the user's sequences, newest first.
    pub async fn list(&self) -> FirestoreResult<Vec<Sequence>> {
        let docs = self.client.list_all_documents(&self.collection()).await?;
        let mut sequences = docs
            .iter()
            .map(|d| d.decode::<Sequence>())
            .collect::<FirestoreResult<Vec<_>>>()?;
        sequences.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sequences)
    }

    pub async fn delete(&self, sequence_id: &SequenceId) -> FirestoreResult<()> {
        self.client
            .delete_document(&self.collection(), sequence_id.as_str())
            .await?;
        info!(sequence_id = %sequence_id, user_id = %self.user_id, "Deleted sequence");
        Ok(())
    }
}
