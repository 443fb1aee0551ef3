//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use vgen_firestore::FirestoreClient;
use vgen_sequencer::{
    DocumentStore, Ffmpeg, FirestoreStore, MemoryStore, SequencerConfig, SequencerService,
};
use vgen_storage::R2Client;
use vgen_veo::VeoClient;

use crate::auth::JwksCache;
use crate::config::{ApiConfig, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub sequencer: SequencerService,
    pub jwks: Arc<JwksCache>,
}

impl AppState {
    /// Build state from the environment: document store, Veo client, R2 and
    /// the local FFmpeg install.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.document_store {
            StoreBackend::Firestore => {
                let client = FirestoreClient::from_env()
                    .await
                    .context("Failed to create Firestore client")?;
                Arc::new(FirestoreStore::new(client))
            }
            StoreBackend::Memory => {
                warn!("Using the in-memory document store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let veo = VeoClient::from_env().context("Failed to create Veo client")?;
        let storage = R2Client::from_env().context("Failed to create R2 client")?;

        let sequencer_config = SequencerConfig::from_env();
        info!(
            work_dir = %sequencer_config.work_dir.display(),
            export_timeout_secs = sequencer_config.export_timeout.as_secs(),
            "Sequencer configured"
        );

        let sequencer = SequencerService::new(
            store,
            Arc::new(veo),
            Arc::new(Ffmpeg),
            Arc::new(storage),
            sequencer_config,
        );

        Ok(Self::with_sequencer(config, sequencer))
    }

    /// State around an already-built sequencer.
    pub fn with_sequencer(config: ApiConfig, sequencer: SequencerService) -> Self {
        Self {
            config,
            sequencer,
            jwks: Arc::new(JwksCache::new()),
        }
    }
}
