//! Sequencer service: the operations behind the REST facade.
//!
//! Generation runs in a spawned task per user action. A whole-sequence run
//! walks scenes one at a time in position order so continuity sources are
//! finished before the scenes that depend on them. Every persisted change is
//! a read-modify-write of the sequence document, so edits made while a long
//! generation is in progress are kept.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, info_span, warn, Instrument};
use validator::Validate;

use vgen_models::{
    find_template, ContinuityError, GenerateVideoRequest, GenerationStatus, NewScene, NewSequence,
    ReorderOutcome, ReorderRequest, SceneStatus, SceneStatusView, SceneUpdate, Sequence, SequenceId,
    SequenceStatus, SequenceStatusView, SequenceUpdate, UsageStats, ValidationError, VideoGeneration,
    VideoId,
};
use vgen_storage::keys::{scene_asset, video_asset};

use crate::backends::{MediaProcessor, ObjectStorage, VideoGenerator};
use crate::config::SequencerConfig;
use crate::error::{SequencerError, SequencerResult};
use crate::exporter::Exporter;
use crate::in_flight::{Activity, InFlight, InFlightGuard};
use crate::metrics;
use crate::pipeline::{ClipJob, ClipKeys, ClipPipeline};
use crate::store::{mutate_sequence, DocumentStore};

const INTERRUPTED_GENERATION: &str = "Generation was interrupted before it finished";
const INTERRUPTED_EXPORT: &str = "Export was interrupted before it finished";

/// What a whole-sequence run should do with the next scene.
enum SceneStart {
    Run(ClipJob),
    Skip,
    Failed,
}

#[derive(Clone)]
pub struct SequencerService {
    store: Arc<dyn DocumentStore>,
    pipeline: ClipPipeline,
    exporter: Exporter,
    storage: Arc<dyn ObjectStorage>,
    in_flight: InFlight,
    config: SequencerConfig,
}

impl SequencerService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn VideoGenerator>,
        media: Arc<dyn MediaProcessor>,
        storage: Arc<dyn ObjectStorage>,
        config: SequencerConfig,
    ) -> Self {
        let pipeline = ClipPipeline::new(generator, media.clone(), storage.clone(), &config.work_dir);
        let exporter = Exporter::new(media, storage.clone(), &config.work_dir, config.export_timeout);
        Self {
            store,
            pipeline,
            exporter,
            storage,
            in_flight: InFlight::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn flight_key(user_id: &str, sequence_id: &SequenceId) -> String {
        format!("{}/{}", user_id, sequence_id)
    }

    fn claim(&self, user_id: &str, sequence_id: &SequenceId, activity: Activity) -> SequencerResult<InFlightGuard> {
        self.in_flight
            .try_claim(&Self::flight_key(user_id, sequence_id), activity)
            .map_err(|running| SequencerError::conflict(running.describe()))
    }

    pub(crate) fn running(&self, user_id: &str, sequence_id: &SequenceId) -> Option<Activity> {
        self.in_flight.current(&Self::flight_key(user_id, sequence_id))
    }

    fn ensure_not_exporting(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<()> {
        match self.running(user_id, sequence_id) {
            Some(Activity::Exporting) => Err(SequencerError::conflict(Activity::Exporting.describe())),
            _ => Ok(()),
        }
    }

    /// Read-modify-write of a sequence. An export the change replaces or
    /// invalidates has its object removed once the write lands.
    async fn mutate<T, F>(&self, user_id: &str, sequence_id: &SequenceId, mut apply: F) -> SequencerResult<(Sequence, T)>
    where
        F: FnMut(&mut Sequence) -> SequencerResult<T> + Send,
        T: Send,
    {
        let mut dropped_export: Option<String> = None;
        let outcome = mutate_sequence(
            self.store.as_ref(),
            user_id,
            sequence_id,
            self.config.max_write_attempts,
            |seq| {
                let before = seq.export.as_ref().map(|e| e.key.clone());
                let output = apply(seq)?;
                let after = seq.export.as_ref().map(|e| e.key.as_str());
                dropped_export = before.filter(|key| after != Some(key.as_str()));
                Ok(output)
            },
        )
        .await?;

        if let Some(key) = dropped_export {
            self.delete_objects(vec![key]).await;
        }
        Ok(outcome)
    }

    /// Best-effort object cleanup; failures are logged.
    async fn delete_objects(&self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        if let Err(e) = self.storage.delete_objects(&keys).await {
            warn!(count = keys.len(), error = %e, "Failed to delete stored objects");
        }
    }

    /// Document store reachability.
    pub async fn ready(&self) -> SequencerResult<()> {
        self.store.ping().await
    }

    /// Object storage reachability.
    pub async fn storage_ready(&self) -> SequencerResult<()> {
        self.storage.check().await
    }

    // ---------------------------------------------------------------------
    // Sequences
    // ---------------------------------------------------------------------

    pub async fn create_sequence(&self, user_id: &str, request: NewSequence) -> SequencerResult<Sequence> {
        request.validate().map_err(ValidationError::from)?;
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ValidationError::field("title must not be blank").into());
        }

        let sequence = Sequence::new(user_id, title, request.description);
        self.store.create_sequence(&sequence).await?;
        info!(sequence_id = %sequence.id, user_id, "Created sequence");
        Ok(sequence)
    }

    pub async fn list_sequences(&self, user_id: &str) -> SequencerResult<Vec<Sequence>> {
        self.store.list_sequences(user_id).await
    }

    pub async fn get_sequence(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<Sequence> {
        self.store
            .get_sequence(user_id, sequence_id)
            .await?
            .map(|v| v.value)
            .ok_or_else(|| SequencerError::not_found(format!("Sequence {}", sequence_id)))
    }

    pub async fn update_sequence(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        update: SequenceUpdate,
    ) -> SequencerResult<Sequence> {
        update.validate().map_err(ValidationError::from)?;
        let (sequence, ()) = self
            .mutate(user_id, sequence_id, |seq| {
                if let Some(ref title) = update.title {
                    seq.title = title.trim().to_string();
                }
                if let Some(ref description) = update.description {
                    seq.description = Some(description.clone()).filter(|d| !d.is_empty());
                }
                seq.updated_at = chrono::Utc::now();
                Ok(())
            })
            .await?;
        Ok(sequence)
    }

    /// Delete a sequence and, best effort, every object it owns.
    pub async fn delete_sequence(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<()> {
        if let Some(activity) = self.running(user_id, sequence_id) {
            return Err(SequencerError::conflict(activity.describe()));
        }
        let sequence = self.get_sequence(user_id, sequence_id).await?;
        self.store.delete_sequence(user_id, sequence_id).await?;
        self.delete_objects(sequence.object_keys()).await;
        info!(sequence_id = %sequence_id, user_id, "Deleted sequence");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Scenes
    // ---------------------------------------------------------------------

    pub async fn add_scene(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        scene: NewScene,
    ) -> SequencerResult<(Sequence, u32)> {
        self.ensure_not_exporting(user_id, sequence_id)?;
        self.mutate(user_id, sequence_id, |seq| Ok(seq.add_scene(scene.clone())?))
            .await
    }

    pub async fn update_scene(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        scene_number: u32,
        update: SceneUpdate,
    ) -> SequencerResult<Sequence> {
        self.ensure_not_exporting(user_id, sequence_id)?;
        let generating = self.running(user_id, sequence_id) == Some(Activity::Generating);

        let (sequence, ()) = self
            .mutate(user_id, sequence_id, |seq| {
                ensure_scene_idle(seq, scene_number, generating)?;
                if !seq.update_scene(scene_number, update.clone())? {
                    return Err(SequencerError::not_found(format!("Scene {}", scene_number)));
                }
                Ok(())
            })
            .await?;
        Ok(sequence)
    }

    pub async fn remove_scene(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        scene_number: u32,
    ) -> SequencerResult<Sequence> {
        self.ensure_not_exporting(user_id, sequence_id)?;
        let generating = self.running(user_id, sequence_id) == Some(Activity::Generating);

        let (sequence, removed) = self
            .mutate(user_id, sequence_id, |seq| {
                ensure_scene_idle(seq, scene_number, generating)?;
                seq.remove_scene(scene_number)
                    .ok_or_else(|| SequencerError::not_found(format!("Scene {}", scene_number)))
            })
            .await?;

        if let Some(result) = removed.result {
            self.delete_objects(result.object_keys()).await;
        }
        Ok(sequence)
    }

    /// Apply a full reorder in one write. Continuity references are left
    /// alone; scenes whose source is no longer earlier are reported.
    pub async fn reorder_scenes(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        request: ReorderRequest,
    ) -> SequencerResult<(Sequence, ReorderOutcome)> {
        if let Some(activity) = self.running(user_id, sequence_id) {
            return Err(SequencerError::conflict(activity.describe()));
        }
        let entries = request.into_entries()?;
        let (sequence, outcome) = self
            .mutate(user_id, sequence_id, |seq| Ok(seq.reorder(&entries)?))
            .await?;

        if !outcome.stale_continuity.is_empty() {
            info!(
                sequence_id = %sequence_id,
                stale = ?outcome.stale_continuity,
                "Reorder left scenes with a continuity source that is no longer earlier"
            );
        }
        Ok((sequence, outcome))
    }

    // ---------------------------------------------------------------------
    // Generation
    // ---------------------------------------------------------------------

    /// Start generating every pending or failed scene. Returns the sequence
    /// with the first scene marked generating.
    pub async fn generate_sequence(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<Sequence> {
        let guard = self.claim(user_id, sequence_id, Activity::Generating)?;

        let (sequence, targets) = self
            .mutate(user_id, sequence_id, |seq| {
                recover_interrupted(seq);
                let targets = seq.scenes_to_generate();
                if seq.scenes.is_empty() {
                    return Err(SequencerError::conflict("Sequence has no scenes to generate"));
                }
                if targets.is_empty() {
                    return Err(SequencerError::conflict("Every scene has already been generated"));
                }
                preflight_continuity(seq, &targets)?;

                if let Some(scene) = seq.scene_mut(targets[0]) {
                    scene.mark_generating();
                }
                seq.refresh_aggregates();
                Ok(targets)
            })
            .await?;

        info!(sequence_id = %sequence_id, user_id, scenes = targets.len(), "Starting sequence generation");

        let this = self.clone();
        let user = user_id.to_string();
        let id = sequence_id.clone();
        let span = info_span!("sequence_generation", sequence_id = %sequence_id, user_id = %user_id);
        tokio::spawn(
            async move {
                let _guard = guard;
                this.run_sequence(&user, &id, targets).await;
            }
            .instrument(span),
        );

        Ok(sequence)
    }

    async fn run_sequence(&self, user_id: &str, sequence_id: &SequenceId, targets: Vec<u32>) {
        let mut failed: HashSet<u32> = HashSet::new();

        for scene_number in targets {
            let start = self
                .mutate(user_id, sequence_id, |seq| {
                    Ok(start_scene_in_run(seq, scene_number, &failed))
                })
                .await;

            let job = match start {
                Ok((_, SceneStart::Run(job))) => job,
                Ok((_, SceneStart::Skip)) => continue,
                Ok((_, SceneStart::Failed)) => {
                    failed.insert(scene_number);
                    continue;
                }
                Err(e) => {
                    error!(scene_number, error = %e, "Could not start scene, stopping run");
                    return;
                }
            };

            metrics::record_generation_started("scene");
            match self.finish_scene(user_id, sequence_id, scene_number, job).await {
                Ok(true) => {}
                Ok(false) => {
                    failed.insert(scene_number);
                }
                Err(e) => {
                    error!(scene_number, error = %e, "Could not record scene outcome, stopping run");
                    return;
                }
            }
        }

        info!(failed = failed.len(), "Sequence generation finished");
    }

    /// Run the pipeline for one scene and persist the outcome. Returns
    /// whether the scene completed.
    async fn finish_scene(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        scene_number: u32,
        job: ClipJob,
    ) -> SequencerResult<bool> {
        let started = Instant::now();
        let outcome = self.pipeline.run(&job).await;
        let success = outcome.is_ok();
        metrics::record_generation("scene", success, started.elapsed());

        let outcome = outcome.map_err(|e| {
            warn!(scene_number, error = %e, "Scene generation failed");
            e.failure_message()
        });

        let (_, stored) = self
            .mutate(user_id, sequence_id, |seq| {
                let Some(scene) = seq.scene_mut(scene_number) else {
                    return Ok(false);
                };
                match &outcome {
                    Ok(result) => scene.complete(result.clone()),
                    Err(message) => scene.fail(message.clone()),
                }
                seq.refresh_aggregates();
                Ok(true)
            })
            .await?;

        if !stored {
            if let Ok(result) = &outcome {
                self.delete_objects(result.object_keys()).await;
            }
        }
        Ok(success && stored)
    }

    /// Generate (or regenerate) one scene.
    pub async fn generate_scene(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        scene_number: u32,
    ) -> SequencerResult<Sequence> {
        let guard = self.claim(user_id, sequence_id, Activity::Generating)?;

        let (sequence, job) = self
            .mutate(user_id, sequence_id, |seq| {
                recover_interrupted(seq);
                let scene = seq
                    .scene(scene_number)
                    .ok_or_else(|| SequencerError::not_found(format!("Scene {}", scene_number)))?;
                let was_completed = scene.is_completed();
                let reference = seq.continuity_frame_key(scene_number)?;
                let job = scene_job(seq, scene_number, &scene.prompt, scene.model, scene.config.clone(), reference);

                if was_completed {
                    seq.invalidate_export();
                }
                if let Some(scene) = seq.scene_mut(scene_number) {
                    scene.mark_generating();
                }
                seq.refresh_aggregates();
                Ok(job)
            })
            .await?;

        info!(sequence_id = %sequence_id, scene_number, "Starting scene generation");
        metrics::record_generation_started("scene");

        let this = self.clone();
        let user = user_id.to_string();
        let id = sequence_id.clone();
        let span = info_span!("scene_generation", sequence_id = %sequence_id, scene_number);
        tokio::spawn(
            async move {
                let _guard = guard;
                if let Err(e) = this.finish_scene(&user, &id, scene_number, job).await {
                    error!(error = %e, "Could not record scene outcome");
                }
            }
            .instrument(span),
        );

        Ok(sequence)
    }

    // ---------------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------------

    /// Concatenate every scene into one file. Blocks until FFmpeg finishes.
    pub async fn export_sequence(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<Sequence> {
        let _guard = self.claim(user_id, sequence_id, Activity::Exporting)?;

        let (sequence, ()) = self
            .mutate(user_id, sequence_id, |seq| {
                recover_interrupted(seq);
                if !seq.can_export() {
                    return Err(SequencerError::conflict(
                        "Every scene must be completed before exporting",
                    ));
                }
                seq.begin_export();
                Ok(())
            })
            .await?;

        let started = Instant::now();
        let outcome = self.exporter.export(&sequence).await;
        metrics::record_export(outcome.is_ok(), started.elapsed());

        match outcome {
            Ok(export) => {
                const SCENES_CHANGED: &str = "Scenes changed while the export was running";
                let (sequence, recorded) = self
                    .mutate(user_id, sequence_id, |seq| {
                        if seq.can_export() {
                            seq.record_export(export.clone());
                            Ok(true)
                        } else {
                            seq.record_export_failure(SCENES_CHANGED);
                            Ok(false)
                        }
                    })
                    .await?;
                if !recorded {
                    warn!(sequence_id = %sequence_id, "Discarding export of outdated scenes");
                    self.delete_objects(vec![export.key]).await;
                    return Err(SequencerError::conflict(SCENES_CHANGED));
                }
                Ok(sequence)
            }
            Err(e) => {
                let message = e.failure_message();
                error!(sequence_id = %sequence_id, error = %message, "Export failed");
                self.mutate(user_id, sequence_id, |seq| {
                    seq.record_export_failure(message.clone());
                    Ok(())
                })
                .await?;
                Err(SequencerError::Export(message))
            }
        }
    }

    // ---------------------------------------------------------------------
    // Status polling
    // ---------------------------------------------------------------------

    pub async fn sequence_status(&self, user_id: &str, sequence_id: &SequenceId) -> SequencerResult<SequenceStatusView> {
        let sequence = self.get_sequence(user_id, sequence_id).await?;
        Ok(SequenceStatusView::from(&sequence))
    }

    pub async fn scene_status(
        &self,
        user_id: &str,
        sequence_id: &SequenceId,
        scene_number: u32,
    ) -> SequencerResult<SceneStatusView> {
        let sequence = self.get_sequence(user_id, sequence_id).await?;
        sequence
            .scene(scene_number)
            .map(SceneStatusView::from)
            .ok_or_else(|| SequencerError::not_found(format!("Scene {}", scene_number)))
    }

    // ---------------------------------------------------------------------
    // Single videos
    // ---------------------------------------------------------------------

    pub async fn generate_video(&self, user_id: &str, request: GenerateVideoRequest) -> SequencerResult<VideoGeneration> {
        request.validate()?;
        if let Some(ref template_id) = request.template_id {
            if find_template(template_id).is_none() {
                return Err(ValidationError::field(format!("Unknown template: {}", template_id)).into());
            }
        }

        let mut video = VideoGeneration::new(user_id, request);
        video.mark_generating();
        self.store.create_video(&video).await?;
        metrics::record_generation_started("video");
        info!(video_id = %video.id, user_id, model = %video.model, "Starting video generation");

        let job = ClipJob {
            label: format!("video {}", video.id),
            prompt: video.prompt.clone(),
            model: video.model,
            config: video.config.clone(),
            reference_frame_key: None,
            keys: ClipKeys::from_fn(|kind| video_asset(user_id, video.id.as_str(), kind)),
        };

        let this = self.clone();
        let user = user_id.to_string();
        let video_id = video.id.clone();
        let span = info_span!("video_generation", video_id = %video.id);
        tokio::spawn(
            async move {
                if let Err(e) = this.finish_video(&user, &video_id, job).await {
                    error!(error = %e, "Could not record video outcome");
                }
            }
            .instrument(span),
        );

        Ok(video)
    }

    async fn finish_video(&self, user_id: &str, video_id: &VideoId, job: ClipJob) -> SequencerResult<()> {
        let started = Instant::now();
        let outcome = self.pipeline.run(&job).await;
        metrics::record_generation("video", outcome.is_ok(), started.elapsed());

        let Some(mut video) = self.store.get_video(user_id, video_id).await? else {
            // Deleted while generating.
            if let Ok(result) = outcome {
                self.delete_objects(result.object_keys()).await;
            }
            return Ok(());
        };

        match outcome {
            Ok(result) => video.complete(result),
            Err(e) => {
                warn!(error = %e, "Video generation failed");
                video.fail(e.failure_message());
            }
        }
        self.store.save_video(&video).await
    }

    pub async fn list_videos(
        &self,
        user_id: &str,
        status: Option<GenerationStatus>,
        limit: Option<usize>,
    ) -> SequencerResult<Vec<VideoGeneration>> {
        self.store.list_videos(user_id, status, limit).await
    }

    pub async fn get_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<VideoGeneration> {
        self.store
            .get_video(user_id, video_id)
            .await?
            .ok_or_else(|| SequencerError::not_found(format!("Video {}", video_id)))
    }

    pub async fn delete_video(&self, user_id: &str, video_id: &VideoId) -> SequencerResult<()> {
        let video = self.get_video(user_id, video_id).await?;
        self.store.delete_video(user_id, video_id).await?;
        if let Some(result) = video.result {
            self.delete_objects(result.object_keys()).await;
        }
        info!(video_id = %video_id, user_id, "Deleted video");
        Ok(())
    }

    pub async fn stats(&self, user_id: &str) -> SequencerResult<UsageStats> {
        let videos = self.store.list_videos(user_id, None, None).await?;
        let sequences = self.store.list_sequences(user_id).await?;
        Ok(UsageStats::compute(&videos, &sequences))
    }
}

/// Reject edits to a scene that a running generation owns.
fn ensure_scene_idle(seq: &Sequence, scene_number: u32, generation_running: bool) -> SequencerResult<()> {
    match seq.scene(scene_number) {
        None => Err(SequencerError::not_found(format!("Scene {}", scene_number))),
        Some(scene) if generation_running && scene.status == SceneStatus::Generating => Err(
            SequencerError::conflict(format!("Scene {} is generating", scene_number)),
        ),
        Some(_) => Ok(()),
    }
}

/// Clear state left behind by a run that died with its process.
///
/// Only called while holding the sequence's in-flight claim, so anything
/// still marked as running belongs to no live task.
fn recover_interrupted(seq: &mut Sequence) -> bool {
    let mut changed = false;
    for scene in seq.scenes.iter_mut().filter(|s| s.status == SceneStatus::Generating) {
        scene.fail(INTERRUPTED_GENERATION);
        changed = true;
    }
    if seq.status == SequenceStatus::Exporting {
        seq.record_export_failure(INTERRUPTED_EXPORT);
        changed = true;
    }
    if changed {
        warn!(sequence_id = %seq.id, "Recovered interrupted sequence state");
        seq.refresh_aggregates();
    }
    changed
}

/// Every target's continuity source must either be ready or be generated
/// earlier in the same run.
fn preflight_continuity(seq: &Sequence, targets: &[u32]) -> SequencerResult<()> {
    for &scene_number in targets {
        match seq.continuity_frame_key(scene_number) {
            Ok(_) => {}
            Err(ContinuityError::SourceNotReady { source_scene, .. }) if targets.contains(&source_scene) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn scene_job(
    seq: &Sequence,
    scene_number: u32,
    prompt: &str,
    model: vgen_models::ModelVariant,
    config: vgen_models::GenerationConfig,
    reference_frame_key: Option<String>,
) -> ClipJob {
    let (user_id, sequence_id) = (seq.user_id.as_str(), seq.id.as_str());
    ClipJob {
        label: format!("sequence {} scene {}", sequence_id, scene_number),
        prompt: prompt.to_string(),
        model,
        config,
        reference_frame_key,
        keys: ClipKeys::from_fn(|kind| scene_asset(user_id, sequence_id, scene_number, kind)),
    }
}

/// Decide, inside a write, whether the next scene of a run can start.
fn start_scene_in_run(seq: &mut Sequence, scene_number: u32, failed: &HashSet<u32>) -> SceneStart {
    let Some(scene) = seq.scene(scene_number) else {
        return SceneStart::Skip;
    };
    if scene.is_completed() {
        return SceneStart::Skip;
    }

    let job = match seq.continuity_frame_key(scene_number) {
        Ok(reference) => Ok(scene_job(
            seq,
            scene_number,
            &scene.prompt,
            scene.model,
            scene.config.clone(),
            reference,
        )),
        Err(ContinuityError::SourceNotReady { source_scene, .. }) if failed.contains(&source_scene) => Err(
            format!("Continuity source scene {} failed to generate", source_scene),
        ),
        Err(e) => Err(e.to_string()),
    };

    let start = match job {
        Ok(job) => {
            if let Some(scene) = seq.scene_mut(scene_number) {
                scene.mark_generating();
            }
            SceneStart::Run(job)
        }
        Err(message) => {
            warn!(scene_number, reason = %message, "Scene cannot start");
            if let Some(scene) = seq.scene_mut(scene_number) {
                scene.fail(message);
            }
            SceneStart::Failed
        }
    };
    seq.refresh_aggregates();
    start
}
