use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use vgen_media::ConcatMode;
use vgen_models::{
    Continuity, ContinuityError, GenerateVideoRequest, GenerationConfig, GenerationStatus, ModelVariant,
    NewScene, NewSequence, ReorderRequest, SceneStatus, SceneUpdate, Sequence, SequenceId, SequenceStatus,
    VideoGeneration,
};
use vgen_veo::{GeneratedVideo, VeoError, VideoRequest};

use crate::backends::{MediaProcessor, MockMediaProcessor, MockObjectStorage, MockVideoGenerator, VideoGenerator};
use crate::store::{mutate_sequence, DocumentStore};
use crate::{MemoryStore, SequencerConfig, SequencerError, SequencerResult, SequencerService};

const USER: &str = "user-1";
const BLOCKED: &str = "Prompt was blocked by safety filters";

type Objects = Arc<Mutex<HashMap<String, Vec<u8>>>>;
type Requests = Arc<Mutex<Vec<VideoRequest>>>;

struct Harness {
    service: SequencerService,
    store: Arc<MemoryStore>,
    objects: Objects,
    deleted: Arc<Mutex<Vec<String>>>,
    requests: Requests,
    fail_concat: Arc<AtomicBool>,
    _work: TempDir,
}

fn generated() -> GeneratedVideo {
    GeneratedVideo {
        operation_name: "models/veo/operations/op-1".to_string(),
        uri: "https://generativelanguage.test/files/clip.mp4".to_string(),
        bytes_written: 2,
    }
}

/// Writes the requested duration as the clip body so probing reads it back.
fn recording_generator(requests: Requests) -> MockVideoGenerator {
    let mut generator = MockVideoGenerator::new();
    generator.expect_generate().returning(move |request, dest| {
        requests.lock().unwrap().push(request.clone());
        if request.prompt.contains("forbidden") {
            return Err(VeoError::provider(Some(3), BLOCKED).into());
        }
        std::fs::write(dest, request.duration_secs.to_string())?;
        Ok(generated())
    });
    generator
}

/// Blocks every generation until the gate is opened.
struct GatedGenerator {
    gate: Arc<Notify>,
}

#[async_trait]
impl VideoGenerator for GatedGenerator {
    async fn generate(&self, request: &VideoRequest, dest: &Path) -> SequencerResult<GeneratedVideo> {
        self.gate.notified().await;
        tokio::fs::write(dest, request.duration_secs.to_string()).await?;
        Ok(generated())
    }
}

fn read_seconds(path: &Path) -> f64 {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0)
}

fn media(fail_concat: Arc<AtomicBool>) -> MockMediaProcessor {
    let mut media = MockMediaProcessor::new();
    media
        .expect_probe_duration()
        .returning(|path| Ok(read_seconds(path)));
    media.expect_extract_last_frame().returning(|_, output| {
        std::fs::write(output, b"last-frame")?;
        Ok(())
    });
    media.expect_thumbnail().returning(|_, output, _| {
        std::fs::write(output, b"thumb")?;
        Ok(())
    });
    media.expect_concat().returning(move |inputs, output, _, _| {
        if fail_concat.load(Ordering::SeqCst) {
            return Err(SequencerError::Export("concat failed\nframe 12: corrupt packet".to_string()));
        }
        let total: f64 = inputs.iter().map(|p| read_seconds(p)).sum();
        std::fs::write(output, total.to_string())?;
        Ok(ConcatMode::StreamCopy)
    });
    media
}

fn storage(objects: Objects, deleted: Arc<Mutex<Vec<String>>>) -> MockObjectStorage {
    let mut storage = MockObjectStorage::new();
    let uploads = objects.clone();
    storage.expect_upload_file().returning(move |path, key| {
        let bytes = std::fs::read(path)?;
        let len = bytes.len() as u64;
        uploads.lock().unwrap().insert(key.to_string(), bytes);
        Ok(len)
    });
    let downloads = objects.clone();
    storage.expect_download_file().returning(move |key, path| {
        let bytes = downloads
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| SequencerError::not_found(format!("Object {}", key)))?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len() as u64)
    });
    storage
        .expect_object_url()
        .returning(|key| Ok(format!("https://cdn.test/{}", key)));
    storage.expect_delete_objects().returning(move |keys| {
        let mut map = objects.lock().unwrap();
        for key in keys {
            map.remove(key);
        }
        deleted.lock().unwrap().extend(keys.iter().cloned());
        Ok(keys.len())
    });
    storage
}

/// Sends a scene back to pending through the store while the concat runs,
/// as another instance editing the sequence would.
struct EditingDuringConcat {
    inner: MockMediaProcessor,
    store: Arc<MemoryStore>,
}

#[async_trait]
impl MediaProcessor for EditingDuringConcat {
    async fn probe_duration(&self, video: &Path) -> SequencerResult<f64> {
        self.inner.probe_duration(video).await
    }

    async fn extract_last_frame(&self, video: &Path, output: &Path) -> SequencerResult<()> {
        self.inner.extract_last_frame(video, output).await
    }

    async fn thumbnail(&self, video: &Path, output: &Path, duration_secs: f64) -> SequencerResult<()> {
        self.inner.thumbnail(video, output, duration_secs).await
    }

    async fn concat(
        &self,
        inputs: &[std::path::PathBuf],
        output: &Path,
        work_dir: &Path,
        timeout: Duration,
    ) -> SequencerResult<ConcatMode> {
        let sequences = self.store.list_sequences(USER).await?;
        for sequence in sequences {
            mutate_sequence(self.store.as_ref(), USER, &sequence.id, 3, |seq| {
                if let Some(scene) = seq.scene_mut(2) {
                    scene.reset();
                }
                seq.refresh_aggregates();
                Ok(())
            })
            .await?;
        }
        self.inner.concat(inputs, output, work_dir, timeout).await
    }
}

fn harness_with(generator: Option<Arc<dyn VideoGenerator>>) -> Harness {
    build_harness(generator, |media, _| Arc::new(media))
}

fn build_harness(
    generator: Option<Arc<dyn VideoGenerator>>,
    wrap_media: impl FnOnce(MockMediaProcessor, Arc<MemoryStore>) -> Arc<dyn MediaProcessor>,
) -> Harness {
    let work = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let objects: Objects = Arc::default();
    let deleted = Arc::new(Mutex::new(Vec::new()));
    let requests: Requests = Arc::default();
    let fail_concat = Arc::new(AtomicBool::new(false));

    let generator =
        generator.unwrap_or_else(|| Arc::new(recording_generator(requests.clone())) as Arc<dyn VideoGenerator>);
    let service = SequencerService::new(
        store.clone(),
        generator,
        wrap_media(media(fail_concat.clone()), store.clone()),
        Arc::new(storage(objects.clone(), deleted.clone())),
        SequencerConfig {
            work_dir: work.path().to_path_buf(),
            ..Default::default()
        },
    );

    Harness {
        service,
        store,
        objects,
        deleted,
        requests,
        fail_concat,
        _work: work,
    }
}

fn harness() -> Harness {
    harness_with(None)
}

fn scene(prompt: &str, duration_secs: u32, continuity: Continuity) -> NewScene {
    NewScene {
        prompt: prompt.to_string(),
        model: ModelVariant::Veo3Fast,
        config: GenerationConfig {
            duration_secs,
            ..Default::default()
        },
        continuity,
    }
}

fn continue_previous() -> Continuity {
    Continuity {
        enabled: true,
        source_scene: None,
    }
}

async fn new_sequence(h: &Harness, scenes: Vec<NewScene>) -> SequenceId {
    let sequence = h
        .service
        .create_sequence(
            USER,
            NewSequence {
                title: "  Launch teaser  ".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    for s in scenes {
        h.service.add_scene(USER, &sequence.id, s).await.unwrap();
    }
    sequence.id
}

async fn three_scene_sequence(h: &Harness) -> SequenceId {
    new_sequence(
        h,
        vec![
            scene("Sunrise over a quiet harbor", 4, Continuity::disabled()),
            scene("A fishing boat leaves the dock", 5, continue_previous()),
            scene("Gulls circle above the open sea", 6, continue_previous()),
        ],
    )
    .await
}

async fn wait_idle(h: &Harness, id: &SequenceId) -> Sequence {
    for _ in 0..200 {
        if h.service.running(USER, id).is_none() {
            return h.service.get_sequence(USER, id).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("generation did not finish");
}

async fn wait_video(h: &Harness, video: &VideoGeneration) -> VideoGeneration {
    for _ in 0..200 {
        let current = h.service.get_video(USER, &video.id).await.unwrap();
        if current.status != GenerationStatus::Generating {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("video generation did not finish");
}

async fn generated_sequence(h: &Harness) -> SequenceId {
    let id = three_scene_sequence(h).await;
    h.service.generate_sequence(USER, &id).await.unwrap();
    wait_idle(h, &id).await;
    id
}

#[tokio::test]
async fn test_create_sequence_trims_title() {
    let h = harness();
    let id = new_sequence(&h, vec![]).await;
    let sequence = h.service.get_sequence(USER, &id).await.unwrap();
    assert_eq!(sequence.title, "Launch teaser");
    assert_eq!(sequence.status, SequenceStatus::Draft);
}

#[tokio::test]
async fn test_sequences_are_scoped_to_their_owner() {
    let h = harness();
    let id = new_sequence(&h, vec![]).await;
    let err = h.service.get_sequence("someone-else", &id).await.unwrap_err();
    assert!(matches!(err, SequencerError::NotFound(_)));
    assert!(h.service.list_sequences("someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_sequence_runs_in_order_with_continuity() {
    let h = harness();
    let id = three_scene_sequence(&h).await;

    let started = h.service.generate_sequence(USER, &id).await.unwrap();
    assert_eq!(started.status, SequenceStatus::Generating);
    assert_eq!(started.scene(1).unwrap().status, SceneStatus::Generating);

    let done = wait_idle(&h, &id).await;
    assert_eq!(done.status, SequenceStatus::Completed);
    assert_eq!(done.total_duration_secs, 15.0);
    assert_eq!(done.progress, 100.0);
    assert!(done.scenes.iter().all(|s| s.is_completed()));

    let requests = h.requests.lock().unwrap();
    let prompts: Vec<&str> = requests.iter().map(|r| r.prompt.as_str()).collect();
    assert_eq!(
        prompts,
        vec![
            "Sunrise over a quiet harbor",
            "A fishing boat leaves the dock",
            "Gulls circle above the open sea"
        ]
    );
    assert!(requests[0].reference_image.is_none());
    let reference = requests[1].reference_image.as_ref().unwrap();
    assert_eq!(reference.bytes, b"last-frame");
    assert!(requests[2].reference_image.is_some());

    let scene_two = done.scene(2).unwrap().result.as_ref().unwrap();
    assert!(scene_two
        .video_key
        .starts_with(&format!("users/{}/sequences/{}/scenes/2/", USER, id)));
    assert!(scene_two.video_url.starts_with("https://cdn.test/"));
    assert!(h.objects.lock().unwrap().contains_key(&scene_two.last_frame_key));
}

#[tokio::test]
async fn test_provider_error_is_kept_and_dependents_fail() {
    let h = harness();
    let id = new_sequence(
        &h,
        vec![
            scene("A forbidden scene that gets blocked", 4, Continuity::disabled()),
            scene("Continues from the blocked scene", 4, continue_previous()),
            scene("An unrelated closing shot of a city", 4, Continuity::disabled()),
        ],
    )
    .await;

    h.service.generate_sequence(USER, &id).await.unwrap();
    let done = wait_idle(&h, &id).await;

    let first = done.scene(1).unwrap();
    assert_eq!(first.status, SceneStatus::Failed);
    assert_eq!(first.error_message.as_deref(), Some(BLOCKED));

    let second = done.scene(2).unwrap();
    assert_eq!(second.status, SceneStatus::Failed);
    assert!(second.error_message.as_deref().unwrap().contains("scene 1"));

    assert!(done.scene(3).unwrap().is_completed());
    assert_eq!(done.status, SequenceStatus::Failed);
    // The dependent scene never reached the provider.
    assert_eq!(h.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_scenes_are_retried_on_next_run() {
    let h = harness();
    let id = new_sequence(
        &h,
        vec![
            scene("A forbidden scene that gets blocked", 4, Continuity::disabled()),
            scene("An unrelated closing shot of a city", 4, Continuity::disabled()),
        ],
    )
    .await;
    h.service.generate_sequence(USER, &id).await.unwrap();
    wait_idle(&h, &id).await;

    h.service
        .update_scene(
            USER,
            &id,
            1,
            SceneUpdate {
                prompt: Some("A calm opening shot of a forest".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    h.service.generate_sequence(USER, &id).await.unwrap();
    let done = wait_idle(&h, &id).await;

    assert_eq!(done.status, SequenceStatus::Completed);
    // Only the fixed scene ran again.
    assert_eq!(h.requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_generate_rejects_empty_or_finished_sequence() {
    let h = harness();
    let empty = new_sequence(&h, vec![]).await;
    let err = h.service.generate_sequence(USER, &empty).await.unwrap_err();
    assert!(matches!(err, SequencerError::Conflict(_)));

    let id = generated_sequence(&h).await;
    let err = h.service.generate_sequence(USER, &id).await.unwrap_err();
    assert!(matches!(err, SequencerError::Conflict(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edits_are_rejected_while_generating() {
    let gate = Arc::new(Notify::new());
    let h = harness_with(Some(Arc::new(GatedGenerator { gate: gate.clone() })));
    let id = new_sequence(
        &h,
        vec![
            scene("Sunrise over a quiet harbor", 4, Continuity::disabled()),
            scene("Gulls circle above the open sea", 4, Continuity::disabled()),
        ],
    )
    .await;

    h.service.generate_scene(USER, &id, 1).await.unwrap();

    let conflicts = [
        h.service.generate_sequence(USER, &id).await.unwrap_err(),
        h.service.export_sequence(USER, &id).await.unwrap_err(),
        h.service
            .reorder_scenes(USER, &id, ReorderRequest::from_order(vec![2, 1]))
            .await
            .unwrap_err(),
        h.service.remove_scene(USER, &id, 1).await.unwrap_err(),
        h.service.delete_sequence(USER, &id).await.unwrap_err(),
    ];
    for err in conflicts {
        assert!(matches!(err, SequencerError::Conflict(_)), "unexpected {err:?}");
    }

    // Scenes the run does not own stay editable.
    h.service
        .update_scene(
            USER,
            &id,
            2,
            SceneUpdate {
                prompt: Some("Gulls circle above a stormy sea".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    gate.notify_one();
    let done = wait_idle(&h, &id).await;
    assert!(done.scene(1).unwrap().is_completed());
    assert_eq!(done.scene(2).unwrap().prompt, "Gulls circle above a stormy sea");
}

#[tokio::test]
async fn test_generate_scene_requires_ready_continuity_source() {
    let h = harness();
    let id = new_sequence(
        &h,
        vec![
            scene("Sunrise over a quiet harbor", 4, Continuity::disabled()),
            scene("A fishing boat leaves the dock", 4, continue_previous()),
        ],
    )
    .await;

    let err = h.service.generate_scene(USER, &id, 2).await.unwrap_err();
    assert!(matches!(
        err,
        SequencerError::Continuity(ContinuityError::SourceNotReady { scene: 2, source_scene: 1 })
    ));

    let err = h.service.generate_scene(USER, &id, 9).await.unwrap_err();
    assert!(matches!(err, SequencerError::NotFound(_)));
}

#[tokio::test]
async fn test_regenerating_a_scene_drops_the_export() {
    let h = harness();
    let id = generated_sequence(&h).await;
    let exported = h.service.export_sequence(USER, &id).await.unwrap();
    let export_key = exported.export.unwrap().key;

    h.service.generate_scene(USER, &id, 2).await.unwrap();
    let done = wait_idle(&h, &id).await;
    assert!(done.export.is_none());
    assert_eq!(done.status, SequenceStatus::Completed);
    assert!(h.deleted.lock().unwrap().contains(&export_key));
}

#[tokio::test]
async fn test_interrupted_generation_is_recovered() {
    let h = harness();
    let id = three_scene_sequence(&h).await;

    // Simulate a process that died mid-run.
    let mut stale = h.service.get_sequence(USER, &id).await.unwrap();
    stale.scene_mut(1).unwrap().mark_generating();
    stale.refresh_aggregates();
    h.store.save_sequence(&stale, None).await.unwrap();
    assert_eq!(
        h.service.sequence_status(USER, &id).await.unwrap().status,
        SequenceStatus::Generating
    );

    h.service.generate_sequence(USER, &id).await.unwrap();
    let done = wait_idle(&h, &id).await;
    assert_eq!(done.status, SequenceStatus::Completed);
    assert_eq!(h.requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_export_requires_every_scene_completed() {
    let h = harness();
    let id = three_scene_sequence(&h).await;
    let err = h.service.export_sequence(USER, &id).await.unwrap_err();
    assert!(matches!(err, SequencerError::Conflict(_)));

    let sequence = h.service.get_sequence(USER, &id).await.unwrap();
    assert_eq!(sequence.status, SequenceStatus::Draft);
    assert!(sequence.export_error.is_none());
}

#[tokio::test]
async fn test_export_joins_scenes_and_replaces_previous() {
    let h = harness();
    let id = generated_sequence(&h).await;

    let first = h.service.export_sequence(USER, &id).await.unwrap();
    let export = first.export.clone().unwrap();
    assert_eq!(first.status, SequenceStatus::Exported);
    assert_eq!(export.duration_secs, 15.0);
    assert_eq!(export.scene_count, 3);
    assert!(export
        .key
        .starts_with(&format!("users/{}/sequences/{}/exports/", USER, id)));
    assert_eq!(export.url, format!("https://cdn.test/{}", export.key));

    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = h.service.export_sequence(USER, &id).await.unwrap();
    assert_eq!(second.scenes, first.scenes);
    assert_eq!(second.status, SequenceStatus::Exported);
    let replacement = second.export.unwrap();
    assert_ne!(replacement.key, export.key);
    assert!(h.deleted.lock().unwrap().contains(&export.key));
}

#[tokio::test]
async fn test_export_of_scenes_changed_midway_is_a_conflict() {
    let h = build_harness(None, |media, store| Arc::new(EditingDuringConcat { inner: media, store }));
    let id = generated_sequence(&h).await;

    let err = h.service.export_sequence(USER, &id).await.unwrap_err();
    assert!(matches!(err, SequencerError::Conflict(_)));
    assert!(err.to_string().contains("Scenes changed"));

    let sequence = h.service.get_sequence(USER, &id).await.unwrap();
    assert!(sequence.export.is_none());
    assert_eq!(
        sequence.export_error.as_deref(),
        Some("Scenes changed while the export was running")
    );
    let uploaded_exports = h
        .objects
        .lock()
        .unwrap()
        .keys()
        .filter(|k| k.contains("/exports/"))
        .count();
    assert_eq!(uploaded_exports, 0);
    assert!(h.deleted.lock().unwrap().iter().any(|k| k.contains("/exports/")));
}

#[tokio::test]
async fn test_export_failure_keeps_previous_export() {
    let h = harness();
    let id = generated_sequence(&h).await;
    let previous = h.service.export_sequence(USER, &id).await.unwrap().export.unwrap();

    h.fail_concat.store(true, Ordering::SeqCst);
    let err = h.service.export_sequence(USER, &id).await.unwrap_err();
    assert!(matches!(err, SequencerError::Export(_)));

    let sequence = h.service.get_sequence(USER, &id).await.unwrap();
    assert_eq!(sequence.export_error.as_deref(), Some("Export failed: concat failed"));
    assert_eq!(sequence.export.unwrap().key, previous.key);
    assert_eq!(sequence.status, SequenceStatus::Exported);
}

#[tokio::test]
async fn test_reorder_reports_stale_continuity() {
    let h = harness();
    let id = three_scene_sequence(&h).await;

    let (sequence, outcome) = h
        .service
        .reorder_scenes(USER, &id, ReorderRequest::from_order(vec![2, 1, 3]))
        .await
        .unwrap();
    assert_eq!(outcome.order, vec![2, 1, 3]);
    assert_eq!(outcome.stale_continuity, vec![2]);
    let order: Vec<u32> = sequence.ordered_scenes().iter().map(|s| s.scene_number).collect();
    assert_eq!(order, vec![2, 1, 3]);

    let err = h
        .service
        .reorder_scenes(USER, &id, ReorderRequest::from_order(vec![2, 1]))
        .await
        .unwrap_err();
    assert!(matches!(err, SequencerError::Validation(_)));
}

#[tokio::test]
async fn test_remove_scene_deletes_its_objects() {
    let h = harness();
    let id = generated_sequence(&h).await;
    let keys = h
        .service
        .get_sequence(USER, &id)
        .await
        .unwrap()
        .scene(3)
        .unwrap()
        .result
        .as_ref()
        .unwrap()
        .object_keys();

    let sequence = h.service.remove_scene(USER, &id, 3).await.unwrap();
    assert_eq!(sequence.scenes.len(), 2);
    assert_eq!(sequence.total_duration_secs, 9.0);
    let deleted = h.deleted.lock().unwrap();
    assert!(keys.iter().all(|k| deleted.contains(k)));
}

#[tokio::test]
async fn test_delete_sequence_cleans_up_objects() {
    let h = harness();
    let id = generated_sequence(&h).await;
    h.service.export_sequence(USER, &id).await.unwrap();

    h.service.delete_sequence(USER, &id).await.unwrap();
    assert!(matches!(
        h.service.get_sequence(USER, &id).await.unwrap_err(),
        SequencerError::NotFound(_)
    ));
    // Three assets per scene plus the export.
    assert_eq!(h.deleted.lock().unwrap().len(), 10);
    assert!(h.objects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_video_completes() {
    let h = harness();
    let video = h
        .service
        .generate_video(
            USER,
            GenerateVideoRequest {
                prompt: "A coffee cup steaming on a wooden table".to_string(),
                model: ModelVariant::Veo2,
                config: GenerationConfig {
                    duration_secs: 6,
                    ..Default::default()
                },
                template_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(video.status, GenerationStatus::Generating);

    let done = wait_video(&h, &video).await;
    assert_eq!(done.status, GenerationStatus::Completed);
    let result = done.result.unwrap();
    assert_eq!(result.actual_duration_secs, 6.0);
    assert!(result.video_key.starts_with(&format!("users/{}/videos/{}/", USER, video.id)));
    assert_eq!(done.cost.actual, Some(2.1));

    let stats = h.service.stats(USER).await.unwrap();
    assert_eq!(stats.total_videos, 1);
}

#[tokio::test]
async fn test_generate_video_records_provider_failure() {
    let h = harness();
    let video = h
        .service
        .generate_video(
            USER,
            GenerateVideoRequest {
                prompt: "A forbidden clip that gets blocked".to_string(),
                model: ModelVariant::Veo3,
                config: GenerationConfig::default(),
                template_id: None,
            },
        )
        .await
        .unwrap();

    let done = wait_video(&h, &video).await;
    assert_eq!(done.status, GenerationStatus::Failed);
    assert_eq!(done.error_message.as_deref(), Some(BLOCKED));
}

#[tokio::test]
async fn test_generate_video_rejects_unknown_template() {
    let h = harness();
    let err = h
        .service
        .generate_video(
            USER,
            GenerateVideoRequest {
                prompt: "A coffee cup steaming on a wooden table".to_string(),
                model: ModelVariant::Veo3,
                config: GenerationConfig::default(),
                template_id: Some("no-such-template".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SequencerError::Validation(_)));
    assert!(h.service.list_videos(USER, None, None).await.unwrap().is_empty());
}
