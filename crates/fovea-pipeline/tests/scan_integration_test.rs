//! End-to-end scan cycle tests with an in-memory photo source, a fake
//! recognizer, and the mock vision backend.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fovea_core::models::{CategoryRule, Photo, ScanStatus, TextObservation};
use fovea_core::traits::{PhotoSource, TextRecognizer};
use fovea_core::{CaptureConfig, Error, Result, ScanEvent};
use fovea_extract::MockVisionBackend;
use fovea_pipeline::{Orchestrator, Watcher};

struct FakePhotoSource {
    photos: Vec<Photo>,
}

#[async_trait]
impl PhotoSource for FakePhotoSource {
    async fn list_candidates(&self, exclude_ids: &HashSet<String>) -> Result<Vec<Photo>> {
        Ok(self
            .photos
            .iter()
            .filter(|p| !exclude_ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

struct FailingSource;

#[async_trait]
impl PhotoSource for FailingSource {
    async fn list_candidates(&self, _exclude_ids: &HashSet<String>) -> Result<Vec<Photo>> {
        Err(Error::PhotoSource("library unavailable".to_string()))
    }
}

/// Recognizer producing a dense page of left-aligned lines.
struct PageRecognizer;

impl TextRecognizer for PageRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<Vec<TextObservation>> {
        Ok((0..10)
            .map(|i| {
                TextObservation::new(
                    format!("printed line {}", i),
                    0.1,
                    0.05 + i as f32 * 0.09,
                    0.8,
                    0.02,
                )
            })
            .collect())
    }
}

/// Recognizer that finds nothing.
struct BlankRecognizer;

impl TextRecognizer for BlankRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<Vec<TextObservation>> {
        Ok(Vec::new())
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 64, image::Rgb([200, 200, 200]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

fn photo(id: &str) -> Photo {
    Photo {
        id: id.to_string(),
        created_at: "2026-02-07T10:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        bytes: png_bytes(),
    }
}

fn album_config(vault: &std::path::Path) -> CaptureConfig {
    CaptureConfig::default()
        .with_vault_root(vault)
        .with_album("Study Inbox")
        .with_category(CategoryRule {
            name: "BookNote".to_string(),
            hint: Some("book pages".to_string()),
            extraction_rules: "Extract the passage verbatim.".to_string(),
            write_rule: "One note per book under captures/book_notes/.".to_string(),
        })
}

fn create_response(path: &str) -> String {
    format!(
        r#"{{"category":"BookNote","title":"Sapiens","content":"Hello","write":{{"mode":"create","path":"{}"}}}}"#,
        path
    )
}

#[tokio::test]
async fn test_single_photo_create_cycle() {
    let vault = tempfile::TempDir::new().unwrap();
    let backend = Arc::new(MockVisionBackend::new(vec![create_response(
        "captures/book_notes/sapiens.md",
    )]));
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(PageRecognizer),
        backend.clone(),
    );

    let result = orchestrator.run_scan().await;
    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.found, 1);
    assert_eq!(result.processed, 1);
    assert_eq!(result.extracted, 1);
    assert_eq!(result.written, 1);
    assert_eq!(result.errors, 0);

    let note = vault.path().join("captures/book_notes/sapiens.md");
    let doc = std::fs::read_to_string(&note).unwrap();
    assert!(doc.contains("Hello"));
    assert!(doc.contains("asset_ids"));
    assert!(doc.contains("A1"));
    assert!(vault.path().join(".fovea/state.json").exists());
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let vault = tempfile::TempDir::new().unwrap();
    let backend = Arc::new(MockVisionBackend::new(vec![create_response(
        "captures/book_notes/sapiens.md",
    )]));
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(PageRecognizer),
        backend.clone(),
    );

    orchestrator.run_scan().await;
    let second = orchestrator.run_scan().await;
    assert_eq!(second.status, ScanStatus::Completed);
    assert_eq!(second.found, 0);
    assert_eq!(second.extracted, 0);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_deleting_note_makes_photo_eligible_again() {
    let vault = tempfile::TempDir::new().unwrap();
    let backend = Arc::new(MockVisionBackend::new(vec![
        create_response("captures/book_notes/sapiens.md"),
        create_response("captures/book_notes/sapiens.md"),
    ]));
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(PageRecognizer),
        backend.clone(),
    );

    orchestrator.run_scan().await;
    let note = vault.path().join("captures/book_notes/sapiens.md");
    std::fs::remove_file(&note).unwrap();

    // The state store still remembers A1; the vault scan overrules it.
    let result = orchestrator.run_scan().await;
    assert_eq!(result.found, 1);
    assert_eq!(result.written, 1);
    assert!(note.exists());
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_skip_plan_processes_without_writing() {
    let vault = tempfile::TempDir::new().unwrap();
    let backend = Arc::new(MockVisionBackend::new(vec![
        r#"{"category":"default","title":"","content":"","write":{"mode":"skip"}}"#.to_string(),
    ]));
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(PageRecognizer),
        backend,
    );

    let result = orchestrator.run_scan().await;
    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.processed, 1);
    assert_eq!(result.extracted, 1);
    assert_eq!(result.written, 0);
    assert_eq!(result.errors, 0);
    assert!(!vault.path().join("captures").exists());

    // A skip leaves no vault record, so the photo stays a candidate on
    // the next cycle; the remote policy is asked again.
    let second = orchestrator.run_scan().await;
    assert_eq!(second.found, 1);
}

#[tokio::test]
async fn test_append_with_anchor_into_existing_note() {
    let vault = tempfile::TempDir::new().unwrap();
    let rel = "captures/languages/spanish/202602.md";
    let abs = vault.path().join(rel);
    std::fs::create_dir_all(abs.parent().unwrap()).unwrap();
    std::fs::write(
        &abs,
        "---\ntitle: Spanish\ncategory: Spanish\nasset_ids:\n- OLD\n---\n\n## 2026-02-07\n- estar\n",
    )
    .unwrap();

    let response = format!(
        r###"{{"category":"BookNote","title":"Spanish","content":"- ser","write":{{"mode":"append","path":"{}","append_to":"## 2026-02-07"}}}}"###,
        rel
    );
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("NEW-1")],
        }),
        Arc::new(PageRecognizer),
        Arc::new(MockVisionBackend::new(vec![response])),
    );

    let result = orchestrator.run_scan().await;
    assert_eq!(result.written, 1);

    let doc = std::fs::read_to_string(&abs).unwrap();
    let heading = doc.find("## 2026-02-07").unwrap();
    let new_bullet = doc.find("- ser").unwrap();
    let old_bullet = doc.find("- estar").unwrap();
    assert!(heading < new_bullet && new_bullet < old_bullet);
    assert!(doc.contains("OLD"));
    assert!(doc.contains("NEW-1"));
}

#[tokio::test]
async fn test_whole_library_mode_gates_blank_photos() {
    let vault = tempfile::TempDir::new().unwrap();
    let backend = Arc::new(MockVisionBackend::new(Vec::new()));
    let config = CaptureConfig::default().with_vault_root(vault.path());
    let orchestrator = Orchestrator::new(
        config,
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(BlankRecognizer),
        backend.clone(),
    );

    let result = orchestrator.run_scan().await;
    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.processed, 1);
    assert_eq!(result.extracted, 0);
    assert_eq!(result.errors, 0);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_album_mode_never_gates() {
    let vault = tempfile::TempDir::new().unwrap();
    let backend = Arc::new(MockVisionBackend::new(vec![create_response(
        "captures/book_notes/anything.md",
    )]));
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(BlankRecognizer),
        backend.clone(),
    );

    let result = orchestrator.run_scan().await;
    assert_eq!(result.extracted, 1);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_item_failure_does_not_abort_batch() {
    let vault = tempfile::TempDir::new().unwrap();
    // One response; the second candidate exhausts the mock and fails.
    let backend = Arc::new(MockVisionBackend::new(vec![create_response(
        "captures/book_notes/one.md",
    )]));
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1"), photo("A2")],
        }),
        Arc::new(PageRecognizer),
        backend,
    );

    let result = orchestrator.run_scan().await;
    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.found, 2);
    assert_eq!(result.processed, 1);
    assert_eq!(result.written, 1);
    assert_eq!(result.errors, 1);
}

#[tokio::test]
async fn test_source_failure_fails_batch_but_saves_state() {
    let vault = tempfile::TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FailingSource),
        Arc::new(PageRecognizer),
        Arc::new(MockVisionBackend::new(Vec::new())),
    );

    let result = orchestrator.run_scan().await;
    assert_eq!(result.status, ScanStatus::Failed);
    assert!(result.message.unwrap().contains("library unavailable"));
    assert!(vault.path().join(".fovea/state.json").exists());
}

#[tokio::test]
async fn test_scan_events_sequence() {
    let vault = tempfile::TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(PageRecognizer),
        Arc::new(MockVisionBackend::new(vec![create_response(
            "captures/book_notes/sapiens.md",
        )])),
    );
    let mut rx = orchestrator.events();

    orchestrator.run_scan().await;

    match rx.recv().await.unwrap() {
        ScanEvent::ScanStarted { candidates, .. } => assert_eq!(candidates, 1),
        other => panic!("unexpected event: {:?}", other),
    }
    match rx.recv().await.unwrap() {
        ScanEvent::ItemProcessed {
            asset_id,
            category,
            path,
            written,
            ..
        } => {
            assert_eq!(asset_id, "A1");
            assert_eq!(category, "BookNote");
            assert_eq!(path.as_deref(), Some("captures/book_notes/sapiens.md"));
            assert!(written);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    match rx.recv().await.unwrap() {
        ScanEvent::ScanFinished {
            status,
            found,
            written,
            errors,
            ..
        } => {
            assert_eq!(status, ScanStatus::Completed);
            assert_eq!(found, 1);
            assert_eq!(written, 1);
            assert_eq!(errors, 0);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_watcher_runs_cycle_and_shuts_down() {
    let vault = tempfile::TempDir::new().unwrap();
    let orchestrator = Arc::new(Orchestrator::new(
        album_config(vault.path()),
        Arc::new(FakePhotoSource {
            photos: vec![photo("A1")],
        }),
        Arc::new(PageRecognizer),
        Arc::new(MockVisionBackend::new(vec![create_response(
            "captures/book_notes/sapiens.md",
        )])),
    ));
    let mut rx = orchestrator.events();

    let handle = Watcher::new(orchestrator.clone())
        .with_interval(Duration::from_secs(3600))
        .start();

    // WatcherStarted, then a full first cycle.
    assert!(matches!(rx.recv().await.unwrap(), ScanEvent::WatcherStarted));
    assert!(matches!(
        rx.recv().await.unwrap(),
        ScanEvent::ScanStarted { .. }
    ));

    handle.shutdown().await.unwrap();
    handle.join().await.unwrap();

    // The in-flight cycle completed before the stop event.
    let mut saw_finished = false;
    let mut saw_stopped = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            ScanEvent::ScanFinished { .. } => saw_finished = true,
            ScanEvent::WatcherStopped => {
                saw_stopped = true;
                assert!(saw_finished);
            }
            _ => {}
        }
    }
    assert!(saw_finished && saw_stopped);
    assert!(vault
        .path()
        .join("captures/book_notes/sapiens.md")
        .exists());
}
