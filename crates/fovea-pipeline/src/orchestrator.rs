//! The per-cycle scan orchestrator.
//!
//! State machine per cycle: `Idle -> Running -> {Completed, Failed,
//! Skipped}`. At most one scan runs per process; a second entry while one
//! is `Running` returns `Skipped` with no side effects. Item failures are
//! isolated; only batch-level setup failures (photo enumeration, vault
//! dedup scan) fail the cycle. State is persisted before every return.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use fovea_classify::{PreFilter, PreFilterConfig};
use fovea_core::models::{Photo, ScanResult, ScanStatus};
use fovea_core::traits::{PhotoSource, TextRecognizer, VisionBackend};
use fovea_core::{CaptureConfig, Error, EventBus, Result, ScanEvent};
use fovea_extract::{ExtractorConfig, PolicyExtractor};
use fovea_vault::{dedup, StateStore, VaultWriter};

/// Outcome of one candidate that completed the pipeline without error.
enum ItemOutcome {
    /// Whole-library mode and the pre-filter rejected the photo.
    Gated,
    /// Extraction ran; `path` is present when a note was written.
    Extracted {
        category: String,
        path: Option<String>,
    },
}

/// Drives one scan cycle end to end.
pub struct Orchestrator {
    config: CaptureConfig,
    source: Arc<dyn PhotoSource>,
    prefilter: PreFilter,
    extractor: PolicyExtractor,
    writer: VaultWriter,
    state: Mutex<StateStore>,
    bus: EventBus,
    running: AtomicBool,
}

impl Orchestrator {
    /// Build an orchestrator from configuration and collaborators.
    ///
    /// Persistent state is loaded from the vault's state file; a corrupt
    /// file is reported and replaced with fresh state rather than
    /// aborting, since the vault itself remains the dedup authority.
    pub fn new(
        config: CaptureConfig,
        source: Arc<dyn PhotoSource>,
        recognizer: Arc<dyn TextRecognizer>,
        backend: Arc<dyn VisionBackend>,
    ) -> Self {
        let state_path = config.state_path();
        let state = match StateStore::load(&state_path) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %state_path.display(), error = %e, "state load failed, starting fresh");
                StateStore::fresh(&state_path)
            }
        };
        let prefilter = PreFilter::new(
            recognizer,
            PreFilterConfig {
                min_text_density: config.min_text_density,
                min_line_count: config.min_line_count,
            },
        );
        let extractor = PolicyExtractor::new(
            backend,
            ExtractorConfig {
                max_concurrent: config.max_concurrent_api_calls,
                max_image_dimension: config.max_image_dimension,
                categories: config.categories.clone(),
                default_rule: config.default_rule.clone(),
                global_rules: config.global_rules.clone(),
            },
        );
        let writer = VaultWriter::new(&config.vault_root);
        Self {
            config,
            source,
            prefilter,
            extractor,
            writer,
            state: Mutex::new(state),
            bus: EventBus::default(),
            running: AtomicBool::new(false),
        }
    }

    /// The event bus all scan events are emitted on.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to scan events.
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<ScanEvent> {
        self.bus.subscribe()
    }

    /// Run one scan cycle.
    ///
    /// Returns `Skipped` immediately if a cycle is already running in this
    /// process.
    pub async fn run_scan(&self) -> ScanResult {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("scan already running, skipping");
            return ScanResult::skipped();
        }
        let scan_id = Uuid::now_v7();
        let result = self.run_cycle(scan_id).await;
        self.running.store(false, Ordering::Release);
        result
    }

    #[instrument(skip(self, scan_id), fields(scan_id = %scan_id))]
    async fn run_cycle(&self, scan_id: Uuid) -> ScanResult {
        let started_at = Utc::now();

        let candidates = match self.list_new_candidates().await {
            Ok(photos) => photos,
            Err(e) => {
                error!(error = %e, "batch setup failed");
                return self.finish_failed(scan_id, started_at, e).await;
            }
        };

        let found = candidates.len();
        info!(found, album = %self.config.album, "scan started");
        self.bus.emit(ScanEvent::ScanStarted {
            scan_id,
            candidates: found,
            started_at,
        });

        let mut processed = 0usize;
        let mut extracted = 0usize;
        let mut written = 0usize;
        let mut errors = 0usize;

        // Sequential by discovery order; only the extractor's internal
        // semaphore bounds API concurrency. Keeps same-file writes ordered.
        for photo in &candidates {
            match self.process_item(photo).await {
                Ok(outcome) => {
                    processed += 1;
                    let (category, path, item_written) = match outcome {
                        ItemOutcome::Gated => ("-".to_string(), None, false),
                        ItemOutcome::Extracted { category, path } => {
                            extracted += 1;
                            let w = path.is_some();
                            if w {
                                written += 1;
                            }
                            (category, path, w)
                        }
                    };
                    let mut state = self.state.lock().await;
                    state.mark_processed(&photo.id);
                    self.bus.emit(ScanEvent::ItemProcessed {
                        scan_id,
                        asset_id: photo.id.clone(),
                        category,
                        path,
                        written: item_written,
                    });
                }
                Err(e) => {
                    errors += 1;
                    warn!(asset_id = %photo.id, error = %e, "candidate failed");
                    self.state.lock().await.stats_mut().errors += 1;
                    self.bus.emit(ScanEvent::ItemFailed {
                        scan_id,
                        asset_id: photo.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.persist_state().await;

        let result = ScanResult {
            status: ScanStatus::Completed,
            found,
            processed,
            extracted,
            written,
            errors,
            message: None,
            started_at,
            finished_at: Utc::now(),
        };
        info!(found, processed, extracted, written, errors, "scan completed");
        self.bus.emit(ScanEvent::ScanFinished {
            scan_id,
            status: result.status,
            found,
            extracted,
            written,
            errors,
        });
        result
    }

    /// Enumerate source candidates and drop any already present in the
    /// vault. The full-vault asset-ID scan is the authoritative skip
    /// decision; the state store never overrides it.
    async fn list_new_candidates(&self) -> Result<Vec<Photo>> {
        let vault_root = self.config.vault_root.clone();
        let existing = tokio::task::spawn_blocking(move || dedup::existing_asset_ids(&vault_root))
            .await
            .map_err(|e| Error::Internal(format!("dedup scan task failed: {}", e)))??;
        debug!(existing = existing.len(), "vault asset ids collected");

        let mut candidates = self.source.list_candidates(&existing).await?;
        // Sources are expected to honor exclude_ids; filter again anyway.
        candidates.retain(|p| !existing.contains(&p.id));
        Ok(candidates)
    }

    /// Run one candidate through pre-filter, extractor, and writer.
    async fn process_item(&self, photo: &Photo) -> Result<ItemOutcome> {
        {
            let mut state = self.state.lock().await;
            state.stats_mut().scanned += 1;
        }

        let classification = self.prefilter.classify(&photo.bytes);
        debug!(
            asset_id = %photo.id,
            hint = %classification.category_hint,
            confidence = classification.confidence,
            "pre-filter classified"
        );
        {
            let mut state = self.state.lock().await;
            state.stats_mut().classified += 1;
        }

        // Album-scoped scans treat the classification as a hint only; the
        // hard gate applies in whole-library mode.
        if !self.config.is_album_scoped() && !classification.is_learning_content {
            debug!(asset_id = %photo.id, reason = %classification.reason, "gated by pre-filter");
            self.state.lock().await.stats_mut().skipped += 1;
            return Ok(ItemOutcome::Gated);
        }

        let extraction = self
            .extractor
            .extract(&photo.bytes, &classification, &photo.id, photo.created_at)
            .await?;
        {
            let mut state = self.state.lock().await;
            state.stats_mut().extracted += 1;
        }

        let path = self.writer.write(&extraction, photo.created_at, &photo.id)?;
        {
            let mut state = self.state.lock().await;
            match path {
                Some(_) => state.stats_mut().written += 1,
                None => state.stats_mut().skipped += 1,
            }
        }
        Ok(ItemOutcome::Extracted {
            category: extraction.category,
            path,
        })
    }

    async fn finish_failed(
        &self,
        scan_id: Uuid,
        started_at: chrono::DateTime<Utc>,
        error: Error,
    ) -> ScanResult {
        self.persist_state().await;
        let result = ScanResult {
            status: ScanStatus::Failed,
            found: 0,
            processed: 0,
            extracted: 0,
            written: 0,
            errors: 0,
            message: Some(error.to_string()),
            started_at,
            finished_at: Utc::now(),
        };
        self.bus.emit(ScanEvent::ScanFinished {
            scan_id,
            status: result.status,
            found: 0,
            extracted: 0,
            written: 0,
            errors: 0,
        });
        result
    }

    /// Flush state to disk. Save failures are reported but never turn a
    /// completed cycle into a failed one.
    async fn persist_state(&self) {
        let mut state = self.state.lock().await;
        state.set_last_scan(Utc::now());
        if let Err(e) = state.save() {
            error!(error = %e, "state save failed");
        }
    }

    /// Seconds between cycles in watch mode.
    pub fn scan_interval_secs(&self) -> u64 {
        self.config.scan_interval_secs
    }
}
