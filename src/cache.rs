//! Memoized snapshots keyed by source content.
//!
//! A [`SnapshotCache`] serves the same `Arc<Snapshot>` for as long as the
//! reader's fingerprint does not change. The cache lock is held across a
//! rebuild, so concurrent requests collapse into a single build and late
//! callers receive its result.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::{self, Snapshot};
use crate::source::SourceReader;

pub struct SnapshotCache {
    reader: Arc<dyn SourceReader>,
    config: PipelineConfig,
    current: Mutex<Option<Arc<Snapshot>>>,
    builds: AtomicUsize,
}

impl SnapshotCache {
    pub fn new(reader: Arc<dyn SourceReader>, config: PipelineConfig) -> Self {
        Self {
            reader,
            config,
            current: Mutex::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Returns the snapshot for the current source content, building it if
    /// the content changed since the last build.
    ///
    /// Failed builds are not cached; the next call tries again.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Arc<Snapshot>> {
        let mut current = self.current.lock().await;

        let reader = Arc::clone(&self.reader);
        let fingerprint = tokio::task::spawn_blocking(move || reader.fingerprint()).await??;

        if let Some(snapshot) = current.as_ref() {
            if snapshot.fingerprint.as_ref() == Some(&fingerprint) {
                debug!(%fingerprint, "Serving cached snapshot");
                return Ok(Arc::clone(snapshot));
            }
        }

        info!(%fingerprint, "Source content changed, rebuilding snapshot");
        let reader = Arc::clone(&self.reader);
        let config = self.config.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            let mut snapshot = pipeline::run(reader.as_ref(), &config)?;
            snapshot.fingerprint = Some(fingerprint);
            Ok::<_, PipelineError>(snapshot)
        })
        .await??;

        self.builds.fetch_add(1, Ordering::Relaxed);
        let snapshot = Arc::new(snapshot);
        *current = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Forgets the cached snapshot so the next [`get`](Self::get) rebuilds
    /// even if the content is unchanged.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        if current.take().is_some() {
            info!("Snapshot cache invalidated");
        }
    }

    /// The cached snapshot, if any, without checking the sources.
    pub async fn peek(&self) -> Option<Arc<Snapshot>> {
        self.current.lock().await.clone()
    }

    /// Number of successful builds so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}
