use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use super::source::LogSource;
use crate::error::Result;
use crate::types::{FetchKey, LogFormat};
use crate::window::DateWindow;

type Slot = Arc<OnceCell<Arc<str>>>;

/// Memoizes raw log text per window and format for the lifetime of one run.
///
/// Concurrent requests for the same key share a single underlying fetch. A
/// fetch that fails or is cancelled leaves no entry behind.
pub struct CachedSource<S> {
    inner: S,
    slots: Mutex<HashMap<FetchKey, Slot>>,
}

impl<S: LogSource> CachedSource<S> {
    /// Wrap a source with an empty cache
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch through the cache
    pub async fn fetch(
        &self,
        window: DateWindow,
        format: LogFormat,
        cancel: &CancellationToken,
    ) -> Result<Arc<str>> {
        let key = FetchKey { window, format };
        let slot = self.slot(key);

        if let Some(text) = slot.get() {
            debug!("cache hit for {window} ({format:?})");
            return Ok(Arc::clone(text));
        }

        let text = slot
            .get_or_try_init(|| async {
                debug!("fetching log for {window} ({format:?})");
                let raw = self.inner.fetch(window, format, cancel.clone()).await?;
                Ok::<_, crate::error::AnalysisError>(Arc::from(raw))
            })
            .await?;
        Ok(Arc::clone(text))
    }

    /// Retrieve already-fetched text without touching the source
    pub fn get(&self, key: &FetchKey) -> Option<Arc<str>> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of keys holding fetched text
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn slot(&self, key: FetchKey) -> Slot {
        Arc::clone(self.lock().entry(key).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<FetchKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
