//! Search index facade.
//!
//! The index itself is an opaque prebuilt artifact; this module owns only
//! the seam the overlay talks through:
//!
//! - **[`SearchIndex`]**: lazily-initialized ranked lookup plus per-match
//!   detail resolution.
//! - **[`IndexHandle`]**: init-once wrapper shared by every query for the
//!   lifetime of the session; injected into the pipeline rather than held
//!   as a hidden module global.
//! - **[`bundle`]**: the shipped adapter reading a prebuilt JSON bundle
//!   from disk.

pub mod bundle;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// A fully resolved search result, in the order the index ranked it.
///
/// `excerpt` is a markup-safe HTML fragment: non-highlighted text is
/// escaped and matched terms are wrapped in `<mark>` tags.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResultItem {
    pub url: String,
    pub title: String,
    pub excerpt: String,
}

/// A ranked match handle returned by [`SearchIndex::search`].
///
/// Details are deliberately a second asynchronous step (`data()`), matching
/// the two-phase shape of prebuilt static indexes: the ranked id list is
/// cheap, the per-match payload is not.
#[async_trait]
pub trait IndexMatch: Send + Sync {
    fn id(&self) -> &str;
    async fn data(&self) -> Result<ResultItem>;
}

/// The external index contract.
///
/// `search` returning `Ok(None)` means the index yielded no result
/// container (superseded internally); callers treat it as empty.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// One-time preparation. Guaranteed to run at most once per session by
    /// [`IndexHandle`]; implementations may still be defensive.
    async fn init(&self) -> Result<()>;

    /// Ranked lookup. Order of the returned matches is the ranking; the
    /// overlay never re-sorts.
    async fn search(&self, query: &str) -> Result<Option<Vec<Box<dyn IndexMatch>>>>;
}

/// Init-once wrapper around a [`SearchIndex`].
///
/// All callers of [`ensure_ready`](Self::ensure_ready) await the same
/// in-flight `init()` rather than racing duplicate loads. There is no
/// teardown; the handle lives for the session.
pub struct IndexHandle {
    index: Arc<dyn SearchIndex>,
    ready: tokio::sync::OnceCell<()>,
}

impl IndexHandle {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            index,
            ready: tokio::sync::OnceCell::new(),
        }
    }

    /// Initialize on first use and hand out the shared index.
    pub async fn ensure_ready(&self) -> Result<&Arc<dyn SearchIndex>> {
        self.ready
            .get_or_try_init(|| async {
                tracing::info!("initializing search index");
                self.index.init().await
            })
            .await?;
        Ok(&self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingIndex {
        inits: AtomicUsize,
    }

    #[async_trait]
    impl SearchIndex for CountingIndex {
        async fn init(&self) -> Result<()> {
            // Yield so concurrent callers genuinely overlap.
            tokio::task::yield_now().await;
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn search(&self, _query: &str) -> Result<Option<Vec<Box<dyn IndexMatch>>>> {
            Ok(Some(Vec::new()))
        }
    }

    #[tokio::test]
    async fn concurrent_ensure_ready_inits_once() {
        let counting = Arc::new(CountingIndex {
            inits: AtomicUsize::new(0),
        });
        let handle = Arc::new(IndexHandle::new(counting.clone()));

        let a = tokio::spawn({
            let h = handle.clone();
            async move { h.ensure_ready().await.map(|_| ()) }
        });
        let b = tokio::spawn({
            let h = handle.clone();
            async move { h.ensure_ready().await.map(|_| ()) }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        handle.ensure_ready().await.unwrap();
        assert_eq!(counting.inits.load(Ordering::SeqCst), 1);
    }
}
