//! Query-to-results pipeline.
//!
//! Stages per issued query: debounce, load-index (once per session),
//! search, resolve-details. Nothing in flight is cancelled when the query
//! changes; a newer issue bumps the generation counter and stale runs are
//! dropped at the checkpoints below, with [`crate::overlay::Overlay::commit`]
//! as the final gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::index::{IndexHandle, ResultItem};

/// Identity of one issued query, compared at commit time to suppress
/// resolutions that were superseded while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryToken(u64);

impl QueryToken {
    /// Only [`SearchPipeline::issue`] mints tokens at runtime; this exists
    /// for tests and alternate front-ends driving [`crate::overlay::Overlay`]
    /// directly.
    pub fn from_raw(n: u64) -> Self {
        Self(n)
    }
}

/// A settled resolution, delivered back to the event loop.
#[derive(Debug)]
pub struct Resolution {
    pub token: QueryToken,
    pub query: String,
    pub items: Vec<ResultItem>,
}

pub struct SearchPipeline {
    index: Arc<IndexHandle>,
    generation: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<Resolution>,
    debounce: Duration,
    rt: tokio::runtime::Handle,
}

impl SearchPipeline {
    pub fn new(
        index: Arc<IndexHandle>,
        debounce: Duration,
        rt: tokio::runtime::Handle,
    ) -> (Self, mpsc::UnboundedReceiver<Resolution>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                index,
                generation: Arc::new(AtomicU64::new(0)),
                tx,
                debounce,
                rt,
            },
            rx,
        )
    }

    /// Issue a query. Every call bumps the generation so older in-flight
    /// runs can no longer commit. An empty query performs no index work at
    /// all; the caller resolves it to idle synchronously.
    pub fn issue(&self, query: &str) -> QueryToken {
        let token = QueryToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        if query.is_empty() {
            return token;
        }
        self.rt.spawn(run_query(
            self.index.clone(),
            self.generation.clone(),
            token,
            query.to_owned(),
            self.debounce,
            self.tx.clone(),
        ));
        token
    }
}

async fn run_query(
    index: Arc<IndexHandle>,
    generation: Arc<AtomicU64>,
    token: QueryToken,
    query: String,
    debounce: Duration,
    tx: mpsc::UnboundedSender<Resolution>,
) {
    tokio::time::sleep(debounce).await;
    if generation.load(Ordering::SeqCst) != token.0 {
        // Keystroke burst; a newer issue owns the lookup.
        return;
    }

    let index = match index.ensure_ready().await {
        Ok(index) => index,
        Err(e) => {
            // No retry and no recovery path; the resource stays pending.
            warn!(query = %query, error = %format!("{e:#}"), "search index unavailable");
            return;
        }
    };

    let matches = match index.search(&query).await {
        Ok(Some(matches)) => matches,
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(query = %query, error = %format!("{e:#}"), "search failed");
            return;
        }
    };

    // Detail payloads resolve concurrently; awaiting the handles in order
    // keeps the index's ranking.
    let handles: Vec<_> = matches
        .into_iter()
        .map(|m| tokio::spawn(async move { m.data().await }))
        .collect();
    let mut items = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Ok(item)) => items.push(item),
            Ok(Err(e)) => warn!(query = %query, error = %format!("{e:#}"), "match detail failed"),
            Err(e) => warn!(query = %query, error = %e, "detail task panicked"),
        }
    }

    if generation.load(Ordering::SeqCst) != token.0 {
        debug!(query = %query, "resolution superseded before commit");
        return;
    }
    let _ = tx.send(Resolution {
        token,
        query,
        items,
    });
}
