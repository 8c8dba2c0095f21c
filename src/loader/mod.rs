pub mod decode;
pub mod transport;

pub use decode::DecodeResource;
pub use transport::{HttpTransport, ResourceTransport};

use crate::cache::{ByteCache, ByteCaching};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// The observable state of a resource load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderPhase<R> {
    NotStarted,
    Loading,
    Success(R),
    Failure,
}

struct LoadTask {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

/// Coordinates loading one resource: cache lookup, network fetch, decode,
/// and phase publication.
///
/// At most one fetch task runs per loader. Changing the key cancels the
/// active task, and cancellation is re-checked before every suspension
/// point inside the task, so a stale fetch can never overwrite the phase
/// published for a newer key.
///
/// # Examples
///
/// ```no_run
/// use clientstore::ResourceLoader;
///
/// # tokio_test::block_on(async {
/// let mut loader: ResourceLoader<Vec<u8>> =
///     ResourceLoader::new(Some("https://example.com/avatar.png".to_string()));
/// loader.load();
/// let mut phases = loader.subscribe();
/// phases.changed().await.unwrap();
/// # });
/// ```
pub struct ResourceLoader<R: DecodeResource> {
    url: Option<String>,
    cache: Arc<dyn ByteCaching>,
    transport: Arc<dyn ResourceTransport>,
    phase_tx: Arc<watch::Sender<LoaderPhase<R>>>,
    task: Option<LoadTask>,
}

impl<R> ResourceLoader<R>
where
    R: DecodeResource + Clone + PartialEq,
{
    /// Creates a loader over the shared cache and shared HTTP transport.
    pub fn new(url: Option<String>) -> Self {
        let (phase_tx, _) = watch::channel(LoaderPhase::NotStarted);
        Self {
            url,
            cache: ByteCache::shared(),
            transport: HttpTransport::shared(),
            phase_tx: Arc::new(phase_tx),
            task: None,
        }
    }

    /// Substitutes the cache dependency (test seam).
    pub fn with_cache(mut self, cache: Arc<dyn ByteCaching>) -> Self {
        self.cache = cache;
        self
    }

    /// Substitutes the transport dependency (test seam).
    pub fn with_transport(mut self, transport: Arc<dyn ResourceTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Starts in `Loading` instead of `NotStarted`, for call sites that
    /// trigger `load` immediately on appearance.
    pub fn initially_loading(self) -> Self {
        self.phase_tx.send_replace(LoaderPhase::Loading);
        self
    }

    /// The current phase.
    pub fn phase(&self) -> LoaderPhase<R> {
        self.phase_tx.borrow().clone()
    }

    /// A receiver notified on every phase change.
    pub fn subscribe(&self) -> watch::Receiver<LoaderPhase<R>> {
        self.phase_tx.subscribe()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Starts loading the resource behind the current key.
    ///
    /// A no-op while a fetch task is still in flight. Without a key the
    /// phase goes straight to `Failure`.
    pub fn load(&mut self) {
        if self.task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }
        self.task = None;

        let Some(url) = self.url.clone() else {
            publish(&self.phase_tx, LoaderPhase::Failure);
            return;
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let routine = LoadRoutine {
            url,
            cache: self.cache.clone(),
            transport: self.transport.clone(),
            phase_tx: self.phase_tx.clone(),
            cancelled: cancelled.clone(),
        };
        let handle = tokio::spawn(routine.run());
        self.task = Some(LoadTask { handle, cancelled });
    }

    /// Replaces the key and reloads; equal keys are a no-op.
    pub fn update_url(&mut self, new_url: Option<String>) {
        if new_url == self.url {
            return;
        }
        self.cancel();
        self.url = new_url;
        self.load();
    }

    /// Cancels the active task, if any. The current phase is untouched.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancelled.store(true, Ordering::SeqCst);
            task.handle.abort();
        }
    }
}

impl<R: DecodeResource> Drop for ResourceLoader<R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancelled.store(true, Ordering::SeqCst);
            task.handle.abort();
        }
    }
}

struct LoadRoutine<R> {
    url: String,
    cache: Arc<dyn ByteCaching>,
    transport: Arc<dyn ResourceTransport>,
    phase_tx: Arc<watch::Sender<LoaderPhase<R>>>,
    cancelled: Arc<AtomicBool>,
}

impl<R> LoadRoutine<R>
where
    R: DecodeResource + Clone + PartialEq,
{
    /// The load state machine. Cancellation is checked before every
    /// suspension point, and every phase write goes through
    /// [`publish`](LoadRoutine::publish), which re-checks the flag under the
    /// channel lock; once canceled, the routine can never transition the
    /// phase again.
    async fn run(self) {
        if self.is_cancelled() {
            return;
        }

        if let Some(bytes) = self.cache.get(&self.url).await {
            if let Some(resource) = R::decode(&bytes) {
                // Cache hit: jump straight to Success, no Loading phase.
                self.publish(LoaderPhase::Success(resource));
                return;
            }
            // Undecodable cached bytes fall through to a fresh fetch.
        }

        if self.is_cancelled() {
            return;
        }
        self.publish(LoaderPhase::Loading);

        match self.transport.fetch(&self.url).await {
            Ok(bytes) => {
                if self.is_cancelled() {
                    return;
                }
                match R::decode(&bytes) {
                    Some(resource) => {
                        self.cache.insert(&self.url, bytes).await;
                        self.publish(LoaderPhase::Success(resource));
                    }
                    None => self.publish(LoaderPhase::Failure),
                }
            }
            Err(err) => {
                if self.is_cancelled() {
                    return;
                }
                warn!(url = %self.url, error = %err, "resource fetch failed");
                self.publish(LoaderPhase::Failure);
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Publishes a phase unless it is unchanged or the task has been
    /// canceled. The cancellation check and the write happen inside one
    /// `send_if_modified` call, so a `cancel()` racing a synchronous step
    /// (decode cannot be interrupted by an abort) still wins: the stale
    /// task observes the flag before it can touch the phase.
    fn publish(&self, phase: LoaderPhase<R>) {
        let mut next = Some(phase);
        self.phase_tx.send_if_modified(|current| {
            let Some(phase) = next.take() else {
                return false;
            };
            if self.cancelled.load(Ordering::SeqCst) || *current == phase {
                return false;
            }
            *current = phase;
            true
        });
    }
}

/// Publishes a phase only when it differs from the current one, so
/// observers never see a duplicate transition.
fn publish<R: Clone + PartialEq>(tx: &watch::Sender<LoaderPhase<R>>, phase: LoaderPhase<R>) {
    if *tx.borrow() != phase {
        tx.send_replace(phase);
    }
}
