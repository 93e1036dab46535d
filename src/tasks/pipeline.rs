//! Mutation Pipeline
//!
//! Three background tasks own every structural change to the recency list:
//!
//! - Inserter: links newly created entries at the head and requests evictions
//!   once earlier accesses have been applied
//! - Evictor: drops the tail while the cache is over capacity
//! - Repositioner: moves accessed keys to the head
//!
//! All three share one `RwLock<CacheStore>` and one cancellation token. No
//! task ever sends on a channel while holding the lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::cache::{CacheStore, Handle};

/// Message carried on every pipeline channel.
#[derive(Debug)]
pub(crate) enum Signal<T> {
    /// A unit of work for the receiving task
    Work(T),
    /// Acknowledged once everything queued before it has been processed
    Barrier(oneshot::Sender<()>),
}

/// Work for the inserter.
#[derive(Debug)]
pub(crate) enum Insertion {
    /// Link a freshly created entry at the head
    Link(Handle),
    /// The key was written or read before its entry was linked; move it to
    /// the head once it is
    Relink(String),
}

type Shared<V> = Arc<RwLock<CacheStore<V>>>;

// == Pipeline ==
/// Channel ends and lifecycle of one cache instance's workers.
///
/// Dropping the pipeline cancels its workers.
pub struct Pipeline {
    insert_tx: mpsc::UnboundedSender<Signal<Insertion>>,
    access_tx: mpsc::Sender<Signal<String>>,
    evict_tx: mpsc::UnboundedSender<Signal<()>>,
    /// Insertions queued but not yet applied by the inserter
    unsettled: Arc<AtomicUsize>,
    token: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    /// Spawns the inserter, evictor and repositioner on `runtime`.
    ///
    /// `capacity` and `access_buffer` must be positive; the cache validates
    /// its config before calling this.
    pub fn spawn<V>(
        runtime: &RuntimeHandle,
        store: Arc<RwLock<CacheStore<V>>>,
        capacity: usize,
        access_buffer: usize,
    ) -> Self
    where
        V: Send + Sync + 'static,
    {
        let token = CancellationToken::new();
        let unsettled = Arc::new(AtomicUsize::new(0));
        let (insert_tx, insert_rx) = mpsc::unbounded_channel();
        let (evict_tx, evict_rx) = mpsc::unbounded_channel();
        let (access_tx, access_rx) = mpsc::channel(access_buffer);

        let workers = vec![
            runtime.spawn(run_inserter(
                Arc::clone(&store),
                capacity,
                insert_rx,
                Arc::clone(&unsettled),
                access_tx.clone(),
                evict_tx.clone(),
                token.clone(),
            )),
            runtime.spawn(run_evictor(
                Arc::clone(&store),
                capacity,
                evict_rx,
                token.clone(),
            )),
            runtime.spawn(run_repositioner(store, access_rx, token.clone())),
        ];

        debug!(
            "Mutation pipeline started: capacity={}, access_buffer={}",
            capacity, access_buffer
        );

        Self {
            insert_tx,
            access_tx,
            evict_tx,
            unsettled,
            token,
            workers: Mutex::new(workers),
        }
    }

    // == Signals ==
    /// Hands a freshly created entry to the inserter.
    ///
    /// Never blocks. Returns false once the inserter has exited.
    pub fn submit_insert(&self, handle: Handle) -> bool {
        self.submit(Insertion::Link(handle))
    }

    /// Asks the inserter to promote a key once its pending entry is linked.
    ///
    /// Travels on the insert channel so it is ordered after the entry's link.
    /// Returns false once the inserter has exited.
    pub fn submit_relink(&self, key: String) -> bool {
        self.submit(Insertion::Relink(key))
    }

    fn submit(&self, insertion: Insertion) -> bool {
        self.unsettled.fetch_add(1, Ordering::AcqRel);
        if self.insert_tx.send(Signal::Work(insertion)).is_err() {
            self.unsettled.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }

    /// Whether insertions queued so far have all been applied.
    ///
    /// While this is false an access must travel behind them as a relink,
    /// or the repositioner could promote a key ahead of entries written
    /// before it was read.
    pub fn inserts_settled(&self) -> bool {
        self.unsettled.load(Ordering::Acquire) == 0
    }

    /// Asks the repositioner to promote a key.
    ///
    /// Never blocks: the signal is dropped when the channel is full or the
    /// repositioner has exited. Returns whether it was queued.
    pub fn signal_access(&self, key: String) -> bool {
        match self.access_tx.try_send(Signal::Work(key)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(Signal::Work(key))) => {
                trace!("Access channel full, dropping reposition of {}", key);
                false
            }
            Err(_) => false,
        }
    }

    // == Quiesce ==
    /// Waits until every signal queued before this call has been handled.
    ///
    /// Barriers go through the inserter first so the evictions it requests
    /// are queued ahead of the evictor's barrier. Returns early if the
    /// pipeline stops.
    pub async fn quiesce(&self) {
        let (ack, done) = oneshot::channel();
        if self.insert_tx.send(Signal::Barrier(ack)).is_err() || done.await.is_err() {
            return;
        }

        let (ack, done) = oneshot::channel();
        if self.access_tx.send(Signal::Barrier(ack)).await.is_err() || done.await.is_err() {
            return;
        }

        let (ack, done) = oneshot::channel();
        if self.evict_tx.send(Signal::Barrier(ack)).is_err() {
            return;
        }
        let _ = done.await;
    }

    // == Stop ==
    /// Cancels all workers. Idempotent and non-blocking.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            debug!("Stopping mutation pipeline");
        }
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels all workers and waits for them to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(err) = worker.await {
                warn!("Pipeline worker ended abnormally: {}", err);
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Receives the next signal, or None once cancelled or disconnected.
async fn next_signal<T>(
    rx: &mut mpsc::Receiver<Signal<T>>,
    token: &CancellationToken,
) -> Option<Signal<T>> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        signal = rx.recv() => signal,
    }
}

async fn next_unbounded<T>(
    rx: &mut mpsc::UnboundedReceiver<Signal<T>>,
    token: &CancellationToken,
) -> Option<Signal<T>> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        signal = rx.recv() => signal,
    }
}

// == Inserter ==
async fn run_inserter<V>(
    store: Shared<V>,
    capacity: usize,
    mut rx: mpsc::UnboundedReceiver<Signal<Insertion>>,
    unsettled: Arc<AtomicUsize>,
    access_tx: mpsc::Sender<Signal<String>>,
    evict_tx: mpsc::UnboundedSender<Signal<()>>,
    token: CancellationToken,
) {
    debug!("Inserter started");

    while let Some(signal) = next_unbounded(&mut rx, &token).await {
        match signal {
            Signal::Work(Insertion::Link(handle)) => {
                let over_capacity = link_entry(&store, handle, capacity);
                unsettled.fetch_sub(1, Ordering::AcqRel);
                if !over_capacity {
                    continue;
                }
                // Accesses queued before this link must reorder the list
                // before the evictor picks the tail.
                if !settle_accesses(&access_tx, &token).await
                    || evict_tx.send(Signal::Work(())).is_err()
                {
                    break;
                }
            }
            Signal::Work(Insertion::Relink(key)) => {
                if !store.write().promote(&key) {
                    trace!("Key {} gone before relink", key);
                }
                unsettled.fetch_sub(1, Ordering::AcqRel);
            }
            Signal::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Inserter stopped");
}

/// Links a pending entry. Returns true if the cache is now over capacity.
fn link_entry<V>(store: &RwLock<CacheStore<V>>, handle: Handle, capacity: usize) -> bool {
    let mut store = store.write();
    if !store.link(handle) {
        trace!("Entry {} was not pending, skipping link", handle);
        return false;
    }
    store.linked_len() > capacity
}

/// Waits for the repositioner to apply everything queued on the access
/// channel so far. Returns false once the pipeline is stopping.
async fn settle_accesses(
    access_tx: &mpsc::Sender<Signal<String>>,
    token: &CancellationToken,
) -> bool {
    let (ack, done) = oneshot::channel();
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        acked = async {
            access_tx.send(Signal::Barrier(ack)).await.is_ok() && done.await.is_ok()
        } => acked,
    }
}

// == Evictor ==
async fn run_evictor<V>(
    store: Shared<V>,
    capacity: usize,
    mut rx: mpsc::UnboundedReceiver<Signal<()>>,
    token: CancellationToken,
) {
    debug!("Evictor started");

    while let Some(signal) = next_unbounded(&mut rx, &token).await {
        match signal {
            Signal::Work(()) => match evict_entry(&store, capacity) {
                Some(key) => debug!("Evicted least recently used key {}", key),
                None => trace!("Eviction signal with nothing to evict"),
            },
            Signal::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Evictor stopped");
}

/// Evicts the tail if the cache is over capacity.
fn evict_entry<V>(store: &RwLock<CacheStore<V>>, capacity: usize) -> Option<String> {
    let mut store = store.write();
    if store.linked_len() <= capacity {
        return None;
    }
    store.evict_tail()
}

// == Repositioner ==
async fn run_repositioner<V>(
    store: Shared<V>,
    mut rx: mpsc::Receiver<Signal<String>>,
    token: CancellationToken,
) {
    debug!("Repositioner started");

    while let Some(signal) = next_signal(&mut rx, &token).await {
        match signal {
            Signal::Work(key) => {
                if !store.write().promote(&key) {
                    trace!("Key {} not linked, skipping reposition", key);
                }
            }
            Signal::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Repositioner stopped");
}
