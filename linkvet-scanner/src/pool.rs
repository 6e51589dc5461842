use crate::link::Link;
use crate::outcome::{BatchSummary, Outcome};
use futures::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Called once per completed outcome, in completion order, for live
/// console/diagnostic output. Serialized by its own lock, independent of
/// the summary lock.
pub type OutcomeCallback = Arc<dyn Fn(&Outcome) + Send + Sync>;

/// Worker cap: available parallelism, bounded at 8 so a batch never
/// overwhelms remote servers or the local browser-launch subsystem.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(8)
}

/// Drain one category's links through a bounded pool of workers and return
/// the finalized tally.
///
/// Workers pop from a shared queue in arbitrary order; each link is popped
/// and recorded in the same worker scope, so every submitted link yields
/// exactly one outcome. The function blocks until every worker has
/// finished. `verify` must encode its failures in the returned [`Outcome`];
/// a panic in `verify` or in the callback is caught and recorded as a
/// failed outcome for the link that triggered it, so nothing a worker does
/// can abort the batch or shrink the tally.
pub async fn run_batch<F, Fut>(
    links: Vec<Link>,
    workers: usize,
    verify: F,
    on_outcome: Option<OutcomeCallback>,
) -> BatchSummary
where
    F: Fn(Link) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    if links.is_empty() {
        return BatchSummary::default();
    }

    let queue: Arc<Mutex<VecDeque<Link>>> = Arc::new(Mutex::new(links.into()));
    let summary = Arc::new(Mutex::new(BatchSummary::default()));
    let output_lock: Arc<StdMutex<()>> = Arc::new(StdMutex::new(()));

    let worker_count = workers.max(1);
    let mut handles = Vec::with_capacity(worker_count);

    for worker_id in 0..worker_count {
        let queue = queue.clone();
        let summary = summary.clone();
        let output_lock = output_lock.clone();
        let on_outcome = on_outcome.clone();
        let verify = verify.clone();

        handles.push(tokio::spawn(async move {
            debug!("verification worker {} started", worker_id);
            loop {
                let link = { queue.lock().await.pop_front() };
                let Some(link) = link else { break };

                // A panic in verification or the callback costs exactly
                // the link that triggered it: it is caught here and
                // recorded as a failed outcome, and the worker moves on.
                let attempt = AssertUnwindSafe(async {
                    let outcome = verify(link.clone()).await;

                    if let Some(ref callback) = on_outcome {
                        let _guard = output_lock
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        callback(&outcome);
                    }

                    outcome
                })
                .catch_unwind()
                .await;

                let outcome = match attempt {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        warn!("worker {} panicked verifying {}", worker_id, link.url);
                        Outcome::fail(link, None, panic_message(panic))
                    }
                };

                summary.lock().await.record(outcome);
            }
            debug!("verification worker {} finished", worker_id);
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!("verification worker panicked: {}", e);
        }
    }

    match Arc::try_unwrap(summary) {
        Ok(mutex) => mutex.into_inner(),
        Err(shared) => shared.lock().await.clone(),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("worker panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("worker panicked: {}", message)
    } else {
        "worker panicked".to_string()
    }
}
