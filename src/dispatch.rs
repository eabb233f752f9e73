//! Fixed-size worker pool that runs every backup item exactly once.
//!
//! Items are placed in a shared queue once. Each worker repeatedly takes the next item,
//! transfers it and reports the outcome until the queue is empty. A failing item, a timeout
//! or even a panicking transfer only affects the item being processed.

use crate::error::{ItemError, Outcome};
use crate::executor::Transfer;
use crate::item::Item;
use futures::FutureExt;
use log::{debug, error, info};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Outcome of one item, tagged with the worker that processed it.
#[derive(Debug)]
pub struct Report {
    /// 1-based worker id.
    pub worker: usize,
    pub label: String,
    pub item: Item,
    pub result: Result<(), ItemError>,
}

impl Report {
    pub fn outcome(&self) -> Outcome {
        match &self.result {
            Ok(()) => Outcome::Succeeded,
            Err(e) => e.outcome(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

type Queue = Arc<Mutex<VecDeque<Item>>>;

/// Runs `items` on `workers` concurrent workers and waits until every item has been attempted.
///
/// Returns one report per item, in completion order. No more workers than items are spawned,
/// and at least one is.
pub async fn dispatch<T: Transfer>(
    items: Vec<Item>,
    workers: usize,
    transfer: Arc<T>,
) -> Vec<Report> {
    let total = items.len();
    let workers = workers.min(total).max(1);
    let queue: Queue = Arc::new(Mutex::new(items.into()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    debug!("dispatching {total} item(s) to {workers} worker(s)");
    let mut set = JoinSet::new();
    for id in 1..=workers {
        set.spawn(worker(id, queue.clone(), transfer.clone(), tx.clone()));
    }
    drop(tx);

    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            error!("worker stopped unexpectedly: {e}");
        }
    }

    let mut reports = Vec::with_capacity(total);
    while let Some(report) = rx.recv().await {
        reports.push(report);
    }
    reports
}

async fn worker<T: Transfer>(
    id: usize,
    queue: Queue,
    transfer: Arc<T>,
    reports: mpsc::UnboundedSender<Report>,
) {
    while let Some(item) = next_item(&queue) {
        let label = item.label();
        debug!("[worker {id}] {label}: running");

        let result = AssertUnwindSafe(transfer.transfer(&item))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(ItemError::ExecutionFailed {
                    program: label.clone(),
                    code: None,
                    detail: "transfer panicked".to_string(),
                })
            });

        match &result {
            Ok(()) => info!("[worker {id}] {label}: ok"),
            Err(e) => error!("[worker {id}] {label}: failed: {e}"),
        }
        let report = Report {
            worker: id,
            label,
            item,
            result,
        };
        if reports.send(report).is_err() {
            break;
        }
    }
    debug!("[worker {id}] queue drained");
}

/// Pops the next item. The lock is released before the item is processed.
fn next_item(queue: &Mutex<VecDeque<Item>>) -> Option<Item> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

/// Counts succeeded and failed reports.
pub fn summarize(reports: &[Report]) -> (usize, usize) {
    let succeeded = reports.iter().filter(|r| r.is_success()).count();
    (succeeded, reports.len() - succeeded)
}
