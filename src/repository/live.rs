//! Live queries.
//!
//! A subscription registers for engine change notifications before running its
//! query for the first time, so no commit can slip between the initial result
//! and the first notification. After that, every commit that touches one of the
//! query's tables re-runs it and pushes the fresh result.
//!
//! The query runs on the tokio runtime current at the `observe_*` call. Called
//! outside a runtime, the subscription delivers a single error and ends.

use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::RepositoryResult;
use crate::database::{Change, Database, DatabaseError, Table};

/// Stream of query results. Dropping it cancels the subscription.
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<RepositoryResult<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    /// Wait for the next result. Returns `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<RepositoryResult<T>> {
        self.receiver.recv().await
    }

    /// Take an already delivered result without waiting
    pub fn try_next(&mut self) -> Option<RepositoryResult<T>> {
        self.receiver.try_recv().ok()
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop delivery and release the background task
    pub fn cancel(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Start a live query on the current tokio runtime
pub(crate) fn subscribe<T, F>(db: &Database, tables: &'static [Table], query: F) -> Subscription<T>
where
    T: Send + 'static,
    F: Fn(&Connection) -> RepositoryResult<T> + Send + Sync + 'static,
{
    let mut changes = db.subscribe_changes();
    let db = db.clone();
    let query = Arc::new(query);
    let (sender, receiver) = mpsc::unbounded_channel();

    let runtime = match Handle::try_current() {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!(?tables, "live query started outside a tokio runtime");
            let _ = sender.send(Err(DatabaseError::Worker(err.to_string()).into()));
            return Subscription { receiver, task: None };
        }
    };

    let task = runtime.spawn(async move {
        debug!(?tables, "subscription started");
        loop {
            let run = Arc::clone(&query);
            let result = db.read(move |conn| (*run)(conn)).await;
            if sender.send(result).is_err() {
                break;
            }
            if !wait_for_change(&mut changes, tables, &sender).await {
                break;
            }
        }
        debug!(?tables, "subscription ended");
    });

    Subscription {
        receiver,
        task: Some(task),
    }
}

/// Returns `false` when the subscriber is gone or the engine stopped publishing
async fn wait_for_change<T>(
    changes: &mut broadcast::Receiver<Change>,
    tables: &[Table],
    sender: &mpsc::UnboundedSender<T>,
) -> bool {
    loop {
        tokio::select! {
            _ = sender.closed() => return false,
            change = changes.recv() => match change {
                Ok(change) if change.touches(tables) => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Missed notifications may have been relevant
                    warn!(skipped, "subscription lagged behind commits, re-running query");
                    return true;
                }
                Err(RecvError::Closed) => return false,
            },
        }
    }
}
