use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::app::{Result, ShelfError};
use crate::resolver::{Resolution, Resolver, Strategy};
use crate::store::Store;

pub const DEFAULT_WORKERS: usize = 4;

/// Resolves several folders with at most `workers` in flight.
///
/// Results come back in input order; one failed folder never stops the rest.
pub async fn resolve_all<S: Store + Send + Sync + 'static>(
    resolver: Arc<Resolver<S>>,
    paths: Vec<PathBuf>,
    strategy: Strategy,
    workers: usize,
) -> Vec<(PathBuf, Result<Resolution>)> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut paths_in_order = Vec::new();
    let mut handles = Vec::new();

    for path in paths {
        let resolver = resolver.clone();
        let semaphore = semaphore.clone();
        let task_path = path.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");

            resolver.resolve(&task_path, strategy).await
        });

        paths_in_order.push(path);
        handles.push(handle);
    }

    let joined = join_all(handles).await;
    paths_in_order
        .into_iter()
        .zip(joined)
        .map(|(path, joined)| {
            let result = joined.unwrap_or_else(|e| {
                tracing::error!("Task join error for {}: {}", path.display(), e);
                Err(ShelfError::Task(e.to_string()))
            });
            (path, result)
        })
        .collect()
}
