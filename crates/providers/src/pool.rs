//! Bounded concurrent fan-out.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

/// Run `f` over every item with at most `limit` futures past the semaphore
/// at once. Results come back in input order; a slow or failing item never
/// cancels its siblings.
pub async fn fan_out<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let tasks = items.into_iter().map(|item| {
        let semaphore = semaphore.clone();
        let work = f(item);
        async move {
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = semaphore.acquire().await.ok();
            work.await
        }
    });
    join_all(tasks).await
}
