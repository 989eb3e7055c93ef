use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Run `f` over `items` with at most `concurrency` calls in flight.
///
/// A fixed pool of `min(concurrency, items.len())` workers claims the next
/// unclaimed index until none remain, so each item runs exactly once. The
/// output is in input order regardless of completion order.
pub async fn map_with_concurrency_limit<'a, T, R, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    f: F,
) -> Vec<R>
where
    F: Fn(usize, &'a T) -> Fut,
    Fut: Future<Output = R>,
{
    if items.is_empty() {
        return Vec::new();
    }
    let workers = concurrency.clamp(1, items.len());
    let next = &AtomicUsize::new(0);
    let f = &f;

    let pool = (0..workers).map(|_| async move {
        let mut finished = Vec::new();
        loop {
            let i = next.fetch_add(1, Ordering::Relaxed);
            let Some(item) = items.get(i) else {
                break;
            };
            finished.push((i, f(i, item).await));
        }
        finished
    });

    let mut out: Vec<(usize, R)> = futures::future::join_all(pool)
        .await
        .into_iter()
        .flatten()
        .collect();
    out.sort_by_key(|(i, _)| *i);
    out.into_iter().map(|(_, r)| r).collect()
}
