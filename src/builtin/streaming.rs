use futures::future;
use futures::{Stream, StreamExt};

/// Turn a stream of cumulative text snapshots into incremental chunks
///
/// On-device sessions report the whole answer so far on every update. Each
/// snapshot is diffed against the previous one and only the new suffix is
/// yielded; empty deltas are skipped. A snapshot that does not extend the
/// previous one is passed through whole. Errors are forwarded unchanged.
pub fn incremental_chunks<S, E>(snapshots: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<String, E>>,
{
    snapshots
        .scan(String::new(), |previous, item| {
            let chunk = match item {
                Ok(current) => {
                    let delta = match current.strip_prefix(previous.as_str()) {
                        Some(rest) => rest.to_string(),
                        None => current.clone(),
                    };
                    *previous = current;
                    (!delta.is_empty()).then_some(Ok(delta))
                }
                Err(e) => Some(Err(e)),
            };
            future::ready(Some(chunk))
        })
        .filter_map(future::ready)
}
