use std::future::Future;
use std::hash::Hash;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use indexmap::IndexMap;

use crate::error::Result;
use crate::reader::ReaderFuture;

/// Drives a set of keyed reader evaluations concurrently.
///
/// Results land in `slots` by their position in `keys` as they complete, in
/// whatever order that happens. The first `Err` settles the whole set and
/// drops whatever is still pending. `settled` guards the terminal transition.
pub(crate) struct Props<K, T> {
    keys: Vec<K>,
    pending: FuturesUnordered<BoxFuture<'static, (usize, Result<T>)>>,
    slots: Vec<Option<T>>,
    settled: bool,
}

// `Vec<K>` and `Vec<Option<T>>` are only `Unpin` when `K` and `T` are; no
// field is ever pinned structurally.
impl<K, T> Unpin for Props<K, T> {}

impl<K, T> Props<K, T>
where
    T: Send + 'static,
{
    pub(crate) fn new<I>(started: I) -> Self
    where
        I: IntoIterator<Item = (K, ReaderFuture<T>)>,
    {
        let mut keys = Vec::new();
        let pending = FuturesUnordered::new();
        for (index, (key, evaluation)) in started.into_iter().enumerate() {
            keys.push(key);
            pending.push(evaluation.map(move |outcome| (index, outcome)).boxed());
        }
        let slots = keys.iter().map(|_| None).collect();
        tracing::trace!(entries = keys.len(), "props started");

        Props {
            keys,
            pending,
            slots,
            settled: false,
        }
    }

    fn collect(&mut self) -> IndexMap<K, T>
    where
        K: Hash + Eq,
    {
        let keys = mem::take(&mut self.keys);
        let slots = mem::take(&mut self.slots);
        keys.into_iter()
            .zip(slots)
            .filter_map(|(key, slot)| slot.map(|value| (key, value)))
            .collect()
    }
}

impl<K, T> Future for Props<K, T>
where
    K: Hash + Eq,
    T: Send + 'static,
{
    type Output = Result<IndexMap<K, T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        assert!(!this.settled, "`Props` polled after it settled");

        loop {
            match this.pending.poll_next_unpin(cx) {
                Poll::Ready(Some((index, Ok(value)))) => {
                    tracing::trace!(index, "props entry resolved");
                    this.slots[index] = Some(value);
                }
                Poll::Ready(Some((index, Err(error)))) => {
                    this.settled = true;
                    this.pending.clear();
                    tracing::debug!(index, %error, "props settled with the first failure");
                    return Poll::Ready(Err(error));
                }
                Poll::Ready(None) => {
                    this.settled = true;
                    return Poll::Ready(Ok(this.collect()));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::future;
    use std::marker::PhantomPinned;

    fn ready<T: Send + 'static>(outcome: Result<T>) -> ReaderFuture<T> {
        future::ready(outcome).boxed()
    }

    #[test]
    fn test_results_keep_input_order_whatever_the_completion_order() {
        let (tx, rx) = oneshot::channel::<&str>();
        let late: ReaderFuture<&str> = async move { rx.await.map_err(Error::new) }.boxed();
        let early: ReaderFuture<&str> = async move {
            let _ = tx.send("late");
            Ok("early")
        }
        .boxed();

        let resolved = block_on(Props::new([("late", late), ("early", early)])).unwrap();
        assert_eq!(resolved.keys().copied().collect::<Vec<_>>(), ["late", "early"]);
        assert_eq!(resolved["late"], "late");
    }

    #[test]
    fn test_empty_set_resolves_immediately() {
        let mut props = Props::<&str, u8>::new([]);
        let resolved = block_on(&mut props).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_first_failure_settles_and_drops_the_rest() {
        let (tx, rx) = oneshot::channel::<u8>();
        let waiting: ReaderFuture<u8> = async move { rx.await.map_err(Error::new) }.boxed();

        let mut props = Props::new([("waiting", waiting), ("failed", ready(Err(Error::msg("no"))))]);
        let err = block_on(&mut props).unwrap_err();

        assert_eq!(err.to_string(), "no");
        assert!(tx.is_canceled());
    }

    #[test]
    fn test_values_that_are_not_unpin_resolve() {
        let mut props = Props::new([("pinned", ready(Ok(PhantomPinned)))]);
        let resolved = block_on(&mut props).unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    #[should_panic(expected = "`Props` polled after it settled")]
    fn test_polling_after_settlement_panics() {
        let mut props = Props::new([("a", ready(Ok(1)))]);
        let _ = block_on(&mut props);
        let _ = block_on(&mut props);
    }
}
