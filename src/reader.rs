//! The [`Reader`] type: a deferred computation over a shared context.
//!
//! A reader wraps a single evaluation function. Nothing happens until the
//! reader is [`run`](Reader::run) with a context; the context is then placed
//! behind one `Arc` and handed, unchanged, to every nested reader the
//! evaluation reaches. Results flow back through the composition chain.
//!
//! ```rust
//! use lector::prelude::*;
//! use std::collections::HashMap;
//!
//! let port = ask::<HashMap<String, u16>>().prop("port");
//! let next_port = port.map(|p| p + 1);
//!
//! let config = HashMap::from([("port".to_string(), 8080)]);
//! assert_eq!(next_port.run_blocking(config).unwrap(), 8081);
//! ```

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;

use crate::concurrent::Props;
use crate::error::{Error, Result};
use crate::record::Record;

/// The deferred outcome of running a reader.
pub type ReaderFuture<T> = BoxFuture<'static, Result<T>>;

type Eval<C, T> = dyn Fn(Arc<C>) -> ReaderFuture<T> + Send + Sync;

/// A computation that needs a context `C` to produce a `T`.
///
/// Readers are immutable and cheap to clone; running one never changes it,
/// so the same reader can be run any number of times against different
/// contexts.
pub struct Reader<C, T> {
    eval: Arc<Eval<C, T>>,
}

impl<C, T> Clone for Reader<C, T> {
    fn clone(&self) -> Self {
        Reader {
            eval: Arc::clone(&self.eval),
        }
    }
}

impl<C, T> fmt::Debug for Reader<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").finish_non_exhaustive()
    }
}

/// Anything a continuation may hand back to be run against the context.
///
/// Lifting is a total match over these cases: a plain value resolves to
/// itself, a reader is run as is, a deferred value is awaited and a failure
/// fails.
pub enum Lift<C, T> {
    Value(T),
    Reader(Reader<C, T>),
    Deferred(ReaderFuture<T>),
    Failed(Error),
}

impl<C, T> Lift<C, T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Lift a future, e.g. an `async` block, into the deferred case.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Lift::Deferred(future.boxed())
    }

    pub(crate) fn resolve(self, context: Arc<C>) -> ReaderFuture<T> {
        match self {
            Lift::Value(value) => future::ready(Ok(value)).boxed(),
            Lift::Reader(reader) => reader.run_shared(context),
            Lift::Deferred(deferred) => deferred,
            Lift::Failed(error) => future::ready(Err(error)).boxed(),
        }
    }

    /// Build a lift from user code, turning a panic into a failure.
    pub(crate) fn catching<F>(f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        panic::catch_unwind(AssertUnwindSafe(f))
            .unwrap_or_else(|payload| Lift::Failed(Error::from_panic(payload)))
    }
}

impl<C, T> From<Reader<C, T>> for Lift<C, T> {
    fn from(reader: Reader<C, T>) -> Self {
        Lift::Reader(reader)
    }
}

impl<C, T> From<Result<T>> for Lift<C, T> {
    fn from(outcome: Result<T>) -> Self {
        match outcome {
            Ok(value) => Lift::Value(value),
            Err(error) => Lift::Failed(error),
        }
    }
}

impl<C, T> From<Error> for Lift<C, T> {
    fn from(error: Error) -> Self {
        Lift::Failed(error)
    }
}

impl<C, T: fmt::Debug> fmt::Debug for Lift<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lift::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Lift::Reader(reader) => f.debug_tuple("Reader").field(reader).finish(),
            Lift::Deferred(_) => f.write_str("Deferred(..)"),
            Lift::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
        }
    }
}

fn guarded<C, T, E>(eval: &E, context: Arc<C>) -> ReaderFuture<T>
where
    T: Send + 'static,
    E: Fn(Arc<C>) -> ReaderFuture<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| eval(context))) {
        Ok(evaluation) => AssertUnwindSafe(evaluation)
            .catch_unwind()
            .map(|outcome| outcome.unwrap_or_else(|payload| Err(Error::from_panic(payload))))
            .boxed(),
        Err(payload) => future::ready(Err(Error::from_panic(payload))).boxed(),
    }
}

impl<C, T> Reader<C, T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Every constructor funnels through here so that no evaluation can
    /// unwind out of `run`.
    pub(crate) fn from_eval<E>(eval: E) -> Self
    where
        E: Fn(Arc<C>) -> ReaderFuture<T> + Send + Sync + 'static,
    {
        Reader {
            eval: Arc::new(move |context: Arc<C>| guarded(&eval, context)),
        }
    }

    /// Create a reader from a synchronous evaluation function.
    ///
    /// ```rust
    /// use lector::prelude::*;
    ///
    /// let double = Reader::new(|n: &i32| Ok(n * 2));
    /// assert_eq!(double.run_blocking(21).unwrap(), 42);
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&C) -> Result<T> + Send + Sync + 'static,
    {
        Reader::from_eval(move |context: Arc<C>| future::ready(f(&context)).boxed())
    }

    /// Create a reader whose evaluation produces a future.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Reader::from_eval(move |context| f(context).boxed())
    }

    /// A reader that resolves to `value`, whatever the context.
    pub fn of(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Reader::from_eval(move |_| future::ready(Ok(value.clone())).boxed())
    }

    /// Turn any [`Lift`] into a reader.
    ///
    /// A `Lift::Reader` comes back unchanged. A deferred value is shared, so the
    /// resulting reader can still be run more than once.
    pub fn lift(lift: Lift<C, T>) -> Self
    where
        T: Clone + Sync,
    {
        match lift {
            Lift::Reader(reader) => reader,
            Lift::Value(value) => Reader::of(value),
            Lift::Deferred(deferred) => {
                let shared = deferred.shared();
                Reader::from_eval(move |_| shared.clone().boxed())
            }
            Lift::Failed(error) => Reader::from_eval(move |_| future::ready(Err(error.clone())).boxed()),
        }
    }

    /// Run the reader against `context`.
    ///
    /// This never fails or panics on the spot: every failure of the
    /// evaluation, including a panic, is the `Err` output of the future.
    pub fn run(&self, context: C) -> ReaderFuture<T> {
        tracing::trace!("running reader");
        self.run_shared(Arc::new(context))
    }

    /// Run the reader against a context that is already shared.
    pub fn run_shared(&self, context: Arc<C>) -> ReaderFuture<T> {
        (self.eval)(context)
    }

    /// Run the reader and wait for its outcome on the current thread.
    pub fn run_blocking(&self, context: C) -> Result<T> {
        futures::executor::block_on(self.run(context))
    }

    /// Returns `true` when both readers share one evaluation function.
    pub fn ptr_eq(&self, other: &Reader<C, T>) -> bool {
        Arc::ptr_eq(&self.eval, &other.eval)
    }

    /// Sequence a continuation after this reader.
    ///
    /// `f` receives the resolved value and returns a reader, a [`Lift`], or a
    /// `Result`; that is then run against the same context. A failure at any
    /// point becomes the failure of the whole chain, unwrapped.
    ///
    /// ```rust
    /// use lector::prelude::*;
    ///
    /// let square = ask::<i64>().chain(|n| Reader::of(n * n));
    /// assert_eq!(square.run_blocking(10).unwrap(), 100);
    /// ```
    pub fn chain<U, L, F>(&self, f: F) -> Reader<C, U>
    where
        U: Send + 'static,
        L: Into<Lift<C, U>>,
        F: Fn(T) -> L + Send + Sync + 'static,
    {
        let current = self.clone();
        let f = Arc::new(f);
        Reader::from_eval(move |context: Arc<C>| {
            let evaluation = current.run_shared(Arc::clone(&context));
            let f = Arc::clone(&f);
            async move {
                let value = evaluation.await?;
                let next = f(value).into();
                next.resolve(context).await
            }
            .boxed()
        })
    }

    /// Alias of [`chain`](Reader::chain).
    pub fn then<U, L, F>(&self, f: F) -> Reader<C, U>
    where
        U: Send + 'static,
        L: Into<Lift<C, U>>,
        F: Fn(T) -> L + Send + Sync + 'static,
    {
        self.chain(f)
    }

    /// Transform the resolved value.
    pub fn map<U, F>(&self, f: F) -> Reader<C, U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.chain(move |value| Lift::Value(f(value)))
    }

    /// Transform the resolved value with a function that may fail.
    pub fn try_map<U, F>(&self, f: F) -> Reader<C, U>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        self.chain(move |value| Lift::from(f(value)))
    }

    /// Project the field `name` out of the resolved value.
    ///
    /// Fails with [`Error::FieldAccess`] when the value has no such field.
    pub fn prop(&self, name: impl Into<String>) -> Reader<C, T::Field>
    where
        T: Record,
        T::Field: Send + 'static,
    {
        let name: Arc<str> = name.into().into();
        self.try_map(move |value| value.field(&name))
    }

    /// Resolve a mapping of values and readers into a mapping of values.
    ///
    /// Every entry is started against the same context without waiting for
    /// the others. The reader resolves once all of them have, to a new map in
    /// input order; it fails with the first failure to arrive and ignores
    /// everything after it. If a key repeats, its last entry wins.
    ///
    /// ```rust
    /// use lector::prelude::*;
    ///
    /// let both = Reader::props([("a", Lift::Value(1)), ("b", Reader::of(2).into())]);
    /// let resolved = both.run_blocking(()).unwrap();
    /// assert_eq!(resolved["a"], 1);
    /// assert_eq!(resolved["b"], 2);
    /// ```
    pub fn props<K, L, I>(entries: I) -> Reader<C, IndexMap<K, T>>
    where
        I: IntoIterator<Item = (K, L)>,
        L: Into<Lift<C, T>>,
        K: Hash + Eq + Clone + Send + Sync + 'static,
        T: Clone + Sync,
    {
        let entries: IndexMap<K, Reader<C, T>> = entries
            .into_iter()
            .map(|(key, value)| (key, Reader::lift(value.into())))
            .collect();
        Reader::from_eval(move |context: Arc<C>| {
            let started = entries
                .iter()
                .map(|(key, reader)| (key.clone(), reader.run_shared(Arc::clone(&context))));
            Props::new(started).boxed()
        })
    }
}

/// A reader that resolves to the context itself.
pub fn ask<C>() -> Reader<C, C>
where
    C: Clone + Send + Sync + 'static,
{
    Reader::new(|context: &C| Ok(context.clone()))
}

/// A reader that resolves to the shared context, without cloning it.
pub fn ask_shared<C>() -> Reader<C, Arc<C>>
where
    C: Send + Sync + 'static,
{
    Reader::from_eval(|context| future::ready(Ok(context)).boxed())
}

/// A reader that resolves to `f` applied to the context.
pub fn asks<C, T, F>(f: F) -> Reader<C, T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(&C) -> T + Send + Sync + 'static,
{
    Reader::new(move |context| Ok(f(context)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn failing<C, T>(error: Error) -> Reader<C, T>
    where
        C: Send + Sync + 'static,
        T: Send + 'static,
    {
        Reader::new(move |_| Err(error.clone()))
    }

    #[test]
    fn test_ask_resolves_to_the_context() {
        let context = HashMap::from([("x".to_string(), 10)]);
        assert_eq!(ask().run_blocking(context.clone()).unwrap(), context);
    }

    #[test]
    fn test_ask_shared_hands_out_the_same_allocation() {
        let context = Arc::new(5_u8);
        let resolved = block_on(ask_shared().run_shared(Arc::clone(&context))).unwrap();
        assert!(Arc::ptr_eq(&resolved, &context));
    }

    #[test]
    fn test_asks_projects_the_context() {
        let len = asks(|s: &String| s.len());
        assert_eq!(len.run_blocking("lector".to_string()).unwrap(), 6);
    }

    #[test]
    fn test_of_ignores_the_context() {
        let r = Reader::<i32, &str>::of("lisp");
        assert_eq!(r.run_blocking(1).unwrap(), "lisp");
        assert_eq!(r.run_blocking(2).unwrap(), "lisp");
    }

    #[test]
    fn test_lift_is_idempotent_on_readers() {
        let r = ask::<i32>();
        let lifted = Reader::lift(Lift::from(r.clone()));
        assert!(lifted.ptr_eq(&r));
        assert!(!Reader::lift(Lift::Value(1)).ptr_eq(&r));
    }

    #[test]
    fn test_lift_shares_deferred_values_between_runs() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        let r: Reader<(), i32> = Reader::lift(Lift::deferred(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        }));

        assert_eq!(r.run_blocking(()).unwrap(), 7);
        assert_eq!(r.run_blocking(()).unwrap(), 7);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lift_of_failure_always_fails() {
        let err = Error::msg("foo");
        let r: Reader<(), i32> = Reader::lift(Lift::from(err.clone()));
        assert!(r.run_blocking(()).unwrap_err().ptr_eq(&err));
        assert!(r.run_blocking(()).unwrap_err().ptr_eq(&err));
    }

    #[test]
    fn test_chain_runs_the_continuation_against_the_same_context() {
        let r = ask::<i32>().chain(|c| ask::<i32>().map(move |again| c + again));
        assert_eq!(r.run_blocking(21).unwrap(), 42);
    }

    #[test]
    fn test_chain_accepts_results_and_deferred_values() {
        let from_result = ask::<i32>().chain(|c| Ok::<_, Error>(c * 2));
        assert_eq!(from_result.run_blocking(4).unwrap(), 8);

        let from_future = ask::<i32>().chain(|c| Lift::deferred(async move { Ok(c * c) }));
        assert_eq!(from_future.run_blocking(10).unwrap(), 100);
    }

    #[test]
    fn test_then_composes_like_chain() {
        let x = ask::<HashMap<String, HashMap<String, i32>>>().then(|c| {
            c.get("x")
                .cloned()
                .ok_or_else(|| Error::msg("missing x"))
        });
        let y = x.then(|x| x.get("y").copied().ok_or_else(|| Error::msg("missing y")));

        let context = HashMap::from([("x".to_string(), HashMap::from([("y".to_string(), 2)]))]);
        assert_eq!(y.run_blocking(context).unwrap(), 2);
    }

    #[test]
    fn test_errors_in_continuations_fail_the_run() {
        let err = Error::msg("foo");
        let raised = err.clone();
        let r = ask::<()>().chain(move |_| Lift::<(), ()>::Failed(raised.clone()));
        assert!(r.run_blocking(()).unwrap_err().ptr_eq(&err));
    }

    #[test]
    fn test_nested_failures_surface_unwrapped() {
        let err = Error::msg("foo");
        let f1 = {
            let err = err.clone();
            move || {
                let err = err.clone();
                ask::<()>().chain(move |_| Lift::<(), ()>::deferred(future::ready(Err(err.clone()))))
            }
        };
        let f2 = move || {
            let f1 = f1.clone();
            ask::<()>().chain(move |_| f1())
        };
        let f3 = ask::<()>().chain(move |_| f2());

        assert!(f3.run_blocking(()).unwrap_err().ptr_eq(&err));
    }

    #[test]
    fn test_failure_skips_the_continuation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let r = failing::<(), i32>(Error::msg("first")).map(move |v| {
            seen.fetch_add(1, Ordering::SeqCst);
            v
        });

        assert_eq!(r.run_blocking(()).unwrap_err().to_string(), "first");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_run_never_panics() {
        let r: Reader<(), i32> = Reader::new(|_| panic!("boom"));
        let pending = r.run(());
        assert!(matches!(block_on(pending), Err(Error::Panicked(ref m)) if m == "boom"));

        let later = ask::<()>().map(|_| -> i32 { panic!("later") });
        assert!(matches!(later.run_blocking(()), Err(Error::Panicked(_))));
    }

    #[test]
    fn test_readers_are_reusable_across_contexts() {
        let r = ask::<i32>().map(|n| n + 1);
        assert_eq!(r.run_blocking(1).unwrap(), 2);
        assert_eq!(r.run_blocking(41).unwrap(), 42);
    }

    #[test]
    fn test_prop_reads_nested_fields() {
        let r = ask::<HashMap<String, HashMap<String, i32>>>().prop("x").prop("y");
        let context = HashMap::from([("x".to_string(), HashMap::from([("y".to_string(), 42)]))]);
        assert_eq!(r.run_blocking(context).unwrap(), 42);
    }

    #[test]
    fn test_prop_on_a_missing_field_fails() {
        let r = ask::<HashMap<String, i32>>().prop("nope");
        assert!(matches!(
            r.run_blocking(HashMap::new()),
            Err(Error::FieldAccess { ref field, .. }) if field == "nope"
        ));
    }

    #[test]
    fn test_props_resolves_values_and_readers() {
        let r = Reader::props([("a", Lift::Value(1)), ("b", Reader::of(2).into())]);
        let resolved = r.run_blocking(()).unwrap();
        assert_eq!(resolved, IndexMap::from([("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_props_share_the_context() {
        let r = Reader::props([("double", ask::<i32>().map(|n| n * 2)), ("same", ask::<i32>())]);
        let resolved = r.run_blocking(5).unwrap();
        assert_eq!(resolved["double"], 10);
        assert_eq!(resolved["same"], 5);
    }

    #[test]
    fn test_props_of_nothing_is_empty() {
        let r = Reader::<(), i32>::props(Vec::<(String, Lift<(), i32>)>::new());
        assert!(r.run_blocking(()).unwrap().is_empty());
    }

    #[test]
    fn test_props_last_duplicate_wins() {
        let r = Reader::<(), i32>::props([("k", Lift::Value(1)), ("k", Lift::Value(2))]);
        assert_eq!(r.run_blocking(()).unwrap(), IndexMap::from([("k", 2)]));
    }

    #[test]
    fn test_props_start_entries_without_waiting() {
        // `first` can only finish after `second` has started.
        let (tx, rx) = oneshot::channel::<i32>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        let tx = Arc::new(Mutex::new(Some(tx)));

        let first: Reader<(), i32> = Reader::from_async(move |_| {
            let rx = rx.lock().unwrap().take();
            async move {
                match rx {
                    Some(rx) => rx.await.map_err(Error::new),
                    None => Err(Error::msg("already run")),
                }
            }
        });
        let second: Reader<(), i32> = Reader::new(move |_| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(1);
            }
            Ok(2)
        });

        let resolved = Reader::props([("first", first), ("second", second)])
            .run_blocking(())
            .unwrap();
        assert_eq!(resolved, IndexMap::from([("first", 1), ("second", 2)]));
    }

    #[test]
    fn test_props_fail_with_the_first_failure_while_others_wait() {
        let err = Error::msg("foo");
        let stalled: Reader<(), i32> = Reader::from_async(|_| future::pending());
        let r = Reader::props([("stalled", stalled), ("failed", failing(err.clone()))]);
        assert!(r.run_blocking(()).unwrap_err().ptr_eq(&err));
    }

    #[test]
    fn test_props_settle_once_when_several_fail() {
        let x = Error::msg("x");
        let y = Error::msg("y");
        let r = Reader::<(), i32>::props([("x", failing(x.clone())), ("y", failing(y.clone()))]);

        let err = r.run_blocking(()).unwrap_err();
        assert!(err.ptr_eq(&x) || err.ptr_eq(&y));
    }
}
