//! Driving generator bodies as readers.
//!
//! A coroutine body yields readers (or anything else that lifts into one) and
//! gets back what they resolved to. The interpreter here runs each yielded
//! value against the ambient context, resumes the body with `Ok(value)` or
//! `Err(error)`, and finally runs whatever the body returns. The whole
//! interaction is a single [`Reader`].
//!
//! Only one yielded value is in flight at a time. An `Err` the body does not
//! handle is returned as its final outcome and fails the reader.
//!
//! ```rust
//! use lector::prelude::*;
//!
//! type Next = Step<Lift<i64, i64>, lector::Result<Lift<i64, i64>>>;
//!
//! let square = coroutine(|()| {
//!     init_from_fn(Lift::from(ask::<i64>()), |ctx: lector::Result<i64>| -> Next {
//!         Step::Complete(ctx.map(|n| Lift::Value(n * n)))
//!     })
//! });
//!
//! assert_eq!(square(()).run_blocking(10).unwrap(), 100);
//! ```

use std::sync::Arc;

use tracing::{debug, trace};

use crate::build::{FromFn, done};
use crate::error::{Error, Result};
use crate::reader::{Lift, Reader};
use crate::{Generator, InitGenerator, Step};

/// A body that returns before its first `yield`, as built by [`returning`] and
/// [`raising`].
#[allow(clippy::type_complexity)]
pub type Finished<C, Y, T> = Step<
    (Lift<C, Y>, FromFn<fn(Result<Y>) -> Step<Lift<C, Y>, Result<Lift<C, T>>>>),
    Result<Lift<C, T>>,
>;

/// A coroutine body that immediately returns `value`.
pub fn returning<C, Y, T>(value: Lift<C, T>) -> Finished<C, Y, T> {
    done(Ok(value))
}

/// A coroutine body that immediately fails with `error`.
pub fn raising<C, Y, T>(error: Error) -> Finished<C, Y, T> {
    done(Err(error))
}

/// Turn a generator function into a function returning readers.
///
/// Every call of the returned function captures its arguments in a new
/// reader. Every run of that reader starts a fresh body from a clone of
/// those arguments, so coroutine readers are as reusable as any other.
///
/// Every value a body yields resolves to the same type `Y`. A body that waits
/// on readers with different result types needs a sum type as `Y`, or
/// `serde_json::Value` when the readers already produce JSON.
pub fn coroutine<A, C, Y, T, G, F>(f: F) -> impl Fn(A) -> Reader<C, T>
where
    A: Clone + Send + Sync + 'static,
    C: Send + Sync + 'static,
    Y: Send + 'static,
    T: Send + 'static,
    G: InitGenerator<Result<Y>, Lift<C, Y>> + Send + 'static,
    G::Next: Generator<Result<Y>, Lift<C, Y>, Return = Result<Lift<C, T>>> + Send + 'static,
    F: Fn(A) -> G + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |args: A| {
        let f = Arc::clone(&f);
        Reader::from_coroutine(move || f(args.clone()))
    }
}

impl<C, T> Reader<C, T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    /// A reader that runs the body produced by `f` to completion.
    pub fn from_coroutine<Y, G, F>(f: F) -> Self
    where
        Y: Send + 'static,
        G: InitGenerator<Result<Y>, Lift<C, Y>> + Send + 'static,
        G::Next: Generator<Result<Y>, Lift<C, Y>, Return = Result<Lift<C, T>>> + Send + 'static,
        F: Fn() -> G + Send + Sync + 'static,
    {
        Reader::from_async(move |context| drive(f(), context))
    }
}

async fn drive<C, Y, T, G>(body: G, context: Arc<C>) -> Result<T>
where
    C: Send + Sync + 'static,
    Y: Send + 'static,
    T: Send + 'static,
    G: InitGenerator<Result<Y>, Lift<C, Y>>,
    G::Next: Generator<Result<Y>, Lift<C, Y>, Return = Result<Lift<C, T>>>,
{
    trace!(state = "created", "coroutine body built");
    let (mut yielded, mut body) = match body.init() {
        Step::Yielded(first) => first,
        Step::Complete(outcome) => return settle(outcome, context).await,
    };

    loop {
        trace!(state = "suspended", "coroutine waiting on a yielded reader");
        let resolved = yielded.resolve(Arc::clone(&context)).await;
        if let Err(error) = &resolved {
            debug!(%error, "resuming coroutine with an error");
        }

        trace!(state = "running", "coroutine resumed");
        match body.resume(resolved) {
            Step::Yielded(next) => yielded = next,
            Step::Complete(outcome) => return settle(outcome, context).await,
        }
    }
}

async fn settle<C, T>(outcome: Result<Lift<C, T>>, context: Arc<C>) -> Result<T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    match outcome {
        Ok(returned) => {
            let settled = returned.resolve(context).await;
            let state = if settled.is_ok() { "completed" } else { "failed" };
            trace!(state, "coroutine settled");
            settled
        }
        Err(error) => {
            debug!(state = "failed", %error, "coroutine body failed");
            Err(error)
        }
    }
}
