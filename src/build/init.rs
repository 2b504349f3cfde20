use super::func::{FromFn, from_fn};
use crate::{Generator, Step};

/// Pair a first yielded value with the generator that handles its outcome.
///
/// Equivalent to writing the tuple `(output, continuation)`, which is itself an
/// [`InitGenerator`](crate::InitGenerator).
pub fn init<I, O, G>(output: O, continuation: G) -> (O, G)
where
    G: Generator<I, O>,
{
    (output, continuation)
}

/// Yield `initial` first, then hand every resumption to `f`.
///
/// ```rust
/// use lector::prelude::*;
///
/// let mut counter = 0;
/// let (initial, mut stage) = init_from_fn(42, move |x: i32| {
///     counter += 1;
///     if counter < 3 { Step::Yielded(x * counter) } else { Step::Complete(x + counter) }
/// });
/// assert_eq!(initial, 42);
/// assert_eq!(stage.resume(10).unwrap_yielded(), 10);
/// assert_eq!(stage.resume(10).unwrap_yielded(), 20);
/// assert_eq!(stage.resume(10).unwrap_complete(), 13);
/// ```
pub fn init_from_fn<I, O, D, F>(initial: O, f: F) -> (O, FromFn<F>)
where
    F: FnMut(I) -> Step<O, D>,
{
    (initial, from_fn(f))
}

/// A body that finishes with `value` before yielding anything.
#[allow(clippy::type_complexity)]
pub fn done<I, O, D>(value: D) -> Step<(O, FromFn<fn(I) -> Step<O, D>>), D> {
    Step::Complete(value)
}
