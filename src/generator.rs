//! The resumable-generator protocol driven by the coroutine interpreter.
//!
//! A [`Generator`] is an explicit state machine standing in for a generator
//! function body. Each call to [`resume`](Generator::resume) hands it the
//! outcome of the last thing it yielded, and it answers with the next
//! [`Step`]: another value to wait on, or its final result.
//!
//! Coroutines resume with `Result`s: `Ok(value)` when the yielded reader
//! resolved, `Err(error)` when it failed. A body that wants to recover
//! matches on the `Err`; one that doesn't completes with it.
//!
//! # Examples
//!
//! ```rust
//! use lector::prelude::*;
//!
//! // Doubles every input until it sees zero.
//! let mut doubler = from_fn(|x: i32| {
//!     if x == 0 { Step::Complete("stopped") } else { Step::Yielded(x * 2) }
//! });
//! assert_eq!(doubler.resume(5).unwrap_yielded(), 10);
//! assert_eq!(doubler.resume(0).unwrap_complete(), "stopped");
//! ```

use crate::step::Step;

/// A suspended computation that takes inputs of type `I` and yields values of type `O`.
pub trait Generator<I, O> {
    /// Type of the final result when the generator completes
    type Return;

    /// Re-enter the generator at its suspension point with `input`.
    fn resume(&mut self, input: I) -> Step<O, Self::Return>;

    /// Erase the concrete type, e.g. to return different bodies from one branch.
    fn boxed(self) -> Box<dyn Generator<I, O, Return = Self::Return> + Send>
    where
        Self: Sized + Send + 'static,
    {
        Box::new(self)
    }
}

impl<I, O, L, R> Generator<I, O> for either::Either<L, R>
where
    L: Generator<I, O>,
    R: Generator<I, O, Return = L::Return>,
{
    type Return = L::Return;
    fn resume(&mut self, input: I) -> Step<O, Self::Return> {
        match self {
            either::Either::Left(l) => l.resume(input),
            either::Either::Right(r) => r.resume(input),
        }
    }
}

impl<I, O, D> Generator<I, O> for Box<dyn Generator<I, O, Return = D> + Send> {
    type Return = D;

    fn resume(&mut self, input: I) -> Step<O, Self::Return> {
        (**self).resume(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::from_fn;
    use either::Either;

    fn countdown(mut n: u32) -> impl Generator<u32, u32, Return = u32> {
        from_fn(move |input: u32| -> Step<u32, u32> {
            if n == 0 {
                Step::Complete(input)
            } else {
                n -= 1;
                Step::Yielded(n)
            }
        })
    }

    #[test]
    fn test_either_resumes_the_active_side() {
        let mut left: Either<_, Box<dyn Generator<u32, u32, Return = u32> + Send>> =
            Either::Left(countdown(1));
        assert_eq!(left.resume(7).unwrap_yielded(), 0);
        assert_eq!(left.resume(9).unwrap_complete(), 9);

        let mut right: Either<Box<dyn Generator<u32, u32, Return = u32> + Send>, _> =
            Either::Right(from_fn(|x: u32| -> Step<u32, u32> { Step::Complete(x * 10) }));
        assert_eq!(right.resume(3).unwrap_complete(), 30);
    }

    #[test]
    fn test_boxed_generator_keeps_state() {
        let mut boxed = countdown(2).boxed();
        assert_eq!(boxed.resume(0).unwrap_yielded(), 1);
        assert_eq!(boxed.resume(0).unwrap_yielded(), 0);
        assert_eq!(boxed.resume(5).unwrap_complete(), 5);
    }
}
