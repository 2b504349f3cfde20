use crate::{Generator, Step};

/// A generator that has not started yet.
///
/// Starting a generator runs its body up to the first suspension point
/// without any input, the way the first `next()` of a generator function
/// does. It either yields a first value together with the suspended
/// generator, or finishes immediately.
///
/// ```rust
/// use lector::prelude::*;
///
/// let body = init_from_fn(42, |x: i32| -> Step<i32, i32> { Step::Complete(x + 1) });
/// let (first, mut rest) = body.init().unwrap_yielded();
/// assert_eq!(first, 42);
/// assert_eq!(rest.resume(1).unwrap_complete(), 2);
/// ```
pub trait InitGenerator<I, O> {
    type Next: Generator<I, O>;

    /// Run the body up to its first suspension point.
    #[allow(clippy::type_complexity)]
    fn init(self) -> Step<(O, Self::Next), <Self::Next as Generator<I, O>>::Return>;
}

impl<I, O, G> InitGenerator<I, O> for (O, G)
where
    G: Generator<I, O>,
{
    type Next = G;
    fn init(self) -> Step<(O, G), G::Return> {
        Step::Yielded(self)
    }
}

impl<I, O, G> InitGenerator<I, O> for Step<(O, G), G::Return>
where
    G: Generator<I, O>,
{
    type Next = G;
    fn init(self) -> Step<(O, G), G::Return> {
        self
    }
}

impl<I, O, L, R> InitGenerator<I, O> for either::Either<L, R>
where
    L: InitGenerator<I, O>,
    R: InitGenerator<I, O>,
    R::Next: Generator<I, O, Return = <L::Next as Generator<I, O>>::Return>,
{
    type Next = either::Either<L::Next, R::Next>;
    fn init(self) -> Step<(O, Self::Next), <Self::Next as Generator<I, O>>::Return> {
        match self {
            either::Either::Left(l) => match l.init() {
                Step::Yielded((o, next_l)) => Step::Yielded((o, either::Either::Left(next_l))),
                Step::Complete(done) => Step::Complete(done),
            },
            either::Either::Right(r) => match r.init() {
                Step::Yielded((o, next_r)) => Step::Yielded((o, either::Either::Right(next_r))),
                Step::Complete(done) => Step::Complete(done),
            },
        }
    }
}
