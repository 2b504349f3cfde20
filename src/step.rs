/// One step of a generator: either it suspended on a yielded value, or it finished.
///
/// A coroutine body yields sub-computations (`Yielded`) and eventually returns a
/// final value (`Complete`). The interpreter in [`coroutine`](crate::coroutine())
/// matches on this to decide whether to resume or to settle.
///
/// # Examples
///
/// ```rust
/// use lector::Step;
///
/// let suspended: Step<i32, String> = Step::Yielded(42);
/// let finished: Step<i32, String> = Step::Complete("finished".to_string());
///
/// assert_eq!(suspended.unwrap_yielded(), 42);
/// assert_eq!(finished.unwrap_complete(), "finished");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step<Y, D> {
    /// Suspended on an intermediate value; the generator expects to be resumed.
    Yielded(Y),
    /// Finished with a final value.
    Complete(D),
}

impl<Y, D> Step<Y, D> {
    /// Returns the yielded value.
    ///
    /// # Panics
    ///
    /// Panics if the step is `Complete`.
    #[inline]
    pub fn unwrap_yielded(self) -> Y {
        match self {
            Step::Yielded(y) => y,
            Step::Complete(_) => panic!("called `Step::unwrap_yielded()` on a `Complete` value"),
        }
    }

    /// Returns the final value.
    ///
    /// # Panics
    ///
    /// Panics if the step is `Yielded`.
    #[inline]
    pub fn unwrap_complete(self) -> D {
        match self {
            Step::Yielded(_) => panic!("called `Step::unwrap_complete()` on a `Yielded` value"),
            Step::Complete(d) => d,
        }
    }
}
