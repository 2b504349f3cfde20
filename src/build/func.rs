use crate::{Generator, Step};

/// A generator whose every resumption is handled by one closure.
///
/// Created by [`from_fn`]. The closure owns whatever state the body needs
/// between suspension points.
pub struct FromFn<F>(F);

impl<I, O, D, F> Generator<I, O> for FromFn<F>
where
    F: FnMut(I) -> Step<O, D>,
{
    type Return = D;
    fn resume(&mut self, input: I) -> Step<O, Self::Return> {
        (self.0)(input)
    }
}

/// Create a generator from a closure.
///
/// ```rust
/// use lector::prelude::*;
///
/// let mut seen = 0;
/// let mut sum = from_fn(move |x: i32| {
///     seen += x;
///     if seen < 10 { Step::Yielded(seen) } else { Step::Complete(seen) }
/// });
/// assert_eq!(sum.resume(4).unwrap_yielded(), 4);
/// assert_eq!(sum.resume(7).unwrap_complete(), 11);
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F> {
    FromFn(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_keeps_state_between_resumptions() {
        let mut calls = Vec::new();
        let mut stage = from_fn(|x: u32| {
            calls.push(x);
            if calls.len() < 3 {
                Step::Yielded(x + 1)
            } else {
                Step::Complete(calls.len())
            }
        });

        assert_eq!(stage.resume(1).unwrap_yielded(), 2);
        assert_eq!(stage.resume(5).unwrap_yielded(), 6);
        assert_eq!(stage.resume(9).unwrap_complete(), 3);
    }
}
