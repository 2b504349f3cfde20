//! Building generator bodies from closures
//!
//! Coroutine bodies are state machines; these helpers turn a closure (plus an
//! optional first yielded value) into a [`Generator`](crate::Generator) or an
//! [`InitGenerator`](crate::InitGenerator).

mod func;
mod init;

pub use func::{FromFn, from_fn};
pub use init::{done, init, init_from_fn};
