//! Commonly used imports
//!
//! Use `use lector::prelude::*;` for quick access to the most common types and functions.

// Core types
pub use crate::{Error, Generator, InitGenerator, Lift, Reader, ReaderFuture, Record, Step};

// Readers
pub use crate::{ask, ask_shared, asks};

// Coroutines
pub use crate::{coroutine, raising, returning};

// Generator constructors
pub use crate::build::{done, from_fn, init, init_from_fn};
