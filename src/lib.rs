//! # Lector: composable readers over a shared context
//!
//! A [`Reader`] is a deferred computation that needs a context to produce a
//! value. Readers are built once, combined freely, and run any number of times
//! against different contexts; every nested reader sees the same context.
//!
//! ## Core Types
//!
//! - **[`Reader<C, T>`]**: A computation over a context `C` resolving to a `T`
//! - **[`Lift<C, T>`]**: Anything a continuation may hand back: a value, a reader, a future or a failure
//! - **[`Generator<I, O>`]** / **[`InitGenerator<I, O>`]**: Resumable bodies driven by [`coroutine()`]
//!
//! ## Example
//!
//! ```
//! use lector::prelude::*;
//! use std::collections::HashMap;
//!
//! type Settings = HashMap<String, HashMap<String, String>>;
//!
//! let language = ask::<Settings>().prop("config").prop("language");
//! let greeting = language.map(|lang| if lang == "es" { "hola" } else { "hello" });
//!
//! let config = HashMap::from([("language".to_string(), "es".to_string())]);
//! let context = HashMap::from([("config".to_string(), config)]);
//! assert_eq!(greeting.run_blocking(context).unwrap(), "hola");
//! ```
//!
//! ## Common Functions
//!
//! **Building Readers:**
//! - [`ask()`] - Resolve to the context itself
//! - [`asks(f)`](asks) - Resolve to a projection of the context
//! - [`Reader::of(x)`](Reader::of) - Resolve to `x`, whatever the context
//! - [`Reader::props(entries)`](Reader::props) - Resolve many entries concurrently
//!
//! **Sequencing:**
//! - [`Reader::chain`] / [`Reader::then`] - Continue with whatever `f` returns
//! - [`Reader::prop`] - Read a field of the resolved value
//! - [`coroutine(f)`](coroutine()) - Drive a generator body that yields readers
//!
//! **Execution:**
//! - [`Reader::run`] - Start against a context, returning a future
//! - [`Reader::run_blocking`] - Run on the current thread
//!
//! ## Features
//!
//! - `json` (default): `serde_json::Value` as a [`Record`], and the
//!   [`connect`] selectors built on it.

pub mod build;
mod concurrent;
#[cfg(feature = "json")]
pub mod connect;
mod coroutine;
mod error;
mod generator;
mod init;
pub mod prelude;
mod reader;
mod record;
mod step;
pub mod store;

pub use coroutine::*;
pub use error::{Error, Result};
pub use generator::*;
pub use init::*;
pub use reader::*;
pub use record::*;
pub use step::*;
