//! Error types shared by readers, coroutines and the store adapters.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Result type for reader evaluation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures produced while building or evaluating readers.
///
/// Evaluation failures never escape a reader's `run` as panics; they travel
/// through the future's output and propagate unchanged through every
/// `chain`, `props` and coroutine step. The first failure wins.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A callable argument was expected but something else was supplied.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `prop` was applied to a value that has no fields.
    #[error("cannot read field `{field}` of {target}")]
    FieldAccess { field: String, target: String },

    /// An error raised by user code during evaluation.
    #[error("{0}")]
    Evaluation(Arc<dyn std::error::Error + Send + Sync>),

    /// A panic captured while evaluating a reader.
    #[error("reader evaluation panicked: {0}")]
    Panicked(String),
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

impl Error {
    /// An evaluation error carrying only a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Error::Evaluation(Arc::new(Message(message.to_string())))
    }

    /// Wraps an arbitrary error raised by user code.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Evaluation(Arc::new(error))
    }

    pub(crate) fn field_access(field: &str, target: impl fmt::Display) -> Self {
        Error::FieldAccess {
            field: field.to_string(),
            target: target.to_string(),
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        tracing::debug!(%message, "captured panic during reader evaluation");
        Error::Panicked(message)
    }

    /// Returns `true` when both errors are the same evaluation failure.
    ///
    /// Clones of one `Error::Evaluation` share their payload, so this tells
    /// "failed with that exact error" apart from "failed with an equal message".
    pub fn ptr_eq(&self, other: &Error) -> bool {
        match (self, other) {
            (Error::Evaluation(a), Error::Evaluation(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
