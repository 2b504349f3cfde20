//! Resolving several readers at once
//!
//! Every entry is started up front and the combined future settles exactly
//! once: with all results, or with the first failure.

mod props;

pub(crate) use props::Props;
