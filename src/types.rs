// src/types.rs

//! Small shared value types.

use clap::ValueEnum;

/// Which task script runs inside the runtime container after a sync.
///
/// - `Full`: rebuild everything and (re)start the application.
/// - `Incremental`: reuse previous build output where possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildMode {
    Full,
    Incremental,
}

/// Result of a selector-based lookup, with the ambiguity made explicit.
///
/// Cluster lookups by label can legitimately return zero, one or many
/// objects. Callers match on this instead of silently taking the first hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matches<T> {
    None,
    One(T),
    Many(Vec<T>),
}

impl<T> Matches<T> {
    pub fn from_vec(mut items: Vec<T>) -> Self {
        match items.len() {
            0 => Matches::None,
            1 => Matches::One(items.remove(0)),
            _ => Matches::Many(items),
        }
    }
}

impl<T> From<Vec<T>> for Matches<T> {
    fn from(items: Vec<T>) -> Self {
        Matches::from_vec(items)
    }
}
