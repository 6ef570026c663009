//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A rank name is not in the ordering table.
    #[error("unknown rank: {0:?}")]
    UnknownRank(String),

    /// A rank index is past the end of the ordering table.
    #[error("rank index out of range: {0}")]
    RankIndex(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
