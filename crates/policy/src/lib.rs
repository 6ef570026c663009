//! Belt-rank based access policy.
//!
//! Core principle: **a member may open content whose required rank is at or
//! below their own.** Ranks form a fixed, totally ordered table; anything that
//! does not name a known rank counts as the lowest one.

pub mod access;
mod error;
pub mod rank;

pub use access::{Decision, check, is_locked};
pub use error::{Error, Result};
pub use rank::{Rank, resolve};
