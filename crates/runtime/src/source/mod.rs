//! Content and member collaborators.
//!
//! The viewer never talks to a database or an HTTP API directly. It goes
//! through these traits, so the same gating and selection logic runs against
//! the remote API ([`RestSource`]) or a local catalog ([`LocalSource`]).

mod local;
mod rest;

pub use local::LocalSource;
pub use rest::{RestSource, RestSourceBuilder};

use crate::Result;
use std::future::Future;
use storage::{Material, MaterialId, MaterialSummary, Member};

/// Trait for training material sources.
pub trait ContentSource: Send + Sync {
    /// List materials, optionally filtered by a search string.
    fn list(&self, search: Option<&str>)
    -> impl Future<Output = Result<Vec<MaterialSummary>>> + Send;

    /// Fetch one material with its locator.
    fn fetch(&self, id: &MaterialId) -> impl Future<Output = Result<Material>> + Send;
}

/// Trait for looking up the signed-in member.
pub trait MemberSource: Send + Sync {
    fn current_member(&self) -> impl Future<Output = Result<Member>> + Send;
}
