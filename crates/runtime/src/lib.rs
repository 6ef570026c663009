//! Sabuk runtime: content sources and the member material viewer.
//!
//! This crate connects the rank policy to the places materials come from.
//!
//! # Overview
//!
//! - **ContentSource** / **MemberSource**: traits for listing materials,
//!   fetching one material's detail and reading the signed-in member.
//! - **RestSource**: the site's REST API over `reqwest`.
//! - **LocalSource**: a local [`storage::Catalog`].
//! - **Viewer**: the selection state machine. Locked materials cannot be
//!   selected, and only the latest selection's detail is ever displayed.
//!
//! # Example
//!
//! ```no_run
//! use runtime::{LocalSource, MemberSource, Viewer, ViewState};
//! use storage::Catalog;
//!
//! # async fn example() -> runtime::Result<()> {
//! let source = LocalSource::new(Catalog::open("sabuk.db")?).with_member("budi");
//! let member = source.current_member().await?;
//!
//! let viewer = Viewer::for_member(source, &member);
//! if let Ok(Some(pending)) = viewer.load_list(None).await {
//!     pending.run().await;
//! }
//! if let ViewState::Loaded(material) = viewer.view() {
//!     println!("{}: {}", material.title, material.url);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod source;
mod viewer;

// Error types
pub use error::{Error, Result};

// Collaborators
pub use source::{ContentSource, LocalSource, MemberSource, RestSource, RestSourceBuilder};

// Viewer
pub use viewer::{
    AutoSelect, Entry, FetchOutcome, ListError, ListState, PendingFetch, SelectError, ViewState,
    Viewer,
};
