//! SQLite-backed catalog of training materials and members.
//!
//! This crate holds the records the member-facing viewer works with and a
//! local [`Catalog`] that stores them. The catalog stands in for the remote
//! content API when running against a local database, and backs the admin
//! commands that create, edit and remove materials.
//!
//! # Core Concepts
//!
//! ## Material
//!
//! A [`Material`] is one unit of gated training content: a title, a
//! [`MaterialKind`], the [`Rank`](policy::Rank) required to open it and the URL
//! of the video or document itself. Lists carry the lighter
//! [`MaterialSummary`], which has everything needed to decide whether an
//! entry is locked but not the locator.
//!
//! ## Member
//!
//! A [`Member`] carries an optional rank. Members without one are treated as
//! holding the lowest rank.
//!
//! # Example
//!
//! ```no_run
//! use policy::Rank;
//! use storage::{Catalog, Material, MaterialKind};
//!
//! let catalog = Catalog::open("sabuk.db")?;
//! let material = Material::new(
//!     "Jurus Dasar 1",
//!     MaterialKind::Video,
//!     Rank::White,
//!     "https://videos.example/jurus-1",
//! );
//! catalog.insert_material(&material)?;
//!
//! for summary in catalog.list_materials(Some("jurus"))? {
//!     println!("{} requires {}", summary.title, summary.required_rank);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod material;
mod store;

pub use error::{Error, Result};
pub use material::{Material, MaterialId, MaterialKind, MaterialSummary, Member};
pub use store::Catalog;
