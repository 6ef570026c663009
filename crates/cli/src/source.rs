//! Source selected by configuration.

use runtime::{ContentSource, LocalSource, MemberSource, RestSource, Result};
use storage::{Material, MaterialId, MaterialSummary, Member};

/// The configured material source.
pub enum Source {
    Local(LocalSource),
    Rest(RestSource),
}

impl Source {
    pub fn local(&self) -> Option<&LocalSource> {
        match self {
            Source::Local(source) => Some(source),
            Source::Rest(_) => None,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Local(_) => write!(f, "local catalog"),
            Source::Rest(source) => write!(f, "{source}"),
        }
    }
}

impl ContentSource for Source {
    async fn list(&self, search: Option<&str>) -> Result<Vec<MaterialSummary>> {
        match self {
            Source::Local(source) => source.list(search).await,
            Source::Rest(source) => source.list(search).await,
        }
    }

    async fn fetch(&self, id: &MaterialId) -> Result<Material> {
        match self {
            Source::Local(source) => source.fetch(id).await,
            Source::Rest(source) => source.fetch(id).await,
        }
    }
}

impl MemberSource for Source {
    async fn current_member(&self) -> Result<Member> {
        match self {
            Source::Local(source) => source.current_member().await,
            Source::Rest(source) => source.current_member().await,
        }
    }
}
