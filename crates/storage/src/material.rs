//! Training material and member records.

use chrono::{DateTime, Utc};
use policy::Rank;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A unique identifier for a training material.
///
/// Locally created materials get a UUID; materials coming from the API keep
/// whatever identifier the API assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub String);

impl MaterialId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for MaterialId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MaterialId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What kind of resource a material points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Video,
    Document,
    Pdf,
}

impl MaterialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialKind::Video => "video",
            MaterialKind::Document => "document",
            MaterialKind::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for MaterialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MaterialKind::Video),
            "document" => Ok(MaterialKind::Document),
            "pdf" => Ok(MaterialKind::Pdf),
            other => Err(Error::InvalidRecord(format!("unknown material kind: {other}"))),
        }
    }
}

/// The list view of a material: enough to render and gate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub id: MaterialId,
    pub title: String,
    pub kind: MaterialKind,
    pub required_rank: Rank,
}

/// A training material with its renderable locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub title: String,
    pub kind: MaterialKind,
    pub required_rank: Rank,
    /// Playable or embeddable URL.
    pub url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    pub fn new(
        title: impl Into<String>,
        kind: MaterialKind,
        required_rank: Rank,
        url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MaterialId::new(),
            title: title.into(),
            kind,
            required_rank,
            url: url.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the material as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> MaterialSummary {
        MaterialSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            kind: self.kind,
            required_rank: self.required_rank,
        }
    }
}

/// A member account as far as access gating is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub username: String,
    pub display_name: String,
    /// `None` means the member has no certified rank yet.
    pub rank: Option<Rank>,
}

impl Member {
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            display_name: username.clone(),
            username,
            rank: None,
        }
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = Some(rank);
        self
    }

    /// The rank used for access checks.
    pub fn effective_rank(&self) -> Rank {
        self.rank.unwrap_or(Rank::LOWEST)
    }
}
