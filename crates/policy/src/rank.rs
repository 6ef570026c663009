//! The belt rank ordering table.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A belt rank, ordered from least to most privileged.
///
/// The discriminant is the rank's position in the ordering table. Privilege
/// comparisons go through [`Rank::index`] (or `Ord`, which agrees with it),
/// never through the display names. Stored rank names must be migrated if
/// this order ever changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(u8)]
pub enum Rank {
    /// No belt yet.
    Unranked = 0,
    /// Passed the Binfistal introductory course.
    Binfistal = 1,
    White = 2,
    Yellow = 3,
    Green = 4,
    Red = 5,
    BlackWiraga1 = 6,
    BlackWiraga2 = 7,
    BlackWiraga3 = 8,
}

impl Rank {
    /// The ordering table, lowest rank first.
    pub const ALL: [Rank; 9] = [
        Rank::Unranked,
        Rank::Binfistal,
        Rank::White,
        Rank::Yellow,
        Rank::Green,
        Rank::Red,
        Rank::BlackWiraga1,
        Rank::BlackWiraga2,
        Rank::BlackWiraga3,
    ];

    /// Number of ranks in the table.
    pub const COUNT: usize = Self::ALL.len();

    /// The least privileged rank.
    pub const LOWEST: Rank = Rank::Unranked;

    /// The most privileged rank.
    pub const HIGHEST: Rank = Rank::BlackWiraga3;

    /// Canonical name, as stored and exchanged with the API.
    pub fn name(self) -> &'static str {
        match self {
            Rank::Unranked => "Belum punya",
            Rank::Binfistal => "LULUS Binfistal",
            Rank::White => "Sabuk Putih",
            Rank::Yellow => "Sabuk Kuning",
            Rank::Green => "Sabuk Hijau",
            Rank::Red => "Sabuk Merah",
            Rank::BlackWiraga1 => "Sabuk Hitam Wiraga 1",
            Rank::BlackWiraga2 => "Sabuk Hitam Wiraga 2",
            Rank::BlackWiraga3 => "Sabuk Hitam Wiraga 3",
        }
    }

    /// Zero-based position in the ordering table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a rank by its table position.
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL.get(index).copied().ok_or(Error::RankIndex(index))
    }

    /// Strict lookup by canonical name. No trimming or case folding.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rank| rank.name() == name)
    }

    /// Resolve a possibly missing or stale rank name.
    ///
    /// Anything that is not a known rank name resolves to [`Rank::LOWEST`].
    pub fn resolve(name: Option<&str>) -> Self {
        name.and_then(Self::from_name).unwrap_or(Self::LOWEST)
    }

    /// Whether holding this rank meets `required`.
    pub fn satisfies(self, required: Rank) -> bool {
        self >= required
    }
}

impl Default for Rank {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Rank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::UnknownRank(s.to_string()))
    }
}

impl TryFrom<String> for Rank {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.name().to_string()
    }
}

/// Position of a rank name in the ordering table.
///
/// Missing or unrecognized names resolve to `0`, the least privileged rank.
pub fn resolve(name: Option<&str>) -> usize {
    Rank::resolve(name).index()
}
