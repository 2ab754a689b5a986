// ── Playlist domain types ──

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::sheet::Sheet;
use crate::error::CoreError;

/// Numeric identifier of a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(i64);

impl PlaylistId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlaylistId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| CoreError::Validation {
                field: "playlist id".into(),
                message: format!("'{s}' is not a number"),
            })
    }
}

/// A user's named, ordered collection of sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub owner: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of items, when the listing reported it.
    pub item_count: Option<u64>,
}

/// Fields for a new playlist.
#[derive(Debug, Clone, Default)]
pub struct PlaylistDraft {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
}

impl PlaylistDraft {
    /// Trim the fields; a blank title is rejected, a blank description dropped.
    pub fn normalized(&self) -> Result<Self, CoreError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CoreError::Validation {
                field: "playlist title".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(Self {
            title: title.to_owned(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned),
            is_public: self.is_public,
        })
    }
}

/// A playlist with its sheets in position order.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub sheets: Vec<Sheet>,
}

/// Result of adding a sheet to a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistAdd {
    /// Appended at this 1-based position.
    Added { position: u64 },
    /// The sheet was already in the playlist.
    AlreadyPresent,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn playlist_id_parses_numbers_only() {
        assert_eq!(" 42 ".parse::<PlaylistId>().unwrap(), PlaylistId::new(42));
        assert!("recital".parse::<PlaylistId>().is_err());
    }

    #[test]
    fn draft_trims_and_requires_title() {
        let draft = PlaylistDraft {
            title: "  Recital ".into(),
            description: Some("   ".into()),
            is_public: true,
        };
        let normalized = draft.normalized().unwrap();
        assert_eq!(normalized.title, "Recital");
        assert_eq!(normalized.description, None);

        let blank = PlaylistDraft::default();
        assert!(matches!(
            blank.normalized(),
            Err(CoreError::Validation { .. })
        ));
    }
}
