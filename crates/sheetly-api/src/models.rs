// Backend row and payload types
//
// Wire shapes for the REST tables and RPC bodies. Column names follow the
// database schema (snake_case), so no renames are needed. Optional columns
// use `#[serde(default)]` because older rows predate several of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Likes ────────────────────────────────────────────────────────────

/// A row of the `likes` table. Presence of the row means "liked".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRow {
    pub sheet_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for the `likes` table.
#[derive(Debug, Serialize)]
pub(crate) struct NewLike<'a> {
    pub sheet_id: &'a str,
    pub user_id: &'a str,
}

/// Argument object for the `increment_likes` / `decrement_likes` procedures.
#[derive(Debug, Serialize)]
pub(crate) struct LikeCounterArgs<'a> {
    pub sheet_id: &'a str,
}

// ── Sheets ───────────────────────────────────────────────────────────

/// A row of the `music_sheets` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub composer: Option<String>,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Denormalized like counter maintained by the counter procedures.
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub downloads: Option<i64>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// One page of catalog rows plus the exact total reported by the backend.
#[derive(Debug, Clone)]
pub struct SheetRowPage {
    pub rows: Vec<SheetRow>,
    pub total: u64,
}

// ── Playlists ────────────────────────────────────────────────────────

/// A row of the `playlists` table, optionally with its embedded item count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRow {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// `item_count:playlist_items(count)` embeds as `[{ "count": n }]`.
    #[serde(default)]
    pub item_count: Vec<EmbeddedCount>,
}

impl PlaylistRow {
    /// Item count from the embedded aggregate, when it was selected.
    pub fn items(&self) -> Option<i64> {
        self.item_count.first().map(|c| c.count)
    }
}

/// Aggregate produced by an embedded `(count)` select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedCount {
    pub count: i64,
}

/// Insert payload for the `playlists` table.
#[derive(Debug, Serialize)]
pub struct NewPlaylist<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub is_public: bool,
}

/// A row of `playlist_items`, with the sheet embedded when selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItemRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub playlist_id: Option<i64>,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    /// `null` when the sheet is hidden from the caller.
    #[serde(default)]
    pub sheet: Option<SheetRow>,
}

/// Insert payload for `playlist_items`.
#[derive(Debug, Serialize)]
pub(crate) struct NewPlaylistItem<'a> {
    pub playlist_id: i64,
    pub sheet_id: &'a str,
    pub position: i64,
}

// ── Errors ───────────────────────────────────────────────────────────

/// Error body returned by the REST layer on non-2xx responses.
///
/// ```json
/// { "code": "23505", "message": "duplicate key ...", "details": null, "hint": null }
/// ```
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RestErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    /// Auth endpoints report failures as `error_description` / `msg`.
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl RestErrorBody {
    /// Best human-readable message in the body.
    pub(crate) fn best_message(&self) -> Option<String> {
        let base = self
            .message
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.msg.clone())?;
        Some(match &self.details {
            Some(details) if !details.is_empty() => format!("{base} ({details})"),
            _ => base,
        })
    }
}
