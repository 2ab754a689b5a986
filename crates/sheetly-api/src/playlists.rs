// `playlists` and `playlist_items` tables
//
// Playlists are owned by a user; items reference catalog sheets and carry
// a 1-based position. Row-level security restricts writes to the owner.

use tracing::debug;

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{NewPlaylist, NewPlaylistItem, PlaylistItemRow, PlaylistRow};
use crate::sheets::SHEET_COLUMNS;

const PLAYLISTS_TABLE: &str = "playlists";
const ITEMS_TABLE: &str = "playlist_items";
const PLAYLIST_COLUMNS: &str =
    "id,title,description,is_public,user_id,created_at,updated_at,item_count:playlist_items(count)";

impl BackendClient {
    /// Playlists owned by `user_id`, most recently updated first.
    pub async fn list_playlists(&self, user_id: &str) -> Result<Vec<PlaylistRow>, Error> {
        let url = self.rest_url(PLAYLISTS_TABLE)?;
        let query = [
            ("select", PLAYLIST_COLUMNS.to_owned()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "updated_at.desc.nullslast".to_owned()),
        ];
        self.get_rows(url, &query).await
    }

    /// A single playlist, or `None` when it does not exist or is hidden.
    pub async fn get_playlist(&self, playlist_id: i64) -> Result<Option<PlaylistRow>, Error> {
        let url = self.rest_url(PLAYLISTS_TABLE)?;
        let query = [
            ("select", PLAYLIST_COLUMNS.to_owned()),
            ("id", format!("eq.{playlist_id}")),
            ("limit", "1".to_owned()),
        ];
        let mut rows: Vec<PlaylistRow> = self.get_rows(url, &query).await?;
        Ok(rows.pop())
    }

    /// Insert a playlist and return the stored row.
    pub async fn create_playlist(&self, playlist: &NewPlaylist<'_>) -> Result<PlaylistRow, Error> {
        let url = self.rest_url(PLAYLISTS_TABLE)?;
        self.insert_row_returning(url, playlist).await
    }

    /// Delete a playlist. Returns how many rows were removed.
    pub async fn delete_playlist(&self, playlist_id: i64) -> Result<usize, Error> {
        let url = self.rest_url(PLAYLISTS_TABLE)?;
        let query = [("id", format!("eq.{playlist_id}"))];
        let removed: Vec<PlaylistRow> = self.delete_rows(url, &query).await?;
        Ok(removed.len())
    }

    /// Items of a playlist in position order, each with its sheet embedded.
    pub async fn playlist_items(&self, playlist_id: i64) -> Result<Vec<PlaylistItemRow>, Error> {
        let url = self.rest_url(ITEMS_TABLE)?;
        let query = [
            (
                "select",
                format!("id,playlist_id,sheet_id,position,sheet:music_sheets({SHEET_COLUMNS})"),
            ),
            ("playlist_id", format!("eq.{playlist_id}")),
            ("order", "position.asc".to_owned()),
        ];
        self.get_rows(url, &query).await
    }

    /// Append a sheet after the current last item.
    ///
    /// A sheet already in the playlist surfaces as [`Error::Api`] with
    /// code `23505`; see [`Error::is_unique_violation`].
    pub async fn add_playlist_item(&self, playlist_id: i64, sheet_id: &str) -> Result<i64, Error> {
        let position = self.next_position(playlist_id).await?;
        let url = self.rest_url(ITEMS_TABLE)?;
        self.insert_row(
            url,
            &NewPlaylistItem {
                playlist_id,
                sheet_id,
                position,
            },
        )
        .await?;
        debug!(playlist_id, sheet_id, position, "playlist item added");
        Ok(position)
    }

    /// Remove a sheet from a playlist. Returns how many rows were removed.
    pub async fn remove_playlist_item(
        &self,
        playlist_id: i64,
        sheet_id: &str,
    ) -> Result<usize, Error> {
        let url = self.rest_url(ITEMS_TABLE)?;
        let query = [
            ("playlist_id", format!("eq.{playlist_id}")),
            ("sheet_id", format!("eq.{sheet_id}")),
        ];
        let removed: Vec<PlaylistItemRow> = self.delete_rows(url, &query).await?;
        Ok(removed.len())
    }

    /// One past the highest position in the playlist (1 when empty).
    async fn next_position(&self, playlist_id: i64) -> Result<i64, Error> {
        let url = self.rest_url(ITEMS_TABLE)?;
        let query = [
            ("select", "position".to_owned()),
            ("playlist_id", format!("eq.{playlist_id}")),
            ("order", "position.desc.nullslast".to_owned()),
            ("limit", "1".to_owned()),
        ];
        let last: Vec<PlaylistItemRow> = self.get_rows(url, &query).await?;
        Ok(last.first().and_then(|item| item.position).unwrap_or(0) + 1)
    }
}
