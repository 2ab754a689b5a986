// `likes` table and like-counter procedures

use tracing::debug;

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{LikeCounterArgs, LikeRow, NewLike};

const LIKES_TABLE: &str = "likes";

impl BackendClient {
    /// Sheet ids liked by `user_id`.
    ///
    /// `GET /rest/v1/likes?select=sheet_id,user_id,created_at&user_id=eq.{user_id}`
    pub async fn list_user_likes(&self, user_id: &str) -> Result<Vec<LikeRow>, Error> {
        let url = self.rest_url(LIKES_TABLE)?;
        let query = [
            ("select", "sheet_id,user_id,created_at".to_owned()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.asc".to_owned()),
        ];
        self.get_rows(url, &query).await
    }

    /// Insert the `(sheet_id, user_id)` like row.
    ///
    /// A duplicate surfaces as [`Error::Api`] with code `23505`; see
    /// [`Error::is_unique_violation`].
    pub async fn insert_like(&self, sheet_id: &str, user_id: &str) -> Result<(), Error> {
        let url = self.rest_url(LIKES_TABLE)?;
        self.insert_row(url, &NewLike { sheet_id, user_id }).await
    }

    /// Delete the `(sheet_id, user_id)` like row. Returns how many rows
    /// were removed (0 when the like did not exist).
    pub async fn delete_like(&self, sheet_id: &str, user_id: &str) -> Result<usize, Error> {
        let url = self.rest_url(LIKES_TABLE)?;
        let query = [
            ("sheet_id", format!("eq.{sheet_id}")),
            ("user_id", format!("eq.{user_id}")),
        ];
        let removed: Vec<LikeRow> = self.delete_rows(url, &query).await?;
        debug!(sheet_id, removed = removed.len(), "like rows deleted");
        Ok(removed.len())
    }

    /// `rpc/increment_likes`: bump the sheet's denormalized counter.
    pub async fn increment_likes(&self, sheet_id: &str) -> Result<(), Error> {
        self.call_rpc("increment_likes", &LikeCounterArgs { sheet_id })
            .await
    }

    /// `rpc/decrement_likes`: lower the sheet's denormalized counter.
    pub async fn decrement_likes(&self, sheet_id: &str) -> Result<(), Error> {
        self.call_rpc("decrement_likes", &LikeCounterArgs { sheet_id })
            .await
    }

    /// Exact number of like rows for a sheet, counted server-side.
    pub async fn count_likes(&self, sheet_id: &str) -> Result<u64, Error> {
        let url = self.rest_url(LIKES_TABLE)?;
        let query = [
            ("select", "*".to_owned()),
            ("sheet_id", format!("eq.{sheet_id}")),
        ];
        self.count_rows(url, &query).await
    }
}
