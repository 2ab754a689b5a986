// ── Like backend seam ──
//
// The remote operations the like store depends on. `BackendClient`
// implements it against the hosted REST API; tests substitute an
// in-memory table.

use std::future::Future;

use tracing::debug;

use sheetly_api::BackendClient;

use crate::error::{CoreError, FOREIGN_KEY_VIOLATION};
use crate::model::{SheetId, UserId};

/// Remote contract of the like store.
///
/// Identity is ambient: [`current_user`](Self::current_user) reports who
/// the backend session belongs to, without a network round trip.
pub trait LikeBackend: Send + Sync + 'static {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<UserId>;

    /// Every sheet id `user` has liked.
    fn liked_sheet_ids(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<SheetId>, CoreError>> + Send;

    /// Insert the like row. `Ok(false)` means the row already existed.
    fn insert_like(
        &self,
        user: &UserId,
        sheet: &SheetId,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;

    /// Delete the like row. `Ok(false)` means there was nothing to delete.
    fn delete_like(
        &self,
        user: &UserId,
        sheet: &SheetId,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;

    /// Bump the sheet's denormalized like counter.
    fn increment_likes(&self, sheet: &SheetId)
    -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Lower the sheet's denormalized like counter.
    fn decrement_likes(&self, sheet: &SheetId)
    -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Authoritative number of likes on a sheet, counted remotely.
    fn count_likes(&self, sheet: &SheetId) -> impl Future<Output = Result<u64, CoreError>> + Send;
}

impl LikeBackend for BackendClient {
    fn current_user(&self) -> Option<UserId> {
        BackendClient::current_user(self).map(|u| UserId::new(u.id))
    }

    async fn liked_sheet_ids(&self, user: &UserId) -> Result<Vec<SheetId>, CoreError> {
        let rows = self.list_user_likes(user.as_str()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| SheetId::new(row.sheet_id).ok())
            .collect())
    }

    async fn insert_like(&self, user: &UserId, sheet: &SheetId) -> Result<bool, CoreError> {
        match BackendClient::insert_like(self, sheet.as_str(), user.as_str()).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_unique_violation() => {
                debug!(sheet_id = %sheet, "like row already present");
                Ok(false)
            }
            Err(e) if e.api_error_code() == Some(FOREIGN_KEY_VIOLATION) => {
                Err(CoreError::SheetNotFound {
                    id: sheet.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_like(&self, user: &UserId, sheet: &SheetId) -> Result<bool, CoreError> {
        let removed = BackendClient::delete_like(self, sheet.as_str(), user.as_str()).await?;
        Ok(removed > 0)
    }

    async fn increment_likes(&self, sheet: &SheetId) -> Result<(), CoreError> {
        Ok(BackendClient::increment_likes(self, sheet.as_str()).await?)
    }

    async fn decrement_likes(&self, sheet: &SheetId) -> Result<(), CoreError> {
        Ok(BackendClient::decrement_likes(self, sheet.as_str()).await?)
    }

    async fn count_likes(&self, sheet: &SheetId) -> Result<u64, CoreError> {
        Ok(BackendClient::count_likes(self, sheet.as_str()).await?)
    }
}
