//! Like/favorite state for sheetly, between `sheetly-api` and consumers.
//!
//! - **[`LikeStore`]**: per-session cache of the current user's liked
//!   sheet ids. Like/unlike write through to the backend (row plus
//!   denormalized counter) with optimistic cache updates that revert on
//!   failure. Changes are published on `tokio::sync::watch` channels.
//!
//! - **[`LikeToggle`]**: the like button of a card or detail view. Paces
//!   clicks, ignores clicks while pending, re-fetches the authoritative
//!   count after each change and stops updating once unmounted.
//!
//! - **[`Hub`]**: session facade. Signs in, owns the store, vends toggles
//!   and browses the catalog and the user's playlists;
//!   [`Hub::sign_out()`] cancels every toggle and clears the cache.
//!
//! - **[`LikeBackend`]**: the remote seam the store is written against,
//!   implemented for [`sheetly_api::BackendClient`].

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod hub;
pub mod model;
pub mod store;
pub mod toggle;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::LikeBackend;
pub use config::{Credentials, DEFAULT_LIKE_PACING, HubConfig, TlsVerification};
pub use error::CoreError;
pub use hub::{Hub, SessionState};
pub use model::{
    DEFAULT_PAGE_SIZE, Difficulty, Playlist, PlaylistAdd, PlaylistDetail, PlaylistDraft,
    PlaylistId, Sheet, SheetId, SheetPage, SheetQuery, SortOrder, UserId,
};
pub use store::{LikeChange, LikeSnapshot, LikeStatus, LikeStore};
pub use toggle::{LikeToggle, ToggleOutcome, TogglePhase, ToggleView};
