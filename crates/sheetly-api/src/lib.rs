// sheetly-api: Async Rust client for the Sheetly backend (REST + RPC + auth)

pub mod auth;
pub mod client;
pub mod error;
pub mod likes;
pub mod models;
pub mod playlists;
pub mod sheets;
pub mod transport;

pub use auth::{AuthUser, Session};
pub use client::BackendClient;
pub use error::Error;
pub use models::{
    EmbeddedCount, LikeRow, NewPlaylist, PlaylistItemRow, PlaylistRow, SheetRow, SheetRowPage,
};
pub use sheets::{SheetFilter, SheetOrder};
pub use transport::{TlsMode, TransportConfig};
