// ── Domain model ──

mod ids;
mod playlist;
mod sheet;

pub use ids::{SheetId, UserId};
pub use playlist::{Playlist, PlaylistAdd, PlaylistDetail, PlaylistDraft, PlaylistId};
pub use sheet::{DEFAULT_PAGE_SIZE, Difficulty, Sheet, SheetPage, SheetQuery, SortOrder};
