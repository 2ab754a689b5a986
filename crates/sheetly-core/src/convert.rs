// ── API-to-domain type conversions ──
//
// Bridges raw `sheetly_api` rows into canonical domain types. Rows with
// unusable ids are dropped with a warning rather than failing the page.

use tracing::warn;

use sheetly_api::{PlaylistItemRow, PlaylistRow, SheetFilter, SheetOrder, SheetRow};

use crate::error::CoreError;
use crate::model::{
    Difficulty, Playlist, PlaylistId, Sheet, SheetId, SheetQuery, SortOrder, UserId,
};

impl TryFrom<SheetRow> for Sheet {
    type Error = CoreError;

    fn try_from(row: SheetRow) -> Result<Self, Self::Error> {
        let id = SheetId::new(row.id)?;
        let difficulty = row.difficulty.as_deref().and_then(|raw| {
            raw.parse::<Difficulty>()
                .map_err(|_| warn!(sheet_id = %id, difficulty = raw, "unknown difficulty"))
                .ok()
        });

        Ok(Self {
            id,
            title: row.title,
            composer: row.composer.filter(|c| !c.is_empty()),
            instrument: row.instrument.filter(|i| !i.is_empty()),
            difficulty,
            tags: row.tags,
            file_url: row.file_url,
            owner: row.user_id.map(UserId::new),
            created_at: row.created_at,
            likes: counter(row.likes),
            downloads: counter(row.downloads),
            is_public: row.is_public.unwrap_or(false),
        })
    }
}

/// Convert a batch of rows, skipping (and logging) the unusable ones.
pub(crate) fn sheets_from_rows(rows: Vec<SheetRow>) -> Vec<Sheet> {
    rows.into_iter()
        .filter_map(|row| {
            Sheet::try_from(row)
                .map_err(|e| warn!(error = %e, "skipping malformed sheet row"))
                .ok()
        })
        .collect()
}

impl From<PlaylistRow> for Playlist {
    fn from(row: PlaylistRow) -> Self {
        let item_count = row.items().map(|n| counter(Some(n)));
        Self {
            id: PlaylistId::new(row.id),
            title: row.title,
            description: row.description.filter(|d| !d.is_empty()),
            is_public: row.is_public.unwrap_or(false),
            owner: row.user_id.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
            item_count,
        }
    }
}

/// Sheets of a playlist in item order. Items whose sheet is hidden or
/// malformed are skipped.
pub(crate) fn sheets_from_items(items: Vec<PlaylistItemRow>) -> Vec<Sheet> {
    sheets_from_rows(items.into_iter().filter_map(|item| item.sheet).collect())
}

/// Negative or missing counters read as zero.
fn counter(raw: Option<i64>) -> u64 {
    raw.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

impl From<SortOrder> for SheetOrder {
    fn from(sort: SortOrder) -> Self {
        match sort {
            SortOrder::Recent => Self::Recent,
            SortOrder::Downloads => Self::Downloads,
            SortOrder::Likes => Self::Likes,
        }
    }
}

impl From<&SheetQuery> for SheetFilter {
    fn from(query: &SheetQuery) -> Self {
        Self {
            search: query.search.clone(),
            instruments: query.instruments.clone(),
            difficulty: query.difficulty.map(|d| d.as_ref().to_owned()),
            order: query.sort.into(),
            offset: query.offset(),
            limit: u64::from(query.per_page.max(1)),
            public_only: true,
        }
    }
}
