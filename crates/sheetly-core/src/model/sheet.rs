// ── Sheet domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::ids::{SheetId, UserId};

/// Playing difficulty declared by the uploader.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A user-uploaded music document with catalog metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub id: SheetId,
    pub title: String,
    pub composer: Option<String>,
    pub instrument: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub tags: Vec<String>,
    pub file_url: Option<String>,
    pub owner: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
    /// Denormalized like counter as of the read. For an exact figure use
    /// [`LikeStore::like_count`](crate::LikeStore::like_count).
    pub likes: u64,
    pub downloads: u64,
    pub is_public: bool,
}

/// Catalog sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Recent,
    Downloads,
    Likes,
}

/// A catalog query as the explore page builds it.
#[derive(Debug, Clone)]
pub struct SheetQuery {
    /// Matches title or composer, case-insensitive substring.
    pub search: Option<String>,
    pub instruments: Vec<String>,
    pub difficulty: Option<Difficulty>,
    pub sort: SortOrder,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 12;

impl Default for SheetQuery {
    fn default() -> Self {
        Self {
            search: None,
            instruments: Vec::new(),
            difficulty: None,
            sort: SortOrder::default(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SheetQuery {
    /// Zero-based offset of the first row on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.per_page.max(1))
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize)]
pub struct SheetPage {
    pub sheets: Vec<Sheet>,
    /// Total matches across all pages.
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl SheetPage {
    /// Number of pages needed for `total` results (at least 1).
    pub fn page_count(&self) -> u64 {
        let per_page = u64::from(self.per_page.max(1));
        self.total.div_ceil(per_page).max(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Beginner".parse::<Difficulty>().unwrap(), Difficulty::Beginner);
        assert_eq!(Difficulty::Advanced.to_string(), "advanced");
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn query_offsets() {
        let mut query = SheetQuery::default();
        assert_eq!(query.offset(), 0);
        query.page = 3;
        assert_eq!(query.offset(), 24);
        query.page = 0;
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn page_count_rounds_up() {
        let page = SheetPage {
            sheets: Vec::new(),
            total: 25,
            page: 1,
            per_page: 12,
        };
        assert_eq!(page.page_count(), 3);
        let empty = SheetPage { total: 0, ..page };
        assert_eq!(empty.page_count(), 1);
    }
}
