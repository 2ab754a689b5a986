// `music_sheets` catalog queries
//
// Read-only: uploads and edits go through the storage flow, which lives
// outside this client.

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{SheetRow, SheetRowPage};

const SHEETS_TABLE: &str = "music_sheets";
pub(crate) const SHEET_COLUMNS: &str = "id,title,composer,instrument,difficulty,tags,file_url,user_id,created_at,likes,downloads,is_public";

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetOrder {
    /// Newest first.
    #[default]
    Recent,
    /// Most downloaded first.
    Downloads,
    /// Most liked first.
    Likes,
}

impl SheetOrder {
    fn as_query(self) -> &'static str {
        match self {
            Self::Recent => "created_at.desc",
            Self::Downloads => "downloads.desc.nullslast",
            Self::Likes => "likes.desc.nullslast",
        }
    }
}

/// Catalog filter, translated into REST query parameters.
#[derive(Debug, Clone)]
pub struct SheetFilter {
    /// Case-insensitive substring matched against title OR composer.
    pub search: Option<String>,
    /// Keep sheets for any of these instruments (empty = all).
    pub instruments: Vec<String>,
    pub difficulty: Option<String>,
    pub order: SheetOrder,
    /// Zero-based index of the first row.
    pub offset: u64,
    pub limit: u64,
    /// Restrict to sheets flagged public.
    pub public_only: bool,
}

impl Default for SheetFilter {
    fn default() -> Self {
        Self {
            search: None,
            instruments: Vec::new(),
            difficulty: None,
            order: SheetOrder::default(),
            offset: 0,
            limit: 12,
            public_only: true,
        }
    }
}

impl SheetFilter {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("select", SHEET_COLUMNS.to_owned()),
            ("order", self.order.as_query().to_owned()),
        ];
        if self.public_only {
            query.push(("is_public", "eq.true".to_owned()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let term = quote_value(&format!("*{search}*"));
            query.push(("or", format!("(title.ilike.{term},composer.ilike.{term})")));
        }
        if !self.instruments.is_empty() {
            let list = self
                .instruments
                .iter()
                .map(String::as_str)
                .map(quote_value)
                .collect::<Vec<_>>()
                .join(",");
            query.push(("instrument", format!("in.({list})")));
        }
        if let Some(ref difficulty) = self.difficulty {
            query.push(("difficulty", format!("eq.{difficulty}")));
        }
        query
    }
}

/// Double-quote a filter value so commas and parentheses stay literal.
fn quote_value(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| *c != '"' && *c != '\\').collect();
    format!("\"{cleaned}\"")
}

impl BackendClient {
    /// One page of the catalog plus the exact total match count.
    pub async fn list_sheets(&self, filter: &SheetFilter) -> Result<SheetRowPage, Error> {
        let url = self.rest_url(SHEETS_TABLE)?;
        let limit = filter.limit.max(1);
        let range = (filter.offset, filter.offset + limit - 1);
        let (rows, total) = self
            .get_rows_counted::<SheetRow>(url, &filter.to_query(), range)
            .await?;
        let total = total.unwrap_or(rows.len() as u64);
        Ok(SheetRowPage { rows, total })
    }

    /// A single sheet by id, or `None` if it does not exist (or is hidden
    /// from the caller by row-level security).
    pub async fn get_sheet(&self, sheet_id: &str) -> Result<Option<SheetRow>, Error> {
        let url = self.rest_url(SHEETS_TABLE)?;
        let query = [
            ("select", SHEET_COLUMNS.to_owned()),
            ("id", format!("eq.{sheet_id}")),
            ("limit", "1".to_owned()),
        ];
        let mut rows: Vec<SheetRow> = self.get_rows(url, &query).await?;
        Ok(rows.pop())
    }

    /// Sheets for a set of ids (e.g. the user's liked sheets), newest first.
    pub async fn sheets_by_ids(&self, ids: &[String]) -> Result<Vec<SheetRow>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.rest_url(SHEETS_TABLE)?;
        let list = ids.iter().map(String::as_str).map(quote_value).collect::<Vec<_>>().join(",");
        let query = [
            ("select", SHEET_COLUMNS.to_owned()),
            ("id", format!("in.({list})")),
            ("order", SheetOrder::Recent.as_query().to_owned()),
        ];
        self.get_rows(url, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_filter_lists_public_recent() {
        let query = SheetFilter::default().to_query();
        assert_eq!(param(&query, "is_public"), Some("eq.true"));
        assert_eq!(param(&query, "order"), Some("created_at.desc"));
        assert_eq!(param(&query, "or"), None);
    }

    #[test]
    fn search_matches_title_or_composer() {
        let filter = SheetFilter {
            search: Some("  Für Elise ".into()),
            ..SheetFilter::default()
        };
        let query = filter.to_query();
        assert_eq!(
            param(&query, "or"),
            Some("(title.ilike.\"*Für Elise*\",composer.ilike.\"*Für Elise*\")")
        );
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = SheetFilter {
            search: Some("   ".into()),
            ..SheetFilter::default()
        };
        assert_eq!(param(&filter.to_query(), "or"), None);
    }

    #[test]
    fn instruments_and_difficulty() {
        let filter = SheetFilter {
            instruments: vec!["piano".into(), "guitar, acoustic".into()],
            difficulty: Some("beginner".into()),
            order: SheetOrder::Likes,
            public_only: false,
            ..SheetFilter::default()
        };
        let query = filter.to_query();
        assert_eq!(
            param(&query, "instrument"),
            Some("in.(\"piano\",\"guitar, acoustic\")")
        );
        assert_eq!(param(&query, "difficulty"), Some("eq.beginner"));
        assert_eq!(param(&query, "order"), Some("likes.desc.nullslast"));
        assert_eq!(param(&query, "is_public"), None);
    }
}
