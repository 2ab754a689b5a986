//! Sheet catalog command handlers.

use serde::Serialize;
use tabled::Tabled;

use sheetly_core::{Difficulty, Hub, Sheet, SheetQuery, SortOrder};

use crate::cli::{
    DifficultyArg, GlobalOpts, OutputFormat, SheetListArgs, SheetsArgs, SheetsCommand, SortArg,
};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct SheetRow {
    #[tabled(rename = "")]
    heart: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Composer")]
    composer: String,
    #[tabled(rename = "Instrument")]
    instrument: String,
    #[tabled(rename = "Level")]
    difficulty: String,
    #[tabled(rename = "Likes")]
    likes: u64,
    #[tabled(rename = "Downloads")]
    downloads: u64,
}

/// A sheet plus whether the current user has liked it.
#[derive(Serialize)]
pub(super) struct ListedSheet {
    #[serde(flatten)]
    pub sheet: Sheet,
    pub liked: bool,
}

pub(super) fn sheet_row(item: &ListedSheet, color: bool) -> SheetRow {
    let s = &item.sheet;
    SheetRow {
        heart: output::heart(item.liked, color),
        id: s.id.to_string(),
        title: util::truncate(&s.title, 40),
        composer: s.composer.clone().unwrap_or_default(),
        instrument: s.instrument.clone().unwrap_or_default(),
        difficulty: s.difficulty.map(|d| d.to_string()).unwrap_or_default(),
        likes: s.likes,
        downloads: s.downloads,
    }
}

// ── Argument conversion ─────────────────────────────────────────────

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Beginner => Self::Beginner,
            DifficultyArg::Intermediate => Self::Intermediate,
            DifficultyArg::Advanced => Self::Advanced,
        }
    }
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Recent => Self::Recent,
            SortArg::Downloads => Self::Downloads,
            SortArg::Likes => Self::Likes,
        }
    }
}

fn query_from_args(args: SheetListArgs) -> SheetQuery {
    SheetQuery {
        search: args.search.filter(|s| !s.trim().is_empty()),
        instruments: args.instruments,
        difficulty: args.difficulty.map(Difficulty::from),
        sort: args.sort.into(),
        page: args.page,
        per_page: args.per_page,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(hub: &Hub, args: SheetsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SheetsCommand::List(list_args) => {
            let query = query_from_args(list_args);
            let page = hub.browse(&query).await?;

            // Hearts only make sense for a signed-in user
            if hub.current_user().is_some() && !hub.likes().ensure_loaded().await {
                tracing::warn!("liked sheets unavailable; hearts omitted");
            }
            let likes = hub.likes();
            let items: Vec<ListedSheet> = page
                .sheets
                .iter()
                .cloned()
                .map(|sheet| ListedSheet {
                    liked: likes.is_sheet_liked(sheet.id.as_str()),
                    sheet,
                })
                .collect();

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &items,
                |item| sheet_row(item, color),
                |item| item.sheet.id.to_string(),
            );
            output::print_output(&out, global.quiet);

            if matches!(global.output, OutputFormat::Table) {
                output::print_note(
                    &format!(
                        "Page {} of {} ({} sheets)",
                        page.page,
                        page.page_count(),
                        page.total
                    ),
                    global.quiet,
                );
            }
            Ok(())
        }

        SheetsCommand::Get { sheet_id } => {
            let id = util::parse_sheet_id(&sheet_id)?;
            let sheet = hub.sheet(&id).await?;

            // The toggle knows the exact count and, when signed in, the liked flag
            let toggle = hub.like_toggle(id);
            toggle.mount().await;
            let view = toggle.view();

            let detail = SheetDetail {
                like_count: view.count.unwrap_or(sheet.likes),
                liked: view.liked,
                sheet,
            };
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &detail,
                |d| render_detail(d, color),
                |d| d.sheet.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

// ── Detail view ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct SheetDetail {
    #[serde(flatten)]
    sheet: Sheet,
    liked: bool,
    like_count: u64,
}

fn render_detail(d: &SheetDetail, color: bool) -> String {
    let s = &d.sheet;
    let field = |v: Option<&str>| v.unwrap_or("-").to_owned();
    let mut lines = vec![
        format!("ID:          {}", s.id),
        format!("Title:       {}", s.title),
        format!("Composer:    {}", field(s.composer.as_deref())),
        format!("Instrument:  {}", field(s.instrument.as_deref())),
        format!(
            "Level:       {}",
            s.difficulty.map_or_else(|| "-".into(), |d| d.to_string())
        ),
    ];
    if !s.tags.is_empty() {
        lines.push(format!("Tags:        {}", s.tags.join(", ")));
    }
    lines.push(format!(
        "Likes:       {} {}",
        d.like_count,
        output::heart(d.liked, color)
    ));
    lines.push(format!("Downloads:   {}", s.downloads));
    if let Some(created) = s.created_at {
        lines.push(format!("Uploaded:    {}", created.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(ref url) = s.file_url {
        lines.push(format!("File:        {url}"));
    }
    lines.join("\n").trim_end().to_owned()
}
