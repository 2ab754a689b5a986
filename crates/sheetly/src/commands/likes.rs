//! Like/favorite command handlers.
//!
//! `add` and `remove` go through the same `LikeToggle` a sheet card uses,
//! so they honor the configured pacing and report the recounted total.

use serde::Serialize;

use sheetly_core::{Hub, ToggleOutcome};

use crate::cli::{GlobalOpts, LikesArgs, LikesCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::sheets::{ListedSheet, sheet_row};
use super::util;

/// Result of a like or unlike.
#[derive(Serialize)]
struct LikeResult {
    sheet_id: String,
    title: String,
    liked: bool,
    /// `false` when the sheet was already in the requested state.
    changed: bool,
    like_count: Option<u64>,
}

pub async fn handle(hub: &Hub, args: LikesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        LikesCommand::List => {
            util::require_user(hub)?;
            let sheets = hub.liked_sheets().await?;
            let items: Vec<ListedSheet> = sheets
                .into_iter()
                .map(|sheet| ListedSheet { sheet, liked: true })
                .collect();

            if items.is_empty() && matches!(global.output, OutputFormat::Table) {
                output::print_note(
                    "No liked sheets yet. Try: sheetly likes add <sheet-id>",
                    global.quiet,
                );
                return Ok(());
            }

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &items,
                |item| sheet_row(item, color),
                |item| item.sheet.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        LikesCommand::Add { sheet_id } => set_liked(hub, &sheet_id, true, global).await,
        LikesCommand::Remove { sheet_id } => set_liked(hub, &sheet_id, false, global).await,
    }
}

async fn set_liked(
    hub: &Hub,
    raw_id: &str,
    like: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_user(hub)?;
    let id = util::parse_sheet_id(raw_id)?;
    // Resolve first so a bad id reads as "not found" rather than a failed write
    let sheet = hub.sheet(&id).await?;

    let toggle = hub.like_toggle(id.clone());
    toggle.mount().await;

    let changed = if toggle.view().liked == like {
        tracing::debug!(sheet_id = %id, like, "already in requested state");
        false
    } else {
        match toggle.toggle().await {
            ToggleOutcome::Liked | ToggleOutcome::Unliked => true,
            ToggleOutcome::Failed(message) => {
                return Err(CliError::LikeFailed {
                    sheet_id: id.to_string(),
                    message,
                });
            }
            ToggleOutcome::Ignored | ToggleOutcome::Cancelled => {
                return Err(CliError::LikeFailed {
                    sheet_id: id.to_string(),
                    message: "the session ended before the change settled".into(),
                });
            }
        }
    };

    let view = toggle.view();
    let result = LikeResult {
        sheet_id: id.to_string(),
        title: sheet.title,
        liked: view.liked,
        changed,
        like_count: view.count,
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &result,
        |r| describe(r, color),
        |r| r.sheet_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn describe(r: &LikeResult, color: bool) -> String {
    let verb = match (r.liked, r.changed) {
        (true, true) => "Liked",
        (true, false) => "Already liked",
        (false, true) => "Removed like from",
        (false, false) => "Not liked",
    };
    let count = r
        .like_count
        .map(|n| format!(" ({n} {})", if n == 1 { "like" } else { "likes" }))
        .unwrap_or_default();
    let heart = output::heart(r.liked, color);
    let heart = if heart.is_empty() {
        String::new()
    } else {
        format!("{heart} ")
    };
    format!("{heart}{verb} '{}'{count}", r.title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(liked: bool, changed: bool, like_count: Option<u64>) -> LikeResult {
        LikeResult {
            sheet_id: "sheet-1".into(),
            title: "Clair de Lune".into(),
            liked,
            changed,
            like_count,
        }
    }

    #[test]
    fn describes_each_outcome() {
        assert_eq!(
            describe(&result(true, true, Some(1)), false),
            "♥ Liked 'Clair de Lune' (1 like)"
        );
        assert_eq!(
            describe(&result(true, false, Some(4)), false),
            "♥ Already liked 'Clair de Lune' (4 likes)"
        );
        assert_eq!(
            describe(&result(false, true, None), false),
            "Removed like from 'Clair de Lune'"
        );
    }
}
