//! Playlist command handlers.

use serde::Serialize;
use tabled::Tabled;

use sheetly_core::{Hub, Playlist, PlaylistAdd, PlaylistDetail, PlaylistDraft};

use crate::cli::{GlobalOpts, OutputFormat, PlaylistsArgs, PlaylistsCommand};
use crate::error::CliError;
use crate::output;

use super::sheets::{ListedSheet, sheet_row};
use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PlaylistRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Sheets")]
    items: String,
    #[tabled(rename = "Visibility")]
    visibility: &'static str,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn playlist_row(p: &Playlist) -> PlaylistRow {
    PlaylistRow {
        id: p.id.to_string(),
        title: util::truncate(&p.title, 40),
        items: p.item_count.map(|n| n.to_string()).unwrap_or_default(),
        visibility: visibility(p.is_public),
        updated: p
            .updated_at
            .or(p.created_at)
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    }
}

fn visibility(public: bool) -> &'static str {
    if public { "public" } else { "private" }
}

/// Result of adding or removing a sheet.
#[derive(Serialize)]
struct MembershipResult {
    playlist_id: String,
    sheet_id: String,
    in_playlist: bool,
    /// `false` when the playlist already had the requested membership.
    changed: bool,
    position: Option<u64>,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(hub: &Hub, args: PlaylistsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Anyone may view a public playlist; everything else is per user
    if !matches!(args.command, PlaylistsCommand::Show { .. }) {
        util::require_user(hub)?;
    }
    match args.command {
        PlaylistsCommand::List => {
            let playlists = hub.playlists().await?;
            if playlists.is_empty() && matches!(global.output, OutputFormat::Table) {
                output::print_note(
                    "No playlists yet. Try: sheetly playlists create <title>",
                    global.quiet,
                );
                return Ok(());
            }
            let out = output::render_list(
                &global.output,
                &playlists,
                playlist_row,
                |p| p.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PlaylistsCommand::Create {
            title,
            description,
            public,
        } => {
            let draft = PlaylistDraft {
                title,
                description,
                is_public: public,
            };
            let playlist = hub.create_playlist(&draft).await?;
            let out = output::render_single(
                &global.output,
                &playlist,
                |p| {
                    format!(
                        "Created {} playlist '{}' (id {})",
                        visibility(p.is_public),
                        p.title,
                        p.id
                    )
                },
                |p| p.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PlaylistsCommand::Show { playlist_id } => {
            let id = util::parse_playlist_id(&playlist_id)?;
            let detail = hub.playlist(id).await?;
            if hub.current_user().is_some() && !hub.likes().ensure_loaded().await {
                tracing::warn!("liked sheets unavailable; hearts omitted");
            }
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &detail,
                |d| render_detail(hub, d, color),
                |d| {
                    d.sheets
                        .iter()
                        .map(|s| s.id.to_string())
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PlaylistsCommand::Add {
            playlist_id,
            sheet_id,
        } => {
            let id = util::parse_playlist_id(&playlist_id)?;
            let sheet = util::parse_sheet_id(&sheet_id)?;
            let (changed, position) = match hub.add_to_playlist(id, &sheet).await? {
                PlaylistAdd::Added { position } => (true, Some(position)),
                PlaylistAdd::AlreadyPresent => (false, None),
            };
            print_membership(
                &MembershipResult {
                    playlist_id: id.to_string(),
                    sheet_id: sheet.to_string(),
                    in_playlist: true,
                    changed,
                    position,
                },
                global,
            );
            Ok(())
        }

        PlaylistsCommand::Remove {
            playlist_id,
            sheet_id,
        } => {
            let id = util::parse_playlist_id(&playlist_id)?;
            let sheet = util::parse_sheet_id(&sheet_id)?;
            let changed = hub.remove_from_playlist(id, &sheet).await?;
            print_membership(
                &MembershipResult {
                    playlist_id: id.to_string(),
                    sheet_id: sheet.to_string(),
                    in_playlist: false,
                    changed,
                    position: None,
                },
                global,
            );
            Ok(())
        }

        PlaylistsCommand::Delete { playlist_id } => {
            let id = util::parse_playlist_id(&playlist_id)?;
            hub.delete_playlist(id).await?;
            output::print_note(&format!("Deleted playlist {id}"), global.quiet);
            Ok(())
        }
    }
}

fn print_membership(result: &MembershipResult, global: &GlobalOpts) {
    let out = output::render_single(
        &global.output,
        result,
        describe_membership,
        |r| r.sheet_id.clone(),
    );
    output::print_output(&out, global.quiet);
}

fn describe_membership(r: &MembershipResult) -> String {
    match (r.in_playlist, r.changed, r.position) {
        (true, true, Some(position)) => format!(
            "Added '{}' to playlist {} at position {position}",
            r.sheet_id, r.playlist_id
        ),
        (true, _, _) => format!("'{}' is already in playlist {}", r.sheet_id, r.playlist_id),
        (false, true, _) => format!("Removed '{}' from playlist {}", r.sheet_id, r.playlist_id),
        (false, false, _) => format!("'{}' was not in playlist {}", r.sheet_id, r.playlist_id),
    }
}

// ── Detail view ─────────────────────────────────────────────────────

fn render_detail(hub: &Hub, d: &PlaylistDetail, color: bool) -> String {
    let p = &d.playlist;
    let mut out = format!("{} ({}, id {})", p.title, visibility(p.is_public), p.id);
    if let Some(description) = &p.description {
        out.push('\n');
        out.push_str(description);
    }
    if d.sheets.is_empty() {
        out.push_str("\n\nNo sheets yet. Try: sheetly playlists add ");
        out.push_str(&p.id.to_string());
        out.push_str(" <sheet-id>");
        return out;
    }
    let likes = hub.likes();
    let items: Vec<ListedSheet> = d
        .sheets
        .iter()
        .cloned()
        .map(|sheet| ListedSheet {
            liked: likes.is_sheet_liked(sheet.id.as_str()),
            sheet,
        })
        .collect();
    let table = output::render_list(
        &OutputFormat::Table,
        &items,
        |item| sheet_row(item, color),
        |item| item.sheet.id.to_string(),
    );
    out.push_str("\n\n");
    out.push_str(&table);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(in_playlist: bool, changed: bool, position: Option<u64>) -> MembershipResult {
        MembershipResult {
            playlist_id: "7".into(),
            sheet_id: "sheet-1".into(),
            in_playlist,
            changed,
            position,
        }
    }

    #[test]
    fn describes_membership_changes() {
        assert_eq!(
            describe_membership(&membership(true, true, Some(3))),
            "Added 'sheet-1' to playlist 7 at position 3"
        );
        assert_eq!(
            describe_membership(&membership(true, false, None)),
            "'sheet-1' is already in playlist 7"
        );
        assert_eq!(
            describe_membership(&membership(false, false, None)),
            "'sheet-1' was not in playlist 7"
        );
    }
}
