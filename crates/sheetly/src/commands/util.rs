//! Shared helpers for command handlers.

use sheetly_core::{Hub, PlaylistId, SheetId};

use crate::error::CliError;

/// Validate a sheet id from the command line.
pub fn parse_sheet_id(raw: &str) -> Result<SheetId, CliError> {
    Ok(SheetId::new(raw)?)
}

/// Validate a numeric playlist id from the command line.
pub fn parse_playlist_id(raw: &str) -> Result<PlaylistId, CliError> {
    Ok(raw.parse::<PlaylistId>()?)
}

/// Fail early with a sign-in hint when the session is anonymous.
pub fn require_user(hub: &Hub) -> Result<(), CliError> {
    if hub.current_user().is_none() {
        return Err(CliError::NotSignedIn);
    }
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Shorten `s` to at most `max` characters, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_owned();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn blank_sheet_id_is_a_validation_error() {
        let err = parse_sheet_id("  ").unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[test]
    fn playlist_id_must_be_numeric() {
        assert_eq!(parse_playlist_id("12").unwrap().get(), 12);
        assert!(matches!(
            parse_playlist_id("recital"),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Gymnopédie", 20), "Gymnopédie");
        assert_eq!(truncate("Gymnopédie", 5), "Gymn…");
    }
}
