//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sheetly_config::ConfigError;
use sheetly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(sheetly::connection_failed),
        help(
            "Check the project URL and your network connection.\n\
             For a local stack with a self-signed certificate, try --insecure (-k)."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(sheetly::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(sheetly::auth_failed),
        help(
            "Verify the email and password of the active profile.\n\
             Update the password with: sheetly config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("This command needs a signed-in user")]
    #[diagnostic(
        code(sheetly::not_signed_in),
        help(
            "Set an email on the profile (sheetly config set email you@example.com)\n\
             or pass --email, and provide a password via SHEETLY_PASSWORD or the keyring."
        )
    )]
    NotSignedIn,

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(sheetly::no_credentials),
        help(
            "Store one with: sheetly config set-password --profile {profile}\n\
             Or set the SHEETLY_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("No anon key configured for profile '{profile}'")]
    #[diagnostic(
        code(sheetly::no_anon_key),
        help(
            "Find it in your project's API settings, then run:\n\
             sheetly config set anon_key <key>   (or pass --anon-key)"
        )
    )]
    NoAnonKey { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(sheetly::not_found),
        help("Run: sheetly {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Likes ────────────────────────────────────────────────────────
    #[error("Could not update like on '{sheet_id}': {message}")]
    #[diagnostic(code(sheetly::like_failed), help("Your favorites were left unchanged."))]
    LikeFailed { sheet_id: String, message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Backend error ({code}): {message}")]
    #[diagnostic(code(sheetly::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sheetly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sheetly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: sheetly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(sheetly::no_config),
        help(
            "Create a profile with: sheetly config init\n\
             Expected at: {path}\n\
             Or pass --url and --anon-key."
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(sheetly::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. }
            | Self::NotSignedIn
            | Self::NoCredentials { .. }
            | Self::NoAnonKey { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::NotAuthenticated => CliError::NotSignedIn,
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::SheetNotFound { id } => CliError::NotFound {
                resource_type: "sheet".into(),
                identifier: id,
                list_command: "sheets list".into(),
            },
            CoreError::PlaylistNotFound { id } => CliError::NotFound {
                resource_type: "playlist".into(),
                identifier: id,
                list_command: "playlists list".into(),
            },
            CoreError::Validation { field, message } => CliError::Validation {
                field,
                reason: message,
            },
            CoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                code: code
                    .or_else(|| status.map(|s| format!("HTTP {s}")))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Cancelled => CliError::ApiError {
                code: "cancelled".into(),
                message: "operation cancelled".into(),
            },
            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::NoAnonKey { profile } => CliError::NoAnonKey { profile },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let not_found = CliError::from(CoreError::SheetNotFound {
            id: "sheet-9".into(),
        });
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let playlist = CliError::from(CoreError::PlaylistNotFound { id: "7".into() });
        assert_eq!(playlist.exit_code(), exit_code::NOT_FOUND);
        assert!(playlist.to_string().contains("playlist '7'"));

        assert_eq!(
            CliError::from(CoreError::NotAuthenticated).exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(CoreError::Timeout { timeout_secs: 5 }).exit_code(),
            exit_code::TIMEOUT
        );
    }

    #[test]
    fn api_error_falls_back_to_status() {
        let err = CliError::from(CoreError::Api {
            message: "boom".into(),
            code: None,
            status: Some(502),
        });
        assert!(err.to_string().contains("HTTP 502"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
