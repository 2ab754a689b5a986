// ── Core error types ──
//
// User-facing errors from sheetly-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<sheetly_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Postgres SQLSTATE for `foreign_key_violation` (like for a missing sheet).
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Sheet not found: {id}")]
    SheetNotFound { id: String },

    #[error("Playlist not found: {id}")]
    PlaylistNotFound { id: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Backend error: {message}")]
    Api {
        message: String,
        /// Backend error code (SQLSTATE or REST-layer code such as `PGRST116`).
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` when the caller has to sign in (again) first.
    pub fn needs_sign_in(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::AuthenticationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sheetly_api::Error> for CoreError {
    fn from(err: sheetly_api::Error) -> Self {
        match err {
            sheetly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            sheetly_api::Error::NotAuthenticated => CoreError::NotAuthenticated,
            sheetly_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- sign in again".into(),
            },
            sheetly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            sheetly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sheetly_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            sheetly_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            sheetly_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            sheetly_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
