// ── Runtime connection configuration ──
//
// These types describe *how* to reach the backend and who to sign in as.
// They carry credential data and tuning but never touch disk; the CLI
// builds a `HubConfig` (usually through sheetly-config) and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Fixed wait before a like/unlike completes, for perceived pacing.
pub const DEFAULT_LIKE_PACING: Duration = Duration::from_millis(400);

/// Email + password for the backend's password grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default for the hosted backend.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed local stacks).
    DangerAcceptInvalid,
}

/// Configuration for one backend project.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Project URL (e.g., `https://abc.supabase.co`).
    pub url: Url,
    /// Public anon key sent as `apikey` on every request.
    pub anon_key: SecretString,
    /// Sign-in credentials. `None` = anonymous (catalog reads only).
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Delay applied by `LikeToggle` before each like/unlike.
    pub like_pacing: Duration,
}

impl HubConfig {
    /// Config with default tuning for the given project.
    pub fn new(url: Url, anon_key: SecretString) -> Self {
        Self {
            url,
            anon_key,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            like_pacing: DEFAULT_LIKE_PACING,
        }
    }

    /// Attach sign-in credentials.
    pub fn with_credentials(mut self, email: impl Into<String>, password: SecretString) -> Self {
        self.credentials = Some(Credentials {
            email: email.into(),
            password,
        });
        self
    }
}
