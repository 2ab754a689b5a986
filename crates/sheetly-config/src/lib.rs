//! Configuration for the sheetly CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext) and
//! translation to `sheetly_core::HubConfig`. Core never reads files; the
//! CLI layers its flag overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use sheetly_core::{HubConfig, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/password` and
/// `{profile}/anon-key`.
pub const KEYRING_SERVICE: &str = "sheetly";

/// Environment variable consulted first for the sign-in password.
pub const PASSWORD_ENV: &str = "SHEETLY_PASSWORD";

/// Environment variable consulted when a profile has no email set.
pub const EMAIL_ENV: &str = "SHEETLY_EMAIL";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("no anon key configured for profile '{profile}'")]
    NoAnonKey { profile: String },

    #[error("keyring unavailable: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Delay before a like/unlike completes, in milliseconds.
    #[serde(default = "default_like_pacing_ms")]
    pub like_pacing_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            like_pacing_ms: default_like_pacing_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_like_pacing_ms() -> u64 {
    400
}

/// A named backend project profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Project URL (e.g., "https://abc.supabase.co").
    pub url: String,

    /// Public anon key (plaintext is fine, it ships in every client).
    pub anon_key: Option<String>,

    /// Environment variable name containing the anon key.
    pub anon_key_env: Option<String>,

    /// Sign-in email. Without one, only the public catalog is readable.
    pub email: Option<String>,

    /// Sign-in password (plaintext -- prefer keyring).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates (local stacks).
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override like pacing delay.
    pub like_pacing_ms: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sheetly", "sheetly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sheetly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered over defaults and under
/// `SHEETLY_`-prefixed env vars (`__` separates nested keys, e.g.
/// `SHEETLY_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SHEETLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, falling back to defaults if it is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_secret(profile_name: &str, kind: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}")).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

/// Store a secret (`password` or `anon-key`) in the system keyring.
pub fn store_secret(profile_name: &str, kind: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}"))?;
    entry.set_password(secret)?;
    Ok(())
}

/// Resolve the anon key from the credential chain.
pub fn resolve_anon_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's anon_key_env → env var lookup
    if let Some(ref env_name) = profile.anon_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring_secret(profile_name, "anon-key") {
        return Ok(secret);
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.anon_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoAnonKey {
        profile: profile_name.into(),
    })
}

/// Resolve the sign-in password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Some(pw) = keyring_secret(profile_name, "password") {
        return Ok(pw);
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve sign-in credentials. `Ok(None)` means the profile is anonymous
/// (no email anywhere); an email without a password is an error.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<(String, SecretString)>, ConfigError> {
    let Some(email) = profile
        .email
        .clone()
        .or_else(|| std::env::var(EMAIL_ENV).ok())
    else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name)?;
    Ok(Some((email, password)))
}

/// Values that take precedence over the profile (CLI flags).
#[derive(Debug, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub anon_key: Option<SecretString>,
    pub email: Option<String>,
    pub insecure: bool,
    pub timeout: Option<u64>,
    pub like_pacing_ms: Option<u64>,
}

/// Build a `HubConfig` from a profile, applying `overrides` on top.
pub fn profile_to_hub_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    overrides: &Overrides,
) -> Result<HubConfig, ConfigError> {
    let url = parse_url(overrides.url.as_deref().unwrap_or(&profile.url))?;
    let anon_key = match overrides.anon_key {
        Some(ref key) => key.clone(),
        None => resolve_anon_key(profile, profile_name)?,
    };

    let credentials = match overrides.email {
        Some(ref email) => Some((email.clone(), resolve_password(profile, profile_name)?)),
        None => resolve_credentials(profile, profile_name)?,
    };

    let mut config = HubConfig::new(url, anon_key);
    if let Some((email, password)) = credentials {
        config = config.with_credentials(email, password);
    }

    config.tls = if overrides.insecure || profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    let timeout = overrides.timeout.or(profile.timeout).unwrap_or(defaults.timeout);
    config.timeout = Duration::from_secs(timeout);
    let pacing = overrides
        .like_pacing_ms
        .or(profile.like_pacing_ms)
        .unwrap_or(defaults.like_pacing_ms);
    config.like_pacing = Duration::from_millis(pacing);

    debug!(
        profile = profile_name,
        url = %config.url,
        signed_in = config.credentials.is_some(),
        "resolved hub config"
    );
    Ok(config)
}

/// Parse a project URL, requiring http(s).
pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    let invalid = || ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    };
    let url: url::Url = raw.trim().parse().map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
timeout = 10

[profiles.home]
url = "https://abc.supabase.co"
anon_key = "anon-123"
email = "ana@example.com"
password = "hunter2"
like_pacing_ms = 0

[profiles.local]
url = "http://localhost:54321"
anon_key = "anon-local"
insecure = true
"#;

    fn write_sample() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_profiles_over_defaults() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("home"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.defaults.like_pacing_ms, 400);
        assert_eq!(cfg.profiles.len(), 2);
        assert_eq!(cfg.profiles["local"].insecure, Some(true));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    }

    #[test]
    fn save_then_load_keeps_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "https://abc.supabase.co".into(),
                anon_key_env: Some("MY_ANON_KEY".into()),
                ..Profile::default()
            },
        );

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        let profile = &loaded.profiles["default"];
        assert_eq!(profile.url, "https://abc.supabase.co");
        assert_eq!(profile.anon_key_env.as_deref(), Some("MY_ANON_KEY"));
        assert_eq!(profile.email, None);
    }

    #[test]
    fn profile_translates_to_hub_config() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        let hub = profile_to_hub_config(
            &cfg.profiles["local"],
            "local",
            &cfg.defaults,
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(hub.url.as_str(), "http://localhost:54321/");
        assert_eq!(hub.anon_key.expose_secret(), "anon-local");
        assert_eq!(hub.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(hub.timeout, Duration::from_secs(10));
        assert_eq!(hub.like_pacing, Duration::from_millis(400));
    }

    #[test]
    fn profile_overrides_pacing() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        let hub = profile_to_hub_config(
            &cfg.profiles["home"],
            "home",
            &cfg.defaults,
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(hub.like_pacing, Duration::ZERO);
        assert!(hub.credentials.is_some());
    }

    #[test]
    fn overrides_win_over_profile() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();
        let overrides = Overrides {
            url: Some("http://127.0.0.1:9999".into()),
            anon_key: Some(SecretString::from("flag-key".to_string())),
            timeout: Some(3),
            like_pacing_ms: Some(50),
            ..Overrides::default()
        };

        let hub = profile_to_hub_config(&cfg.profiles["local"], "local", &cfg.defaults, &overrides)
            .unwrap();
        assert_eq!(hub.url.as_str(), "http://127.0.0.1:9999/");
        assert_eq!(hub.anon_key.expose_secret(), "flag-key");
        assert_eq!(hub.timeout, Duration::from_secs(3));
        assert_eq!(hub.like_pacing, Duration::from_millis(50));
    }

    #[test]
    fn missing_anon_key_is_reported() {
        let profile = Profile {
            url: "https://abc.supabase.co".into(),
            ..Profile::default()
        };
        let err = resolve_anon_key(&profile, "sheetly-test-no-key").unwrap_err();
        assert!(matches!(err, ConfigError::NoAnonKey { .. }));
    }

    #[test]
    fn bad_urls_are_rejected() {
        assert!(parse_url("not a url").is_err());
        assert!(parse_url("ftp://abc.supabase.co").is_err());
        assert!(parse_url(" https://abc.supabase.co ").is_ok());
    }
}
