//! Glue between global flags and `sheetly-config`.
//!
//! Profiles, the credential chain and TOML persistence live in
//! `sheetly-config`; this module only turns `GlobalOpts` into overrides
//! and picks the active profile.

use secrecy::SecretString;

use sheetly_config::{Config, Overrides, Profile};
use sheetly_core::HubConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use sheetly_config::{config_path, load_config_or_default, save_config};

/// Profile selected by `--profile`, then the config's default.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

fn overrides(global: &GlobalOpts) -> Overrides {
    Overrides {
        url: global.url.clone(),
        anon_key: global.anon_key.clone().map(SecretString::from),
        email: global.email.clone(),
        insecure: global.insecure,
        timeout: global.timeout,
        like_pacing_ms: global.like_pacing_ms,
    }
}

/// Build a `HubConfig` from the config file, profile, and flag overrides.
pub fn build_hub_config(global: &GlobalOpts) -> Result<HubConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let overrides = overrides(global);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return Ok(sheetly_config::profile_to_hub_config(
            profile,
            &profile_name,
            &cfg.defaults,
            &overrides,
        )?);
    }

    // An explicitly requested profile has to exist
    if global.profile.is_some() && !cfg.profiles.is_empty() {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available.join(", "),
        });
    }

    // No profile: flags and env vars alone
    if overrides.url.is_none() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    Ok(sheetly_config::profile_to_hub_config(
        &Profile::default(),
        &profile_name,
        &cfg.defaults,
        &overrides,
    )?)
}
