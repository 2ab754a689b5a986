//! Config subcommand handlers.

use dialoguer::{Input, Select};

use sheetly_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn save(cfg: &Config) -> Result<std::path::PathBuf, CliError> {
    Ok(config::save_config(cfg)?)
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Store a secret in the keyring, or hand it back for plaintext storage.
fn place_secret(
    profile_name: &str,
    kind: &str,
    label: &str,
    secret: String,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        sheetly_config::store_secret(profile_name, kind, &secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

/// Copy of the config with secrets replaced, safe to print.
fn redacted(cfg: &Config) -> Config {
    let mask = |v: Option<&String>| v.map(|_| "********".to_owned());
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: sheetly_config::Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            timeout: cfg.defaults.timeout,
            like_pacing_ms: cfg.defaults.like_pacing_ms,
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let profile = Profile {
                    anon_key: mask(p.anon_key.as_ref()),
                    password: mask(p.password.as_ref()),
                    ..p.clone()
                };
                (name.clone(), profile)
            })
            .collect(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n# {e}")),
                |_| config::config_path().display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;

            save(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: sheetly config init");
            } else {
                let mut names: Vec<&String> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available_profiles(&cfg),
                });
            }
            cfg.default_profile = Some(name.clone());
            save(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: available_profiles(&cfg),
                });
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            sheetly_config::store_secret(&profile_name, "password", &secret)?;
            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("♪ sheetly configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("Project URL")
        .default("https://your-project.supabase.co".into())
        .validate_with(|v: &String| {
            sheetly_config::parse_url(v)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let anon_key = rpassword::prompt_password("Anon key: ").map_err(prompt_err)?;
    if anon_key.is_empty() {
        return Err(CliError::Validation {
            field: "anon_key".into(),
            reason: "anon key cannot be empty".into(),
        });
    }
    let anon_key = place_secret(&profile_name, "anon-key", "anon key", anon_key)?;

    // Leaving the email blank makes an anonymous, browse-only profile
    let email: String = Input::new()
        .with_prompt("Sign-in email (blank for browse only)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let (email, password) = if email.trim().is_empty() {
        (None, None)
    } else {
        let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
        if pass.is_empty() {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "password cannot be empty".into(),
            });
        }
        let password = place_secret(&profile_name, "password", "password", pass)?;
        (Some(email.trim().to_owned()), password)
    };

    let profile = Profile {
        url,
        anon_key,
        email,
        password,
        ..Profile::default()
    };

    // Keep other profiles when re-running the wizard
    let mut cfg = config::load_config_or_default();
    let mut profiles = std::mem::take(&mut cfg.profiles);
    profiles.insert(profile_name.clone(), profile);
    let cfg = Config {
        default_profile: Some(profile_name.clone()),
        profiles,
        ..cfg
    };

    let path = save(&cfg)?;
    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: sheetly sheets list");
    Ok(())
}

fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "url" => {
            sheetly_config::parse_url(&value)?;
            profile.url = value;
        }
        "anon_key" | "anon-key" => profile.anon_key = Some(value),
        "anon_key_env" | "anon-key-env" => profile.anon_key_env = Some(value),
        "email" => profile.email = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => profile.timeout = Some(parse_number("timeout", "seconds", &value)?),
        "like_pacing_ms" | "like-pacing-ms" => {
            profile.like_pacing_ms = Some(parse_number("like_pacing_ms", "milliseconds", &value)?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, anon_key, anon_key_env, \
                     email, ca_cert, insecure, timeout, like_pacing_ms"
                ),
            });
        }
    }
    Ok(())
}

fn parse_number(field: &str, unit: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be a number ({unit})"),
    })
}
