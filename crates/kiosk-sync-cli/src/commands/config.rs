use kiosk_sync_core::util::{is_http_url, normalize_text_option};
use kiosk_sync_core::SyncSettings;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::commands::common::read_piped_stdin;
use crate::config_profiles::CliProfilesConfig;
use crate::credentials::{resolve_access_key, AccessKeyStore};
use crate::error::CliError;

/// Explicit values from `config init`; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub server_address: Option<String>,
    pub username: Option<String>,
    pub auto_sync: Option<bool>,
    pub sync_period_minutes: Option<u64>,
    pub concurrency: Option<usize>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    profile: &'a str,
    #[serde(flatten)]
    settings: &'a SyncSettings,
    access_key_configured: bool,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            server_address,
            username,
            auto_sync,
            sync_period_minutes,
            concurrency,
            timeout_ms,
            no_activate,
        } => run_config_init(
            global_profile,
            ProfileUpdate {
                server_address,
                username,
                auto_sync,
                sync_period_minutes,
                concurrency,
                timeout_ms,
            },
            no_activate,
        ),
        ConfigCommands::Show { json } => run_config_show(global_profile, json),
        ConfigCommands::SetAccessKey { access_key } => {
            run_set_access_key(global_profile, access_key)
        }
        ConfigCommands::ClearAccessKey => run_clear_access_key(global_profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    update: ProfileUpdate,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let settings = config.profile_mut_or_default(&profile_name);
    *settings = apply_profile_update(settings.clone(), update)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let settings = config
        .profile(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let mut missing_fields = Vec::new();
    if settings.server_address.is_none() {
        missing_fields.push("server_address");
    }
    if settings.username.is_none() {
        missing_fields.push("username");
    }
    if resolve_access_key(&profile_name)?.is_none() {
        missing_fields.push("access_key");
    }
    if missing_fields.is_empty() {
        println!("Profile '{profile_name}' is ready. Run `kiosk-sync sync` to deliver votings.");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

pub fn apply_profile_update(
    mut settings: SyncSettings,
    update: ProfileUpdate,
) -> Result<SyncSettings, CliError> {
    if let Some(address) = normalize_text_option(update.server_address) {
        if address.contains("://") && !is_http_url(&address) {
            return Err(CliError::Config(
                "server_address must use http:// or https://".to_string(),
            ));
        }
        settings.server_address = Some(address);
    }
    if let Some(username) = normalize_text_option(update.username) {
        settings.username = Some(username);
    }
    if let Some(auto_sync) = update.auto_sync {
        settings.auto_sync = auto_sync;
    }
    if let Some(minutes) = update.sync_period_minutes {
        if minutes == 0 {
            return Err(CliError::Config(
                "sync_period_minutes must be at least 1".to_string(),
            ));
        }
        settings.sync_period_minutes = minutes;
    }
    if let Some(concurrency) = update.concurrency {
        settings.concurrency = concurrency;
    }
    if let Some(timeout_ms) = update.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    Ok(settings.normalize())
}

fn run_config_show(global_profile: Option<&str>, as_json: bool) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let settings = config.profile(&profile_name).cloned().unwrap_or_default();
    let access_key_configured = resolve_access_key(&profile_name)?.is_some();

    if as_json {
        let view = ProfileView {
            profile: &profile_name,
            settings: &settings,
            access_key_configured,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("profile:             {profile_name}");
    println!(
        "server_address:      {}",
        settings.server_address.as_deref().unwrap_or("-")
    );
    println!(
        "username:            {}",
        settings.username.as_deref().unwrap_or("-")
    );
    println!("auto_sync:           {}", settings.auto_sync);
    println!("sync_period_minutes: {}", settings.sync_period_minutes);
    println!("concurrency:         {}", settings.concurrency);
    println!("timeout_ms:          {}", settings.timeout_ms);
    println!(
        "access_key:          {}",
        if access_key_configured { "configured" } else { "missing" }
    );
    Ok(())
}

fn run_set_access_key(
    global_profile: Option<&str>,
    access_key: Option<String>,
) -> Result<(), CliError> {
    let access_key = match normalize_text_option(access_key) {
        Some(key) => key,
        None => read_piped_stdin()?.ok_or(CliError::EmptyAccessKey)?,
    };

    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    AccessKeyStore::new(&profile_name).save(&access_key)?;
    println!("Access key stored for profile '{profile_name}'");
    Ok(())
}

fn run_clear_access_key(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    AccessKeyStore::new(&profile_name).clear()?;
    println!("Access key cleared for profile '{profile_name}'");
    Ok(())
}
