use bazaar_core::util::is_http_url;

use crate::cli::ConfigCommands;
use crate::config_profiles::{
    normalize_text_option, remote_config_from_env, CliProfile, CliProfilesConfig,
};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            remote_url,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            remote_url,
            no_activate,
        ),
        ConfigCommands::Show { profile } => run_config_show(profile.as_deref().or(global_profile)),
    }
}

/// Create or update a profile, then save it. Explicit values win over
/// `BAZAAR_REMOTE_URL`, which wins over what the profile already had.
pub fn run_config_init(
    profile_name: Option<&str>,
    remote_url: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load()?;
    let profile_name = apply_config_init(&mut config, profile_name, remote_url, no_activate)?;

    let path = config.save()?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let has_url = config
        .profile(&profile_name)
        .is_some_and(|profile| profile.remote_url.is_some());
    if !has_url {
        println!("Profile '{profile_name}' is missing: remote_url");
    } else if remote_config_from_env().auth_token.is_none() {
        println!("Set BAZAAR_REMOTE_TOKEN to enable remote bookmarks.");
    } else {
        println!("Remote bookmarks are ready. Run `bazaar sync`.");
    }

    Ok(())
}

pub fn apply_config_init(
    config: &mut CliProfilesConfig,
    profile_name: Option<&str>,
    remote_url: Option<String>,
    no_activate: bool,
) -> Result<String, CliError> {
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged_remote_url = normalize_text_option(remote_url)
        .or_else(|| remote_config_from_env().base_url)
        .or(existing_profile.remote_url);

    let profile = config.profile_mut_or_default(&profile_name);
    if let Some(value) = merged_remote_url {
        profile.remote_url = Some(value.trim_end_matches('/').to_string());
    }
    validate_profile_urls(profile)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load()?;
    let name = config.resolve_profile_name(profile_name);
    let remote = config.remote_config(Some(name.as_str()));

    println!("Profile: {name}");
    println!(
        "Remote URL: {}",
        remote.base_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "Remote token: {}",
        if remote.auth_token.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    Ok(())
}

pub fn validate_profile_urls(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.remote_url.as_deref() {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "remote_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}
