//! Profile management commands

use anyhow::{Context, Result};

use sd_core::ServerProfile;

use crate::context::AppContext;
use crate::output::{format_profile, format_profiles, print_info, print_success};

/// Fields supplied to `edit`; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: Option<bool>,
    pub description: Option<String>,
    pub namespace: Option<String>,
    pub path_prefix: Option<String>,
}

impl ProfileChanges {
    /// Apply the changes on top of `current`
    ///
    /// An omitted password leaves the field empty, which the store reads as
    /// "keep the stored secret". An empty string for an optional text field
    /// clears it.
    pub fn apply(self, current: ServerProfile) -> ServerProfile {
        fn optional(change: Option<String>, current: Option<String>) -> Option<String> {
            match change {
                Some(value) if value.is_empty() => None,
                Some(value) => Some(value),
                None => current,
            }
        }

        ServerProfile {
            name: self.name.unwrap_or(current.name),
            hostname: self.hostname.unwrap_or(current.hostname),
            port: self.port.unwrap_or(current.port),
            username: self.username.unwrap_or(current.username),
            use_tls: self.use_tls.unwrap_or(current.use_tls),
            password: self.password.unwrap_or_default(),
            description: optional(self.description, current.description),
            namespace: optional(self.namespace, current.namespace),
            path_prefix: optional(self.path_prefix, current.path_prefix),
        }
    }
}

/// Print every stored profile
pub fn list_command(ctx: &AppContext, long: bool) -> Result<()> {
    let profiles = ctx.store.read().list_profiles();
    println!("{}", format_profiles(&profiles, long));
    Ok(())
}

/// Print one profile, as text or JSON
pub fn show_command(ctx: &AppContext, name: &str, json: bool) -> Result<()> {
    let store = ctx.store.read();
    let profile = store
        .get_profile(name)
        .with_context(|| format!("Server '{}' not found", name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        let has_password = !store.get_decrypted_secret(name).is_empty();
        println!("{}", format_profile(&profile, has_password));
    }
    Ok(())
}

/// Store a new profile
pub fn add_command(ctx: &AppContext, profile: ServerProfile) -> Result<()> {
    let name = profile.name.clone();
    if profile.password.is_empty() {
        print_info("No password given; connections will fail until one is set with 'serverdeck edit'");
    }

    ctx.store
        .write()
        .save_profile(profile)
        .with_context(|| format!("Failed to add server '{}'", name))?;

    print_success(&format!("Added server '{}'", name));
    Ok(())
}

/// Change an existing profile, possibly renaming it
pub fn edit_command(ctx: &AppContext, old_name: &str, changes: ProfileChanges) -> Result<()> {
    let mut store = ctx.store.write();
    let current = store
        .get_profile(old_name)
        .with_context(|| format!("Server '{}' not found", old_name))?;

    let updated = changes.apply(current);
    let new_name = updated.name.clone();

    store
        .update_profile(old_name, updated)
        .with_context(|| format!("Failed to update server '{}'", old_name))?;

    if new_name != old_name {
        print_success(&format!("Renamed server '{}' to '{}'", old_name, new_name));
    } else {
        print_success(&format!("Updated server '{}'", new_name));
    }
    Ok(())
}

/// Delete a profile
pub fn remove_command(ctx: &AppContext, name: &str) -> Result<()> {
    ctx.store
        .write()
        .delete_profile(name)
        .with_context(|| format!("Failed to remove server '{}'", name))?;

    print_success(&format!("Removed server '{}'", name));
    Ok(())
}
