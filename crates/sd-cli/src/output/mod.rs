//! Output formatting utilities for the CLI
//!
//! Tables for profile listings, the per-profile detail view, lifecycle
//! event lines, and colored status messages.

use tabled::{
    settings::{Style, Width},
    Table, Tabled,
};

use sd_core::ServerProfile;
use sd_lifecycle::{ConnectionEvent, EventStatus};

/// Format profiles as an ASCII table
///
/// Passwords are never part of the output. With `detailed`, namespace,
/// path prefix and description columns are added.
pub fn format_profiles(profiles: &[ServerProfile], detailed: bool) -> String {
    if profiles.is_empty() {
        return "No servers configured".to_string();
    }

    #[derive(Tabled)]
    struct ProfileRow {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "PORT")]
        port: u16,
        #[tabled(rename = "USER")]
        user: String,
        #[tabled(rename = "TLS")]
        tls: &'static str,
    }

    #[derive(Tabled)]
    struct ProfileRowDetailed {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "URL")]
        url: String,
        #[tabled(rename = "USER")]
        user: String,
        #[tabled(rename = "NAMESPACE")]
        namespace: String,
        #[tabled(rename = "DESCRIPTION")]
        description: String,
    }

    if detailed {
        let rows: Vec<ProfileRowDetailed> = profiles
            .iter()
            .map(|p| ProfileRowDetailed {
                name: p.name.clone(),
                url: p.server_spec().base_url(),
                user: p.username.clone(),
                namespace: dash(p.namespace.as_deref()),
                description: dash(p.description.as_deref()),
            })
            .collect();

        Table::new(rows)
            .with(Style::rounded())
            .with(Width::wrap(120))
            .to_string()
    } else {
        let rows: Vec<ProfileRow> = profiles
            .iter()
            .map(|p| ProfileRow {
                name: p.name.clone(),
                host: p.hostname.clone(),
                port: p.port,
                user: p.username.clone(),
                tls: if p.use_tls { "yes" } else { "no" },
            })
            .collect();

        Table::new(rows).with(Style::rounded()).to_string()
    }
}

/// Format one profile as aligned `key: value` lines
pub fn format_profile(profile: &ServerProfile, has_password: bool) -> String {
    let fields = [
        ("Name", profile.name.clone()),
        ("Host", profile.hostname.clone()),
        ("Port", profile.port.to_string()),
        ("User", profile.username.clone()),
        ("TLS", if profile.use_tls { "yes" } else { "no" }.to_string()),
        ("Password", if has_password { "stored" } else { "none" }.to_string()),
        ("Namespace", dash(profile.namespace.as_deref())),
        ("Path prefix", dash(profile.path_prefix.as_deref())),
        ("Description", dash(profile.description.as_deref())),
        ("URL", profile.server_spec().base_url()),
    ];

    fields
        .iter()
        .map(|(key, value)| format!("{:<12} {}", format!("{}:", key), value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a lifecycle event with the matching style
pub fn print_event(event: &ConnectionEvent) {
    let message = event
        .message
        .clone()
        .unwrap_or_else(|| format!("{} {}", event.status, event.server_name));

    match event.status {
        EventStatus::Connecting => print_info(&message),
        EventStatus::Connected => print_success(&message),
        EventStatus::Cancelled | EventStatus::Disconnected => print_warning(&message),
        EventStatus::Error => print_error(&message),
    }
}

fn dash(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    print_styled(std::io::stdout(), crossterm::style::Color::Green, "✓ ", msg);
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    print_styled(std::io::stderr(), crossterm::style::Color::Red, "✗ ", msg);
}

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
    print_styled(std::io::stderr(), crossterm::style::Color::Yellow, "⚠ ", msg);
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    print_styled(std::io::stdout(), crossterm::style::Color::Cyan, "ℹ ", msg);
}

fn print_styled<W: std::io::Write>(
    mut out: W,
    color: crossterm::style::Color,
    prefix: &str,
    msg: &str,
) {
    use crossterm::style::{Print, ResetColor, SetForegroundColor};

    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(prefix),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
