//! serverdeck CLI
//!
//! Manage named database server profiles with encrypted passwords and test
//! connections to them.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sd_core::ServerProfile;
use serverdeck::commands::{self, ProfileChanges};
use serverdeck::context::AppContext;

#[derive(Parser)]
#[command(name = "serverdeck")]
#[command(author, version, about = "Database server profiles and connection testing")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored server profiles
    #[command(alias = "ls")]
    List {
        /// Show detailed information
        #[arg(short, long)]
        long: bool,
    },

    /// Show one server profile
    Show {
        /// Profile name
        name: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a server profile
    Add {
        /// Unique profile name
        #[arg(short, long)]
        name: String,
        /// Server host name or address
        #[arg(long)]
        host: String,
        /// Web server port
        #[arg(short, long)]
        port: u16,
        /// Login user
        #[arg(short, long)]
        user: String,
        /// Password (stored encrypted)
        #[arg(long, env = "SERVERDECK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Connect over TLS
        #[arg(long)]
        tls: bool,
        #[arg(long)]
        description: Option<String>,
        /// Default namespace
        #[arg(long)]
        namespace: Option<String>,
        /// URL path prefix (for servers behind a shared web gateway)
        #[arg(long)]
        path_prefix: Option<String>,
    },

    /// Change a server profile; omitted fields keep their current values
    Edit {
        /// Current profile name
        old_name: String,
        /// New profile name
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        #[arg(short, long)]
        user: Option<String>,
        /// New password (omit to keep the stored one)
        #[arg(long, env = "SERVERDECK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Connect over TLS
        #[arg(long, conflicts_with = "no_tls")]
        tls: bool,
        /// Connect without TLS
        #[arg(long)]
        no_tls: bool,
        /// Description (empty string clears it)
        #[arg(long)]
        description: Option<String>,
        /// Namespace (empty string clears it)
        #[arg(long)]
        namespace: Option<String>,
        /// Path prefix (empty string clears it)
        #[arg(long)]
        path_prefix: Option<String>,
    },

    /// Remove a server profile
    #[command(alias = "rm")]
    Remove {
        /// Profile name
        name: String,
    },

    /// Test the connection to a server (Ctrl-C cancels)
    Connect {
        /// Profile name
        name: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli.config.as_deref();

    // Commands that never touch the store
    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Path => {
                commands::config_path(config_path);
                return Ok(());
            }
            ConfigAction::Init { force } => return commands::config_init(config_path, *force),
            ConfigAction::Show => {}
        }
    }

    let ctx = AppContext::load(config_path)?;

    match cli.command {
        Commands::List { long } => commands::list_command(&ctx, long)?,

        Commands::Show { name, json } => commands::show_command(&ctx, &name, json)?,

        Commands::Add {
            name,
            host,
            port,
            user,
            password,
            tls,
            description,
            namespace,
            path_prefix,
        } => {
            let mut profile = ServerProfile::new(name, host, port, user)
                .with_password(password.unwrap_or_default())
                .with_tls(tls);
            profile.description = description;
            profile.namespace = namespace;
            profile.path_prefix = path_prefix;
            commands::add_command(&ctx, profile)?;
        }

        Commands::Edit {
            old_name,
            name,
            host,
            port,
            user,
            password,
            tls,
            no_tls,
            description,
            namespace,
            path_prefix,
        } => {
            let use_tls = match (tls, no_tls) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let changes = ProfileChanges {
                name,
                hostname: host,
                port,
                username: user,
                password,
                use_tls,
                description,
                namespace,
                path_prefix,
            };
            commands::edit_command(&ctx, &old_name, changes)?;
        }

        Commands::Remove { name } => commands::remove_command(&ctx, &name)?,

        Commands::Connect { name } => commands::connect_command(&ctx, &name).await?,

        Commands::Config { .. } => commands::config_show(&ctx)?,
    }

    Ok(())
}
