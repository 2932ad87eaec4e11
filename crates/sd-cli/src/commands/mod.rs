//! CLI command implementations

mod config;
mod connect;
mod profile;

pub use config::{config_init, config_path, config_show};
pub use connect::connect_command;
pub use profile::{
    add_command, edit_command, list_command, remove_command, show_command, ProfileChanges,
};
