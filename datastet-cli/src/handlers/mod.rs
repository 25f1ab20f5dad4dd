//! Command handlers for the Datastet CLI

pub mod config;
pub mod process;
pub mod status;

pub use config::handle_config_command;
pub use process::handle_process_command;
pub use status::handle_status_command;
