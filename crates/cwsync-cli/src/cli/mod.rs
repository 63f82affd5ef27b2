pub mod config;
pub mod output;
pub mod runner;

pub use config::{default_config_path, CliConfig};
pub use runner::{run, CliCommand};
