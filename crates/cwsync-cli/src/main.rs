use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cwsync_cli::cli::{default_config_path, run, CliCommand, CliConfig};
use cwsync_core::tracing_setup::init_tracing;

#[derive(Parser)]
#[command(name = "cwsync")]
#[command(about = "Incremental chat sync client")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (credentials, sync settings)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll continuously and print new chats as JSON lines
    Watch,

    /// Run one poll cycle
    Poll,

    /// List rooms
    Rooms,

    /// Look up people by account id
    People {
        /// Account ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Send a message to a room
    Send {
        /// Room id
        room_id: String,
        /// Message text
        text: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = match CliConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let command = match cli.command {
        Commands::Watch => CliCommand::Watch,
        Commands::Poll => CliCommand::Poll,
        Commands::Rooms => CliCommand::Rooms,
        Commands::People { ids } => CliCommand::People { ids },
        Commands::Send { room_id, text } => CliCommand::Send { room_id, text },
    };

    if let Err(e) = run(command, config, cli.pretty) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
