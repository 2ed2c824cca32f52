use std::path::PathBuf;

use photosync::config::{ConfigFile, expand_with_home, resolve_config_path};
use photosync::console::ConsoleSink;
use photosync::sync::{SyncEngine, SyncError};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "photosync=info,photosync_core=info";

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Run {
        config: Option<String>,
        destination: Option<String>,
    },
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut destination = None;
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliMode::Help),
            "--config" => match args.next() {
                Some(path) => config = Some(path),
                None => anyhow::bail!("--config requires a path"),
            },
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => {
                if destination.is_some() {
                    anyhow::bail!("unexpected extra argument: {other}");
                }
                destination = Some(other.to_string());
            }
        }
    }
    Ok(CliMode::Run {
        config,
        destination,
    })
}

fn print_help() {
    println!("Usage: photosync [--config <path>] [<destination-dir>]");
    println!("  --config <path>   Endpoint config file (default: $PHOTOSYNC_CONFIG or ./photosync.toml)");
    println!("  <destination-dir> Directory that receives new folders (default: current directory)");
    println!("  -h, --help        Show this help");
    println!();
    println!("Config file (TOML):");
    println!("  [urls]");
    println!("  folders = \"...\"      folder list endpoint");
    println!("  photos = \"...\"       photo list prefix, folder id is appended");
    println!("  remove_old = \"...\"   cleanup endpoint, requested last");
    println!("  [http] accept_invalid_certs = true|false, user_agent = \"...\" (optional)");
    println!();
    println!("Migrating from google_drive_sync.ini: rename the [URLS] group to [urls] and");
    println!("quote each value; folders, photos and remove_old keep their names.");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let (config, destination) = match parse_cli_mode(std::env::args())? {
        CliMode::Help => {
            print_help();
            return Ok(());
        }
        CliMode::Run {
            config,
            destination,
        } => (config, destination),
    };

    let config_path = resolve_config_path(config.as_deref());
    let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    let destination = match destination {
        Some(value) => expand_with_home(&value, &home),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    tracing::info!(
        config = %config_path.display(),
        destination = %destination.display(),
        "starting sync"
    );

    let engine = SyncEngine::new(ConfigFile::new(config_path));
    match engine.run(&destination, &ConsoleSink).await {
        Ok(_) => Ok(()),
        Err(SyncError::AlreadyRunning) => Err(SyncError::AlreadyRunning.into()),
        // ConsoleSink has already printed the failure.
        Err(_) => std::process::exit(1),
    }
}
