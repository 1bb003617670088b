use anyhow::Result;
use clap::{Parser, Subcommand};
use contactdir_api::Server;
use contactdir_core::{ConfigManager, ServiceDirectory, Settings};
use std::path::PathBuf;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[derive(Parser)]
#[command(name = "contactdir")]
#[command(about = "Ordered directory of contact microservices over HTTP", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration directory (default: ~/.contactdir, ./config, or cwd)
    #[arg(long, global = true, env = "CONTACTDIR_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Environment name selecting <env>.toml overrides
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Listen host, overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the seeded directory as JSON and exit
    List,

    /// Print the JSON schema of the settings file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Schema) = cli.command {
        println!("{}", serde_json::to_string_pretty(&Settings::json_schema())?);
        return Ok(());
    }

    let filter = init_tracing("info");
    let mut settings = ConfigManager::load(cli.config_dir, cli.env)?;
    filter.reload(log_filter(&settings.logging.level))?;

    match cli.command {
        Some(Commands::List) => {
            let directory = ServiceDirectory::from_config(&settings.directory)?;
            println!("{}", serde_json::to_string_pretty(&directory.to_sequence())?);
            Ok(())
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            Server::new(settings)?.run().await
        }
        Some(Commands::Schema) | None => Server::new(settings)?.run().await,
    }
}

/// Install the subscriber; the returned handle swaps in the configured level.
fn init_tracing(level: &str) -> FilterHandle {
    let (filter, handle) = reload::Layer::new(log_filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    handle
}

/// `RUST_LOG` wins over the configured level.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(level).into())
}

fn default_directives(level: &str) -> String {
    format!(
        "contactdir_api={level},contactdir_core={level},tower_http=debug",
        level = level
    )
}
