mod db_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    storefront_config::StorefrontConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "storefront", about = "Storefront: GraphQL blog and shop backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Database URL (overrides config value).
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,
    /// Keep all data in memory instead of SQLite.
    #[arg(long, global = true, default_value_t = false)]
    in_memory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default when no subcommand is provided).
    Serve,
    /// Print the GraphQL schema in SDL form.
    Schema,
    /// Database management (migrate, seed).
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Config file (explicit or discovered) and env overrides, then CLI flags.
fn load_config(cli: &Cli) -> anyhow::Result<StorefrontConfig> {
    let mut config = match &cli.config {
        Some(path) => storefront_config::apply_env_overrides(
            storefront_config::load_config(path)?,
            |name| std::env::var(name).ok(),
        ),
        None => storefront_config::discover_and_load(),
    };

    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = &cli.database_url {
        config.database.url = Some(url.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Schema)) {
        print!("{}", storefront_graphql::schema_sdl());
        return Ok(());
    }

    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "storefront starting");

    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Serve) => {
            let data = storefront_gateway::open_data_source(&config, cli.in_memory).await?;
            storefront_gateway::start_gateway(&config, data).await
        },
        Some(Commands::Schema) => Ok(()),
        Some(Commands::Db { action }) => {
            db_commands::handle_db(action, &config, cli.in_memory).await
        },
    }
}
