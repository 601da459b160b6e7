use anyhow::Context;
use clap::{Parser, Subcommand};
use connect_api::{handlers::AppState, ApiServer};
use connect_config::{AppConfig, LoggingConfig};
use connect_core::{ConnectBackendFactory, ConnectFacade};
use connect_rest::RestBackendFactory;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "connect-cli")]
#[command(about = "Kafka Connect control plane CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the control plane API
    Start {
        /// Path to configuration directory
        #[arg(short, long, default_value = "config")]
        config_dir: String,
    },

    /// Validate configuration files
    Validate {
        /// Path to configuration directory
        #[arg(short, long, default_value = "config")]
        config_dir: String,
    },
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().try_init().map_err(|e| anyhow::anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}

/// Check the configuration and build every backend without contacting any worker
fn validate_config(
    app_config: &AppConfig,
    factory: &dyn ConnectBackendFactory,
) -> anyhow::Result<()> {
    app_config.validate()?;

    println!("✓ Configuration is valid");
    println!("\n📦 Clusters: {}", app_config.clusters.len());
    for cluster in &app_config.clusters {
        println!("  • {} ({} connect(s))", cluster.id, cluster.connects.len());
        for connect in &cluster.connects {
            let auth = if connect.basic_auth_username.is_some() {
                " [basic auth]"
            } else {
                ""
            };
            println!("    - {} → {}{}", connect.id, connect.url, auth);
        }
    }

    // Catches anything the backend itself refuses
    app_config
        .build_registry(factory)
        .context("failed to create backends")?;
    println!("\n✓ Backends created");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_dir } => {
            // Load app config from files and environment variables
            let app_config = AppConfig::load(&config_dir)?;
            init_tracing(&app_config.logging)?;

            info!("Starting control plane with config directory: {}", config_dir);

            let factory = RestBackendFactory;
            info!("Using backend: {}", factory.name());

            let registry = app_config.build_registry(&factory)?;
            for cluster_id in registry.list_clusters() {
                let connects = registry.resolve_cluster(&cluster_id)?.connect_ids().len();
                info!("Cluster '{}' with {} connect(s)", cluster_id, connects);
            }

            let facade = Arc::new(ConnectFacade::new(registry));
            let app_state = AppState::new(facade);

            // Start API server
            let api_config = app_config.api.clone();
            let server = ApiServer::new(
                api_config.host,
                api_config.port,
                api_config.cors_enabled,
                app_state,
            );

            info!(
                "API server available at http://{}:{}",
                app_config.api.host, app_config.api.port
            );

            // Wait for API server or shutdown signal
            tokio::select! {
                res = server.run() => {
                    if let Err(e) = res {
                        error!("API server error: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down control plane...");
                }
            }
        }

        Commands::Validate { config_dir } => {
            let app_config = AppConfig::load(&config_dir)?;

            if let Err(e) = validate_config(&app_config, &RestBackendFactory) {
                println!("✗ Configuration is invalid: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
