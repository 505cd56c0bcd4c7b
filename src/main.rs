use clap::{Parser, Subcommand};
use metadata_discovery::{
    api::{build_router, AppState},
    config::Config,
    namespace::{InMemoryNamespaceStore, NamespaceResolver, NamespaceService},
    search::{DiscoveryRepository, DiscoveryService, EngineClient},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "metadata-discovery")]
#[command(about = "Multi-tenant metadata discovery service", long_about = None)]
struct Cli {
    /// Configuration file, overrides CONFIG_PATH
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Server,

    /// Register the default namespace and bind its aliases, then exit
    Migrate,
}

struct Services {
    state: AppState,
    namespaces: Arc<NamespaceService>,
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "metadata_discovery={},tower_http=info",
            config.observability.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_services(config: &Config) -> anyhow::Result<Services> {
    let client = EngineClient::new(&config.elasticsearch)?;
    match client.info().await {
        Ok(info) => tracing::info!(brokers = %config.elasticsearch.brokers, "Connected to search engine {}", info),
        Err(e) => tracing::warn!(error = %e, "Search engine not reachable at startup"),
    }

    let store = Arc::new(InMemoryNamespaceStore::new());
    let repository = Arc::new(
        DiscoveryRepository::new(client.clone(), &config.elasticsearch)
            .with_directory(store.clone()),
    );
    let discovery = Arc::new(DiscoveryService::new(client, &config.elasticsearch));
    let namespaces = Arc::new(
        NamespaceService::new(store.clone(), repository.clone())
            .with_locks(repository.locks().clone()),
    );
    let resolver = NamespaceResolver::new(store, config.identity.clone());

    Ok(Services {
        state: AppState::new(discovery, repository, namespaces.clone(), resolver),
        namespaces,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config);

    tracing::info!("Starting metadata-discovery v{}", env!("CARGO_PKG_VERSION"));

    let services = build_services(&config).await?;

    match cli.command.unwrap_or(Commands::Server) {
        Commands::Migrate => {
            let id = services.namespaces.migrate_default().await?;
            tracing::info!(namespace_id = %id, "Default namespace migrated");
            Ok(())
        }
        Commands::Server => serve(&config, services).await,
    }
}

async fn serve(config: &Config, services: Services) -> anyhow::Result<()> {
    // The namespace store is in memory, so the default namespace is registered on every start
    if let Err(e) = services.namespaces.migrate_default().await {
        tracing::warn!(error = %e, "Failed to migrate default namespace, continuing");
    }

    let app = build_router(services.state).layer(tower_http::timeout::TimeoutLayer::new(
        Duration::from_secs(config.server.request_timeout_secs),
    ));

    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("HTTP server listening on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
