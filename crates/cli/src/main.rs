use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use db::{Catalog, ResourceRepository, StateRepository, StatusStore};
use server::config::{AppConfig, CONFIG_FILE};
use server::{create_router, state::AppState};
use shard_core::{parse_create, StatusKey, StatusRecord};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shard-coordinator")]
#[command(about = "Coordinated creation of sharded resources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init,
    /// Run the HTTP server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one create statement in-process and wait for it
    Create { query: String },
    /// Print the catalog entry and status record of a resource
    Status { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Init) => init(&cli.config).await,
        Some(Commands::Serve { port }) => serve(&cli.config, port).await,
        Some(Commands::Create { query }) => create(&cli.config, &query).await,
        Some(Commands::Status { name }) => status(&cli.config, &name).await,
        None => serve(&cli.config, None).await,
    }
}

async fn init(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    let config = AppConfig::default();
    config
        .write(config_path)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    connect(&config).await?;

    println!("Initialized shard coordinator");
    println!();
    println!("  Config:    {}", config_path.display());
    println!("  Database:  {}", config.database.url);
    println!();
    println!("Run 'shard-coordinator serve' to start the server");

    Ok(())
}

async fn serve(config_path: &Path, port: Option<u16>) -> Result<()> {
    let mut config = AppConfig::load(config_path).await;
    if let Some(port) = port {
        config.server.port = port;
    }

    let pool = connect(&config).await?;
    let state = AppState::new(pool, &config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        timeout_secs = config.coordinator.timeout_secs,
        local_fulfillment = config.fulfillment.local,
        "Shard coordinator listening"
    );
    println!("  API Server:  http://{}", config.bind_addr());
    println!("  Swagger UI:  http://{}/swagger-ui", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn create(config_path: &Path, query: &str) -> Result<()> {
    let config = AppConfig::load(config_path).await;
    let intent = parse_create(query)?;

    let pool = connect(&config).await?;
    let state = AppState::new(pool, &config);

    match state.coordinator.execute(intent).await.into_result() {
        Ok(result) => {
            println!("{}", result);
            Ok(())
        }
        Err(message) => bail!(message),
    }
}

async fn status(config_path: &Path, name: &str) -> Result<()> {
    let config = AppConfig::load(config_path).await;
    let pool = connect(&config).await?;

    let catalog = ResourceRepository::new(pool.clone());
    let store = StateRepository::new(pool);

    match catalog.describe(name).await? {
        Some(descriptor) => println!("{}", descriptor.definition()),
        None => println!("Resource '{}' is not registered", name),
    }

    let key = StatusKey::for_resource(name);
    let raw = store.get(key.as_str()).await?;
    let record = StatusRecord::from_stored(raw.as_deref());
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

async fn connect(config: &AppConfig) -> Result<db::SqlitePool> {
    let pool = db::create_pool(&config.database.url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    db::run_migrations(&pool).await?;
    Ok(pool)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shard_coordinator=info,server=info,coordinator=info,tower_http=info".into()
            }),
        )
        .init();
}
