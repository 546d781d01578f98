use clap::Parser;
use intern_core::{AssistantConfig, LlmClient, Store};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "intern.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience; production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match AssistantConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging
    let level = config
        .service
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    // Open DB
    let store = match Store::connect(&config.database).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    if args.health {
        match intern_core::db::health_check(store.pool()).await {
            Ok(v) => println!("✅ SQLite ready: {} ({})", v, config.database.path),
            Err(e) => {
                println!("❌ SQLite check failed: {}", e);
                std::process::exit(1);
            }
        }

        match store.active_profile().await {
            Ok(Some(p)) => println!("✅ Active profile: {} ({})", p.internship_name, p.vault_root),
            Ok(None) => println!("⚠️  No active profile yet"),
            Err(e) => {
                println!("❌ Profile lookup failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Intern Assistant health check passed");
        return Ok(());
    }

    let llm = LlmClient::from_config(&config.llm)?;

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    if config.housekeeping.enabled {
        let housekeeping_store = store.clone();
        let housekeeping_config = config.housekeeping.clone();
        let housekeeping_shutdown = tx.subscribe();
        tokio::spawn(async move {
            intern_server::housekeeping::run_housekeeping_loop(
                housekeeping_store,
                housekeeping_config,
                housekeeping_shutdown,
            )
            .await;
        });
    }

    intern_server::http::start_http_server(store, config, llm, tx.subscribe()).await?;

    Ok(())
}
