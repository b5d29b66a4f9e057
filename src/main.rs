use clap::Parser;
use paypal_ipn_core::adapters::{InMemoryStore, PostgresRepository};
use paypal_ipn_core::cli::{self, Cli, Commands, DbCommands, OrderCommands};
use paypal_ipn_core::config::Config;
use paypal_ipn_core::paypal::PaypalClient;
use paypal_ipn_core::ports::PaymentStore;
use paypal_ipn_core::{create_app, db, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn payment_store(config: &Config) -> anyhow::Result<Arc<dyn PaymentStore>> {
    match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            db::run_migrations(&pool).await?;
            let store: Arc<dyn PaymentStore> = Arc::new(PostgresRepository::new(pool));
            Ok(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            let store: Arc<dyn PaymentStore> = Arc::new(InMemoryStore::new());
            Ok(store)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Order(OrderCommands::Show { reference }) => {
            let store = payment_store(&config).await?;
            cli::handle_order_show(store.as_ref(), &reference).await
        }
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = payment_store(&config).await?;

    let paypal_client = PaypalClient::with_circuit_breaker(
        config.paypal.url_action.to_string(),
        config.paypal_timeout,
        config.paypal_failure_threshold,
        config.paypal_reset_timeout_secs,
    );
    tracing::info!("PayPal client initialized with URL: {}", config.paypal.url_action);

    let state = AppState::new(config.paypal.clone(), paypal_client, store);
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
