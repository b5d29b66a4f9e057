use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::ports::{OrderRepository, TransactionRepository};

#[derive(Parser)]
#[command(name = "paypal-ipn-core")]
#[command(about = "PayPal IPN receiver and order reconciliation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Order inspection commands
    #[command(subcommand)]
    Order(OrderCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Show an order and every payment notification recorded for it
    Show {
        /// Order reference
        #[arg(value_name = "REFERENCE")]
        reference: String,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let Some(database_url) = config.database_url.as_deref() else {
        anyhow::bail!("DATABASE_URL is not set, nothing to migrate");
    };

    let pool = crate::db::create_pool(database_url).await?;
    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;
    println!("✓ Database migrations completed");

    Ok(())
}

pub async fn handle_order_show<S>(store: &S, reference: &str) -> anyhow::Result<()>
where
    S: OrderRepository + TransactionRepository + ?Sized,
{
    let Some(order) = store.get_by_reference(reference).await? else {
        tracing::warn!("Order {} not found", reference);
        anyhow::bail!("Order {} not found", reference)
    };

    println!("Order {}", order.reference);
    println!("  Total:          {} {}", order.total, order.currency);
    println!("  Status:         {}", display_or_dash(order.status));
    println!("  Payment status: {}", display_or_dash(order.payment_status));
    println!(
        "  Validated at:   {}",
        order
            .validated_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    let history = store.list_for_order(reference).await?;
    if history.is_empty() {
        println!("No payment notifications recorded");
        return Ok(());
    }

    println!();
    println!("{:<38} {:<6} {:<18} {:<20}", "Transaction", "State", "Status", "Received");
    println!("{}", "-".repeat(85));
    for tx in history {
        println!(
            "{:<38} {:<6} {:<18} {:<20}",
            tx.id,
            tx.state.map(|s| s.as_str()).unwrap_or("-"),
            tx.status_code.map(|s| s.as_str()).unwrap_or("-"),
            tx.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!(
        "  Database URL: {}",
        config
            .database_url
            .as_deref()
            .map(mask_password)
            .unwrap_or_else(|| "(none, in-memory store)".to_string())
    );
    println!("  PayPal endpoint: {}", config.paypal.url_action);
    println!("  PayPal account: {}", config.paypal.account);
    println!("  PayPal callback: {}", config.paypal.url_callback);
    println!("  PayPal check secret: ****");
    println!("  PayPal timeout: {}s", config.paypal_timeout.as_secs());

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user_start = slash_pos + 2;
                let user = &url[user_start..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStore;

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://shop:hunter2@db:5432/shop"),
            "postgres://shop:****@db:5432/shop"
        );
        assert_eq!(mask_password("postgres://db/shop"), "postgres://db/shop");
    }

    #[test]
    fn test_cli_parses_order_show() {
        let cli = Cli::try_parse_from(["paypal-ipn-core", "order", "show", "ORD-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Order(OrderCommands::Show { reference })) if reference == "ORD-1"
        ));
    }

    #[test]
    fn test_cli_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["paypal-ipn-core"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[tokio::test]
    async fn test_order_show_unknown_order_fails() {
        let store = InMemoryStore::new();
        let result = handle_order_show(&store, "ORD-404").await;
        assert!(result.is_err());
    }
}
