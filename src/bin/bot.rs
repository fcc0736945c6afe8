use anyhow::Result;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use tokio::sync::watch;

use nudge::command_handler::CommandHandler;
use nudge::core::Config;
use nudge::database::Database;
use nudge::features::reminders::ReminderScheduler;
use nudge::gateway::GatewayServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting nudge reminder bot...");

    let database = Database::new(&config.database_path).await?;
    info!("💾 Database ready at {}", config.database_path);

    let handler = Arc::new(CommandHandler::new(database.clone(), config.offset));
    let gateway = Arc::new(GatewayServer::new(handler));
    let notifier = gateway.notifier();
    gateway.clone().start(&config.gateway_addr).await?;

    // Start the reminder scheduler
    let scheduler = ReminderScheduler::new(database, notifier, config.poll_interval, config.offset);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    info!("Bot configured successfully. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown requested, stopping scheduler...");
    let _ = shutdown_tx.send(true);
    scheduler_handle.await?;

    Ok(())
}
