use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fleetwatch::alerting::clock::{Clock, SystemClock};
use fleetwatch::alerting::evaluation_service::EvaluationService;
use fleetwatch::db::{
    self,
    services::{AlertService, ChannelService, CooldownService, RuleService, SettingsService},
};
use fleetwatch::notifications::service::NotificationService;
use fleetwatch::server::config::ServerConfig;
use fleetwatch::version::VERSION;
use fleetwatch::web::{self, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "fleetwatch.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("Server version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    // Logging needs `log_dir`, so configuration errors go to stderr.
    let config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&config.log_dir);
    info!(version = VERSION, "Starting fleetwatch server.");

    let db_pool = Arc::new(db::connect(&config.database_url).await?);
    if config.auto_create_schema {
        db::schema::create_schema(&*db_pool).await?;
        info!("Database schema is up to date.");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let channel_service = Arc::new(ChannelService::new(db_pool.clone()));
    let cooldown_service = Arc::new(CooldownService::new(db_pool.clone(), clock.clone()));
    let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
    let rule_service = Arc::new(RuleService::new(db_pool.clone()));

    let notification_service = Arc::new(NotificationService::new(
        channel_service.clone(),
        clock.clone(),
        config.webhook_timeout(),
    )?);

    let evaluation_service = Arc::new(
        EvaluationService::new(
            rule_service,
            channel_service.clone(),
            cooldown_service.clone(),
            settings_service.clone(),
            notification_service.clone(),
            clock,
        )
        .with_policy(config.cooldown_policy),
    );

    let app_state = Arc::new(AppState {
        db: db_pool.clone(),
        evaluation_service,
        notification_service,
        alert_service: Arc::new(AlertService::new(db_pool)),
        channel_service,
        cooldown_service,
        settings_service,
    });
    let app = web::create_router(app_state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    info!(address = %addr, cooldown_policy = ?config.cooldown_policy, "HTTP server listening.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Box::new)?;

    info!("Server stopped.");
    Ok(())
}
