// src/main.rs
use clap::Parser;
use fx_zone_alert::advisor::{Advisor, GeminiAdvisor};
use fx_zone_alert::api::{self, AppState};
use fx_zone_alert::config::MonitorConfig;
use fx_zone_alert::data::{CandleSource, YahooCandleSource};
use fx_zone_alert::notifications::{LineNotifier, NotificationManager, Notifier, TelegramNotifier};
use fx_zone_alert::realtime::{Scheduler, ZoneMonitor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "fx_zone_alert", about = "Support/resistance zone alerts for a single FX pair")]
struct Cli {
    /// HTTP port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Run one analysis and exit
    #[arg(long)]
    once: bool,

    /// With --once: send a diagnostic summary, ignoring weekday and cooldown gates
    #[arg(long)]
    force: bool,

    /// Serve HTTP without the periodic scheduler
    #[arg(long)]
    no_scheduler: bool,
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = tracing_appender::rolling::daily("logs", "fx_zone_alert");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fx_zone_alert=info")),
        )
        .try_init()?;

    Ok(())
}

fn build_monitor(config: MonitorConfig) -> ZoneMonitor {
    let source: Arc<dyn CandleSource> = Arc::new(YahooCandleSource::new());
    let advisor: Arc<dyn Advisor> = Arc::new(GeminiAdvisor::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.advisor_timeout_secs,
    ));
    let channels: Vec<Arc<dyn Notifier>> = vec![
        Arc::new(LineNotifier::new(
            config.line_notify_token.clone(),
            config.notifier_timeout_secs,
        )),
        Arc::new(TelegramNotifier::new(
            config.telegram_bot_token.clone(),
            config.telegram_chat_id.clone(),
            config.notifier_timeout_secs,
        )),
    ];
    let notifier: Arc<dyn Notifier> = Arc::new(NotificationManager::new(channels));

    ZoneMonitor::new(config, source, advisor, notifier)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        println!("Warning: Could not load .env file: {}", e);
    }

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize file logging: {}", e);
        let _ = tracing_subscriber::fmt()
            .with_target(false)
            .with_level(true)
            .try_init();
    }

    let cli = Cli::parse();
    let mut config = MonitorConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.no_scheduler {
        config.enable_scheduler = false;
    }

    info!("🚀 Starting FX zone alert service");
    config.log_summary();

    let port = config.port;
    let check_interval = Duration::from_secs(config.check_interval_secs);
    let enable_scheduler = config.enable_scheduler;
    let monitor = Arc::new(build_monitor(config));

    if cli.once {
        let outcome = monitor.run_once(cli.force).await;
        info!("✅ Single run finished: {:?}", outcome);
        return Ok(());
    }

    let scheduler = Arc::new(Scheduler::new());
    if enable_scheduler {
        scheduler.start(monitor.clone(), check_interval);
    } else {
        info!("⏰ Scheduler disabled, runs only via /trigger");
    }

    let app = api::router(AppState {
        monitor,
        scheduler: scheduler.clone(),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("🌐 Listening on http://0.0.0.0:{}", port);
    if let Err(e) = axum::serve(listener, app).await {
        error!("❌ HTTP server stopped: {}", e);
    }

    scheduler.stop();
    Ok(())
}
