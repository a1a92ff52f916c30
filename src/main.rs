// SpaceTraders Ship - Main Entry Point
// Flies one ship around a trading route until Ctrl+C

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::{error, info};

use spacetraders_ship::client::TcpQueueConnection;
use spacetraders_ship::{
    Backend, HttpTransport, QueueTransport, Result, RouteDriver, RouteFile, Ship, Shutdown,
    TradeCounters, TraderConfig, Transport, DEFAULT_CONFIG_FILE,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Http,
    Queue,
}

/// Autonomous trading loop for one SpaceTraders ship.
#[derive(Parser, Debug)]
#[command(name = "spacetraders_ship")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (created with defaults if missing)
    #[arg(short, long, env = "TRADER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Route description file
    #[arg(short, long, env = "CONFIG_FILE_PATH")]
    route: Option<String>,

    /// Ship to control
    #[arg(long, env = "SHIP_ID")]
    ship_id: Option<String>,

    /// Account token
    #[arg(long, env = "USER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Transport backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
}

impl Cli {
    fn apply(&self, config: &mut TraderConfig) {
        if let Some(route) = &self.route {
            config.route.path = route.clone();
        }
        if let Some(id) = &self.ship_id {
            config.ship.id = id.clone();
        }
        if let Some(token) = &self.token {
            config.ship.token = token.clone();
        }
        if let Some(backend) = self.backend {
            config.transport.backend = match backend {
                BackendArg::Http => Backend::Http,
                BackendArg::Queue => Backend::Queue,
            };
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match TraderConfig::load_or_create(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);
    config.logging.init();

    match run(config).await {
        Ok(()) => {
            info!("Ship stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Ship stopped on error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: TraderConfig) -> Result<()> {
    config.validate()?;
    config.print_summary();

    let (trigger, shutdown) = Shutdown::new();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received (Ctrl+C)");
            trigger.trigger();
        }
    });

    let transport = build_transport(&config, &shutdown).await?;
    let counters = Arc::new(TradeCounters::new());

    let mut ship = Ship::new(&config.ship.id, transport)
        .with_observer(counters.clone())
        .with_flight_config(config.flight.clone())
        .with_fuel_config(config.fuel.clone())
        .with_shutdown(shutdown);

    match ship.await_arrival().await {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => return Ok(()),
        Err(e) => return Err(e),
    }
    info!(ship = %ship.id(), location = %ship.details().location(), "Registered ship");

    let mut driver = RouteDriver::new(ship, RouteFile::new(&config.route.path));
    let result = driver.run().await;

    info!(totals = ?counters.snapshot(), "Final trade totals");
    result
}

async fn build_transport(config: &TraderConfig, shutdown: &Shutdown) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.transport.backend {
        Backend::Http => Arc::new(HttpTransport::new(
            &config.transport.base_url,
            &config.ship.id,
            &config.ship.token,
            config.transport.request_timeout(),
            config.retry.clone(),
            shutdown.clone(),
        )?),
        Backend::Queue => {
            info!(addr = %config.transport.queue_addr, "Connecting to queue bridge");
            let connection = TcpQueueConnection::connect(config.transport.queue_addr.as_str()).await?;
            Arc::new(QueueTransport::new(
                Arc::new(connection),
                &config.ship.id,
                config.transport.poll_interval(),
                config.transport.response_timeout(),
                config.retry.clone(),
                shutdown.clone(),
            ))
        }
    };
    Ok(transport)
}
