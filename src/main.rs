use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use usbswitchd::config::ConfigLoader;
use usbswitchd::link::SerialPortLink;
use usbswitchd::rest_api::{build_router, RestContext};
use usbswitchd::session::SwitchSession;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Web-controlled multi-port USB switch over a serial link.",
    long_about = "Serves a small control page and JSON API for a serial-attached USB \
                  switch. All device access is funneled through one shared session, so \
                  concurrent requests never interleave commands on the wire."
)]
struct Args {
    /// Path to the configuration file (overrides the default lookup).
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Serial device path (overrides config).
    #[arg(short, long)]
    device: Option<String>,

    /// Baud rate (overrides config).
    #[arg(short, long)]
    baud: Option<u32>,

    /// HTTP listen port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();

    // CLI flags win over file and environment.
    if let Some(device) = args.device {
        config.serial.device = device;
    }
    if let Some(baud) = args.baud {
        config.serial.baud = baud;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Open the device once. If this fails the link stays permanently
    // absent and the web UI keeps running, reporting the failure on
    // every protocol operation.
    let session_config = config.switch.session_config();
    let session = match SerialPortLink::open(&config.serial.device, &config.serial.link_config()) {
        Ok(link) => {
            info!(
                device = %config.serial.device,
                baud = config.serial.baud,
                "serial connection opened"
            );
            SwitchSession::new(Box::new(link), session_config)
        }
        Err(e) => {
            error!(device = %config.serial.device, error = %e, "error opening serial connection");
            SwitchSession::link_absent(session_config)
        }
    };

    let ctx = RestContext {
        session: Arc::new(session),
    };
    let app = build_router(ctx);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}
