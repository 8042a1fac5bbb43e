use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use servoman::cli::{Driver, Opts, GIT_VERSION};
use servoman::metrics::Metrics;
use servoman::servo::Servo;
use servoman::{api, supervisor, Result};

/// # Servoman Webservice
/// Steps a servo left or right on `POST /api/left` and `POST /api/right`,
/// serves a small control page on `/` and Prometheus metrics on `/metrics`.
///
/// Startup fails if the configuration is inconsistent or the PWM channel
/// cannot be acquired. Driver errors while serving are reported as 500s.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "servoman=info,warp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let opts: Opts = Opts::parse();

    if let Err(e) = run(opts).await {
        error!(error = %e, "exiting");
        return Err(e);
    }
    Ok(())
}

async fn run(opts: Opts) -> Result<()> {
    let servo = Arc::new(Servo::from_opts(&opts)?);
    let (min, max) = servo.bounds()?;
    match &opts.driver {
        Driver::Pwm { frequency, .. } => {
            info!(pin = opts.pin, frequency, min, max, "driving hardware pwm")
        }
        Driver::Blaster { path, .. } => {
            info!(pin = opts.pin, path = %path.display(), min, max, "driving pi-blaster")
        }
    }

    let metrics = Metrics::new(GIT_VERSION)?;
    let signals = supervisor::signals()?;

    let (stop, stopped) = supervisor::stop_channel();
    let (addr, server) = api::bind(servo, metrics, opts.listen(), stopped)?;
    info!(address = %addr, version = GIT_VERSION, "starting the HTTP server");

    supervisor::run(server, stop, signals).await
}
