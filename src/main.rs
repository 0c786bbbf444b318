//! Mesh Range Tester - Main CLI Application

use clap::Parser;
use mesh_range_tester::{
    app::{AppOptions, RangeTestApp},
    cli::Cli,
    config::load_config,
    error::Result,
    responder,
    PKG_NAME, VERSION,
};
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();

    if let Err(e) = run_application(cli).await {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    cli.validate()?;

    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("Debug mode enabled");
        println!();
    }

    let config = load_config(&cli)?;

    if config.debug {
        println!("Configuration loaded:");
        println!("  Destination: {}", config.base_station_destination);
        println!("  Ping interval: {}s", config.ping_interval);
        println!("  Ping timeout: {}s", config.ping_timeout);
        println!("  GPS policy: {:?}", config.gps_policy);
        println!("  Export cadence: {:?}", config.export_cadence);
        println!("  Export dir: {}", config.export_dir.display());
        println!();
    }

    // Ctrl+C flips the stop flag; loops finish their iteration and drain
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    if cli.serve {
        responder::run(&cli.bind, stop_rx).await?;
        return Ok(());
    }

    let options = AppOptions {
        loopback: cli.loopback,
        no_gps: cli.no_gps,
        download_formats: cli.export_formats()?,
    };

    let app = RangeTestApp::new(config, options).await?;
    app.run(stop_rx).await
}
