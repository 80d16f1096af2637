//! Sirocco trading engine operator CLI.
//!
//! ```bash
//! # Validate a configuration
//! sirocco --config sirocco.yaml --validate start
//!
//! # Run a backtest (mode: backtest) or live session (mode: live)
//! sirocco --config sirocco.yaml start
//!
//! # Print the wiring summary
//! sirocco --config sirocco.yaml status
//! ```
//!
//! Exit code 0 on clean shutdown, non-zero on unrecoverable init
//! failure.

#![warn(clippy::all)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use sirocco_core::config::{load_config, Mode, SiroccoConfig};
use sirocco_server::{init_logging, replay, App};
use sirocco_strategy::strategies::MaCrossStrategy;

/// Sirocco trading engine.
#[derive(Parser, Debug)]
#[command(name = "sirocco")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sirocco.yaml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    validate: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the engine (runs the backtest to completion, or live until
    /// interrupted)
    Start,
    /// Print configuration and component summary
    Status,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if args.debug {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging);

    if args.validate {
        println!("configuration is valid");
        return ExitCode::SUCCESS;
    }

    match args.command {
        Command::Start => {
            // The runtime is sized from configuration, so build it by
            // hand instead of using the attribute macro.
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(config.engine.worker_threads)
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("failed to build runtime: {e}");
                    return ExitCode::FAILURE;
                }
            };
            runtime.block_on(run(config))
        }
        Command::Status => status(&config),
    }
}

async fn run(config: SiroccoConfig) -> ExitCode {
    let mode = config.mode;
    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to assemble application");
            return ExitCode::FAILURE;
        }
    };

    // The bundled reference strategy; operators typically replace this
    // with their own registrations when embedding the crates.
    if let Err(e) = app.register_strategy(
        Box::new(MaCrossStrategy::new("ma-cross")),
        serde_json::json!({}),
    ) {
        error!(error = %e, "failed to register strategy");
        return ExitCode::FAILURE;
    }

    if let Err(e) = app.start().await {
        error!(error = %e, "failed to start");
        return ExitCode::FAILURE;
    }

    match mode {
        Mode::Backtest => match replay::run(&mut app).await {
            Ok(report) => {
                info!(
                    bars = report.bars_replayed,
                    final_cash = %report.account.cash,
                    realized_pnl = %report.account.total_realized_pnl,
                    "backtest finished"
                );
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(error = %e, "failed to render report"),
                }
            }
            Err(e) => {
                error!(error = %e, "backtest failed");
                app.stop().await;
                return ExitCode::FAILURE;
            }
        },
        Mode::Live => {
            info!("running until interrupted (ctrl-c)");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "signal listener failed");
            }
        }
    }

    let stats = app.stop().await;
    info!(
        published = stats.published,
        dispatched = stats.dispatched,
        dropped = stats.dropped,
        "shutdown complete"
    );
    ExitCode::SUCCESS
}

fn status(config: &SiroccoConfig) -> ExitCode {
    println!("mode:            {}", config.mode);
    println!("queue capacity:  {}", config.engine.queue_capacity);
    println!("account:         {}", config.account.account_id);
    println!("initial capital: {}", config.account.initial_capital);
    println!("max strategies:  {}", config.strategy.max_strategies);
    println!(
        "execution:       {:?}",
        config.execution.execution_type
    );
    if let (Some(start), Some(end)) = (config.backtest.start_date, config.backtest.end_date) {
        println!("backtest window: {start} .. {end}");
    }
    ExitCode::SUCCESS
}
