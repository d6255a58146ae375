//! EPL ETL runner.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use epl_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_etl, run_schema};
use crate::summary::print_summary;

fn main() {
    let env_file = dotenvy::dotenv();
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    match env_file {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(error) if error.not_found() => {}
        Err(error) => warn!(%error, "could not read .env file"),
    }

    let exit_code = match cli.command {
        Command::Run(args) => {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(error) => {
                    eprintln!("error: failed to start async runtime: {error}");
                    std::process::exit(1);
                }
            };
            match runtime.block_on(run_etl(&args)) {
                Ok(result) => {
                    print_summary(&result);
                    if result.has_errors() {
                        warn!("ETL pipeline finished with load failures");
                        1
                    } else {
                        info!("ETL pipeline completed successfully");
                        0
                    }
                }
                Err(err) => {
                    error!("ETL pipeline failed: {err:#}");
                    eprintln!("error: {err:#}");
                    1
                }
            }
        }
        Command::Schema => match run_schema() {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
