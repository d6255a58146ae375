//! CLI argument definitions for the EPL ETL runner.
//!
//! Every connection setting can also come from the environment, and a `.env`
//! file in the working directory is loaded before parsing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use epl_ingest::{ApiConfig, S3Settings};
use epl_load::PgSettings;
use epl_model::DEFAULT_SCHEMA;

use epl_cli::pipeline::PipelineOptions;

#[derive(Parser)]
#[command(
    name = "epl-etl",
    version,
    about = "EPL ETL - Load Premier League teams and players into Postgres",
    long_about = "Fetch the season's teams and squads from the league API, archive the raw\n\
                  JSON to S3, clean both tables, and bulk load them into Postgres."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for log shipping).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full teams and players pipeline.
    Run(Box<RunArgs>),

    /// Show the load destinations and the player output schema.
    Schema,
}

#[derive(Parser)]
pub struct RunArgs {
    /// League API base URL.
    #[arg(long, env = "EPL_API_BASE_URL", default_value = epl_ingest::client::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// League API key, sent as a bearer token.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Season to ingest.
    #[arg(long, env = "EPL_SEASON", default_value_t = 2024)]
    pub season: u16,

    /// Seconds between API requests (the free tier allows 5 per minute).
    #[arg(long = "request-interval-secs", env = "EPL_REQUEST_INTERVAL_SECS", default_value_t = 12)]
    pub request_interval_secs: u64,

    /// HTTP request timeout in seconds.
    #[arg(long = "http-timeout-secs", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Bucket that receives the raw JSON payloads.
    #[arg(long, env = "S3_BUCKET", default_value = "t1-de-prep")]
    pub bucket: String,

    #[arg(long = "aws-region", env = "AWS_REGION")]
    pub aws_region: Option<String>,

    #[arg(long = "aws-access-key", env = "AWS_ACCESS_KEY", hide_env_values = true)]
    pub aws_access_key: Option<String>,

    #[arg(long = "aws-secret-key", env = "AWS_SECRET_KEY", hide_env_values = true)]
    pub aws_secret_key: Option<String>,

    /// Prefix archived keys with the run timestamp.
    #[arg(long = "timestamp-keys")]
    pub timestamp_keys: bool,

    #[arg(long = "pg-host", env = "POSTGRES_HOST", default_value = "localhost")]
    pub pg_host: String,

    #[arg(long = "pg-port", env = "POSTGRES_PORT", default_value_t = 5432)]
    pub pg_port: u16,

    #[arg(long = "pg-user", env = "POSTGRES_USER", default_value = "postgres")]
    pub pg_user: String,

    #[arg(long = "pg-password", env = "POSTGRES_PASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,

    #[arg(long = "pg-database", env = "POSTGRES_DB", default_value = "postgres")]
    pub pg_database: String,

    /// Schema holding the team and player tables.
    #[arg(long, env = "EPL_SCHEMA", default_value = DEFAULT_SCHEMA)]
    pub schema: String,

    /// Fetch and clean without writing to S3 or Postgres.
    ///
    /// Raw payloads go to an in-memory store and no database connection is
    /// opened. The API is still called.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Stop after the team stage.
    #[arg(long = "skip-players")]
    pub skip_players: bool,
}

impl RunArgs {
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            season: self.season,
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }

    pub fn s3_settings(&self) -> S3Settings {
        S3Settings {
            bucket: self.bucket.clone(),
            region: self.aws_region.clone(),
            access_key_id: self.aws_access_key.clone(),
            secret_access_key: self.aws_secret_key.clone(),
        }
    }

    pub fn pg_settings(&self) -> PgSettings {
        PgSettings {
            host: self.pg_host.clone(),
            port: self.pg_port,
            user: self.pg_user.clone(),
            password: self.pg_password.clone(),
            database: self.pg_database.clone(),
            ..PgSettings::default()
        }
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        let mut options = PipelineOptions::new(self.season, &self.schema)?;
        options.request_interval = Duration::from_secs(self.request_interval_secs);
        options.timestamp_keys = self.timestamp_keys;
        options.skip_players = self.skip_players;
        Ok(options)
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["epl-etl", "run", "--dry-run"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.dry_run);
        let options = args.pipeline_options().unwrap();
        assert_eq!(options.teams_destination.to_string(), "epl_datapipeline.epl_teams");
        assert!(!options.skip_players);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let cli =
            Cli::try_parse_from(["epl-etl", "run", "--schema", "bad schema"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.pipeline_options().is_err());
    }
}
