//! Command line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use cleanroom::client::EnvToken;
use cleanroom::config::{ClientConfig, PollingConfig};
use cleanroom::dialect::Dialect;
use cleanroom::handoff::DEFAULT_TASK_KEY;
use cleanroom::observability::LogFormat;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "cleanroom",
    version,
    about = "Create, run and tear down clean room stations"
)]
pub struct Cli {
    /// Workspace API URL
    #[arg(long, env = "CLEAN_ROOM_HOST", global = true, default_value = "")]
    pub host: String,

    /// Station API generation
    #[arg(long, env = "CLEAN_ROOM_API_DIALECT", global = true, default_value_t = Dialect::V2)]
    pub dialect: Dialect,

    /// Environment variable holding the bearer token
    #[arg(long, env = "CLEAN_ROOM_TOKEN_ENV", global = true, default_value = EnvToken::DEFAULT_VAR)]
    pub token_env: String,

    /// Per-request timeout
    #[arg(long, env = "CLEAN_ROOM_REQUEST_TIMEOUT", global = true, default_value = "60s")]
    pub request_timeout: humantime::Duration,

    /// Log output format: pretty, compact or json
    #[arg(long, env = "CLEAN_ROOM_LOG_FORMAT", global = true, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Create the station, run the notebook and import its output
    Run(RunArgs),
    /// Tear down the station created by a previous run
    Teardown(TeardownArgs),
    /// List the stations of a clean room
    ListStations(ListArgs),
}

#[derive(Debug, Args, Clone)]
pub struct StationArgs {
    /// Clean room name
    #[arg(long, env = "CLEAN_ROOM_NAME")]
    pub clean_room: String,

    /// Station name
    #[arg(long, env = "CLEAN_ROOM_STATION_NAME")]
    pub station_name: String,
}

#[derive(Debug, Args, Clone)]
pub struct HandoffArgs {
    /// Directory where phase values are kept between run and teardown
    #[arg(long, env = "CLEAN_ROOM_HANDOFF_DIR", default_value = ".cleanroom")]
    pub handoff_dir: PathBuf,

    /// Task key the run phase writes under
    #[arg(long, env = "CLEAN_ROOM_TASK_KEY", default_value = DEFAULT_TASK_KEY)]
    pub task_key: String,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub station: StationArgs,

    #[command(flatten)]
    pub handoff: HandoffArgs,

    /// Collaborator that owns the notebook
    #[arg(long, env = "CLEAN_ROOM_NOTEBOOK_COLLABORATOR")]
    pub collaborator: String,

    /// Notebook name within the clean room
    #[arg(long, env = "CLEAN_ROOM_NOTEBOOK_NAME")]
    pub notebook_name: String,

    /// JSON object of string notebook parameters
    #[arg(long, env = "CLEAN_ROOM_NOTEBOOK_PARAMETERS", default_value = "")]
    pub notebook_parameters: String,

    /// JSON object mapping output tables to shared names
    #[arg(long, env = "CLEAN_ROOM_OUTPUT_TABLE_PARAMETERS", default_value = "")]
    pub output_table_parameters: String,

    /// Workspace user receiving the imported output
    #[arg(long, env = "CLEAN_ROOM_USER_NAME")]
    pub user_name: String,

    /// Browser-facing workspace host for results links
    #[arg(long, env = "CLEAN_ROOM_BROWSER_HOST")]
    pub browser_host: Option<String>,

    /// Delay between status polls
    #[arg(long, env = "CLEAN_ROOM_POLL_INTERVAL", default_value = "10s")]
    pub poll_interval: humantime::Duration,

    /// Give up on workspace provisioning after this long
    #[arg(long, env = "CLEAN_ROOM_WORKSPACE_TIMEOUT", default_value = "1h")]
    pub workspace_timeout: humantime::Duration,

    /// Give up on the notebook run after this long
    #[arg(long, env = "CLEAN_ROOM_RUN_TIMEOUT", default_value = "12h")]
    pub run_timeout: humantime::Duration,

    /// Cap on status polls per wait
    #[arg(long, env = "CLEAN_ROOM_MAX_POLL_ATTEMPTS")]
    pub max_poll_attempts: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct TeardownArgs {
    #[command(flatten)]
    pub station: StationArgs,

    #[command(flatten)]
    pub handoff: HandoffArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// Clean room name
    #[arg(long, env = "CLEAN_ROOM_NAME")]
    pub clean_room: String,
}

impl Cli {
    /// Client configuration from the global flags.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.host.clone())
            .with_dialect(self.dialect)
            .with_timeout(self.request_timeout.as_secs_f64())
    }
}

impl RunArgs {
    /// Polling configuration from the run flags.
    pub fn polling_config(&self) -> PollingConfig {
        let polling = PollingConfig::new()
            .with_interval(*self.poll_interval)
            .with_workspace_timeout(*self.workspace_timeout)
            .with_run_timeout(*self.run_timeout);
        match self.max_poll_attempts {
            Some(attempts) => polling.with_max_attempts(attempts),
            None => polling,
        }
    }
}
