//! Configuration module for jarvis-hull.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values, and the listen and
//! server addresses can also come from the environment.

use crate::codec::ParsePolicy;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "jarvis-hull")]
#[command(author = "jarvis-hull authors")]
#[command(version = "0.1.0")]
#[command(about = "Convex hull server and verification client (Jarvis March)", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the hull server
    Serve {
        /// Address to bind to (e.g., 0.0.0.0:9090)
        #[arg(short = 'l', long, env = "JARVIS_LISTEN")]
        listen: Option<String>,

        /// How malformed requests are handled
        #[arg(long, value_enum)]
        policy: Option<ParsePolicy>,

        /// Handle each connection on its own task
        #[arg(long)]
        concurrent: bool,

        /// Per-connection read timeout in milliseconds
        #[arg(long)]
        read_timeout_ms: Option<u64>,
    },

    /// Send one point set to the server and compare with the local hull
    Client {
        /// Server address (e.g., 127.0.0.1:9090)
        #[arg(short, long, env = "JARVIS_SERVER")]
        server: Option<String>,

        /// Points as "x,y x,y ..."; read from stdin when absent
        #[arg(short, long)]
        points: Option<String>,
    },

    /// Verify many generated point sets against the server
    MassTest {
        /// Server address (e.g., 127.0.0.1:9090)
        #[arg(short, long, env = "JARVIS_SERVER")]
        server: Option<String>,

        /// Number of generated test cases
        #[arg(short = 'n', long)]
        clients: Option<usize>,

        /// Unique points per test case
        #[arg(long)]
        points_per_test: Option<usize>,

        /// Seed for reproducible point sets
        #[arg(long)]
        seed: Option<u64>,

        /// Test log path
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub mass_test: MassTestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Pending connection queue length
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    /// Largest request accepted by the single read
    #[serde(default = "default_server_buffer")]
    pub buffer_size: usize,
    /// Optional per-connection read timeout
    pub read_timeout_ms: Option<u64>,
    /// Spawn a task per connection instead of handling them in order
    #[serde(default)]
    pub concurrent: bool,
    /// Request decoding policy
    #[serde(default)]
    pub policy: ParsePolicy,
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backlog: default_backlog(),
            buffer_size: default_server_buffer(),
            read_timeout_ms: None,
            concurrent: false,
            policy: ParsePolicy::default(),
        }
    }
}

/// Client-related configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Server address to connect to
    #[serde(default = "default_server")]
    pub server: String,
    /// Receive chunk size
    #[serde(default = "default_client_buffer")]
    pub buffer_size: usize,
    /// Receive timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            buffer_size: default_client_buffer(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Mass test configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MassTestConfig {
    #[serde(default = "default_clients")]
    pub clients: usize,
    #[serde(default = "default_points_per_test")]
    pub points_per_test: usize,
    #[serde(default = "default_min_coord")]
    pub min_coord: i32,
    #[serde(default = "default_max_coord")]
    pub max_coord: i32,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    pub seed: Option<u64>,
}

impl Default for MassTestConfig {
    fn default() -> Self {
        Self {
            clients: default_clients(),
            points_per_test: default_points_per_test(),
            min_coord: default_min_coord(),
            max_coord: default_max_coord(),
            log_file: default_log_file(),
            seed: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_backlog() -> i32 {
    50
}

fn default_server_buffer() -> usize {
    2048
}

fn default_server() -> String {
    "127.0.0.1:9090".to_string()
}

fn default_client_buffer() -> usize {
    4096
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_clients() -> usize {
    100
}

fn default_points_per_test() -> usize {
    50
}

fn default_min_coord() -> i32 {
    -1000
}

fn default_max_coord() -> i32 {
    1000
}

fn default_log_file() -> PathBuf {
    PathBuf::from("jarvis_tests.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// What the process was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Client { points: Option<String> },
    MassTest,
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub mass_test: MassTestConfig,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    pub fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let TomlConfig {
            mut server,
            mut client,
            mut mass_test,
            logging,
        } = toml_config;

        // Merge CLI args with TOML config (CLI takes precedence)
        let mode = match cli.command {
            CliCommand::Serve {
                listen,
                policy,
                concurrent,
                read_timeout_ms,
            } => {
                server.listen = listen.unwrap_or(server.listen);
                server.policy = policy.unwrap_or(server.policy);
                server.concurrent |= concurrent;
                server.read_timeout_ms = read_timeout_ms.or(server.read_timeout_ms);
                Mode::Serve
            }
            CliCommand::Client {
                server: address,
                points,
            } => {
                client.server = address.unwrap_or(client.server);
                Mode::Client { points }
            }
            CliCommand::MassTest {
                server: address,
                clients,
                points_per_test,
                seed,
                log_file,
            } => {
                client.server = address.unwrap_or(client.server);
                mass_test.clients = clients.unwrap_or(mass_test.clients);
                mass_test.points_per_test = points_per_test.unwrap_or(mass_test.points_per_test);
                mass_test.seed = seed.or(mass_test.seed);
                mass_test.log_file = log_file.unwrap_or(mass_test.log_file);
                Mode::MassTest
            }
        };

        let config = Config {
            mode,
            server,
            client,
            mass_test,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                logging.level
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.buffer_size == 0 || self.client.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be positive".into()));
        }

        let mt = &self.mass_test;
        if mt.min_coord > mt.max_coord {
            return Err(ConfigError::Invalid(format!(
                "min_coord {} is greater than max_coord {}",
                mt.min_coord, mt.max_coord
            )));
        }
        let side = (mt.max_coord as i128 - mt.min_coord as i128) + 1;
        if side * side < mt.points_per_test as i128 {
            return Err(ConfigError::Invalid(format!(
                "coordinate range holds fewer than {} unique points",
                mt.points_per_test
            )));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
