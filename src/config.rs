//! Configuration resolution.
//!
//! Every setting is resolved in the same order: command-line argument, then
//! the INI config file (with `UFM_STREAMER_*` environment variables layered
//! on top), then a built-in default. A setting with none of those is a
//! [`ConfigError::Missing`].
//!
//! # Config file
//!
//! ```ini
//! [ufm-server-config]
//! protocol = https
//! host = ufm.example.com
//! username = admin
//! password = secret
//! local_streaming = false
//!
//! [fluentd-endpoint]
//! host = fluentd.example.com
//! port = 24224
//!
//! [streaming]
//! interval = 10
//! enabled_streaming_alarms = false
//!
//! [logs-config]
//! log_level = info
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use thiserror::Error;
use ufm_streamer_types::{StreamToggles, DEFAULT_CACHE_DIR};

/// Config file used when `--config` is not given. It may be absent.
pub const DEFAULT_CONFIG_FILE: &str = "ufm_streamer.cfg";

/// Prefix of environment variables overriding config file values.
pub const ENV_PREFIX: &str = "UFM_STREAMER";

pub const UFM_SECTION: &str = "ufm-server-config";
pub const FLUENTD_SECTION: &str = "fluentd-endpoint";
pub const STREAMING_SECTION: &str = "streaming";
pub const LOGS_SECTION: &str = "logs-config";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No argument, file value or default for a required setting.
    #[error("missing required configuration value '{key}' in section [{section}]")]
    Missing { section: String, key: String },

    /// A value was found but could not be parsed.
    #[error("invalid value '{value}' for '{key}' in section [{section}]: {reason}")]
    Invalid {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// The config file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Command-line arguments. Every setting flag overrides the config file.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "ufm-streamer")]
#[command(about = "Stream UFM fabric telemetry to a Fluentd collector")]
pub struct Args {
    /// Path to the INI config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// UFM protocol for remote streaming (http or https)
    #[arg(long)]
    pub ufm_protocol: Option<String>,

    /// UFM host name or address
    #[arg(long)]
    pub ufm_host: Option<String>,

    /// UFM username
    #[arg(long)]
    pub ufm_username: Option<String>,

    /// UFM password
    #[arg(long)]
    pub ufm_password: Option<String>,

    /// Stream through the local UFM internal server instead of the remote API
    #[arg(long, value_parser = parse_bool)]
    pub local_streaming: Option<bool>,

    /// Port of the UFM internal server (local streaming)
    #[arg(long)]
    pub internal_ufm_server_port: Option<u16>,

    /// Server name carried in every record (defaults to the UFM host)
    #[arg(long)]
    pub ufm_server_name: Option<String>,

    /// Fluentd host
    #[arg(long)]
    pub fluentd_host: Option<String>,

    /// Fluentd forward port
    #[arg(long)]
    pub fluentd_port: Option<u16>,

    /// Fluentd tag for stream records
    #[arg(long)]
    pub fluentd_tag: Option<String>,

    /// Fluentd connect/write timeout in seconds
    #[arg(long)]
    pub fluentd_timeout: Option<u64>,

    /// Seconds between ticks
    #[arg(long)]
    pub streaming_interval: Option<u64>,

    /// First sequence number
    #[arg(long)]
    pub initial_sequence: Option<u64>,

    /// Message type label
    #[arg(long)]
    pub message_type: Option<String>,

    /// Directory holding the cached API results
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// UFM request timeout in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Stream the systems section
    #[arg(long, value_parser = parse_bool)]
    pub enabled_streaming_systems: Option<bool>,

    /// Stream the ports section
    #[arg(long, value_parser = parse_bool)]
    pub enabled_streaming_ports: Option<bool>,

    /// Stream the links section
    #[arg(long, value_parser = parse_bool)]
    pub enabled_streaming_links: Option<bool>,

    /// Stream the alarms section
    #[arg(long, value_parser = parse_bool)]
    pub enabled_streaming_alarms: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run a single tick and exit
    #[arg(long)]
    pub once: bool,
}

/// Parse the boolean spellings accepted in config files and flags.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

/// The config-file layer of the resolution order.
#[derive(Debug, Default)]
pub struct ConfigFile {
    config: Config,
}

impl ConfigFile {
    /// A config with no file values at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load an INI file plus `UFM_STREAMER_*` environment overrides.
    ///
    /// A missing file is only an error when `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(Self { config })
    }

    /// Parse INI text directly.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Ini))
            .build()?;
        Ok(Self { config })
    }

    /// Raw lookup of `section.key`.
    ///
    /// Environment variables cannot carry `-`, so an override for a dashed
    /// section lands under the underscored name. That name is checked first
    /// so the environment wins over the file.
    pub fn lookup(&self, section: &str, key: &str) -> Option<String> {
        let env_section = section.replace('-', "_");
        if env_section != section {
            if let Ok(value) = self.config.get_string(&format!("{}.{}", env_section, key)) {
                return Some(value);
            }
        }
        self.config.get_string(&format!("{}.{}", section, key)).ok()
    }

    /// Resolve a string setting: argument, then file, then default.
    pub fn get_config_value(
        &self,
        arg: Option<String>,
        section: &str,
        key: &str,
        default: Option<&str>,
    ) -> Result<String, ConfigError> {
        arg.or_else(|| self.lookup(section, key))
            .or_else(|| default.map(str::to_string))
            .ok_or_else(|| ConfigError::Missing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Resolve a typed setting. File values are parsed with `FromStr`.
    pub fn get_parsed<T>(
        &self,
        arg: Option<T>,
        section: &str,
        key: &str,
        default: Option<T>,
    ) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.resolve_with(arg, section, key, default, |raw| {
            raw.trim().parse::<T>().map_err(|e| e.to_string())
        })
    }

    /// Resolve a boolean setting using [`parse_bool`].
    pub fn get_bool(
        &self,
        arg: Option<bool>,
        section: &str,
        key: &str,
        default: Option<bool>,
    ) -> Result<bool, ConfigError> {
        self.resolve_with(arg, section, key, default, parse_bool)
    }

    fn resolve_with<T, F>(
        &self,
        arg: Option<T>,
        section: &str,
        key: &str,
        default: Option<T>,
        parse: F,
    ) -> Result<T, ConfigError>
    where
        F: FnOnce(&str) -> Result<T, String>,
    {
        if let Some(value) = arg {
            return Ok(value);
        }
        if let Some(raw) = self.lookup(section, key) {
            return parse(&raw).map_err(|reason| ConfigError::Invalid {
                section: section.to_string(),
                key: key.to_string(),
                value: raw,
                reason,
            });
        }
        default.ok_or_else(|| ConfigError::Missing {
            section: section.to_string(),
            key: key.to_string(),
        })
    }
}

/// UFM connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct UfmSettings {
    pub protocol: String,
    pub host: String,
    pub username: String,
    pub password: String,
    pub local_streaming: bool,
    pub internal_port: u16,
    pub server_name: String,
}

/// Collector settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FluentdSettings {
    pub host: String,
    pub port: u16,
    pub tag: String,
    pub timeout: Duration,
}

impl FluentdSettings {
    /// `host:port` of the forward listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingSettings {
    pub interval: Duration,
    pub initial_sequence: u64,
    pub message_type: String,
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
    pub toggles: StreamToggles,
}

/// Fully resolved settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ufm: UfmSettings,
    pub fluentd: FluentdSettings,
    pub streaming: StreamingSettings,
    pub log_level: tracing::Level,
    pub once: bool,
}

impl Settings {
    /// Load the config file named by `args` (or the optional default one)
    /// and resolve every setting.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path, true)?,
            None => ConfigFile::load(Path::new(DEFAULT_CONFIG_FILE), false)?,
        };
        Self::resolve(args, &file)
    }

    /// Resolve every setting from arguments and an already loaded file.
    pub fn resolve(args: &Args, file: &ConfigFile) -> Result<Self, ConfigError> {
        let args = args.clone();

        let local_streaming =
            file.get_bool(args.local_streaming, UFM_SECTION, "local_streaming", Some(false))?;
        // Local streaming talks to the loopback server and only sends a user name
        let (host_default, password_default) = if local_streaming {
            (Some(ufm_streamer_adapters::ufm::LOCAL_HOST), Some(""))
        } else {
            (None, None)
        };

        let host = file.get_config_value(args.ufm_host, UFM_SECTION, "host", host_default)?;
        let ufm = UfmSettings {
            protocol: file.get_config_value(args.ufm_protocol, UFM_SECTION, "protocol", Some("https"))?,
            username: file.get_config_value(args.ufm_username, UFM_SECTION, "username", None)?,
            password: file.get_config_value(
                args.ufm_password,
                UFM_SECTION,
                "password",
                password_default,
            )?,
            local_streaming,
            internal_port: file.get_parsed(
                args.internal_ufm_server_port,
                UFM_SECTION,
                "internal_port",
                Some(8000),
            )?,
            server_name: file.get_config_value(
                args.ufm_server_name,
                UFM_SECTION,
                "server_name",
                Some(host.as_str()),
            )?,
            host,
        };

        let fluentd = FluentdSettings {
            host: file.get_config_value(args.fluentd_host, FLUENTD_SECTION, "host", None)?,
            port: file.get_parsed(args.fluentd_port, FLUENTD_SECTION, "port", Some(24224))?,
            tag: file.get_config_value(
                args.fluentd_tag,
                FLUENTD_SECTION,
                "tag",
                Some(ufm_streamer_sdk::DEFAULT_TAG),
            )?,
            timeout: Duration::from_secs(file.get_parsed(
                args.fluentd_timeout,
                FLUENTD_SECTION,
                "timeout",
                Some(10),
            )?),
        };

        let toggles = StreamToggles {
            systems: file.get_bool(
                args.enabled_streaming_systems,
                STREAMING_SECTION,
                "enabled_streaming_systems",
                Some(true),
            )?,
            ports: file.get_bool(
                args.enabled_streaming_ports,
                STREAMING_SECTION,
                "enabled_streaming_ports",
                Some(true),
            )?,
            links: file.get_bool(
                args.enabled_streaming_links,
                STREAMING_SECTION,
                "enabled_streaming_links",
                Some(true),
            )?,
            alarms: file.get_bool(
                args.enabled_streaming_alarms,
                STREAMING_SECTION,
                "enabled_streaming_alarms",
                Some(true),
            )?,
        };

        let interval_secs: u64 =
            file.get_parsed(args.streaming_interval, STREAMING_SECTION, "interval", Some(10))?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                section: STREAMING_SECTION.to_string(),
                key: "interval".to_string(),
                value: "0".to_string(),
                reason: "interval must be at least one second".to_string(),
            });
        }

        let streaming = StreamingSettings {
            interval: Duration::from_secs(interval_secs),
            initial_sequence: file.get_parsed(
                args.initial_sequence,
                STREAMING_SECTION,
                "initial_sequence",
                Some(1),
            )?,
            message_type: file.get_config_value(
                args.message_type,
                STREAMING_SECTION,
                "message_type",
                Some(ufm_streamer_sdk::DEFAULT_MESSAGE_TYPE),
            )?,
            cache_dir: file.get_parsed(
                args.cache_dir,
                STREAMING_SECTION,
                "cache_dir",
                Some(PathBuf::from(DEFAULT_CACHE_DIR)),
            )?,
            request_timeout: Duration::from_secs(file.get_parsed(
                args.request_timeout,
                STREAMING_SECTION,
                "request_timeout",
                Some(30),
            )?),
            toggles,
        };

        let log_level = match args.log_level {
            Some(raw) => raw.parse::<tracing::Level>().map_err(|e| ConfigError::Invalid {
                section: LOGS_SECTION.to_string(),
                key: "log_level".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => file.get_parsed(None, LOGS_SECTION, "log_level", Some(tracing::Level::INFO))?,
        };

        Ok(Settings {
            ufm,
            fluentd,
            streaming,
            log_level,
            once: args.once,
        })
    }
}
