use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tinylink_core::DEFAULT_REFERRER;

pub const STORE_PATH_ENV: &str = "TINYLINK_STORE_PATH";
pub const DEFAULT_VALIDITY_ENV: &str = "TINYLINK_DEFAULT_VALIDITY";
pub const LOCATION_ENV: &str = "TINYLINK_LOCATION";
pub const BASE_URL_ENV: &str = "TINYLINK_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "TINYLINK_LOG_FORMAT";

pub const DEFAULT_STORE_PATH: &str = "tinylink.json";
pub const DEFAULT_VALIDITY: &str = "30";
pub const DEFAULT_LOCATION: &str = "Unknown";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tinylink", about = "Shorten URLs and track their clicks")]
pub struct CLI {
    /// JSON file holding the shortened urls.
    #[arg(long, env = STORE_PATH_ENV, default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Validity in minutes for links created without one.
    #[arg(long, env = DEFAULT_VALIDITY_ENV, default_value = DEFAULT_VALIDITY)]
    pub default_validity: i64,

    /// Location recorded for every click.
    #[arg(long, env = LOCATION_ENV, default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// Base used to render full short links.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten one or more urls in a single batch.
    Shorten {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Custom short codes, matched to urls by position.
        #[arg(long = "code")]
        codes: Vec<String>,

        /// Validity in minutes for every url in the batch.
        #[arg(long)]
        validity: Option<i64>,
    },
    /// Resolve a short code and record a click.
    Open {
        code: String,

        #[arg(long, default_value = DEFAULT_REFERRER)]
        referrer: String,
    },
    /// Show a short code without recording a click.
    Show { code: String },
    /// List live short codes, newest first.
    List,
    /// Remove every short code.
    Clear,
}
