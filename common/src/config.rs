use config::{Config, ConfigError, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
    #[serde(default = "default_graph_scopes")]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Static,
    ClientCredentials,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Pre-acquired bearer token, used in `static` mode.
    pub access_token: Option<String>,
    /// Account label reported for the static token.
    pub account: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default = "default_authority")]
    pub authority: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_filename")]
    pub filename: String,
    #[serde(default = "default_report_subject")]
    pub subject: String,
    /// Mailbox to send from; `/me/sendMail` is used when unset.
    pub sender: Option<String>,
    pub default_recipient: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            base_url: default_graph_base_url(),
            scopes: default_graph_scopes(),
            headers: HashMap::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            mode: AuthMode::default(),
            access_token: None,
            account: None,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            authority: default_authority(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            filename: default_report_filename(),
            subject: default_report_subject(),
            sender: None,
            default_recipient: None,
            output_dir: default_output_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_graph_scopes() -> Vec<String> {
    vec![
        "User.Read.All".to_string(),
        "Directory.Read.All".to_string(),
        "Mail.Send".to_string(),
    ]
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_report_filename() -> String {
    "Enabled_Users_Report.csv".to_string()
}

fn default_report_subject() -> String {
    "Enabled Users Report".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_port() -> u16 {
    3000
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::build(builder)
    }

    /// Builds settings from an in-memory TOML document, without the environment layer.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml));
        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config = builder.build()?;

        if let Ok(headers) = config.get_table("graph.headers") {
            debug!(?headers, "Loaded Graph headers from configuration");
        }

        let settings: Settings = config.try_deserialize()?;

        debug!(
            base_url = %settings.graph.base_url,
            auth_mode = ?settings.auth.mode,
            api_port = settings.api_port,
            "Parsed settings"
        );

        Ok(settings)
    }
}
