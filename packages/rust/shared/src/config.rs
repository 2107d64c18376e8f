//! Application configuration for ContactDesk.
//!
//! User config lives at `~/.contactdesk/contactdesk.toml`.
//! CLI flags override config file values, which override defaults.
//! Webhook URLs are secrets: the config only names the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ContactDeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contactdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contactdesk";

/// Name given to the sink configured by `notify.webhook_url_env`.
pub const PRIMARY_SINK_NAME: &str = "webhook";

// ---------------------------------------------------------------------------
// Config structs (matching contactdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Notification sinks.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Postal-code lookup service.
    #[serde(default)]
    pub address: AddressConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}

/// Payload shape sent to a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// The submission fields as a flat JSON object.
    #[default]
    Json,
    /// Slack incoming-webhook body: `{"text": "<fields as JSON>"}`.
    Slack,
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadFormat::Json => f.write_str("json"),
            PayloadFormat::Slack => f.write_str("slack"),
        }
    }
}

/// `[notify]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Name of the env var holding the primary webhook URL.
    #[serde(default = "default_webhook_url_env")]
    pub webhook_url_env: String,

    /// Payload format for the primary webhook.
    #[serde(default)]
    pub format: PayloadFormat,

    /// Deadline for one whole dispatch, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional sinks, each notified once per submission.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: default_webhook_url_env(),
            format: PayloadFormat::default(),
            timeout_secs: default_timeout_secs(),
            sinks: Vec::new(),
        }
    }
}

fn default_webhook_url_env() -> String {
    "SLACK_WEBHOOK".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[[notify.sinks]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Label used in logs and `config check`.
    pub name: String,
    /// Name of the env var holding this sink's URL.
    pub url_env: String,
    #[serde(default)]
    pub format: PayloadFormat,
}

/// `[address]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressConfig {
    /// Base URL of the postal-code REST API.
    #[serde(default = "default_address_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            base_url: default_address_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_address_base_url() -> String {
    "https://postcode.teraren.com".into()
}

impl AppConfig {
    /// Reject values that parse but cannot work at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.notify.timeout_secs == 0 {
            return Err(ContactDeskError::config("notify.timeout_secs must be at least 1"));
        }
        if self.address.timeout_secs == 0 {
            return Err(ContactDeskError::config("address.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sink resolution (config + environment)
// ---------------------------------------------------------------------------

/// A sink whose destination URL has been read from the environment.
///
/// `Debug` never prints the URL.
#[derive(Clone)]
pub struct ResolvedSink {
    pub name: String,
    pub url: Url,
    pub format: PayloadFormat,
}

impl std::fmt::Debug for ResolvedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSink")
            .field("name", &self.name)
            .field("url", &"<redacted>")
            .field("format", &self.format)
            .finish()
    }
}

impl NotifyConfig {
    /// Resolve every sink URL using `lookup` for env var access.
    ///
    /// Fails if any variable is unset, empty, or not an http(s) URL.
    pub fn resolve_sinks_with<F>(&self, lookup: F) -> Result<Vec<ResolvedSink>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let primary = std::iter::once((PRIMARY_SINK_NAME, &self.webhook_url_env, self.format));
        let extra = self
            .sinks
            .iter()
            .map(|s| (s.name.as_str(), &s.url_env, s.format));

        primary
            .chain(extra)
            .map(|(name, var, format)| -> Result<ResolvedSink> {
                let url = resolve_url(&lookup, name, var)?;
                Ok(ResolvedSink {
                    name: name.to_string(),
                    url,
                    format,
                })
            })
            .collect()
    }

    /// Resolve every sink URL from the process environment.
    pub fn resolve_sinks(&self) -> Result<Vec<ResolvedSink>> {
        self.resolve_sinks_with(|var| std::env::var(var).ok())
    }
}

fn resolve_url<F>(lookup: &F, sink: &str, var: &str) -> Result<Url>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(var) {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            return Err(ContactDeskError::config(format!(
                "webhook URL for sink '{sink}' not found. Set the {var} environment variable."
            )));
        }
    };

    // The parse error is reported without echoing the value.
    let url = Url::parse(raw.trim()).map_err(|e| {
        ContactDeskError::config(format!("{var} does not hold a valid URL: {e}"))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ContactDeskError::config(format!(
            "{var} must be an http(s) URL, got scheme '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contactdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContactDeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contactdesk/contactdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContactDeskError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ContactDeskError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContactDeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContactDeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContactDeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("SLACK_WEBHOOK"));
        assert!(toml_str.contains("postcode.teraren.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.notify.webhook_url_env, "SLACK_WEBHOOK");
        assert_eq!(parsed.notify.format, PayloadFormat::Json);
    }

    #[test]
    fn config_with_extra_sinks() {
        let toml_str = r#"
[notify]
format = "slack"
timeout_secs = 3

[[notify.sinks]]
name = "ops"
url_env = "OPS_WEBHOOK"
format = "json"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.notify.format, PayloadFormat::Slack);
        assert_eq!(config.notify.timeout_secs, 3);
        assert_eq!(config.notify.sinks.len(), 1);
        assert_eq!(config.notify.sinks[0].name, "ops");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let dir = std::env::temp_dir().join(format!("contactdesk-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);

        std::fs::write(&path, "[notify]\ntimeout_secs = 0\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ContactDeskError::Config { .. }));
        assert!(err.to_string().contains("notify.timeout_secs"));

        std::fs::write(&path, "[address]\ntimeout_secs = 0\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("address.timeout_secs"));

        std::fs::write(&path, "[notify]\ntimeout_secs = 2\n").unwrap();
        assert_eq!(load_config_from(&path).unwrap().notify.timeout_secs, 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolve_sinks_reads_env() {
        let mut config = NotifyConfig::default();
        config.sinks.push(SinkConfig {
            name: "ops".into(),
            url_env: "OPS_WEBHOOK".into(),
            format: PayloadFormat::Json,
        });

        let sinks = config
            .resolve_sinks_with(env(&[
                ("SLACK_WEBHOOK", "https://hooks.example.com/T000/B000"),
                ("OPS_WEBHOOK", "http://ops.example.com/notify"),
            ]))
            .expect("resolve");

        assert_eq!(sinks.len(), 2);
        assert_eq!(sinks[0].name, PRIMARY_SINK_NAME);
        assert_eq!(sinks[1].url.host_str(), Some("ops.example.com"));
    }

    #[test]
    fn missing_webhook_env_is_config_error() {
        let config = NotifyConfig::default();
        let err = config.resolve_sinks_with(env(&[])).unwrap_err();
        assert!(matches!(err, ContactDeskError::Config { .. }));
        assert!(err.to_string().contains("SLACK_WEBHOOK"));
    }

    #[test]
    fn empty_or_non_http_webhook_is_rejected() {
        let config = NotifyConfig::default();
        assert!(config.resolve_sinks_with(env(&[("SLACK_WEBHOOK", "  ")])).is_err());

        let err = config
            .resolve_sinks_with(env(&[("SLACK_WEBHOOK", "ftp://hooks.example.com/x")]))
            .unwrap_err();
        assert!(err.to_string().contains("http(s)"));
        assert!(!err.to_string().contains("hooks.example.com"));
    }

    #[test]
    fn resolved_sink_debug_hides_url() {
        let config = NotifyConfig::default();
        let sinks = config
            .resolve_sinks_with(env(&[("SLACK_WEBHOOK", "https://hooks.example.com/secret")]))
            .unwrap();
        let debug = format!("{:?}", sinks[0]);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("redacted"));
    }
}
