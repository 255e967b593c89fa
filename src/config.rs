//! Configuration management module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::controllers::attachments::{DEFAULT_ALLOWED_EXTENSIONS, MAX_ATTACHMENT_BYTES};
use crate::controllers::communication::{BadgePolicy, USER_MESSAGE_BADGE};

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub endpoints: EndpointsConfig,
    pub polling: PollingConfig,
    pub attachments: AttachmentsConfig,
    pub voucher: VoucherConfig,
    pub badges: BadgesConfig,
}

/// Mutuelle server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
    /// Fixed anti-forgery token. When unset the `csrftoken` cookie is used.
    pub csrf_token: Option<String>,
    /// Session cookie value seeded into the cookie jar at startup.
    pub session_cookie: Option<String>,
}

/// REST endpoint paths, relative to `server.base_url`.
///
/// Paths containing `{id}` are templates filled per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub member_search: String,
    pub member_list: String,
    pub dues_verification: String,
    pub doctor_list: String,
    pub daily_stats: String,
    pub voucher_creation: String,
    pub notification_count: String,
    pub message_unread_count: String,
    pub conversation_list: String,
    pub conversation_messages: String,
    pub send_message: String,
    pub attachment_download: String,
}

/// Badge count polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
}

/// Message attachment limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentsConfig {
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

/// Voucher wizard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoucherConfig {
    pub min_search_length: usize,
}

/// Per badge class display policy overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgesConfig {
    pub policies: BTreeMap<String, BadgePolicy>,
}

impl AppConfig {
    /// Get config file path in the platform config directory.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("org", "mutuelle", "mutuelle-desk")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.base_url.starts_with("http") {
            return Err(ConfigError::Validation(
                "Server URL must start with http:// or https://".to_string(),
            ));
        }
        if self.server.timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.polling.interval_secs < 5 {
            return Err(ConfigError::Validation(
                "Polling interval must be at least 5 seconds".to_string(),
            ));
        }
        if self.attachments.max_size_bytes == 0 {
            return Err(ConfigError::Validation(
                "Attachment size limit must be greater than 0".to_string(),
            ));
        }
        if self.attachments.allowed_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one attachment extension must be allowed".to_string(),
            ));
        }
        if self.voucher.min_search_length < 1 {
            return Err(ConfigError::Validation(
                "Minimum search length must be at least 1".to_string(),
            ));
        }
        for (name, template) in [
            ("dues_verification", &self.endpoints.dues_verification),
            ("conversation_messages", &self.endpoints.conversation_messages),
            ("attachment_download", &self.endpoints.attachment_download),
        ] {
            if !template.contains("{id}") {
                return Err(ConfigError::Validation(format!(
                    "Endpoint {name} must contain an {{id}} placeholder"
                )));
            }
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl EndpointsConfig {
    /// Fill the `{id}` placeholder of an endpoint template.
    pub fn with_id(template: &str, id: i64) -> String {
        template.replace("{id}", &id.to_string())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            csrf_token: None,
            session_cookie: None,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            member_search: "/membres/api/search/".to_string(),
            member_list: "/membres/api/liste/".to_string(),
            dues_verification: "/agents/verifier-cotisation/{id}/".to_string(),
            doctor_list: "/medecin/api/list/".to_string(),
            daily_stats: "/agents/api/stats-quotidiens/".to_string(),
            voucher_creation: "/agents/creer-bon-soin/".to_string(),
            notification_count: "/communication/notifications/count/".to_string(),
            message_unread_count: "/communication/api/messages/count/".to_string(),
            conversation_list: "/communication/api/conversations/".to_string(),
            conversation_messages: "/communication/api/messages/{id}/".to_string(),
            send_message: "/communication/envoyer-message/".to_string(),
            attachment_download: "/communication/fichier/{id}/telecharger/".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_ATTACHMENT_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Default for VoucherConfig {
    fn default() -> Self {
        Self { min_search_length: 3 }
    }
}

impl Default for BadgesConfig {
    fn default() -> Self {
        let mut policies = BTreeMap::new();
        policies.insert(USER_MESSAGE_BADGE.to_string(), BadgePolicy::AlwaysShowText);
        Self { policies }
    }
}
