use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Language codes following ISO 639-1
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The string sent to the service as `language` for this target.
    ///
    /// Codes missing from [`target_languages`] are passed through verbatim
    /// in either format.
    pub fn wire_value(&self, format: LanguageFormat) -> String {
        match format {
            LanguageFormat::Code => self.0.clone(),
            LanguageFormat::Label => target_languages()
                .into_iter()
                .find(|opt| opt.code == self.as_str())
                .map_or_else(|| self.0.clone(), |opt| opt.label.to_string()),
        }
    }
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How the target language is written into the submit request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFormat {
    /// ISO code, e.g. `fr`
    Code,
    /// Service-facing label, e.g. `法语`
    #[default]
    Label,
}

impl std::str::FromStr for LanguageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "label" | "name" => Ok(Self::Label),
            other => Err(Error::ConfigInvalid {
                field: "language_format".to_string(),
                reason: format!("expected 'code' or 'label', got '{other}'"),
            }),
        }
    }
}

/// What the poller does with a non-200, non-404 result status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollPolicy {
    /// Treat as transient and keep polling within the retry budget
    #[default]
    Lenient,
    /// Stop the sequence with [`Error::PollError`]
    Strict,
}

/// Translation service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL, without the `/v1/...` path
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Static credential sent as `x-user-token`
    #[serde(default = "default_user_token")]
    pub user_token: String,
    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub language_format: LanguageFormat,
}

impl ServiceConfig {
    pub fn new(api_base: impl Into<String>, user_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            user_token: user_token.into(),
            ..Self::default()
        }
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_user_token() -> String {
    DEFAULT_USER_TOKEN.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_token: default_user_token(),
            request_timeout_secs: default_request_timeout_secs(),
            language_format: LanguageFormat::default(),
        }
    }
}

/// Result polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub policy: PollPolicy,
}

impl PollConfig {
    pub const fn new(max_retries: u32, delay_ms: u64) -> Self {
        Self {
            max_retries,
            delay_ms,
            policy: PollPolicy::Lenient,
        }
    }

    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

const fn default_max_retries() -> u32 {
    60
}

const fn default_delay_ms() -> u64 {
    15_000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(default_max_retries(), default_delay_ms())
    }
}

/// Export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for saved translations (unset = don't save)
    pub output_dir: Option<PathBuf>,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target language
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_lang: default_target_lang(),
            service: ServiceConfig::default(),
            poll: PollConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/long-translate/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("long-translate").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        let base = self.service.api_base.trim();
        if base.is_empty() {
            return Err(Error::ConfigInvalid {
                field: "service.api_base".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::ConfigInvalid {
                field: "service.api_base".to_string(),
                reason: format!("expected an http(s) URL, got '{base}'"),
            });
        }
        if self.service.user_token.is_empty() {
            return Err(Error::ConfigInvalid {
                field: "service.user_token".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.target_lang.as_str().trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "target_lang".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// A language option for the target picker
#[derive(Debug, Clone)]
pub struct LanguageOption {
    /// ISO language code (e.g., "en", "fr")
    pub code: &'static str,
    /// English display name
    pub name: &'static str,
    /// Label the service prompt expects
    pub label: &'static str,
}

/// Languages offered as translation target.
pub fn target_languages() -> Vec<LanguageOption> {
    vec![
        LanguageOption { code: "en", name: "English", label: "英语" },
        LanguageOption { code: "zh", name: "Chinese", label: "中文" },
        LanguageOption { code: "es", name: "Spanish", label: "西班牙语" },
        LanguageOption { code: "fr", name: "French", label: "法语" },
        LanguageOption { code: "de", name: "German", label: "德语" },
        LanguageOption { code: "ja", name: "Japanese", label: "日语" },
        LanguageOption { code: "ko", name: "Korean", label: "韩语" },
        LanguageOption { code: "ru", name: "Russian", label: "俄语" },
        LanguageOption { code: "ar", name: "Arabic", label: "阿拉伯语" },
        LanguageOption { code: "pt", name: "Portuguese", label: "葡萄牙语" },
        LanguageOption { code: "it", name: "Italian", label: "意大利语" },
    ]
}

/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "en";
/// Default translation service
pub const DEFAULT_API_BASE: &str = "https://long-translate.mlsql.tech:8998";
/// Credential the public client ships with
pub const DEFAULT_USER_TOKEN: &str = "long-translate";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_value_formats() {
        let fr = Lang::new("fr");
        assert_eq!(fr.wire_value(LanguageFormat::Code), "fr");
        assert_eq!(fr.wire_value(LanguageFormat::Label), "法语");
    }

    #[test]
    fn test_wire_value_unknown_code_passes_through() {
        let lang = Lang::new("Klingon");
        assert_eq!(lang.wire_value(LanguageFormat::Label), "Klingon");
        assert_eq!(lang.wire_value(LanguageFormat::Code), "Klingon");
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.target_lang.as_str(), "en");
        assert_eq!(config.poll.max_retries, 60);
        assert_eq!(config.poll.delay(), Duration::from_secs(15));
        assert_eq!(config.poll.policy, PollPolicy::Lenient);
        assert_eq!(config.service.language_format, LanguageFormat::Label);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            target_lang = "de"

            [poll]
            delay_ms = 5000
            policy = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.target_lang.as_str(), "de");
        assert_eq!(config.poll.delay_ms, 5000);
        assert_eq!(config.poll.max_retries, 60);
        assert_eq!(config.poll.policy, PollPolicy::Strict);
        assert_eq!(config.service.api_base, DEFAULT_API_BASE);
        assert!(config.export.output_dir.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.service.language_format = LanguageFormat::Code;
        config.export.output_dir = Some(PathBuf::from("/tmp/out"));

        let text = toml::to_string(&config).unwrap();
        let parsed = AppConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.service.language_format, LanguageFormat::Code);
        assert_eq!(parsed.export.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_validate_rejects_bad_api_base() {
        let err = AppConfig::from_toml(
            r#"
            [service]
            api_base = "ftp://example.com"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { ref field, .. } if field == "service.api_base"));
    }

    #[test]
    fn test_language_format_from_str() {
        assert_eq!("CODE".parse::<LanguageFormat>().unwrap(), LanguageFormat::Code);
        assert_eq!("name".parse::<LanguageFormat>().unwrap(), LanguageFormat::Label);
        assert!("iso".parse::<LanguageFormat>().is_err());
    }
}
