use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Host-side settings for one bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// CDN folder uploads are filed under.
    #[serde(default = "default_upload_folder")]
    pub upload_folder: String,
    /// Hold `insert-image` messages until the surface reports `ready`.
    #[serde(default = "default_true")]
    pub queue_until_ready: bool,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub notices: NoticeTexts,
    #[serde(default)]
    pub page: PageOptions,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            upload_folder: default_upload_folder(),
            queue_until_ready: true,
            queue_capacity: default_queue_capacity(),
            notices: NoticeTexts::default(),
            page: PageOptions::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.upload_folder.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "upload_folder must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// User-facing texts for the notices the acquisition flow raises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeTexts {
    #[serde(default = "default_permission_denied")]
    pub permission_denied: String,
    /// Shown when the upload service gives no message of its own.
    #[serde(default = "default_upload_failed")]
    pub upload_failed: String,
}

impl Default for NoticeTexts {
    fn default() -> Self {
        Self {
            permission_denied: default_permission_denied(),
            upload_failed: default_upload_failed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOptions {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub placeholder: String,
    /// Language tag of the edited field, e.g. `en` or `ta`.
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_true")]
    pub show_toolbar: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: default_title(),
            placeholder: String::new(),
            lang: default_lang(),
            show_toolbar: true,
        }
    }
}

fn default_upload_folder() -> String {
    "vayal".to_string()
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    16
}

fn default_permission_denied() -> String {
    "Permission to access your photos is needed to add images.".to_string()
}

fn default_upload_failed() -> String {
    "Image upload failed. Please try again.".to_string()
}

fn default_title() -> String {
    "Editor".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}
