// WHY: one immutable record per render decides which entity kinds get linked
// Field defaults mirror what callers get when they leave a setting out of the JSON file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

use crate::recognizer::{EnabledKinds, RecognizeOptions};

/// Link color used by the default renderer
pub const DEFAULT_LINK_COLOR: &str = "#0E7AFE";

/// Platform that hashtag links open in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(try_from = "HashtagSetting")]
pub enum HashtagPlatform {
    /// Hashtags are not linked
    #[default]
    Off,
    Instagram,
    Twitter,
}

impl HashtagPlatform {
    pub fn is_enabled(self) -> bool {
        self != HashtagPlatform::Off
    }
}

/// Accepted JSON shapes: `false`, `"off"`, `"instagram"`, `"twitter"`
#[derive(Deserialize)]
#[serde(untagged)]
enum HashtagSetting {
    Flag(bool),
    Named(String),
}

impl TryFrom<HashtagSetting> for HashtagPlatform {
    type Error = String;

    fn try_from(setting: HashtagSetting) -> Result<Self, Self::Error> {
        match setting {
            HashtagSetting::Flag(false) => Ok(HashtagPlatform::Off),
            HashtagSetting::Flag(true) => {
                Err("hashtag must be false, \"instagram\" or \"twitter\", not true".to_string())
            }
            HashtagSetting::Named(name) => match name.to_ascii_lowercase().as_str() {
                "off" | "false" => Ok(HashtagPlatform::Off),
                "instagram" => Ok(HashtagPlatform::Instagram),
                "twitter" => Ok(HashtagPlatform::Twitter),
                other => Err(format!("unknown hashtag platform: {other}")),
            },
        }
    }
}

impl Serialize for HashtagPlatform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HashtagPlatform::Off => serializer.serialize_bool(false),
            HashtagPlatform::Instagram => serializer.serialize_str("instagram"),
            HashtagPlatform::Twitter => serializer.serialize_str("twitter"),
        }
    }
}

/// Which entity kinds to link and how link labels are shortened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// Link e-mail addresses
    pub email: bool,
    /// Link hashtags, and choose which platform they open in
    pub hashtag: HashtagPlatform,
    /// Link phone numbers
    pub phone: bool,
    /// Link URLs
    pub url: bool,
    /// Link `@handle` mentions
    #[serde(alias = "twitter")]
    pub mention: bool,
    /// Drop `http://`, `https://` and `www.` from URL labels
    pub strip_prefix: bool,
    /// Maximum label length in characters, 0 disables truncation
    pub truncate: usize,
    /// Marker inserted where a truncated label was shortened
    pub truncate_chars: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            email: true,
            hashtag: HashtagPlatform::Off,
            phone: true,
            url: true,
            mention: false,
            strip_prefix: true,
            truncate: 32,
            truncate_chars: "..".to_string(),
        }
    }
}

impl Configuration {
    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config = serde_json::from_str(json).context("Invalid autolink configuration")?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Entity kinds the recognizer should look for
    pub fn enabled_kinds(&self) -> EnabledKinds {
        EnabledKinds {
            email: self.email,
            url: self.url,
            phone: self.phone,
            hashtag: self.hashtag.is_enabled(),
            mention: self.mention,
        }
    }

    pub fn recognize_options(&self) -> RecognizeOptions {
        RecognizeOptions {
            kinds: self.enabled_kinds(),
            strip_prefix: self.strip_prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert!(config.email);
        assert!(config.phone);
        assert!(config.url);
        assert!(!config.mention);
        assert_eq!(config.hashtag, HashtagPlatform::Off);
        assert!(config.strip_prefix);
        assert_eq!(config.truncate, 32);
        assert_eq!(config.truncate_chars, "..");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Configuration::from_json_str(r#"{"hashtag": "twitter", "truncate": 0}"#).unwrap();
        assert_eq!(config.hashtag, HashtagPlatform::Twitter);
        assert_eq!(config.truncate, 0);
        assert!(config.email);
        assert_eq!(config.truncate_chars, "..");
    }

    #[test]
    fn test_hashtag_accepts_false() {
        let config = Configuration::from_json_str(r#"{"hashtag": false}"#).unwrap();
        assert_eq!(config.hashtag, HashtagPlatform::Off);
    }

    #[test]
    fn test_hashtag_rejects_true_and_unknown() {
        assert!(Configuration::from_json_str(r#"{"hashtag": true}"#).is_err());
        assert!(Configuration::from_json_str(r#"{"hashtag": "myspace"}"#).is_err());
    }

    #[test]
    fn test_twitter_alias_enables_mentions() {
        let config = Configuration::from_json_str(r#"{"twitter": true}"#).unwrap();
        assert!(config.mention);
        assert!(config.enabled_kinds().mention);
    }

    #[test]
    fn test_camel_case_fields() {
        let config = Configuration::from_json_str(
            r#"{"stripPrefix": false, "truncateChars": "__"}"#,
        )
        .unwrap();
        assert!(!config.strip_prefix);
        assert_eq!(config.truncate_chars, "__");
    }

    #[test]
    fn test_serialize_hashtag_off_as_false() {
        let json = serde_json::to_value(Configuration::default()).unwrap();
        assert_eq!(json["hashtag"], serde_json::Value::Bool(false));
    }

    #[test]
    fn test_enabled_kinds_projection() {
        let config = Configuration {
            email: false,
            hashtag: HashtagPlatform::Instagram,
            ..Configuration::default()
        };
        let kinds = config.enabled_kinds();
        assert!(!kinds.email);
        assert!(kinds.hashtag);
        assert!(kinds.url);
        assert!(!kinds.mention);
    }
}
