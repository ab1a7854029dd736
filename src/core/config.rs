//! settings.json loading and validation.
//!
//! The config is re-read from disk on every trigger so edits take effect
//! without restarting the game. Alongside every load attempt, a plain-text
//! schema description is regenerated in the same directory so users have
//! something to read when the popup tells them their config is broken.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ENDPOINT_DOMAIN: &str = "api.openshock.app";

pub const DEFAULT_MIN_DURATION_MS: i64 = 300;
pub const DEFAULT_MAX_DURATION_MS: i64 = 30000;
pub const DEFAULT_MIN_INTENSITY: i64 = 1;
pub const DEFAULT_MAX_INTENSITY: i64 = 100;

const SETTINGS_FILE: &str = "settings.json";
const README_FILE: &str = "readme.txt";

/// Why a load attempt failed. Range and intensity violations are separate
/// variants so callers can produce distinct diagnostics; all of them map
/// to an instructional popup via [`ConfigError::popup_message`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open settings.json: {0}")]
    MissingFile(#[source] io::Error),
    #[error("could not parse settings.json: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("missing required config field: {0}")]
    MissingRequiredField(&'static str),
    #[error("invalid duration range: minDuration={min}, maxDuration={max}")]
    InvalidRange { min: i64, max: i64 },
    #[error("invalid intensity range: minIntensity={min}, maxIntensity={max}")]
    InvalidIntensity { min: i64, max: i64 },
}

impl ConfigError {
    /// User-facing popup text. Deliberately generic: the details go to the
    /// log, the user goes to readme.txt.
    pub fn popup_message(&self) -> &'static str {
        match self {
            Self::MissingFile(_) => {
                "Error: Missing config file! Read readme.txt in the mod's config folder."
            }
            Self::MissingRequiredField(_) => {
                "Error: Missing required fields in config file! Read readme.txt in the mod's config folder."
            }
            Self::MalformedJson(_) | Self::InvalidRange { .. } | Self::InvalidIntensity { .. } => {
                "Error: Invalid config file! Read readme.txt in the mod's config folder."
            }
        }
    }
}

/// Validated configuration, immutable once constructed.
#[derive(Clone)]
pub struct ShockConfig {
    pub shocker_id: String,
    pub api_token: String,
    pub custom_name: String,
    pub min_duration_ms: u32,
    pub max_duration_ms: u32,
    pub min_intensity: u32,
    pub max_intensity: u32,
    pub endpoint_domain: String,
}

// The API token must never reach the log output, so Debug redacts it.
impl fmt::Debug for ShockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShockConfig")
            .field("shocker_id", &self.shocker_id)
            .field("api_token", &"<redacted>")
            .field("custom_name", &self.custom_name)
            .field("min_duration_ms", &self.min_duration_ms)
            .field("max_duration_ms", &self.max_duration_ms)
            .field("min_intensity", &self.min_intensity)
            .field("max_intensity", &self.max_intensity)
            .field("endpoint_domain", &self.endpoint_domain)
            .finish()
    }
}

/// Raw on-disk shape. Everything is optional here; requiredness and
/// ranges are enforced in [`RawSettings::validate`] so each failure mode
/// gets its own error variant. Unknown fields are ignored. No Debug impl:
/// this still carries the raw token.
#[derive(Deserialize)]
struct RawSettings {
    #[serde(rename = "shockerID", default)]
    shocker_id: Option<String>,
    #[serde(rename = "OpenShockToken", default)]
    api_token: Option<String>,
    #[serde(rename = "customName", default)]
    custom_name: Option<String>,
    #[serde(rename = "minDuration", default)]
    min_duration: Option<i64>,
    #[serde(rename = "maxDuration", default)]
    max_duration: Option<i64>,
    #[serde(rename = "minIntensity", default)]
    min_intensity: Option<i64>,
    #[serde(rename = "maxIntensity", default)]
    max_intensity: Option<i64>,
    #[serde(rename = "endpointDomain", default)]
    endpoint_domain: Option<String>,
}

fn required_field(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            log::error!("Missing required field in config: {}", name);
            Err(ConfigError::MissingRequiredField(name))
        }
    }
}

impl RawSettings {
    fn validate(self) -> Result<ShockConfig, ConfigError> {
        let shocker_id = required_field(self.shocker_id, "shockerID")?;
        let api_token = required_field(self.api_token, "OpenShockToken")?;
        let custom_name = required_field(self.custom_name, "customName")?;

        let min_duration = self.min_duration.unwrap_or(DEFAULT_MIN_DURATION_MS);
        let max_duration = self.max_duration.unwrap_or(DEFAULT_MAX_DURATION_MS);
        let min_intensity = self.min_intensity.unwrap_or(DEFAULT_MIN_INTENSITY);
        let max_intensity = self.max_intensity.unwrap_or(DEFAULT_MAX_INTENSITY);

        // Duration invariants come first; intensity is not reached if they fail.
        if min_duration < DEFAULT_MIN_DURATION_MS
            || max_duration > DEFAULT_MAX_DURATION_MS
            || min_duration > max_duration
        {
            log::error!(
                "Invalid duration range in config: minDuration={}, maxDuration={}",
                min_duration,
                max_duration
            );
            return Err(ConfigError::InvalidRange {
                min: min_duration,
                max: max_duration,
            });
        }

        if min_intensity < DEFAULT_MIN_INTENSITY
            || max_intensity > DEFAULT_MAX_INTENSITY
            || min_intensity > max_intensity
        {
            log::error!(
                "Invalid intensity range in config: minIntensity={}, maxIntensity={}",
                min_intensity,
                max_intensity
            );
            return Err(ConfigError::InvalidIntensity {
                min: min_intensity,
                max: max_intensity,
            });
        }

        let endpoint_domain = match self.endpoint_domain {
            Some(domain) if !domain.is_empty() => domain,
            _ => DEFAULT_ENDPOINT_DOMAIN.to_string(),
        };

        // Ranges are confined to [300, 30000] and [1, 100] at this point,
        // so the narrowing casts cannot truncate.
        Ok(ShockConfig {
            shocker_id,
            api_token,
            custom_name,
            min_duration_ms: min_duration as u32,
            max_duration_ms: max_duration as u32,
            min_intensity: min_intensity as u32,
            max_intensity: max_intensity as u32,
            endpoint_domain,
        })
    }
}

pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// The config directory is supplied by the host; no engine singleton
    /// is consulted.
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    fn readme_path(&self) -> PathBuf {
        self.config_dir.join(README_FILE)
    }

    /// Fresh read of settings.json, validated into a [`ShockConfig`].
    /// The readme is regenerated on every attempt, including failing ones.
    pub fn load(&self) -> Result<ShockConfig, ConfigError> {
        self.write_readme();

        let content = fs::read_to_string(self.settings_path()).map_err(|e| {
            log::error!("Failed to open settings.json in config directory: {}", e);
            ConfigError::MissingFile(e)
        })?;

        let raw: RawSettings = serde_json::from_str(&content).map_err(|e| {
            log::error!("Error parsing settings.json: {}", e);
            ConfigError::MalformedJson(e)
        })?;

        raw.validate()
    }

    /// Overwrites readme.txt with the schema documentation. A failed write
    /// is logged and swallowed; it must not block the trigger.
    fn write_readme(&self) {
        let contents = format!(
            "{}\nGenerated: {}\n",
            README_TEXT,
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        let result = fs::create_dir_all(&self.config_dir)
            .and_then(|()| fs::write(self.readme_path(), contents));
        if let Err(e) = result {
            log::warn!("Failed to write readme.txt in the config directory: {}", e);
        }
    }
}

const README_TEXT: &str = r#"=======================================================
        OpenShock Mod Configuration Documentation
=======================================================

The `settings.json` file configures the OpenShock mod.
This file must follow JSON format and include the necessary fields.

-------------------------------------------------------
Supported Fields
-------------------------------------------------------

Field Name      | Type    | Required | Default           | Description
----------------+---------+----------+-------------------+-----------------------------------------------
shockerID       | string  | Yes      | N/A               | Unique ID for the shocker device.
OpenShockToken  | string  | Yes      | N/A               | API token for the OpenShock service.
customName      | string  | Yes      | N/A               | Custom name for the shock control session.
minDuration     | integer | No       | 300               | Minimum shock duration (ms). Must be >= 300.
maxDuration     | integer | No       | 30000             | Maximum shock duration (ms). Must be <= 30000.
minIntensity    | integer | No       | 1                 | Minimum shock intensity. Must be >= 1.
maxIntensity    | integer | No       | 100               | Maximum shock intensity. Must be <= 100.
endpointDomain  | string  | No       | api.openshock.app | API endpoint domain. Defaults if not provided.

-------------------------------------------------------
Validation Rules
-------------------------------------------------------

1. Duration ranges:
   - `minDuration` must be >= 300.
   - `maxDuration` must be <= 30000.
   - `minDuration` must not exceed `maxDuration`.

2. Intensity ranges:
   - `minIntensity` must be >= 1.
   - `maxIntensity` must be <= 100.
   - `minIntensity` must not exceed `maxIntensity`.

3. Required fields:
   - `shockerID`, `OpenShockToken`, and `customName` are mandatory
     and must not be empty.

4. Endpoint domain:
   - If `endpointDomain` is missing or empty, defaults to `api.openshock.app`.

-------------------------------------------------------
Example Configuration File
-------------------------------------------------------

{
    "shockerID": "7a3e1c5b-fb7c-4b1c-8b6e-6a2e1f8b7d92",
    "OpenShockToken": "<your API token>",
    "minDuration": 500,
    "maxDuration": 10000,
    "minIntensity": 10,
    "maxIntensity": 90,
    "customName": "ShockControl",
    "endpointDomain": "api.openshock.app"
}

-------------------------------------------------------
Error Handling
-------------------------------------------------------

- Invalid configurations are rejected as a whole; nothing is sent.
- Errors are logged and displayed in-game via pop-ups.
- Required fields must not be empty.
- Ensure `endpointDomain` is valid if provided.

-------------------------------------------------------
"#;
