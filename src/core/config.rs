//! Configuration types and management for knxrename-rs.
//!
//! The configuration is a YAML document with one section per concern. Every
//! section has defaults, so an empty file (or no file at all) is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{KnxError, Result};

/// Main configuration for the renaming engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnxRenameConfig {
    /// Name synthesis settings
    #[serde(default)]
    pub rename: RenameConfig,

    /// Machine translation of group range labels
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Where and how output documents are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Console message settings
    #[serde(default)]
    pub ui: UiConfig,
}

impl KnxRenameConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            KnxError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            KnxError::io(format!("Failed to write config file: {}", path.display()), e)
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.rename.validate()?;
        self.translation.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Name synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Delete group addresses that no device reference renamed
    pub remove_unused_addresses: bool,

    /// Literals used when a location or role is unknown
    #[serde(default)]
    pub placeholders: Placeholders,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            remove_unused_addresses: false,
            placeholders: Placeholders::default(),
        }
    }
}

impl RenameConfig {
    fn validate(&self) -> Result<()> {
        let p = &self.placeholders;
        for (field, value) in [
            ("building", &p.building),
            ("building_part", &p.building_part),
            ("floor", &p.floor),
            ("room", &p.room),
            ("object_type", &p.object_type),
        ] {
            if value.trim().is_empty() {
                return Err(KnxError::config_field(
                    "placeholder must not be empty",
                    format!("rename.placeholders.{field}"),
                ));
            }
        }
        Ok(())
    }
}

/// Fallback literals for missing name segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    /// Building name when the room has no Building ancestor
    pub building: String,
    /// Building part name when the room has no BuildingPart ancestor
    pub building_part: String,
    /// Floor name when the room has no Floor ancestor
    pub floor: String,
    /// Room name when the device has no location
    pub room: String,
    /// Role token when neither the name nor the hardware gives one
    pub object_type: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            building: "Batiment".to_string(),
            building_part: "FacadeXx".to_string(),
            floor: "Etage".to_string(),
            room: "Piece".to_string(),
            object_type: "Type".to_string(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translate group range labels before formatting them
    pub enabled: bool,

    /// Source language code; `None` lets the service detect it
    pub source_lang: Option<String>,

    /// Target language code (e.g. `FR`, `EN-GB`, `DE`)
    pub target_lang: String,

    /// Base URL of the DeepL v2 API
    pub api_endpoint: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_lang: None,
            target_lang: "FR".to_string(),
            api_endpoint: "https://api-free.deepl.com/v2".to_string(),
            api_key_env: "DEEPL_API_KEY".to_string(),
            timeout_secs: 20,
        }
    }
}

impl TranslationConfig {
    fn validate(&self) -> Result<()> {
        if self.target_lang.trim().is_empty() {
            return Err(KnxError::config_field(
                "target language must not be empty",
                "translation.target_lang",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(KnxError::config_field(
                "timeout must be at least one second",
                "translation.timeout_secs",
            ));
        }
        if !self.api_endpoint.starts_with("http://") && !self.api_endpoint.starts_with("https://") {
            return Err(KnxError::config_field(
                format!("'{}' is not an http(s) URL", self.api_endpoint),
                "translation.api_endpoint",
            ));
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Output document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for output documents; defaults to the project document's directory
    pub output_dir: Option<PathBuf>,

    /// Suffix appended to the project file stem for the renamed document
    pub updated_suffix: String,

    /// Suffix appended to the project file stem for the pruned pristine copy
    pub original_suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            updated_suffix: "_updated".to_string(),
            original_suffix: "_original".to_string(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.updated_suffix.is_empty() || self.original_suffix.is_empty() {
            return Err(KnxError::config_field(
                "output suffixes must not be empty",
                "output",
            ));
        }
        if self.updated_suffix == self.original_suffix {
            return Err(KnxError::config_field(
                "updated and original suffixes must differ",
                "output.original_suffix",
            ));
        }
        Ok(())
    }
}

/// Console message configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Language code for summary messages (`en`, `fr`, `de`)
    pub language: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
        }
    }
}
