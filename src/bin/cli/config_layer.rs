//! Configuration Layer Management
//!
//! Defaults, then a configuration file (explicit `--config` or an implicit
//! `.knxrename.yml`), then CLI overrides.

use std::path::{Path, PathBuf};

use crate::cli::args::RenameArgs;
use knxrename_rs::core::config::{KnxRenameConfig, OutputConfig, RenameConfig, TranslationConfig};

const IMPLICIT_CONFIG_FILES: [&str; 2] = [".knxrename.yml", ".knxrename.yaml"];

/// Trait for merging configuration layers
pub trait ConfigMerge<T> {
    /// Merge another configuration into this one, with the other taking priority
    fn merge_with(&mut self, other: T);
}

/// Convert CLI arguments to partial configuration overrides
pub trait FromCliArgs<T> {
    /// Create a partial configuration from CLI arguments
    fn from_cli_args(args: &T) -> Self;
}

/// Load a configuration file, or the defaults when `path` is `None`.
pub fn load_configuration(path: Option<&Path>) -> anyhow::Result<KnxRenameConfig> {
    let config = match path {
        Some(path) => KnxRenameConfig::from_yaml_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to load configuration from {}: {}", path.display(), e)
        })?,
        None => KnxRenameConfig::default(),
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
    Ok(config)
}

/// Build the effective configuration for a rename run.
pub fn build_layered_config(args: &RenameArgs) -> anyhow::Result<KnxRenameConfig> {
    let implicit_config_path = if args.config.is_none() {
        IMPLICIT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    } else {
        None
    };

    let mut config = match args.config.as_ref().or(implicit_config_path.as_ref()) {
        Some(config_path) => KnxRenameConfig::from_yaml_file(config_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load configuration from {}: {}",
                config_path.display(),
                e
            )
        })?,
        None => KnxRenameConfig::default(),
    };

    config.merge_with(KnxRenameConfig::from_cli_args(args));

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}

impl FromCliArgs<RenameArgs> for KnxRenameConfig {
    fn from_cli_args(args: &RenameArgs) -> Self {
        let mut config = KnxRenameConfig::default();
        config.rename.remove_unused_addresses = args.remove_unused;
        config.translation.enabled = args.translate;
        if let Some(target) = &args.target_lang {
            config.translation.target_lang = target.clone();
        }
        config.translation.source_lang = args.source_lang.clone();
        config.output.output_dir = args.out.clone();
        config
    }
}

/// Merge higher-priority values into an existing config.
///
/// CLI flags can only switch features on, so a `false` coming from the
/// overrides never clears a `true` from the file.
impl ConfigMerge<KnxRenameConfig> for KnxRenameConfig {
    fn merge_with(&mut self, other: KnxRenameConfig) {
        self.rename.merge_with(other.rename);
        self.translation.merge_with(other.translation);
        self.output.merge_with(other.output);
    }
}

impl ConfigMerge<RenameConfig> for RenameConfig {
    fn merge_with(&mut self, other: RenameConfig) {
        if other.remove_unused_addresses {
            self.remove_unused_addresses = true;
        }
        let default = RenameConfig::default();
        if other.placeholders != default.placeholders {
            self.placeholders = other.placeholders;
        }
    }
}

impl ConfigMerge<TranslationConfig> for TranslationConfig {
    fn merge_with(&mut self, other: TranslationConfig) {
        let default = TranslationConfig::default();
        if other.enabled {
            self.enabled = true;
        }
        if other.source_lang.is_some() {
            self.source_lang = other.source_lang;
        }
        if other.target_lang != default.target_lang {
            self.target_lang = other.target_lang;
        }
    }
}

impl ConfigMerge<OutputConfig> for OutputConfig {
    fn merge_with(&mut self, other: OutputConfig) {
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir;
        }
    }
}
