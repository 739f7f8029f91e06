//! CLI Argument Structures
//!
//! This module contains all CLI argument definitions and command structures
//! used by the knxrename binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Group address renaming for KNX ETS project exports
#[derive(Parser)]
#[command(name = "knxrename")]
#[command(version = VERSION)]
#[command(about = "Rename KNX group addresses from device locations and roles")]
#[command(long_about = "
Rewrite the group address names of an unpacked ETS project export into
Role_Function_Building_BuildingPart_Floor_Room names.

Common Usage:

  # Rename in place, writing P-xxxx/0_updated.xml next to the project
  knxrename rename ./export

  # Also drop unreferenced group addresses (writes 0_original.xml too)
  knxrename rename ./export --remove-unused

  # Translate group range labels with DeepL (key from DEEPL_API_KEY)
  knxrename rename ./export --translate --target-lang EN-GB

  # Export the group address list in three-level notation
  knxrename export-addresses ./export/P-0001/0.xml --out addresses.xml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rename the group addresses of an ETS project export
    Rename(RenameArgs),

    /// Write the group address list as a GroupAddress-Export document
    #[command(name = "export-addresses")]
    ExportAddresses(ExportAddressesArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a knxrename configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args)]
pub struct RenameArgs {
    /// Export directory or project document (`P-xxxx/0.xml`)
    pub project: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for output documents (defaults to the project directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Remove group addresses no device references
    #[arg(long)]
    pub remove_unused: bool,

    /// Translate group range labels before formatting
    #[arg(long)]
    pub translate: bool,

    /// Target language for translation (e.g. FR, EN-GB, DE)
    #[arg(long)]
    pub target_lang: Option<String>,

    /// Source language for translation (detected when omitted)
    #[arg(long)]
    pub source_lang: Option<String>,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExportAddressesArgs {
    /// Export directory or project document
    pub document: PathBuf,

    /// Output file (defaults to `{stem}_addresses.xml` next to the document)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".knxrename.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(short, long, required = true)]
    pub config: PathBuf,
}
