//! Command Execution Logic
//!
//! Entry points for every subcommand.

use std::path::PathBuf;
use std::sync::Arc;

use owo_colors::OwoColorize;
use tracing::warn;

use crate::cli::args::{ExportAddressesArgs, InitConfigArgs, RenameArgs, ValidateConfigArgs};
use crate::cli::config_layer::{build_layered_config, load_configuration};
use crate::cli::messages::Messages;
use crate::cli::output::{display_report, start_spinner};
use knxrename_rs::core::config::KnxRenameConfig;
use knxrename_rs::project::discovery::ProjectExport;
use knxrename_rs::{DeepLTranslator, RenameEngine};

/// Rename the group addresses of a project export
pub async fn rename_command(args: RenameArgs) -> anyhow::Result<()> {
    let config = build_layered_config(&args)?;
    let messages = Messages::for_language(&config.ui.language);
    let translation_requested = config.translation.enabled;

    let mut engine = RenameEngine::new(config.clone())?;
    if translation_requested {
        match DeepLTranslator::from_config(&config.translation) {
            Ok(translator) => engine = engine.with_translator(Arc::new(translator)),
            Err(e) => warn!(error = %e, "Translation disabled"),
        }
    }

    let spinner = if args.json {
        None
    } else {
        Some(start_spinner(messages.loading)?)
    };

    let result = engine.rename_project(&args.project).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        display_report(&report, messages, translation_requested);
    }

    Ok(())
}

/// Write the group address list of a project as a `GroupAddress-Export` document
pub async fn export_addresses_command(args: ExportAddressesArgs) -> anyhow::Result<()> {
    let engine = RenameEngine::new(KnxRenameConfig::default())?;
    let document = engine.export_addresses(&args.document)?;

    let out = match args.out {
        Some(out) => out,
        None => {
            let export = ProjectExport::locate(&args.document)?;
            let dir = export
                .project_file
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            dir.join(format!("{}_addresses.xml", export.stem()))
        }
    };

    let bytes = document.to_bytes()?;
    tokio::fs::write(&out, bytes).await?;
    println!(
        "{} {}",
        "✅ Group addresses exported to:".bright_green().bold(),
        out.display().to_string().cyan()
    );
    Ok(())
}

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default knxrename configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!("{}", "# Usage: knxrename rename --config your-config.yml <export>".dimmed());
    println!();

    let config = KnxRenameConfig::default();
    let yaml_output = serde_yaml::to_string(&config)?;
    println!("{}", yaml_output);

    Ok(())
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        eprintln!(
            "{} {}",
            "❌ Configuration file already exists:".red(),
            args.output.display()
        );
        eprintln!("   Use --force to overwrite or choose a different name with --output");
        std::process::exit(1);
    }

    let config = KnxRenameConfig::default();
    let yaml_content = serde_yaml::to_string(&config)?;
    tokio::fs::write(&args.output, yaml_content).await?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Next steps:".bright_blue().bold());
    println!("   1. Edit the placeholders and translation settings");
    println!(
        "   2. Run with: {}",
        format!("knxrename rename --config {} <export>", args.output.display()).cyan()
    );

    Ok(())
}

/// Validate a configuration file
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );
    println!();

    let config = match load_configuration(Some(&args.config)) {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!("{}", "🔧 Common issues:".bright_blue().bold());
            println!("   • Check YAML syntax (indentation, colons, quotes)");
            println!("   • Placeholders and suffixes must not be empty");
            println!("   • translation.api_endpoint must be an http(s) URL");
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'knxrename print-default-config' to see valid format".dimmed()
            );
            std::process::exit(1);
        }
    };

    let placeholders = &config.rename.placeholders;
    println!("   Remove unused addresses: {}", config.rename.remove_unused_addresses);
    println!(
        "   Placeholders:            {} / {} / {} / {} / {}",
        placeholders.building,
        placeholders.building_part,
        placeholders.floor,
        placeholders.room,
        placeholders.object_type
    );
    println!(
        "   Translation:             {} (target {})",
        config.translation.enabled, config.translation.target_lang
    );
    if config.translation.enabled && config.translation.api_key().is_none() {
        println!(
            "{}",
            format!(
                "   ⚠️  {} is not set; translation will be skipped",
                config.translation.api_key_env
            )
            .yellow()
        );
    }

    Ok(())
}
