//! # knxrename-rs: Group Address Renaming for KNX ETS Projects
//!
//! Rewrites the group address names of an ETS project export into a
//! canonical, machine-friendly form built from where each device sits in the
//! building and what its communication object does:
//!
//! ```text
//! Cmd_Confort_Eclairage_Siege_FacadeXx_1erEtage_Bureau1
//! │   │       │         │     │        │        └ room
//! │   │       │         │     │        └ floor
//! │   │       │         │     └ building part (placeholder)
//! │   │       │         └ building
//! │   │       └ group range (function)
//! │   └ parent group range
//! └ role: command or indication
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        API Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core          │  Format       │  Project      │  Rename    │
//! │                │               │               │            │
//! │ • XML tree     │ • Normalizer  │ • Discovery   │ • Synthesis│
//! │ • Config       │ • Translation │ • Hardware    │ • Pruning  │
//! │ • Errors       │ • DeepL       │ • Locations   │            │
//! │                │               │ • Devices     │            │
//! │                │               │ • Export      │            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use knxrename_rs::{KnxRenameConfig, RenameEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = KnxRenameConfig::default();
//!     config.rename.remove_unused_addresses = true;
//!
//!     let engine = RenameEngine::new(config)?;
//!     let report = engine.rename_project("./export").await?;
//!
//!     println!("Renamed {} group addresses", report.renamed());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core infrastructure
pub mod core {
    //! XML document model, configuration, and error types.

    pub mod config;
    pub mod errors;
    pub mod xml;
}

// Label formatting and translation
pub mod format {
    //! Label normalization and machine translation.

    pub mod deepl;
    pub mod normalize;
    pub mod translate;
}

// ETS project model
pub mod project {
    //! Lookups over the ETS export: project discovery, hardware, locations, devices.

    pub mod devices;
    pub mod discovery;
    pub mod export;
    pub mod hardware;
    pub mod location;
}

// Renaming passes
pub mod rename {
    //! Name synthesis and pruning of unused group addresses.

    pub mod prune;
    pub mod synthesis;
}

// Public API and engine interface
pub mod api {
    //! High-level API and engine interface.

    pub mod engine;
    pub mod report;
}

// Re-export primary types for convenience
pub use api::engine::RenameEngine;
pub use api::report::RenameReport;
pub use core::config::KnxRenameConfig;
pub use core::errors::{ErrorKind, KnxError, Result};
pub use format::deepl::DeepLTranslator;
pub use format::translate::Translator;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
