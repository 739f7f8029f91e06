//! Run report returned by [`RenameEngine`](crate::api::engine::RenameEngine).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rename::synthesis::{RenamedAddress, SynthesisStats};

/// Summary of one rename run
#[derive(Debug, Clone, Serialize)]
pub struct RenameReport {
    /// Project document that was read
    pub project_file: PathBuf,
    /// Namespace URI sniffed from the document root
    pub namespace: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Device → group address links found in the topology
    pub device_refs: usize,
    /// Rooms and corridors indexed
    pub rooms: usize,
    /// Name synthesis counters
    pub stats: SynthesisStats,
    /// Distinct range labels sent to the translator
    pub translated_labels: usize,
    /// Whether the translator was used for this run
    pub translation_active: bool,
    /// Ids of removed group addresses
    pub pruned: Vec<String>,
    /// Renamed document
    pub updated_document: PathBuf,
    /// Pruned pristine copy, when pruning was enabled
    pub original_document: Option<PathBuf>,
    /// Every rename, in processing order
    pub renames: Vec<RenamedAddress>,
}

impl RenameReport {
    /// Group addresses that received a new name
    pub fn renamed(&self) -> usize {
        self.stats.renamed
    }

    /// Referenced tokens that no group address matched
    pub fn skipped(&self) -> usize {
        self.stats.missing_addresses + self.stats.format_failures
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> crate::core::errors::Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}
