//! Main rename engine implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::api::report::RenameReport;
use crate::core::config::KnxRenameConfig;
use crate::core::errors::{KnxError, Result, ResultExt};
use crate::core::xml::{Document, Namespace};
use crate::format::translate::{TranslatingFormatter, Translator};
use crate::project::devices::extract_device_refs;
use crate::project::discovery::ProjectExport;
use crate::project::export::export_group_addresses;
use crate::project::hardware::HardwareCatalog;
use crate::project::location::LocationIndex;
use crate::rename::prune::prune_unused;
use crate::rename::synthesis::NameSynthesizer;

/// Main knxrename engine
pub struct RenameEngine {
    /// Engine configuration
    config: Arc<KnxRenameConfig>,

    /// Translation backend, used when `translation.enabled` is set
    translator: Option<Arc<dyn Translator>>,
}

impl RenameEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: KnxRenameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            translator: None,
        })
    }

    /// Attach the translation backend
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &KnxRenameConfig {
        &self.config
    }

    /// Locate the project under `path` and rename it.
    pub async fn rename_project<P: AsRef<Path>>(&self, path: P) -> Result<RenameReport> {
        let export = ProjectExport::locate(path.as_ref())?;
        self.rename(&export).await
    }

    /// Rename every referenced group address of `export` and write the output documents.
    ///
    /// Nothing is written unless both documents serialize.
    pub async fn rename(&self, export: &ProjectExport) -> Result<RenameReport> {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!(project = %export.project_file.display(), "Starting rename");

        let mut document = Document::load(&export.project_file)?;
        let namespace = project_namespace(&document)?;
        info!(namespace = namespace.uri(), "Detected project namespace");

        let locations = LocationIndex::build(&document, &namespace);
        let mut catalog = HardwareCatalog::new(&export.export_root);
        let refs = extract_device_refs(&document, &namespace, &mut catalog);

        let mut formatter = self.formatter().await;
        let placeholders = &self.config.rename.placeholders;
        let outcome = NameSynthesizer::new(&mut formatter, placeholders)
            .run(&mut document, &namespace, &locations, &refs)
            .await;

        let (updated_path, original_path) = self.output_paths(export);
        let updated_bytes;
        let mut original = None;
        let mut pruned = Vec::new();

        if self.config.rename.remove_unused_addresses {
            let mut pristine = Document::load(&export.project_file)
                .context("Reloading project for the pruned original")?;
            pruned = prune_unused(&mut document, &mut pristine, &namespace, &outcome.touched);
            updated_bytes = document.to_bytes()?;
            original = Some((original_path, pristine.to_bytes()?));
        } else {
            updated_bytes = document.to_bytes()?;
        }

        if let Some(dir) = updated_path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| {
                KnxError::io(format!("Failed to create output directory {}", dir.display()), err)
            })?;
        }
        write_bytes(&updated_path, &updated_bytes)?;
        let original_document = match original {
            Some((path, bytes)) => {
                if let Err(err) = write_bytes(&path, &bytes) {
                    // no partial output: drop the updated document again
                    if let Err(cleanup) = std::fs::remove_file(&updated_path) {
                        warn!(
                            path = %updated_path.display(),
                            error = %cleanup,
                            "Failed to remove partially written output"
                        );
                    }
                    return Err(err);
                }
                Some(path)
            }
            None => None,
        };

        let report = RenameReport {
            project_file: export.project_file.clone(),
            namespace: namespace.uri().to_string(),
            started_at,
            duration_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
            device_refs: refs.len(),
            rooms: locations.len(),
            stats: outcome.stats,
            translated_labels: formatter.cache().len(),
            translation_active: formatter.is_active(),
            pruned,
            updated_document: updated_path,
            original_document,
            renames: outcome.renamed,
        };

        info!(
            renamed = report.renamed(),
            skipped = report.skipped(),
            pruned = report.pruned.len(),
            duration_ms = report.duration_ms,
            "Rename completed"
        );
        Ok(report)
    }

    /// Build the `GroupAddress-Export` document for a project file.
    pub fn export_addresses<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let export = ProjectExport::locate(path.as_ref())?;
        let document = Document::load(&export.project_file)?;
        let namespace = project_namespace(&document)?;
        Ok(export_group_addresses(&document, &namespace))
    }

    async fn formatter(&self) -> TranslatingFormatter {
        let translation = &self.config.translation;
        if !translation.enabled {
            return TranslatingFormatter::disabled();
        }
        let Some(translator) = &self.translator else {
            warn!("Translation is enabled but no translator is available; labels stay untranslated");
            return TranslatingFormatter::disabled();
        };

        let mut formatter = TranslatingFormatter::new(
            Arc::clone(translator),
            translation.source_lang.clone(),
            translation.target_lang.clone(),
        );
        formatter.activate().await;
        formatter
    }

    fn output_paths(&self, export: &ProjectExport) -> (PathBuf, PathBuf) {
        let output = &self.config.output;
        let dir = output.output_dir.clone().unwrap_or_else(|| {
            export
                .project_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        });
        let stem = export.stem();
        (
            dir.join(format!("{stem}{}.xml", output.updated_suffix)),
            dir.join(format!("{stem}{}.xml", output.original_suffix)),
        )
    }
}

fn project_namespace(document: &Document) -> Result<Namespace> {
    let is_project = document
        .root()
        .is_some_and(|root| document.local_name(root) == "KNX");
    if !is_project {
        return Err(KnxError::validation(format!(
            "{} is not an ETS project document (root element must be KNX)",
            document.origin()
        )));
    }
    Namespace::sniff(document)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|err| KnxError::io(format!("Failed to write {}", path.display()), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::format::translate::tests::RecordingTranslator;
    use crate::rename::synthesis::tests::fixture_root;
    use std::fs;
    use tempfile::TempDir;

    fn copy_fixture(target: &Path) {
        for entry in walkdir::WalkDir::new(fixture_root()) {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(fixture_root()).unwrap();
            let destination = target.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&destination).unwrap();
            } else {
                fs::copy(entry.path(), &destination).unwrap();
            }
        }
    }

    fn names(path: &Path) -> Vec<String> {
        let document = Document::load(path).unwrap();
        let namespace = Namespace::sniff(&document).unwrap();
        document
            .find_all(&namespace, "GroupAddress")
            .into_iter()
            .filter_map(|node| document.attribute(node, "Name").map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_rename_writes_updated_document_only() {
        let dir = TempDir::new().unwrap();
        copy_fixture(dir.path());

        let engine = RenameEngine::new(KnxRenameConfig::default()).unwrap();
        let report = engine.rename_project(dir.path()).await.unwrap();

        let project_dir = dir.path().join("P-0001");
        assert_eq!(report.updated_document, project_dir.join("0_updated.xml"));
        assert!(report.original_document.is_none());
        assert!(!project_dir.join("0_original.xml").exists());
        assert_eq!(report.renamed(), 6);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.namespace, "http://knx.org/xml/project/20");

        let names = names(&report.updated_document);
        assert_eq!(names[0], "Cmd_Confort_Eclairage_Siege_FacadeXx_1erEtage_Bureau1");
        assert!(names.contains(&"Réserve".to_string()));
    }

    #[tokio::test]
    async fn test_rename_with_pruning_writes_both_documents() {
        let dir = TempDir::new().unwrap();
        copy_fixture(dir.path());
        let out = dir.path().join("out");

        let mut config = KnxRenameConfig::default();
        config.rename.remove_unused_addresses = true;
        config.output.output_dir = Some(out.clone());
        let engine = RenameEngine::new(config).unwrap();
        let report = engine.rename_project(dir.path()).await.unwrap();

        assert_eq!(report.pruned, vec!["P-0001-0_GA-7"]);
        let original = report.original_document.clone().unwrap();
        assert_eq!(original, out.join("0_original.xml"));

        let updated = names(&report.updated_document);
        let pristine = names(&original);
        assert_eq!(updated.len(), 6);
        assert_eq!(pristine.len(), 6);
        assert!(pristine.contains(&"Eclairage bureau".to_string()));
        assert!(!pristine.contains(&"Réserve".to_string()));
    }

    #[tokio::test]
    async fn test_failed_original_write_removes_updated_document() {
        let dir = TempDir::new().unwrap();
        copy_fixture(dir.path());
        let out = dir.path().join("out");
        // a directory in the way makes the second write fail
        fs::create_dir_all(out.join("0_original.xml")).unwrap();

        let mut config = KnxRenameConfig::default();
        config.rename.remove_unused_addresses = true;
        config.output.output_dir = Some(out.clone());
        let engine = RenameEngine::new(config).unwrap();
        let err = engine.rename_project(dir.path()).await.unwrap_err();

        assert!(matches!(err, KnxError::Io { .. }));
        assert!(!out.join("0_updated.xml").exists());
    }

    #[tokio::test]
    async fn test_translation_uses_attached_translator() {
        let dir = TempDir::new().unwrap();
        copy_fixture(dir.path());

        let mut config = KnxRenameConfig::default();
        config.translation.enabled = true;
        config.translation.target_lang = "EN".to_string();
        let translator = Arc::new(RecordingTranslator::default());
        let engine = RenameEngine::new(config)
            .unwrap()
            .with_translator(translator.clone());
        let report = engine.rename_project(dir.path()).await.unwrap();

        assert!(report.translation_active);
        assert_eq!(report.translated_labels, 4);
        assert_eq!(translator.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_enabled_translation_without_translator_is_skipped() {
        let dir = TempDir::new().unwrap();
        copy_fixture(dir.path());

        let mut config = KnxRenameConfig::default();
        config.translation.enabled = true;
        let engine = RenameEngine::new(config).unwrap();
        let report = engine.rename_project(dir.path()).await.unwrap();

        assert!(!report.translation_active);
        assert_eq!(report.renamed(), 6);
    }

    #[tokio::test]
    async fn test_malformed_project_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("P-0001")).unwrap();
        fs::write(dir.path().join("P-0001/0.xml"), "<KNX><Project>").unwrap();

        let engine = RenameEngine::new(KnxRenameConfig::default()).unwrap();
        let err = engine.rename_project(dir.path()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(!dir.path().join("P-0001/0_updated.xml").exists());
    }

    #[tokio::test]
    async fn test_non_project_document_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.xml");
        fs::write(&file, "<Notes/>").unwrap();

        let engine = RenameEngine::new(KnxRenameConfig::default()).unwrap();
        let err = engine.rename_project(&file).await.unwrap_err();
        assert!(matches!(err, KnxError::Validation { .. }));
        assert!(!dir.path().join("notes_updated.xml").exists());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = KnxRenameConfig::default();
        config.translation.timeout_secs = 0;
        assert!(RenameEngine::new(config).is_err());
    }

    #[test]
    fn test_export_addresses() {
        let engine = RenameEngine::new(KnxRenameConfig::default()).unwrap();
        let export = engine.export_addresses(fixture_root()).unwrap();
        let bytes = String::from_utf8(export.to_bytes().unwrap()).unwrap();
        assert!(bytes.contains("GroupAddress-Export"));
        assert!(bytes.contains(r#"Address="1/1/1""#));
    }
}
