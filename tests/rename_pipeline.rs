//! End-to-end tests of the library pipeline against the fixture export.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use knxrename_rs::core::xml::{Document, Namespace};
use knxrename_rs::{ErrorKind, KnxError, KnxRenameConfig, RenameEngine, Translator};
use tempfile::TempDir;

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

fn fixture_export() -> TempDir {
    let temp = TempDir::new().unwrap();
    copy_dir(
        &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/export"),
        temp.path(),
    );
    temp
}

fn group_addresses(path: &Path) -> Vec<(String, String)> {
    let document = Document::load(path).unwrap();
    let namespace = Namespace::sniff(&document).unwrap();
    document
        .find_all(&namespace, "GroupAddress")
        .into_iter()
        .map(|node| {
            (
                document.attribute(node, "Id").unwrap_or_default().to_string(),
                document.attribute(node, "Name").unwrap_or_default().to_string(),
            )
        })
        .collect()
}

/// Translator that prefixes labels and counts calls
#[derive(Default)]
struct PrefixTranslator {
    calls: AtomicUsize,
}

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_lang: Option<&str>,
        _target_lang: &str,
    ) -> knxrename_rs::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("en {text}"))
    }
}

struct RejectingTranslator;

#[async_trait]
impl Translator for RejectingTranslator {
    async fn translate(
        &self,
        _text: &str,
        _source_lang: Option<&str>,
        _target_lang: &str,
    ) -> knxrename_rs::Result<String> {
        panic!("translate must not be called after a rejected credential");
    }

    async fn check_credential(&self) -> knxrename_rs::Result<()> {
        Err(KnxError::translation_status("Forbidden", 403))
    }
}

#[tokio::test]
async fn renames_every_referenced_address() {
    let export = fixture_export();
    let engine = RenameEngine::new(KnxRenameConfig::default()).unwrap();
    let report = engine.rename_project(export.path()).await.unwrap();

    let names: Vec<_> = group_addresses(&report.updated_document);
    let lookup = |id: &str| {
        names
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, name)| name.as_str())
            .unwrap()
    };

    assert_eq!(lookup("P-0001-0_GA-1"), "Cmd_Confort_Eclairage_Siege_FacadeXx_1erEtage_Bureau1");
    assert_eq!(lookup("P-0001-0_GA-4"), "Cmd_Technique_Batiment_FacadeXx_Etage_Piece");
    assert_eq!(lookup("P-0001-0_GA-7"), "Réserve");
    assert_eq!(report.stats.missing_addresses, 1);
    assert_eq!(report.device_refs, 8);
    assert_eq!(report.rooms, 3);
}

#[tokio::test]
async fn newer_schema_namespace_is_detected() {
    let export = fixture_export();
    let project = export.path().join("P-0001/0.xml");
    let content = fs::read_to_string(&project)
        .unwrap()
        .replace("http://knx.org/xml/project/20", "http://knx.org/xml/project/23");
    fs::write(&project, content).unwrap();

    let engine = RenameEngine::new(KnxRenameConfig::default()).unwrap();
    let report = engine.rename_project(export.path()).await.unwrap();

    assert_eq!(report.namespace, "http://knx.org/xml/project/23");
    assert_eq!(report.renamed(), 6);
}

#[tokio::test]
async fn pruned_documents_share_group_address_ids() {
    let export = fixture_export();
    let mut config = KnxRenameConfig::default();
    config.rename.remove_unused_addresses = true;
    let engine = RenameEngine::new(config).unwrap();
    let report = engine.rename_project(export.path()).await.unwrap();

    let ids = |path: &Path| -> HashSet<String> {
        group_addresses(path).into_iter().map(|(id, _)| id).collect()
    };
    let original = report.original_document.as_deref().unwrap();
    assert_eq!(ids(&report.updated_document), ids(original));
    assert!(!ids(original).contains("P-0001-0_GA-7"));
}

#[tokio::test]
async fn translation_runs_once_per_label() {
    let export = fixture_export();
    let mut config = KnxRenameConfig::default();
    config.translation.enabled = true;
    let translator = Arc::new(PrefixTranslator::default());
    let engine = RenameEngine::new(config)
        .unwrap()
        .with_translator(translator.clone());

    let report = engine.rename_project(export.path()).await.unwrap();

    assert_eq!(translator.calls.load(Ordering::SeqCst), 4);
    assert_eq!(report.translated_labels, 4);
    let names = group_addresses(&report.updated_document);
    assert_eq!(names[0].1, "Cmd_EnConfort_EnEclairage_Siege_FacadeXx_1erEtage_Bureau1");
}

#[tokio::test]
async fn rejected_credential_leaves_labels_untranslated() {
    let export = fixture_export();
    let mut config = KnxRenameConfig::default();
    config.translation.enabled = true;
    let engine = RenameEngine::new(config)
        .unwrap()
        .with_translator(Arc::new(RejectingTranslator));

    let report = engine.rename_project(export.path()).await.unwrap();

    assert!(!report.translation_active);
    let names = group_addresses(&report.updated_document);
    assert_eq!(names[0].1, "Cmd_Confort_Eclairage_Siege_FacadeXx_1erEtage_Bureau1");
}

#[tokio::test]
async fn missing_export_is_not_found() {
    let engine = RenameEngine::new(KnxRenameConfig::default()).unwrap();
    let err = engine
        .rename_project("/definitely/not/an/export")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
