//! Locating the project document inside an ETS export directory.
//!
//! An unpacked `.knxproj` looks like:
//!
//! ```text
//! export/
//! ├── knx_master.xml
//! ├── M-0083/             hardware descriptors, one folder per manufacturer
//! │   ├── Hardware.xml
//! │   └── M-0083_A-....xml
//! └── P-0001/
//!     ├── project.xml
//!     └── 0.xml           installation: topology, locations, group addresses
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::core::errors::{KnxError, Result};

const PROJECT_DOCUMENT: &str = "0.xml";
const PROJECT_DIR_PREFIX: &str = "P-";

/// Paths of one ETS export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectExport {
    /// The installation document to rename
    pub project_file: PathBuf,
    /// Directory holding the `M-xxxx` hardware folders
    pub export_root: PathBuf,
}

impl ProjectExport {
    /// Resolve `path`, which is either the project document itself or an export directory.
    pub fn locate(path: &Path) -> Result<Self> {
        if path.is_file() {
            let packed = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("knxproj"));
            if packed {
                return Err(KnxError::unsupported(format!(
                    "{} is a packed project; extract the archive and pass the directory",
                    path.display()
                )));
            }
            return Ok(Self::from_project_file(path));
        }
        if !path.is_dir() {
            return Err(KnxError::not_found(path));
        }

        let mut candidates: Vec<PathBuf> = WalkDir::new(path)
            .max_depth(3)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|candidate| is_project_document(candidate))
            .collect();
        candidates.sort();

        debug!(
            root = %path.display(),
            candidates = candidates.len(),
            "Searched export for project documents"
        );

        let project_file = candidates.into_iter().next().ok_or_else(|| {
            KnxError::io(
                format!(
                    "No {PROJECT_DIR_PREFIX}*/{PROJECT_DOCUMENT} project document under {}",
                    path.display()
                ),
                std::io::Error::new(std::io::ErrorKind::NotFound, "project document not found"),
            )
        })?;
        Ok(Self::from_project_file(&project_file))
    }

    fn from_project_file(project_file: &Path) -> Self {
        let parent = project_file.parent().unwrap_or_else(|| Path::new("."));
        let in_project_dir = parent
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(PROJECT_DIR_PREFIX));
        let export_root = if in_project_dir {
            parent.parent().unwrap_or(parent)
        } else {
            parent
        };

        Self {
            project_file: project_file.to_path_buf(),
            export_root: export_root.to_path_buf(),
        }
    }

    /// File stem used to name output documents
    pub fn stem(&self) -> &str {
        self.project_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("project")
    }
}

fn is_project_document(path: &Path) -> bool {
    let is_document = path.file_name().and_then(|name| name.to_str()) == Some(PROJECT_DOCUMENT);
    let in_project_dir = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(PROJECT_DIR_PREFIX));
    is_document && in_project_dir
}
