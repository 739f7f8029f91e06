//! Hardware capability lookups against per-manufacturer descriptor files.
//!
//! An ETS export stores each manufacturer's catalog under `{export_root}/M-xxxx/`:
//! `Hardware.xml` lists products, and `M-xxxx_A-....xml` files describe
//! application programs and their communication objects. The catalog parses
//! each file at most once per run. A missing file counts as a miss, not an error.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::xml::{Document, Namespace, NodeId};

const PROGRAM_MARKER: &str = "HP";

/// Coarse function of a communication object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTag {
    /// Written by the bus: a command
    Cmd,
    /// Read from the bus: an indication / status
    Ie,
}

impl RoleTag {
    /// Literal used in synthesized names
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cmd => "Cmd",
            Self::Ie => "Ie",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware module and application descriptor named by a program reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramRef {
    /// Manufacturer directory, e.g. `M-0083`
    pub module: String,
    /// Application descriptor file name, e.g. `M-0083_A-00A4-12-C1F8.xml`
    pub descriptor_file: String,
}

impl ProgramRef {
    /// Decompose a `Hardware2ProgramRefId` such as `M-0083_H-00093-1_HP-00A4-12-C1F8`.
    pub fn parse(program_ref_id: &str) -> Option<Self> {
        let (before, after) = program_ref_id.split_once(PROGRAM_MARKER)?;

        let module = before
            .trim_end_matches('-')
            .split('_')
            .find(|token| token.starts_with("M-"))?;

        let application = after.strip_prefix('-').unwrap_or(after);
        Some(Self {
            module: module.to_string(),
            descriptor_file: format!("{module}_A-{application}.xml"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Enabled,
    Disabled,
}

impl Flag {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "Enabled" => Some(Self::Enabled),
            "Disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

fn role_from_flags(read: Option<Flag>, write: Option<Flag>) -> Option<RoleTag> {
    match (read, write) {
        (Some(Flag::Enabled), Some(Flag::Disabled)) => Some(RoleTag::Ie),
        (Some(Flag::Disabled | Flag::Enabled), Some(Flag::Enabled)) => Some(RoleTag::Cmd),
        _ => None,
    }
}

/// Parsed descriptor with its id lookups prepared.
struct Descriptor {
    document: Document,
    com_object_refs: Vec<(String, NodeId)>,
    com_objects: Vec<(String, NodeId)>,
    products: HashMap<String, NodeId>,
}

impl Descriptor {
    fn index(document: Document, namespace: &Namespace) -> Self {
        let ids = |local: &str| -> Vec<(String, NodeId)> {
            document
                .find_all(namespace, local)
                .into_iter()
                .filter_map(|id| document.attribute(id, "Id").map(|v| (v.to_string(), id)))
                .collect()
        };
        let com_object_refs = ids("ComObjectRef");
        let com_objects = ids("ComObject");
        let products = ids("Product").into_iter().collect();

        Self {
            document,
            com_object_refs,
            com_objects,
            products,
        }
    }

    fn com_object_ending_with(&self, suffix: &str) -> Option<NodeId> {
        self.com_objects
            .iter()
            .find(|(id, _)| id.ends_with(suffix))
            .map(|&(_, node)| node)
    }

    fn flag(&self, node: Option<NodeId>, key: &str) -> Option<Flag> {
        node.and_then(|id| self.document.attribute(id, key))
            .and_then(Flag::parse)
    }
}

/// Cached access to hardware descriptors under an export root.
pub struct HardwareCatalog {
    export_root: PathBuf,
    descriptors: HashMap<PathBuf, Option<Descriptor>>,
}

impl HardwareCatalog {
    /// Catalog rooted at the directory that holds the `M-xxxx` folders
    pub fn new(export_root: impl Into<PathBuf>) -> Self {
        Self {
            export_root: export_root.into(),
            descriptors: HashMap::new(),
        }
    }

    /// Directory the catalog reads from
    pub fn export_root(&self) -> &Path {
        &self.export_root
    }

    /// Resolve the role of `com_object_ref_id` for the program named by `program_ref_id`.
    pub fn resolve(&mut self, program_ref_id: &str, com_object_ref_id: &str) -> Option<RoleTag> {
        let Some(program) = ProgramRef::parse(program_ref_id) else {
            debug!(program_ref_id, "Program reference has no hardware module");
            return None;
        };
        self.resolve_role(&program, com_object_ref_id)
    }

    /// Resolve the role of a communication object from its read/write flags.
    pub fn resolve_role(&mut self, program: &ProgramRef, com_object_ref_id: &str) -> Option<RoleTag> {
        if com_object_ref_id.is_empty() || program.descriptor_file.is_empty() {
            return None;
        }
        let descriptor = self.descriptor(&program.module, &program.descriptor_file)?;

        let reference = descriptor
            .com_object_refs
            .iter()
            .find(|(id, _)| id.ends_with(com_object_ref_id))
            .map(|&(_, node)| node);

        let base = reference
            .and_then(|node| descriptor.document.attribute(node, "RefId"))
            .and_then(|ref_id| {
                descriptor
                    .com_objects
                    .iter()
                    .find(|(id, _)| id == ref_id)
                    .map(|&(_, node)| node)
            })
            .or_else(|| {
                let truncated = com_object_ref_id
                    .split_once('_')
                    .map_or(com_object_ref_id, |(head, _)| head);
                descriptor.com_object_ending_with(truncated)
            });

        if reference.is_none() && base.is_none() {
            debug!(
                com_object_ref_id,
                descriptor = %program.descriptor_file,
                "Communication object not found in descriptor"
            );
            return None;
        }

        let read = descriptor
            .flag(reference, "ReadFlag")
            .or_else(|| descriptor.flag(base, "ReadFlag"));
        let write = descriptor
            .flag(reference, "WriteFlag")
            .or_else(|| descriptor.flag(base, "WriteFlag"));

        role_from_flags(read, write)
    }

    /// Whether the product is a DIN-rail module according to the module's `Hardware.xml`.
    pub fn is_rail_mounted(&mut self, product_ref_id: &str, module: &str) -> bool {
        if product_ref_id.is_empty() || module.is_empty() {
            return false;
        }
        let Some(descriptor) = self.descriptor(module, "Hardware.xml") else {
            return false;
        };
        let Some(&product) = descriptor.products.get(product_ref_id) else {
            debug!(product_ref_id, module, "Product not found in Hardware.xml");
            return false;
        };

        match descriptor.document.attribute(product, "IsRailMounted") {
            Some(value) if value.eq_ignore_ascii_case("true") || value == "1" => true,
            Some(value) if value.eq_ignore_ascii_case("false") || value == "0" => false,
            Some(value) => {
                warn!(product_ref_id, value, "Unrecognized IsRailMounted value; assuming false");
                false
            }
            None => false,
        }
    }

    fn descriptor(&mut self, module: &str, file_name: &str) -> Option<&Descriptor> {
        if module.is_empty() {
            return None;
        }
        let path = self.export_root.join(module).join(file_name);
        self.descriptors
            .entry(path)
            .or_insert_with_key(|path| load_descriptor(path))
            .as_ref()
    }
}

fn load_descriptor(path: &Path) -> Option<Descriptor> {
    let directory = path.parent()?;
    if !directory.is_dir() {
        warn!(directory = %directory.display(), "Hardware module directory not found");
        return None;
    }
    if !path.is_file() {
        warn!(path = %path.display(), "Hardware descriptor not found");
        return None;
    }

    let document = match Document::load(path) {
        Ok(document) => document,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to parse hardware descriptor");
            return None;
        }
    };
    let namespace = Namespace::sniff(&document).ok()?;
    debug!(path = %path.display(), "Loaded hardware descriptor");
    Some(Descriptor::index(document, &namespace))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    pub(crate) const PROGRAM_REF: &str = "M-0083_H-00093-1_HP-00A4-12-C1F8";

    pub(crate) fn write_catalog(root: &Path) {
        let module = root.join("M-0083");
        fs::create_dir_all(&module).unwrap();
        fs::write(
            module.join("M-0083_A-00A4-12-C1F8.xml"),
            r#"<?xml version="1.0" encoding="utf-8"?>
<KNX xmlns="http://knx.org/xml/project/20">
  <ManufacturerData><Manufacturer RefId="M-0083"><ApplicationPrograms>
    <ApplicationProgram Id="M-0083_A-00A4-12-C1F8">
      <Static>
        <ComObjectTable>
          <ComObject Id="M-0083_A-00A4-12-C1F8_O-1" ReadFlag="Disabled" WriteFlag="Enabled" />
          <ComObject Id="M-0083_A-00A4-12-C1F8_O-2" ReadFlag="Enabled" WriteFlag="Disabled" />
          <ComObject Id="M-0083_A-00A4-12-C1F8_O-3" ReadFlag="Disabled" WriteFlag="Disabled" />
          <ComObject Id="M-0083_A-00A4-12-C1F8_O-4" ReadFlag="Enabled" WriteFlag="Enabled" />
        </ComObjectTable>
        <ComObjectRefs>
          <ComObjectRef Id="M-0083_A-00A4-12-C1F8_O-1_R-1" RefId="M-0083_A-00A4-12-C1F8_O-1" />
          <ComObjectRef Id="M-0083_A-00A4-12-C1F8_O-2_R-2" RefId="M-0083_A-00A4-12-C1F8_O-2" WriteFlag="Enabled" />
          <ComObjectRef Id="M-0083_A-00A4-12-C1F8_O-3_R-3" RefId="M-0083_A-00A4-12-C1F8_O-3" />
        </ComObjectRefs>
      </Static>
    </ApplicationProgram>
  </ApplicationPrograms></Manufacturer></ManufacturerData>
</KNX>"#,
        )
        .unwrap();
        fs::write(
            module.join("Hardware.xml"),
            r#"<KNX xmlns="http://knx.org/xml/project/20">
  <ManufacturerData><Manufacturer RefId="M-0083"><Hardware>
    <Hardware Id="M-0083_H-00093-1">
      <Products>
        <Product Id="M-0083_H-00093-1_P-RAIL" IsRailMounted="true" />
        <Product Id="M-0083_H-00093-1_P-WALL" IsRailMounted="0" />
        <Product Id="M-0083_H-00093-1_P-ODD" IsRailMounted="maybe" />
        <Product Id="M-0083_H-00093-1_P-BARE" />
      </Products>
    </Hardware>
  </Hardware></Manufacturer></ManufacturerData>
</KNX>"#,
        )
        .unwrap();
    }

    fn catalog() -> (TempDir, HardwareCatalog) {
        let dir = TempDir::new().unwrap();
        write_catalog(dir.path());
        let catalog = HardwareCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn test_parse_program_ref() {
        let program = ProgramRef::parse(PROGRAM_REF).unwrap();
        assert_eq!(program.module, "M-0083");
        assert_eq!(program.descriptor_file, "M-0083_A-00A4-12-C1F8.xml");
    }

    #[test]
    fn test_parse_program_ref_failures() {
        assert_eq!(ProgramRef::parse("M-0083_H-00093-1_A-00A4"), None);
        assert_eq!(ProgramRef::parse("X-0083_H-00093-1_HP-00A4"), None);
        assert_eq!(ProgramRef::parse(""), None);
    }

    #[test]
    fn test_role_from_flags() {
        use Flag::*;
        assert_eq!(role_from_flags(Some(Enabled), Some(Disabled)), Some(RoleTag::Ie));
        assert_eq!(role_from_flags(Some(Disabled), Some(Enabled)), Some(RoleTag::Cmd));
        assert_eq!(role_from_flags(Some(Enabled), Some(Enabled)), Some(RoleTag::Cmd));
        assert_eq!(role_from_flags(Some(Disabled), Some(Disabled)), None);
        assert_eq!(role_from_flags(None, Some(Enabled)), None);
    }

    #[test]
    fn test_resolve_inherits_flags_from_base_object() {
        let (_dir, mut catalog) = catalog();
        assert_eq!(catalog.resolve(PROGRAM_REF, "O-1_R-1"), Some(RoleTag::Cmd));
        assert_eq!(catalog.resolve(PROGRAM_REF, "O-3_R-3"), None);
    }

    #[test]
    fn test_reference_flags_override_base() {
        let (_dir, mut catalog) = catalog();
        // base O-2 is read-only, the reference enables writing
        assert_eq!(catalog.resolve(PROGRAM_REF, "O-2_R-2"), Some(RoleTag::Cmd));
    }

    #[test]
    fn test_fallback_to_base_object_by_truncated_id() {
        let (_dir, mut catalog) = catalog();
        assert_eq!(catalog.resolve(PROGRAM_REF, "O-4_R-9"), Some(RoleTag::Cmd));
        assert_eq!(catalog.resolve(PROGRAM_REF, "O-2_R-7"), Some(RoleTag::Ie));
        assert_eq!(catalog.resolve(PROGRAM_REF, "O-99_R-1"), None);
    }

    #[test]
    fn test_missing_descriptor_resolves_to_none() {
        let (_dir, mut catalog) = catalog();
        assert_eq!(catalog.resolve("M-0001_H-1_HP-0000-01-0000", "O-1_R-1"), None);
        assert_eq!(catalog.resolve("M-0083_H-1_HP-FFFF-01-0000", "O-1_R-1"), None);
        assert_eq!(catalog.resolve(PROGRAM_REF, ""), None);
    }

    #[test]
    fn test_is_rail_mounted() {
        let (_dir, mut catalog) = catalog();
        assert!(catalog.is_rail_mounted("M-0083_H-00093-1_P-RAIL", "M-0083"));
        assert!(!catalog.is_rail_mounted("M-0083_H-00093-1_P-WALL", "M-0083"));
        assert!(!catalog.is_rail_mounted("M-0083_H-00093-1_P-ODD", "M-0083"));
        assert!(!catalog.is_rail_mounted("M-0083_H-00093-1_P-BARE", "M-0083"));
        assert!(!catalog.is_rail_mounted("M-0083_H-00093-1_P-NONE", "M-0083"));
        assert!(!catalog.is_rail_mounted("M-0083_H-00093-1_P-RAIL", "M-0099"));
        assert!(!catalog.is_rail_mounted("M-0083_H-00093-1_P-RAIL", ""));
    }
}
