//! Group address export in the ETS `GroupAddress-Export` format.
//!
//! The export keeps the range hierarchy, names and datapoint types of a
//! project and writes addresses in three-level notation (`main/middle/sub`).

use tracing::{debug, warn};

use crate::core::xml::{Document, Namespace, NodeId};

/// Namespace of ETS group address export files
pub const EXPORT_NAMESPACE: &str = "http://knx.org/xml/ga-export/01";

/// Format a raw 16-bit group address as `main/middle/sub`.
pub fn three_level_address(raw: u32) -> String {
    let main = raw / 2048;
    let middle = (raw % 2048) / 256;
    let sub = raw % 256;
    format!("{main}/{middle}/{sub}")
}

/// Build a `GroupAddress-Export` document from a project document.
pub fn export_group_addresses(document: &Document, namespace: &Namespace) -> Document {
    let (mut export, root) = Document::with_root("group-address-export", "GroupAddress-Export");
    export.set_attribute(root, "xmlns", EXPORT_NAMESPACE);

    let mut exporter = Exporter {
        source: document,
        namespace,
        ranges: 0,
        addresses: 0,
    };
    if let Some(source_root) = document.root() {
        exporter.mirror(source_root, &mut export, root);
    }

    debug!(
        ranges = exporter.ranges,
        addresses = exporter.addresses,
        "Built group address export"
    );
    export
}

struct Exporter<'a> {
    source: &'a Document,
    namespace: &'a Namespace,
    ranges: usize,
    addresses: usize,
}

impl Exporter<'_> {
    /// Copy the ranges and addresses under `node` into `parent`, flattening any other elements.
    fn mirror(&mut self, node: NodeId, export: &mut Document, parent: NodeId) {
        for &child in self.source.children(node) {
            if self.source.is_named(child, self.namespace, "GroupRange") {
                let range = export.append_element(parent, "GroupRange");
                self.copy_attribute(child, export, range, "Name", "Name");
                self.copy_attribute(child, export, range, "RangeStart", "RangeStart");
                self.copy_attribute(child, export, range, "RangeEnd", "RangeEnd");
                self.ranges += 1;
                self.mirror(child, export, range);
            } else if self.source.is_named(child, self.namespace, "GroupAddress") {
                self.address(child, export, parent);
            } else if self.source.is_element(child) {
                self.mirror(child, export, parent);
            }
        }
    }

    fn address(&mut self, node: NodeId, export: &mut Document, parent: NodeId) {
        let element = export.append_element(parent, "GroupAddress");
        self.copy_attribute(node, export, element, "Name", "Name");

        let raw = self.source.attribute(node, "Address").unwrap_or_default();
        match raw.parse::<u32>() {
            Ok(value) => export.set_attribute(element, "Address", three_level_address(value)),
            Err(_) => warn!(
                id = self.source.attribute(node, "Id").unwrap_or_default(),
                address = raw,
                "Group address has no numeric address"
            ),
        }

        self.copy_attribute(node, export, element, "DatapointType", "DPTs");
        self.addresses += 1;
    }

    fn copy_attribute(&self, from: NodeId, export: &mut Document, to: NodeId, key: &str, as_key: &str) {
        if let Some(value) = self.source.attribute(from, key) {
            export.set_attribute(to, as_key, value);
        }
    }
}
