//! Device → group address references from the project topology.

use serde::Serialize;
use tracing::debug;

use crate::core::xml::{Document, Namespace};
use crate::project::hardware::{HardwareCatalog, ProgramRef, RoleTag};

/// One link between a device's communication object and a group address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceGroupRef {
    /// Group address reference token from the `Links` attribute
    pub group_address_ref: String,
    /// Owning `DeviceInstance` id
    pub device_id: String,
    /// `ComObjectInstanceRef@RefId`
    pub com_object_ref_id: String,
    /// Whether this is the first token of the `Links` list
    pub is_first_link: bool,
    /// Whether the device's product is rail mounted
    pub rail_mounted: bool,
    /// Role from the hardware descriptor; only resolved for first links
    pub role: Option<RoleTag>,
}

/// Walk every `DeviceInstance` and emit one [`DeviceGroupRef`] per linked group address.
pub fn extract_device_refs(
    document: &Document,
    namespace: &Namespace,
    catalog: &mut HardwareCatalog,
) -> Vec<DeviceGroupRef> {
    let mut refs = Vec::new();

    for device in document.find_all(namespace, "DeviceInstance") {
        let Some(device_id) = document.attribute(device, "Id") else {
            debug!("Skipping DeviceInstance without Id");
            continue;
        };

        let program = document
            .attribute(device, "Hardware2ProgramRefId")
            .and_then(ProgramRef::parse)
            .unwrap_or_default();
        let product_ref_id = document.attribute(device, "ProductRefId").unwrap_or_default();
        let rail_mounted = catalog.is_rail_mounted(product_ref_id, &program.module);

        for com_object in document.find_descendants(device, namespace, "ComObjectInstanceRef") {
            let links = document.attribute(com_object, "Links").unwrap_or_default();
            if links.trim().is_empty() {
                continue;
            }
            let com_object_ref_id = document.attribute(com_object, "RefId").unwrap_or_default();

            for (index, token) in links.split_whitespace().enumerate() {
                let is_first_link = index == 0;
                let role = if is_first_link && !program.descriptor_file.is_empty() {
                    catalog.resolve_role(&program, com_object_ref_id)
                } else {
                    None
                };

                refs.push(DeviceGroupRef {
                    group_address_ref: token.to_string(),
                    device_id: device_id.to_string(),
                    com_object_ref_id: com_object_ref_id.to_string(),
                    is_first_link,
                    rail_mounted,
                    role,
                });
            }
        }
    }

    debug!(count = refs.len(), "Extracted device group references");
    refs
}
