//! Device → room lookup built from the `Locations` space tree.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::core::xml::{Document, Namespace, NodeId};

/// Where a room sits in the building, and which devices it contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationRecord {
    /// Room or corridor name
    pub room: String,
    /// Nearest enclosing Floor name, empty when absent
    pub floor: String,
    /// Nearest enclosing BuildingPart name, empty when absent
    pub building_part: String,
    /// Nearest enclosing Building name, empty when absent
    pub building: String,
    /// First DistributionBoard found inside the room, empty when absent
    pub distribution_board: String,
    /// Device instance ids contained anywhere under the room
    pub device_ids: HashSet<String>,
}

/// Every room/corridor record of a project.
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    records: Vec<LocationRecord>,
}

impl LocationIndex {
    /// Build one record per `Room` and `Corridor` space.
    pub fn build(document: &Document, namespace: &Namespace) -> Self {
        let records: Vec<LocationRecord> = document
            .find_all(namespace, "Space")
            .into_iter()
            .filter(|&space| matches!(space_type(document, space), "Room" | "Corridor"))
            .map(|space| Self::record_for(document, namespace, space))
            .collect();

        debug!(rooms = records.len(), "Built location index");
        Self { records }
    }

    fn record_for(document: &Document, namespace: &Namespace, space: NodeId) -> LocationRecord {
        let mut record = LocationRecord {
            room: name_of(document, space),
            ..LocationRecord::default()
        };

        for ancestor in document.ancestors(space) {
            if !document.is_named(ancestor, namespace, "Space") {
                continue;
            }
            let slot = match space_type(document, ancestor) {
                "Floor" => &mut record.floor,
                "BuildingPart" => &mut record.building_part,
                "Building" => &mut record.building,
                _ => continue,
            };
            if slot.is_empty() {
                *slot = name_of(document, ancestor);
            }
        }

        let descendants = document.descendants(space);
        record.distribution_board = descendants
            .iter()
            .copied()
            .find(|&id| {
                document.is_named(id, namespace, "Space")
                    && space_type(document, id) == "DistributionBoard"
            })
            .map(|id| name_of(document, id))
            .unwrap_or_default();

        record.device_ids = descendants
            .into_iter()
            .filter(|&id| document.is_named(id, namespace, "DeviceInstanceRef"))
            .filter_map(|id| document.attribute(id, "RefId").map(str::to_string))
            .collect();

        record
    }

    /// First room containing the device.
    pub fn find_by_device_id(&self, device_id: &str) -> Option<&LocationRecord> {
        self.records
            .iter()
            .find(|record| record.device_ids.contains(device_id))
    }

    /// All records in document order
    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    /// Number of rooms and corridors indexed
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the project has no rooms
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn space_type(document: &Document, space: NodeId) -> &str {
    document.attribute(space, "Type").unwrap_or_default()
}

fn name_of(document: &Document, space: NodeId) -> String {
    document
        .attribute(space, "Name")
        .unwrap_or_default()
        .to_string()
}
