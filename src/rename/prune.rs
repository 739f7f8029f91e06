//! Removal of group addresses that no device references.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::core::xml::{Document, Namespace};

/// Detach every group address whose id is not in `touched` from both documents.
///
/// `pristine` is a fresh parse of the input file and supplies the candidate
/// list; `working` is the renamed document. Both end up with the same set of
/// group address ids. Returns the removed ids in document order.
pub fn prune_unused(
    working: &mut Document,
    pristine: &mut Document,
    namespace: &Namespace,
    touched: &HashSet<String>,
) -> Vec<String> {
    let working_by_id: HashMap<String, _> = working
        .find_all(namespace, "GroupAddress")
        .into_iter()
        .filter_map(|node| working.attribute(node, "Id").map(|id| (id.to_string(), node)))
        .collect();

    let unused: Vec<_> = pristine
        .find_all(namespace, "GroupAddress")
        .into_iter()
        .filter_map(|node| pristine.attribute(node, "Id").map(|id| (id.to_string(), node)))
        .filter(|(id, _)| !touched.contains(id))
        .collect();

    let mut removed = Vec::with_capacity(unused.len());
    for (id, node) in unused {
        pristine.detach(node);
        if let Some(&working_node) = working_by_id.get(&id) {
            working.detach(working_node);
        }
        debug!(id = %id, "Removed unused group address");
        removed.push(id);
    }

    info!(removed = removed.len(), "Pruned unused group addresses");
    removed
}
