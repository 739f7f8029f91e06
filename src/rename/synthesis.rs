//! Group address name synthesis.
//!
//! Joins device references, the location index and the group range hierarchy
//! into one canonical name per referenced group address:
//!
//! ```text
//! {Role}_{AncestorFunction}_{Function}_{Building}_{BuildingPart}_{Floor}_{Room}[_{Board}][_{Circuit}]
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::core::config::Placeholders;
use crate::core::errors::Result;
use crate::core::xml::{Document, Namespace, NodeId};
use crate::format::normalize::LabelFormatter;
use crate::format::translate::TranslatingFormatter;
use crate::project::devices::DeviceGroupRef;
use crate::project::location::LocationIndex;

/// One rewritten group address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedAddress {
    /// `GroupAddress@Id`
    pub id: String,
    /// Name before the run
    pub old_name: String,
    /// Synthesized name
    pub new_name: String,
}

/// Counters describing a synthesis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisStats {
    /// Distinct group address reference tokens
    pub groups: usize,
    /// Group addresses renamed
    pub renamed: usize,
    /// Tokens with no matching `GroupAddress` element
    pub missing_addresses: usize,
    /// Representatives without a room
    pub missing_locations: usize,
    /// Names that fell back to the generic object type
    pub default_roles: usize,
    /// Group addresses skipped because a label could not be formatted
    pub format_failures: usize,
}

/// Result of a synthesis pass.
#[derive(Debug, Clone, Default)]
pub struct SynthesisOutcome {
    /// Ids of every group address that received a synthesized name
    pub touched: HashSet<String>,
    /// Renames in processing order
    pub renamed: Vec<RenamedAddress>,
    /// Pass counters
    pub stats: SynthesisStats,
}

/// Renames group addresses in place.
pub struct NameSynthesizer<'a> {
    formatter: &'a mut TranslatingFormatter,
    placeholders: &'a Placeholders,
    stats: SynthesisStats,
}

impl<'a> NameSynthesizer<'a> {
    /// Create a synthesizer using `formatter` for labels and translation
    pub fn new(formatter: &'a mut TranslatingFormatter, placeholders: &'a Placeholders) -> Self {
        Self {
            formatter,
            placeholders,
            stats: SynthesisStats::default(),
        }
    }

    /// Rename every group address referenced by `refs`.
    ///
    /// Failures that concern one group address are logged and skipped; the
    /// pass itself never fails.
    pub async fn run(
        mut self,
        document: &mut Document,
        namespace: &Namespace,
        locations: &LocationIndex,
        refs: &[DeviceGroupRef],
    ) -> SynthesisOutcome {
        let addresses: Vec<(NodeId, String)> = document
            .find_all(namespace, "GroupAddress")
            .into_iter()
            .filter_map(|id| document.attribute(id, "Id").map(|v| (id, v.to_string())))
            .collect();
        let original_names: HashMap<NodeId, String> = addresses
            .iter()
            .map(|&(node, _)| {
                let name = document.attribute(node, "Name").unwrap_or_default();
                (node, name.to_string())
            })
            .collect();

        let mut groups: IndexMap<&str, Vec<&DeviceGroupRef>> = IndexMap::new();
        for reference in refs {
            groups
                .entry(reference.group_address_ref.as_str())
                .or_default()
                .push(reference);
        }
        self.stats.groups = groups.len();

        let mut outcome = SynthesisOutcome::default();
        for (token, members) in &groups {
            let Some(representative) = select_representative(members) else {
                debug!(token, "Group has no device reference");
                continue;
            };

            // ids carry scope prefixes that links omit, so match on suffix; first match wins
            let Some((address, address_id)) = addresses.iter().find(|(_, id)| id.ends_with(token))
            else {
                warn!(token, "No group address matches reference; skipping");
                self.stats.missing_addresses += 1;
                continue;
            };
            let original = original_names.get(address).map(String::as_str).unwrap_or_default();

            match self
                .compose(document, namespace, locations, *address, original, representative, members)
                .await
            {
                Ok(new_name) => {
                    debug!(id = %address_id, old = original, new = %new_name, "Renamed group address");
                    document.set_attribute(*address, "Name", new_name.clone());
                    outcome.touched.insert(address_id.clone());
                    outcome.renamed.push(RenamedAddress {
                        id: address_id.clone(),
                        old_name: original.to_string(),
                        new_name,
                    });
                    self.stats.renamed += 1;
                }
                Err(err) => {
                    error!(id = %address_id, error = %err, "Could not build a name; group address left unchanged");
                    self.stats.format_failures += 1;
                }
            }
        }

        info!(
            groups = self.stats.groups,
            renamed = self.stats.renamed,
            missing_addresses = self.stats.missing_addresses,
            "Name synthesis finished"
        );
        outcome.stats = self.stats;
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    async fn compose(
        &mut self,
        document: &mut Document,
        namespace: &Namespace,
        locations: &LocationIndex,
        address: NodeId,
        original: &str,
        representative: &DeviceGroupRef,
        members: &[&DeviceGroupRef],
    ) -> Result<String> {
        let role = self.role_token(original, representative, members)?;
        let function = self.function_token(document, namespace, address).await?;
        let location = self.location_token(locations, representative, original)?;
        Ok(format!("{role}{function}{location}"))
    }

    fn role_token(
        &mut self,
        original: &str,
        representative: &DeviceGroupRef,
        members: &[&DeviceGroupRef],
    ) -> Result<String> {
        let has_cmd = contains_word(original, "cmd");
        let has_ie = contains_word(original, "ie");

        let literal = if has_cmd && !has_ie {
            "Cmd"
        } else if has_ie {
            "Ie"
        } else if let Some(role) = representative.role.filter(|_| representative.rail_mounted) {
            role.as_str()
        } else if let Some(role) = members.iter().find_map(|member| member.role) {
            role.as_str()
        } else {
            debug!(
                device_id = %representative.device_id,
                group_address_ref = %representative.group_address_ref,
                "No role found; using default object type"
            );
            self.stats.default_roles += 1;
            self.placeholders.object_type.as_str()
        };

        self.formatter.format_str(literal)
    }

    async fn function_token(
        &mut self,
        document: &mut Document,
        namespace: &Namespace,
        address: NodeId,
    ) -> Result<String> {
        let Some(function) = document.nearest_ancestor(address, namespace, "GroupRange") else {
            return Ok(String::new());
        };

        let mut token = String::new();
        if let Some(ancestor) = document.nearest_ancestor(function, namespace, "GroupRange") {
            let label = self.range_label(document, ancestor).await;
            token.push('_');
            token.push_str(&self.formatter.format_str(&label)?);
        }

        let label = self.range_label(document, function).await;
        token.push('_');
        token.push_str(&self.formatter.format_str(&label)?);
        Ok(token)
    }

    /// Current label of a group range, translated (and written back) when translation is active.
    async fn range_label(&mut self, document: &mut Document, range: NodeId) -> String {
        let raw = document.attribute(range, "Name").unwrap_or_default().to_string();
        if !self.formatter.is_active() {
            return raw;
        }
        let translated = self.formatter.translate_label(&raw).await;
        if translated != raw {
            document.set_attribute(range, "Name", translated.clone());
        }
        translated
    }

    fn location_token(
        &mut self,
        locations: &LocationIndex,
        representative: &DeviceGroupRef,
        original: &str,
    ) -> Result<String> {
        let p = self.placeholders;
        let mut token = String::new();
        match locations.find_by_device_id(&representative.device_id) {
            Some(record) => {
                for part in [
                    or_placeholder(&record.building, &p.building),
                    or_placeholder(&record.building_part, &p.building_part),
                    or_placeholder(&record.floor, &p.floor),
                    or_placeholder(&record.room, &p.room),
                ] {
                    token.push('_');
                    token.push_str(&self.formatter.format_str(part)?);
                }
                if !record.distribution_board.is_empty() {
                    token.push('_');
                    token.push_str(&self.formatter.format_str(&record.distribution_board)?);
                }
            }
            None => {
                info!(device_id = %representative.device_id, "No location found for device");
                self.stats.missing_locations += 1;
                for part in [&p.building, &p.building_part, &p.floor, &p.room] {
                    token.push('_');
                    token.push_str(&self.formatter.format_str(part)?);
                }
            }
        }

        if let Some(designator) = circuit_designator(original) {
            token.push('_');
            token.push_str(&self.formatter.format_str(designator)?);
        }

        Ok(token)
    }
}

/// First non-rail-mounted reference, otherwise the first rail-mounted one.
fn select_representative<'r>(members: &[&'r DeviceGroupRef]) -> Option<&'r DeviceGroupRef> {
    members
        .iter()
        .find(|member| !member.rail_mounted)
        .or_else(|| members.iter().find(|member| member.rail_mounted))
        .copied()
}

fn or_placeholder<'s>(value: &'s str, placeholder: &'s str) -> &'s str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive whole-word match, with `_` counted as a word character.
fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !is_word_char(c))
        .any(|candidate| candidate.eq_ignore_ascii_case(word))
}

/// Trailing circuit designator such as `Q1`, `L1+L2` or `2B/3`.
fn circuit_designator(name: &str) -> Option<&str> {
    let trimmed = name.trim_end();
    let is_designator_char = |c: char| c.is_alphanumeric() || c == '/' || c == '+';
    let start = trimmed
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_designator_char(c))
        .last()
        .map(|(index, _)| index)?;

    // a word character right before the run means the token does not start on a word boundary
    if trimmed[..start].chars().next_back().is_some_and(is_word_char) {
        return None;
    }

    let candidate = &trimmed[start..];
    let has_letter = candidate.chars().any(char::is_alphabetic);
    let has_digit = candidate.chars().any(|c| c.is_ascii_digit());
    (has_letter && has_digit).then_some(candidate)
}
