//! Localized console messages.
//!
//! Summary lines are looked up by language code (`ui.language`); unknown
//! codes fall back to English.

/// User-facing strings for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub loading: &'static str,
    pub finished: &'static str,
    pub renamed: &'static str,
    pub skipped: &'static str,
    pub unlocated: &'static str,
    pub default_roles: &'static str,
    pub translated: &'static str,
    pub pruned: &'static str,
    pub updated_document: &'static str,
    pub original_document: &'static str,
    pub translation_inactive: &'static str,
}

const EN: Messages = Messages {
    loading: "Renaming group addresses...",
    finished: "Rename complete",
    renamed: "Group addresses renamed",
    skipped: "References without a group address",
    unlocated: "Devices without a room",
    default_roles: "Names using the default object type",
    translated: "Range labels translated",
    pruned: "Unused group addresses removed",
    updated_document: "Updated project",
    original_document: "Pruned original",
    translation_inactive: "Translation requested but no valid credential is available; labels were not translated",
};

const FR: Messages = Messages {
    loading: "Renommage des adresses de groupe...",
    finished: "Renommage terminé",
    renamed: "Adresses de groupe renommées",
    skipped: "Références sans adresse de groupe",
    unlocated: "Participants sans pièce",
    default_roles: "Noms avec le type d'objet par défaut",
    translated: "Libellés de plages traduits",
    pruned: "Adresses de groupe inutilisées supprimées",
    updated_document: "Projet mis à jour",
    original_document: "Original épuré",
    translation_inactive: "Traduction demandée mais aucune clé valide n'est disponible ; libellés non traduits",
};

const DE: Messages = Messages {
    loading: "Gruppenadressen werden umbenannt...",
    finished: "Umbenennung abgeschlossen",
    renamed: "Umbenannte Gruppenadressen",
    skipped: "Verweise ohne Gruppenadresse",
    unlocated: "Geräte ohne Raum",
    default_roles: "Namen mit Standard-Objekttyp",
    translated: "Übersetzte Bereichsnamen",
    pruned: "Entfernte ungenutzte Gruppenadressen",
    updated_document: "Aktualisiertes Projekt",
    original_document: "Bereinigtes Original",
    translation_inactive: "Übersetzung angefordert, aber kein gültiger Schlüssel vorhanden; Namen wurden nicht übersetzt",
};

impl Messages {
    /// Messages for `language`, English when the code is unknown
    pub fn for_language(language: &str) -> &'static Messages {
        let primary = language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "fr" => &FR,
            "de" => &DE,
            _ => &EN,
        }
    }
}
