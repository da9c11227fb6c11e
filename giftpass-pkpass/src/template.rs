/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PassError;

/// Name of the descriptor file inside a template directory and inside
/// the final archive.  Dictated by the wallet-pass format.
pub const DESCRIPTOR_FILE: &str = "pass.json";

/// Asset name that an image override replaces.
pub const STRIP_IMAGE_FILE: &str = "strip.png";

/// The typed shape of a `pass.json` descriptor.  Keys this module does
/// not bind are preserved verbatim through the `extra` maps, so template
/// authors can use the full wallet-pass vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDescriptor {
    pub format_version: u32,
    pub pass_type_identifier: String,
    pub team_identifier: String,
    pub organization_name: String,
    pub description: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<Barcode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcodes: Option<Vec<Barcode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_card: Option<PassStructure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<PassStructure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic: Option<PassStructure>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PassDescriptor {
    /// The style structure holding this pass's field groups.  Gift cards
    /// are store cards, so that style is created when the template
    /// declares none.
    pub fn structure_mut(&mut self) -> &mut PassStructure {
        if self.store_card.is_some() {
            self.store_card.as_mut().unwrap()
        } else if self.coupon.is_some() {
            self.coupon.as_mut().unwrap()
        } else if self.generic.is_some() {
            self.generic.as_mut().unwrap()
        } else {
            self.store_card.get_or_insert_with(PassStructure::default)
        }
    }

    pub fn structure(&self) -> Option<&PassStructure> {
        self.store_card.as_ref().or(self.coupon.as_ref()).or(self.generic.as_ref())
    }
}

/// The ordered field groups of one pass style.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassStructure {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxiliary_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub back_fields: Vec<PassField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassField {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PassField {
    pub fn new(key: &str, label: &str, value: &str) -> Self {
        PassField {
            key: key.to_string(),
            label: Some(label.to_string()),
            value: Value::String(value.to_string()),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: String,
    pub message: String,
    pub message_encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// An in-memory pass template: the parsed descriptor plus the raw bytes
/// of every sibling asset (icons, logos, the default strip image).
/// Templates are read-only reference data; every signing request works
/// on a cloned descriptor and its own copy of the asset map.
#[derive(Debug, Clone)]
pub struct PassTemplate {
    descriptor: PassDescriptor,
    assets: HashMap<String, Vec<u8>>,
}

impl PassTemplate {
    pub fn load(dir: &Path) -> Result<Self, PassError> {
        let descriptor_path = dir.join(DESCRIPTOR_FILE);
        if !descriptor_path.is_file() {
            return Err(PassError::TemplateNotFound(dir.display().to_string()));
        }
        let descriptor_bytes = std::fs::read(&descriptor_path)?;
        let descriptor: PassDescriptor = serde_json::from_slice(&descriptor_bytes)
            .map_err(|source| PassError::TemplateInvalid {
                dir: dir.display().to_string(),
                source,
            })?;
        let mut assets = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == DESCRIPTOR_FILE || name.starts_with('.') {
                continue;
            }
            assets.insert(name, std::fs::read(entry.path())?);
        }
        Ok(PassTemplate { descriptor, assets })
    }

    /// A deep copy of the descriptor, safe for request-local mutation.
    pub fn clone_descriptor(&self) -> PassDescriptor {
        self.descriptor.clone()
    }

    pub fn assets(&self) -> &HashMap<String, Vec<u8>> {
        &self.assets
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_generators as tg;

    #[test]
    fn test_load_template() {
        let dir = tempfile::tempdir().unwrap();
        tg::write_minimal_template(dir.path()).unwrap();
        let template = PassTemplate::load(dir.path()).unwrap();
        assert!(template.assets().contains_key("icon.png"));
        assert!(template.assets().contains_key(STRIP_IMAGE_FILE));
        assert!(!template.assets().contains_key(DESCRIPTOR_FILE));
        let descriptor = template.clone_descriptor();
        assert!(descriptor.structure().is_some());
    }

    #[test]
    fn test_missing_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = PassTemplate::load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PassError::TemplateNotFound(_)));
    }

    #[test]
    fn test_bad_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DESCRIPTOR_FILE), b"not json").unwrap();
        let err = PassTemplate::load(dir.path()).unwrap_err();
        assert!(matches!(err, PassError::TemplateInvalid { .. }));
    }

    #[test]
    fn test_unknown_descriptor_keys_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        tg::write_minimal_template(dir.path()).unwrap();
        let template = PassTemplate::load(dir.path()).unwrap();
        let descriptor = template.clone_descriptor();
        let json = serde_json::to_value(&descriptor).unwrap();
        // webServiceURL is not a bound key, but must survive a reserialize
        assert_eq!(
            json.get("webServiceURL").and_then(|v| v.as_str()),
            Some("https://example.com/passes")
        );
    }
}
