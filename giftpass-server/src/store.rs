/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::collections::HashMap;
use std::path::Path;

use eyre::{Result, WrapErr};
use log::{info, warn};

use giftpass_pkpass::PassData;

/// The issued-pass lookup consumed by the handlers: a read-only map of
/// unique code to pass data, loaded from a JSON file maintained by the
/// commerce layer.  A record's optional `template` key selects a
/// non-default template.
pub struct PassStore {
    passes: HashMap<String, StoredPass>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredPass {
    #[serde(flatten)]
    pub data: PassData,
    #[serde(default)]
    pub template: Option<String>,
}

impl PassStore {
    /// A missing store file yields an empty store so the server can
    /// still come up and report status.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            warn!("No pass store at '{}'; starting empty", path.display());
            return Ok(PassStore { passes: HashMap::new() });
        }
        let file = std::fs::File::open(path)
            .wrap_err(format!("Can't open pass store '{}'", path.display()))?;
        let passes: HashMap<String, StoredPass> = serde_json::from_reader(&file)
            .wrap_err(format!("Can't parse pass store '{}'", path.display()))?;
        info!("Loaded {} pass(es) from '{}'", passes.len(), path.display());
        Ok(PassStore { passes })
    }

    pub fn lookup(&self, code: &str) -> Option<&StoredPass> {
        self.passes.get(code)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PassStore::from_file(&dir.path().join("nope.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_lookup_by_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passes.json");
        let body = serde_json::json!({
            "abc-123-xyz": {
                "uniqueCode": "abc-123-xyz",
                "recipientName": "Asha",
                "amount": 500,
                "currency": "INR",
                "giftCardName": "Birthday Card",
                "expiryDate": "2026-01-01"
            }
        });
        std::fs::write(&path, serde_json::to_vec(&body).unwrap()).unwrap();
        let store = PassStore::from_file(&path).unwrap();
        assert_eq!(store.len(), 1);
        let stored = store.lookup("abc-123-xyz").unwrap();
        assert_eq!(stored.data.recipient_name, "Asha");
        assert_eq!(stored.template, None);
        assert!(store.lookup("other").is_none());
    }
}
