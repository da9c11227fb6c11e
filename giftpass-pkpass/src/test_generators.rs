/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
//! Fixtures for pipeline tests: a minimal store-card template and a
//! sample pass-data record.  Signing material comes from the base
//! crate's generators.
use std::path::Path;

use eyre::Result;

use crate::fields::PassData;
use crate::template::{PassDescriptor, DESCRIPTOR_FILE, STRIP_IMAGE_FILE};

// PNG signature followed by filler; the pipeline never decodes images.
pub const STRIP_IMAGE_BYTES: &[u8] =
    &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x01, 0x02, 0x03];
pub const ICON_IMAGE_BYTES: &[u8] =
    &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x04, 0x05, 0x06, 0x07];

pub fn minimal_descriptor_json() -> serde_json::Value {
    serde_json::json!({
        "formatVersion": 1,
        "passTypeIdentifier": "pass.com.example.giftcard",
        "teamIdentifier": "TESTTEAM99",
        "organizationName": "Example Gifts",
        "description": "Gift Card",
        "webServiceURL": "https://example.com/passes",
        "storeCard": {
            "backFields": [
                { "key": "terms", "label": "Terms", "value": "Not redeemable for cash." }
            ]
        }
    })
}

pub fn minimal_descriptor() -> PassDescriptor {
    serde_json::from_value(minimal_descriptor_json()).expect("bad fixture descriptor")
}

/// Write a two-asset store-card template into `dir`.
pub fn write_minimal_template(dir: &Path) -> Result<()> {
    let descriptor = serde_json::to_vec_pretty(&minimal_descriptor_json())?;
    std::fs::write(dir.join(DESCRIPTOR_FILE), descriptor)?;
    std::fs::write(dir.join("icon.png"), ICON_IMAGE_BYTES)?;
    std::fs::write(dir.join(STRIP_IMAGE_FILE), STRIP_IMAGE_BYTES)?;
    Ok(())
}

pub fn sample_pass_data() -> PassData {
    PassData {
        unique_code: "abc-123-xyz".to_string(),
        recipient_name: "Asha".to_string(),
        amount: 500.0,
        currency: "INR".to_string(),
        gift_card_name: "Birthday Card".to_string(),
        expiry_date: Some("2026-01-01".to_string()),
        image_source: None,
    }
}
