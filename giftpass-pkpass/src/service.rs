/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::path::Path;

use log::{debug, info};

use giftpass_base::{load_certificates, KeyAlgorithm};

use crate::asset::fetch_image_buffer;
use crate::bundle::assemble;
use crate::error::PassError;
use crate::fields::{bind_fields, BindConfig, PassData};
use crate::template::{PassTemplate, STRIP_IMAGE_FILE};

pub const PASS_CONTENT_TYPE: &str = "application/vnd.apple.pkpass";

/// A finished pass, ready for the caller to deliver.
///
/// The core does not speak HTTP; callers serving this over the web must
/// send `content_type`, a `Content-Disposition` of `attachment` (or
/// `inline` for iOS Safari user agents, which hand inline pkpass bodies
/// straight to Wallet), and should disable caching.
#[derive(Debug, Clone)]
pub struct IssuedPass {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

/// Run the full pipeline for one pass: load signing material (cached
/// after the first call), load and clone the named template, bind the
/// pass data, apply the optional image override, then sign and archive.
///
/// Stages run strictly in order and the first failure is terminal for
/// the request; only the image fetch is best-effort.
pub async fn generate_pass(
    templates_dir: &Path,
    template_name: &str,
    data: &PassData,
    cert_dir: &Path,
    conf: &BindConfig,
) -> Result<IssuedPass, PassError> {
    let certs = load_certificates(cert_dir)?;
    if let KeyAlgorithm::Ecdsa = certs.key_algorithm() {
        return Err(PassError::UnsupportedKeyAlgorithm(KeyAlgorithm::Ecdsa));
    }
    let template = PassTemplate::load(&templates_dir.join(template_name))?;
    let mut descriptor = template.clone_descriptor();
    bind_fields(&mut descriptor, data, conf);
    let mut assets = template.assets().clone();
    match fetch_image_buffer(data.image_source.as_deref()).await {
        Some(image) => {
            debug!("Pass {} uses a strip image override", data.unique_code);
            assets.insert(STRIP_IMAGE_FILE.to_string(), image);
        }
        None => debug!("Pass {} keeps the template strip image", data.unique_code),
    }
    let bytes = assemble(&descriptor, &assets, &certs)?;
    info!(
        "Issued pass {} from template '{}' ({} bytes)",
        data.unique_code,
        template_name,
        bytes.len()
    );
    Ok(IssuedPass {
        bytes,
        content_type: PASS_CONTENT_TYPE,
        file_name: format!("{}.pkpass", data.unique_code),
    })
}
