/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use giftpass_base::test_generators as certs;
use giftpass_pkpass::test_generators as tg;
use giftpass_pkpass::{generate_pass, BindConfig, PassError, PASS_CONTENT_TYPE};

struct Fixture {
    _root: tempfile::TempDir,
    templates_dir: PathBuf,
    cert_dir: PathBuf,
}

fn fixture(material: &certs::SigningMaterial) -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let templates_dir = root.path().join("templates");
    let template_dir = templates_dir.join("gift-card");
    std::fs::create_dir_all(&template_dir).unwrap();
    tg::write_minimal_template(&template_dir).unwrap();
    let cert_dir = root.path().join("certs");
    std::fs::create_dir_all(&cert_dir).unwrap();
    certs::write_cert_dir(&cert_dir, material).unwrap();
    Fixture { _root: root, templates_dir, cert_dir }
}

fn archive_entries(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        entries.insert(file.name().to_string(), content);
    }
    entries
}

fn hex_sha1(bytes: &[u8]) -> String {
    hex::encode(openssl::sha::sha1(bytes))
}

#[tokio::test]
async fn test_end_to_end_pass_generation() {
    let material = certs::rsa_signing_material().unwrap();
    let fx = fixture(&material);
    let data = tg::sample_pass_data();
    let pass = generate_pass(
        &fx.templates_dir,
        "gift-card",
        &data,
        &fx.cert_dir,
        &BindConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(pass.content_type, PASS_CONTENT_TYPE);
    assert_eq!(pass.file_name, "abc-123-xyz.pkpass");

    let entries = archive_entries(&pass.bytes);
    let descriptor: serde_json::Value =
        serde_json::from_slice(&entries["pass.json"]).unwrap();
    assert_eq!(descriptor["serialNumber"], "abc-123-xyz");
    assert_eq!(descriptor["barcode"]["message"], "abc-123-xyz");
    let primary = descriptor["storeCard"]["primaryFields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["key"] == "amount")
        .unwrap();
    assert_eq!(primary["value"], "\u{20b9} 500");

    // every archive member except the manifest and signature has a
    // correct manifest entry, and nothing else is listed
    let manifest: BTreeMap<String, String> =
        serde_json::from_slice(&entries["manifest.json"]).unwrap();
    for (name, content) in &entries {
        if name == "manifest.json" || name == "signature" {
            continue;
        }
        assert_eq!(manifest.get(name), Some(&hex_sha1(content)), "bad hash for {}", name);
    }
    assert_eq!(manifest.len(), entries.len() - 2);
    assert!(!entries["signature"].is_empty());
}

#[tokio::test]
async fn test_manifest_is_deterministic() {
    let material = certs::rsa_signing_material().unwrap();
    let fx = fixture(&material);
    let data = tg::sample_pass_data();
    let conf = BindConfig::default();
    let first =
        generate_pass(&fx.templates_dir, "gift-card", &data, &fx.cert_dir, &conf)
            .await
            .unwrap();
    let second =
        generate_pass(&fx.templates_dir, "gift-card", &data, &fx.cert_dir, &conf)
            .await
            .unwrap();
    let first_manifest = archive_entries(&first.bytes).remove("manifest.json").unwrap();
    let second_manifest = archive_entries(&second.bytes).remove("manifest.json").unwrap();
    assert_eq!(first_manifest, second_manifest);
}

#[tokio::test]
async fn test_ecdsa_signer_rejected() {
    let material = certs::ec_signing_material().unwrap();
    let fx = fixture(&material);
    let err = generate_pass(
        &fx.templates_dir,
        "gift-card",
        &tg::sample_pass_data(),
        &fx.cert_dir,
        &BindConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PassError::UnsupportedKeyAlgorithm(_)));
    assert!(err.to_string().contains("RSA"));
}

#[tokio::test]
async fn test_unreachable_image_falls_back_to_template_strip() {
    let material = certs::rsa_signing_material().unwrap();
    let fx = fixture(&material);
    let mut data = tg::sample_pass_data();
    data.image_source = Some("http://127.0.0.1:9/strip.png".to_string());
    let pass = generate_pass(
        &fx.templates_dir,
        "gift-card",
        &data,
        &fx.cert_dir,
        &BindConfig::default(),
    )
    .await
    .unwrap();
    let entries = archive_entries(&pass.bytes);
    assert_eq!(entries["strip.png"], tg::STRIP_IMAGE_BYTES);
}

#[tokio::test]
async fn test_local_image_override_replaces_strip() {
    let material = certs::rsa_signing_material().unwrap();
    let fx = fixture(&material);
    let override_path = fx.templates_dir.join("override.png");
    std::fs::write(&override_path, b"override image bytes").unwrap();
    let mut data = tg::sample_pass_data();
    data.image_source = Some(override_path.display().to_string());
    let pass = generate_pass(
        &fx.templates_dir,
        "gift-card",
        &data,
        &fx.cert_dir,
        &BindConfig::default(),
    )
    .await
    .unwrap();
    let entries = archive_entries(&pass.bytes);
    assert_eq!(entries["strip.png"], b"override image bytes");
    // the override is hashed into the manifest like any other member
    let manifest: BTreeMap<String, String> =
        serde_json::from_slice(&entries["manifest.json"]).unwrap();
    assert_eq!(manifest.get("strip.png"), Some(&hex_sha1(b"override image bytes")));
}

#[tokio::test]
async fn test_missing_template_is_configuration_error() {
    let material = certs::rsa_signing_material().unwrap();
    let fx = fixture(&material);
    let err = generate_pass(
        &fx.templates_dir,
        "no-such-template",
        &tg::sample_pass_data(),
        &fx.cert_dir,
        &BindConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PassError::TemplateNotFound(_)));
    assert_eq!(err.category(), giftpass_pkpass::ErrorCategory::Configuration);
}

#[tokio::test]
async fn test_missing_ca_reported_with_role() {
    let material = certs::rsa_signing_material().unwrap();
    let fx = fixture(&material);
    std::fs::remove_file(fx.cert_dir.join("wwdr.pem")).unwrap();
    let err = generate_pass(
        &fx.templates_dir,
        "gift-card",
        &tg::sample_pass_data(),
        &fx.cert_dir,
        &BindConfig::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.category(), giftpass_pkpass::ErrorCategory::Configuration);
    assert!(err.to_string().contains("WWDR"));
}
