/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};

use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::sha::sha1;
use openssl::stack::Stack;
use openssl::x509::X509;
use serde_json::Value;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use giftpass_base::{CertificateBundle, KeyAlgorithm};

use crate::error::PassError;
use crate::template::{PassDescriptor, DESCRIPTOR_FILE};

/// Archive member names dictated by the wallet-pass format.
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "signature";

/// The manifest maps every archive member name to the lowercase hex
/// SHA-1 of its content.  SHA-1 is what on-device verification expects;
/// it is a format constant, not a choice.
pub fn build_manifest(files: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>, PassError> {
    let mut manifest = serde_json::Map::new();
    for (name, bytes) in files {
        manifest.insert(name.clone(), Value::String(hex::encode(sha1(bytes))));
    }
    Ok(serde_json::to_vec(&Value::Object(manifest))?)
}

/// Detached PKCS#7 signature over the serialized manifest, DER encoded,
/// with the WWDR intermediate included in the chain.
pub fn sign_manifest(
    manifest: &[u8],
    certs: &CertificateBundle,
) -> Result<Vec<u8>, PassError> {
    if let KeyAlgorithm::Ecdsa = certs.key_algorithm() {
        return Err(PassError::UnsupportedKeyAlgorithm(KeyAlgorithm::Ecdsa));
    }
    let mut chain: Stack<X509> = Stack::new()?;
    chain.push(certs.ca_cert().clone())?;
    let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY;
    let pkcs7 =
        Pkcs7::sign(certs.signer_cert(), certs.signer_key(), &chain, manifest, flags)?;
    Ok(pkcs7.to_der()?)
}

/// Hash, sign, and zip one pass bundle, entirely in memory.  The result
/// is the raw `.pkpass` archive: descriptor, assets, manifest, and the
/// detached signature, all as stored (uncompressed) entries.
pub fn assemble(
    descriptor: &PassDescriptor,
    assets: &HashMap<String, Vec<u8>>,
    certs: &CertificateBundle,
) -> Result<Vec<u8>, PassError> {
    if let KeyAlgorithm::Ecdsa = certs.key_algorithm() {
        return Err(PassError::UnsupportedKeyAlgorithm(KeyAlgorithm::Ecdsa));
    }
    let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    files.insert(DESCRIPTOR_FILE.to_string(), serde_json::to_vec(descriptor)?);
    for (name, bytes) in assets {
        files.insert(name.clone(), bytes.clone());
    }
    let manifest = build_manifest(&files)?;
    let signature = sign_manifest(&manifest, certs)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in &files {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes)?;
    }
    writer.start_file(MANIFEST_FILE, options)?;
    writer.write_all(&manifest)?;
    writer.start_file(SIGNATURE_FILE, options)?;
    writer.write_all(&signature)?;
    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_generators as tg;
    use giftpass_base::CertificateBundle;

    fn bundle_from(material: &giftpass_base::test_generators::SigningMaterial) -> CertificateBundle {
        let dir = tempfile::tempdir().unwrap();
        giftpass_base::test_generators::write_cert_dir(dir.path(), material).unwrap();
        CertificateBundle::load(dir.path()).unwrap()
    }

    #[test]
    fn test_manifest_hashes() {
        let mut files = BTreeMap::new();
        files.insert("a.txt".to_string(), b"hello".to_vec());
        let manifest = build_manifest(&files).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&manifest).unwrap();
        assert_eq!(
            parsed.get("a.txt").and_then(|v| v.as_str()),
            // sha1("hello")
            Some("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d")
        );
    }

    #[test]
    fn test_rsa_signature_is_der() {
        let material = giftpass_base::test_generators::rsa_signing_material().unwrap();
        let certs = bundle_from(&material);
        let signature = sign_manifest(b"{}", &certs).unwrap();
        assert!(!signature.is_empty());
        // DER SEQUENCE tag
        assert_eq!(signature[0], 0x30);
    }

    #[test]
    fn test_ecdsa_signer_rejected_before_signing() {
        let material = giftpass_base::test_generators::ec_signing_material().unwrap();
        let certs = bundle_from(&material);
        let err = sign_manifest(b"{}", &certs).unwrap_err();
        assert!(matches!(err, PassError::UnsupportedKeyAlgorithm(_)));
        let descriptor = tg::minimal_descriptor();
        let err = assemble(&descriptor, &HashMap::new(), &certs).unwrap_err();
        assert!(matches!(err, PassError::UnsupportedKeyAlgorithm(_)));
    }
}
