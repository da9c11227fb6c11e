/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use log::{debug, info};
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Private};
use openssl::x509::X509;
use thiserror::Error;

/// Signer certificates may be deployed under any of these names.
/// They are probed in order, and the first match wins.
pub const SIGNER_CERT_NAMES: &[&str] =
    &["signerCert.pem", "certificate.pem", "pass-cert.pem"];

/// The private key always has this name.
pub const SIGNER_KEY_NAME: &str = "signerKey.pem";

/// Accepted names for the Apple WWDR intermediate certificate.
pub const CA_CERT_NAMES: &[&str] = &["wwdr.pem", "AppleWWDRCA.pem", "ca-cert.pem"];

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error(
        "No {role} found in '{dir}' (expected {expected}); \
         pass signing is not configured"
    )]
    NotConfigured { role: &'static str, dir: String, expected: String },
    #[error(
        "File '{file}' is not PEM-armored text; if it is DER-encoded, \
         convert it first (e.g. 'openssl x509 -inform der -in {file}')"
    )]
    WrongEncoding { file: String },
    #[error("Can't parse {role} file '{file}'")]
    Malformed {
        role: &'static str,
        file: String,
        #[source]
        source: openssl::error::ErrorStack,
    },
    #[error("Can't read '{file}'")]
    Unreadable {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Private key '{key_file}' does not match signer certificate '{cert_file}'")]
    KeyMismatch { key_file: String, cert_file: String },
}

/// The signing algorithm implied by a signer certificate's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Ecdsa,
    Unknown,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAlgorithm::Rsa => write!(f, "RSA"),
            KeyAlgorithm::Ecdsa => write!(f, "ECDSA"),
            KeyAlgorithm::Unknown => write!(f, "an unrecognized key algorithm"),
        }
    }
}

/// The complete signing material for one pass-type certificate directory:
/// signer certificate, signer key, and the WWDR intermediate, plus the
/// classification of the signer's key.  Immutable once loaded.
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    signer_cert: X509,
    signer_key: PKey<Private>,
    ca_cert: X509,
    key_algorithm: KeyAlgorithm,
}

impl CertificateBundle {
    /// Load signing material from a certificate directory, without caching.
    /// All three parts must be present and PEM-armored, and the key must
    /// match the signer certificate.
    pub fn load(cert_dir: &Path) -> Result<Self, CertificateError> {
        let cert_path = find_first(cert_dir, SIGNER_CERT_NAMES).ok_or_else(|| {
            CertificateError::NotConfigured {
                role: "signer certificate",
                dir: cert_dir.display().to_string(),
                expected: format!("one of {}", SIGNER_CERT_NAMES.join(", ")),
            }
        })?;
        let key_path = find_first(cert_dir, &[SIGNER_KEY_NAME]).ok_or_else(|| {
            CertificateError::NotConfigured {
                role: "signer private key",
                dir: cert_dir.display().to_string(),
                expected: format!("'{}'", SIGNER_KEY_NAME),
            }
        })?;
        let ca_path = find_first(cert_dir, CA_CERT_NAMES).ok_or_else(|| {
            CertificateError::NotConfigured {
                role: "WWDR/CA intermediate certificate",
                dir: cert_dir.display().to_string(),
                expected: format!("one of {}", CA_CERT_NAMES.join(", ")),
            }
        })?;
        let signer_cert = read_pem_cert("signer certificate", &cert_path)?;
        let ca_cert = read_pem_cert("WWDR/CA intermediate certificate", &ca_path)?;
        let key_pem = read_pem_bytes(&key_path)?;
        let signer_key = PKey::private_key_from_pem(&key_pem).map_err(|source| {
            CertificateError::Malformed {
                role: "signer private key",
                file: key_path.display().to_string(),
                source,
            }
        })?;
        validate_key_match(&signer_key, &signer_cert, &key_path, &cert_path)?;
        let key_algorithm = detect_key_algorithm(&signer_cert);
        debug!(
            "Loaded pass signing material from '{}' ({} signer key)",
            cert_dir.display(),
            key_algorithm
        );
        Ok(CertificateBundle { signer_cert, signer_key, ca_cert, key_algorithm })
    }

    pub fn signer_cert(&self) -> &X509 {
        &self.signer_cert
    }

    pub fn signer_key(&self) -> &PKey<Private> {
        &self.signer_key
    }

    pub fn ca_cert(&self) -> &X509 {
        &self.ca_cert
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }
}

lazy_static! {
    // Certificate material is immutable for the process lifetime, so each
    // directory is loaded at most once.  Failed loads are never cached.
    static ref BUNDLE_CACHE: Mutex<HashMap<PathBuf, Arc<CertificateBundle>>> =
        Mutex::new(HashMap::new());
}

/// Load the signing material for `cert_dir`, reusing the process-wide
/// cached bundle after the first successful load.
pub fn load_certificates(cert_dir: &Path) -> Result<Arc<CertificateBundle>, CertificateError> {
    let key = cert_dir.to_path_buf();
    if let Some(bundle) = BUNDLE_CACHE.lock().unwrap().get(&key) {
        return Ok(bundle.clone());
    }
    let bundle = Arc::new(CertificateBundle::load(cert_dir)?);
    info!("Cached pass signing material from '{}'", cert_dir.display());
    BUNDLE_CACHE.lock().unwrap().insert(key, bundle.clone());
    Ok(bundle)
}

fn find_first(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

fn read_pem_bytes(path: &Path) -> Result<Vec<u8>, CertificateError> {
    let file = path.display().to_string();
    let bytes = std::fs::read(path)
        .map_err(|source| CertificateError::Unreadable { file: file.clone(), source })?;
    match std::str::from_utf8(&bytes) {
        Ok(text) if text.contains("-----BEGIN ") => Ok(bytes),
        _ => Err(CertificateError::WrongEncoding { file }),
    }
}

fn read_pem_cert(role: &'static str, path: &Path) -> Result<X509, CertificateError> {
    let pem = read_pem_bytes(path)?;
    X509::from_pem(&pem).map_err(|source| CertificateError::Malformed {
        role,
        file: path.display().to_string(),
        source,
    })
}

fn validate_key_match(
    key: &PKey<Private>,
    cert: &X509,
    key_path: &Path,
    cert_path: &Path,
) -> Result<(), CertificateError> {
    let mismatch = || CertificateError::KeyMismatch {
        key_file: key_path.display().to_string(),
        cert_file: cert_path.display().to_string(),
    };
    let key_pubkey = key.public_key_to_pem().map_err(|_| mismatch())?;
    let cert_pubkey = cert
        .public_key()
        .and_then(|pubkey| pubkey.public_key_to_pem())
        .map_err(|_| mismatch())?;
    if key_pubkey == cert_pubkey {
        Ok(())
    } else {
        Err(mismatch())
    }
}

/// Classify the signer certificate's key.  Certificate tooling varies in
/// what it can introspect, so this runs an ordered list of strategies and
/// takes the first answer; when none of them answer, the classification
/// is `Unknown` rather than an error.
fn detect_key_algorithm(cert: &X509) -> KeyAlgorithm {
    let strategies: &[fn(&X509) -> Option<KeyAlgorithm>] =
        &[classify_by_public_key, classify_by_signature_oid];
    for strategy in strategies {
        if let Some(algorithm) = strategy(cert) {
            return algorithm;
        }
    }
    KeyAlgorithm::Unknown
}

fn classify_by_public_key(cert: &X509) -> Option<KeyAlgorithm> {
    match cert.public_key().ok()?.id() {
        Id::RSA => Some(KeyAlgorithm::Rsa),
        Id::EC => Some(KeyAlgorithm::Ecdsa),
        _ => None,
    }
}

fn classify_by_signature_oid(cert: &X509) -> Option<KeyAlgorithm> {
    match cert.signature_algorithm().object().nid() {
        Nid::SHA256WITHRSAENCRYPTION
        | Nid::SHA384WITHRSAENCRYPTION
        | Nid::SHA512WITHRSAENCRYPTION
        | Nid::SHA1WITHRSAENCRYPTION => Some(KeyAlgorithm::Rsa),
        Nid::ECDSA_WITH_SHA256
        | Nid::ECDSA_WITH_SHA384
        | Nid::ECDSA_WITH_SHA512
        | Nid::ECDSA_WITH_SHA1 => Some(KeyAlgorithm::Ecdsa),
        _ => None,
    }
}
