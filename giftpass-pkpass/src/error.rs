/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use giftpass_base::{CertificateError, KeyAlgorithm};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Certificate(#[from] CertificateError),
    #[error(
        "Pass signing requires an RSA signer key, but the configured \
         certificate uses {0}; request an RSA pass certificate from Apple, \
         or switch to a CMS implementation with ECDSA support"
    )]
    UnsupportedKeyAlgorithm(KeyAlgorithm),
    #[error("No pass template at '{0}'")]
    TemplateNotFound(String),
    #[error("Pass template at '{dir}' has an unreadable descriptor")]
    TemplateInvalid {
        dir: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Can't sign pass manifest")]
    Signing(#[from] openssl::error::ErrorStack),
    #[error("Can't assemble pass archive")]
    Archive(#[from] zip::result::ZipError),
    #[error("Can't serialize pass descriptor")]
    Descriptor(#[from] serde_json::Error),
    #[error("I/O failure while assembling pass")]
    Io(#[from] std::io::Error),
}

/// The coarse category of a failure, used by HTTP-facing callers to pick
/// status codes and remediation messaging without parsing error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed deployment material; self-remediable.
    Configuration,
    /// The request is valid but this build can't honor it.
    UnsupportedCapability,
    /// Hashing, signing, or archiving failed mid-assembly.
    Assembly,
}

impl PassError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PassError::Certificate(_)
            | PassError::TemplateNotFound(_)
            | PassError::TemplateInvalid { .. } => ErrorCategory::Configuration,
            PassError::UnsupportedKeyAlgorithm(_) => ErrorCategory::UnsupportedCapability,
            PassError::Signing(_)
            | PassError::Archive(_)
            | PassError::Descriptor(_)
            | PassError::Io(_) => ErrorCategory::Assembly,
        }
    }
}
