/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
//! Generators for self-signed signing material, used by the test suites
//! of this crate and its clients.  Not for production use: real passes
//! need Apple-issued certificates.
use std::path::Path;

use eyre::{Result, WrapErr};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

use crate::certificate::SIGNER_KEY_NAME;

pub struct SigningMaterial {
    pub signer_key: PKey<Private>,
    pub signer_cert: X509,
    pub ca_cert: X509,
}

/// An RSA signer plus a (separate) RSA intermediate, both self-signed.
pub fn rsa_signing_material() -> Result<SigningMaterial> {
    let signer_key = PKey::from_rsa(Rsa::generate(2048)?)?;
    let ca_key = PKey::from_rsa(Rsa::generate(2048)?)?;
    build_material(signer_key, ca_key)
}

/// An EC (prime256v1) signer plus an RSA intermediate, both self-signed.
pub fn ec_signing_material() -> Result<SigningMaterial> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let signer_key = PKey::from_ec_key(EcKey::generate(&group)?)?;
    let ca_key = PKey::from_rsa(Rsa::generate(2048)?)?;
    build_material(signer_key, ca_key)
}

/// Write the material into `dir` under the standard deployment names.
pub fn write_cert_dir(dir: &Path, material: &SigningMaterial) -> Result<()> {
    std::fs::write(dir.join("signerCert.pem"), material.signer_cert.to_pem()?)
        .wrap_err("Can't write signer certificate")?;
    std::fs::write(
        dir.join(SIGNER_KEY_NAME),
        material.signer_key.private_key_to_pem_pkcs8()?,
    )
    .wrap_err("Can't write signer key")?;
    std::fs::write(dir.join("wwdr.pem"), material.ca_cert.to_pem()?)
        .wrap_err("Can't write CA certificate")?;
    Ok(())
}

fn build_material(
    signer_key: PKey<Private>,
    ca_key: PKey<Private>,
) -> Result<SigningMaterial> {
    let signer_cert = self_signed_cert(&signer_key, "Pass Signing Test")?;
    let ca_cert = self_signed_cert(&ca_key, "Pass Intermediate Test")?;
    Ok(SigningMaterial { signer_key, signer_cert, ca_cert })
}

fn self_signed_cert(key: &PKey<Private>, common_name: &str) -> Result<X509> {
    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_text("CN", common_name)?;
    let name = name.build();
    let mut builder = X509Builder::new()?;
    builder.set_version(2)?;
    let mut serial = BigNum::new()?;
    serial.rand(159, MsbOption::MAYBE_ZERO, false)?;
    let serial = serial.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    let not_after = Asn1Time::days_from_now(365)?;
    builder.set_not_after(&not_after)?;
    builder.sign(key, MessageDigest::sha256())?;
    Ok(builder.build())
}
