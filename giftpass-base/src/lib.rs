/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
pub use certificate::{
    load_certificates, CertificateBundle, CertificateError, KeyAlgorithm,
};
pub use signal::get_first_interrupt;

mod certificate;
mod signal;
pub mod test_generators;
