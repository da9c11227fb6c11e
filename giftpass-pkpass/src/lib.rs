/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
//! Assembly and signing of Apple Wallet gift-card passes.
//!
//! The pipeline turns a pass-data record (recipient, amount, currency,
//! expiry, unique code, optional image) plus an on-disk template into a
//! signed `.pkpass` archive: load signing material, clone the template
//! descriptor, bind the per-pass fields, optionally override the strip
//! image, then hash, sign, and zip the bundle in memory.
pub use asset::fetch_image_buffer;
pub use error::{ErrorCategory, PassError};
pub use fields::{bind_fields, BindConfig, PassData};
pub use service::{generate_pass, IssuedPass, PASS_CONTENT_TYPE};
pub use template::{Barcode, PassDescriptor, PassField, PassStructure, PassTemplate};

pub mod asset;
pub mod bundle;
pub mod error;
pub mod fields;
pub mod service;
pub mod template;
pub mod test_generators;
