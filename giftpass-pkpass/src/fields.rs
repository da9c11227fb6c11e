/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::{Barcode, PassDescriptor, PassField};

pub const NO_EXPIRY: &str = "No Expiry";

/// The per-pass record supplied by the commerce layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassData {
    /// Primary identifier; becomes the serial number and barcode payload.
    pub unique_code: String,
    #[serde(default)]
    pub recipient_name: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub gift_card_name: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub image_source: Option<String>,
}

/// Presentation settings applied at bind time.  The currency table is an
/// explicit, reviewed mapping rather than hard-coded branches; codes
/// outside the table render with `default_symbol`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindConfig {
    pub currency_symbols: HashMap<String, String>,
    pub default_symbol: String,
    pub background_color: String,
    pub foreground_color: String,
    pub label_color: String,
    pub recipient_placeholder: String,
}

impl Default for BindConfig {
    fn default() -> Self {
        let currency_symbols: HashMap<String, String> =
            [("INR", "\u{20b9}"), ("USD", "$"), ("EUR", "\u{20ac}"), ("GBP", "\u{a3}")]
                .iter()
                .map(|(code, symbol)| (code.to_string(), symbol.to_string()))
                .collect();
        BindConfig {
            currency_symbols,
            default_symbol: "$".to_string(),
            background_color: "rgb(35, 31, 32)".to_string(),
            foreground_color: "rgb(255, 255, 255)".to_string(),
            label_color: "rgb(255, 255, 255)".to_string(),
            recipient_placeholder: "Recipient".to_string(),
        }
    }
}

/// Merge the pass data into the descriptor and return it for chaining.
///
/// Field-group entries follow the upsert rule: a record whose `key`
/// already exists is updated in place, otherwise a new record is
/// appended.  Top-level attributes (serial number, barcode, colors,
/// logo text) are overwritten unconditionally.
pub fn bind_fields<'a>(
    descriptor: &'a mut PassDescriptor,
    data: &PassData,
    conf: &BindConfig,
) -> &'a mut PassDescriptor {
    let amount = format_amount(data.amount, &data.currency, conf);
    let expiry = format_expiry(data.expiry_date.as_deref());
    let recipient = if data.recipient_name.trim().is_empty() {
        conf.recipient_placeholder.clone()
    } else {
        data.recipient_name.clone()
    };
    let structure = descriptor.structure_mut();
    upsert(&mut structure.primary_fields, "amount", "Amount", &amount);
    upsert(&mut structure.secondary_fields, "recipient", "To", &recipient);
    if !data.gift_card_name.trim().is_empty() {
        upsert(&mut structure.header_fields, "card", "Gift Card", &data.gift_card_name);
    }
    upsert(&mut structure.auxiliary_fields, "expiry", "Expires", &expiry);

    descriptor.serial_number = data.unique_code.clone();
    let barcode = Barcode {
        format: "PKBarcodeFormatQR".to_string(),
        message: data.unique_code.clone(),
        message_encoding: "iso-8859-1".to_string(),
        alt_text: Some(data.unique_code.clone()),
    };
    descriptor.barcode = Some(barcode.clone());
    descriptor.barcodes = Some(vec![barcode]);
    descriptor.background_color = Some(conf.background_color.clone());
    descriptor.foreground_color = Some(conf.foreground_color.clone());
    descriptor.label_color = Some(conf.label_color.clone());
    if !data.gift_card_name.trim().is_empty() {
        descriptor.logo_text = Some(data.gift_card_name.clone());
        descriptor.description = data.gift_card_name.clone();
    }
    descriptor
}

fn upsert(group: &mut Vec<PassField>, key: &str, label: &str, value: &str) {
    match group.iter_mut().find(|field| field.key == key) {
        Some(field) => field.value = Value::String(value.to_string()),
        None => group.push(PassField::new(key, label, value)),
    }
}

/// `"<symbol> <amount>"`, with whole amounts rendered without a
/// fractional part.
pub fn format_amount(amount: f64, currency: &str, conf: &BindConfig) -> String {
    let symbol = conf
        .currency_symbols
        .get(currency)
        .map(String::as_str)
        .unwrap_or(&conf.default_symbol);
    format!("{} {}", symbol, format_decimal(amount))
}

fn format_decimal(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        amount.to_string()
    }
}

/// `"No Expiry"` when absent or unparsable, else `M/D/YYYY` without
/// zero-padding.  Accepts plain dates and RFC 3339 timestamps, since
/// upstream stores have supplied both.
pub fn format_expiry(expiry: Option<&str>) -> String {
    let date = match expiry {
        None => None,
        Some(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Some(d)
            } else if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                Some(dt.date_naive())
            } else if let Ok(dt) = s.parse::<DateTime<Utc>>() {
                Some(dt.date_naive())
            } else {
                None
            }
        }
    };
    match date {
        Some(d) => format!("{}/{}/{}", d.month(), d.day(), d.year()),
        None => NO_EXPIRY.to_string(),
    }
}
