/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::path::Path;

use log::{error, info};
use warp::{reply, Reply};

use giftpass_pkpass::{generate_pass, ErrorCategory, IssuedPass};

use crate::settings::ServerConfiguration;

pub async fn status(conf: ServerConfiguration) -> reply::Response {
    let status = format!("Pass server ready ({} pass(es) loaded)", conf.store.len());
    info!("Status request received, issuing status: {}", &status);
    let body =
        serde_json::json!({"statusCode": 200, "version": &agent(), "status": &status});
    json_reply(200, &body)
}

pub async fn issue_pass(
    code: String,
    user_agent: Option<String>,
    conf: ServerConfiguration,
) -> reply::Response {
    info!("Received pass request for code: {}", &code);
    let Some(stored) = conf.store.lookup(&code) else {
        let body = serde_json::json!({
            "statusCode": 404,
            "error": format!("No pass with code '{}'", code),
        });
        return json_reply(404, &body);
    };
    let template_name = stored
        .template
        .as_deref()
        .unwrap_or(&conf.settings.passes.default_template);
    let outcome = generate_pass(
        Path::new(&conf.settings.passes.templates_dir),
        template_name,
        &stored.data,
        Path::new(&conf.settings.passes.cert_dir),
        &conf.bind,
    )
    .await;
    match outcome {
        Ok(pass) => pass_reply(&pass, wants_inline(user_agent.as_deref())),
        Err(err) => {
            error!("Can't issue pass {}: {:#}", &code, &err);
            let (status, message) = match err.category() {
                ErrorCategory::Configuration => {
                    (500, format!("Pass signing is misconfigured: {}", err))
                }
                ErrorCategory::UnsupportedCapability => (500, err.to_string()),
                ErrorCategory::Assembly => {
                    (500, "Pass assembly failed; see server log".to_string())
                }
            };
            let body = serde_json::json!({"statusCode": status, "error": message});
            json_reply(status, &body)
        }
    }
}

/// iOS Safari opens an inline pkpass body directly in Wallet; every
/// other client gets a download.
fn wants_inline(user_agent: Option<&str>) -> bool {
    match user_agent {
        Some(ua) => {
            (ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod"))
                && ua.contains("Safari")
        }
        None => false,
    }
}

fn pass_reply(pass: &IssuedPass, inline: bool) -> reply::Response {
    let disposition = format!(
        "{}; filename=\"{}\"",
        if inline { "inline" } else { "attachment" },
        pass.file_name
    );
    match warp::http::Response::builder()
        .status(200)
        .header("Content-Type", pass.content_type)
        .header("Content-Disposition", disposition)
        .header("Cache-Control", "no-cache")
        .body(warp::hyper::Body::from(pass.bytes.clone()))
    {
        Ok(response) => response,
        Err(err) => {
            error!("Can't build pass response: {}", err);
            json_reply(500, &serde_json::json!({"statusCode": 500}))
        }
    }
}

fn json_reply(status: u16, body: &serde_json::Value) -> reply::Response {
    let reply = reply::json(body);
    let mut response = reply.into_response();
    *response.status_mut() = warp::http::StatusCode::from_u16(status)
        .unwrap_or(warp::http::StatusCode::INTERNAL_SERVER_ERROR);
    response
}

fn agent() -> String {
    format!("giftpass-server/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod test {
    use super::wants_inline;

    #[test]
    fn test_inline_disposition_detection() {
        let ios = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) \
                   AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 \
                   Mobile/15E148 Safari/604.1";
        assert!(wants_inline(Some(ios)));
        let desktop = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/104.0";
        assert!(!wants_inline(Some(desktop)));
        assert!(!wants_inline(None));
    }
}
