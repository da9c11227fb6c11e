/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use clap::Parser;
use eyre::Result;

use giftpass_server::cli::ServerArgs;
use giftpass_server::{run, settings};

#[tokio::main]
async fn main() -> Result<()> {
    openssl_probe::init_ssl_cert_env_vars();
    let args: ServerArgs = ServerArgs::parse();
    let settings = settings::load_config_file(&args)?;
    run(settings, args).await
}
