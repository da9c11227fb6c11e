/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::path::Path;

use eyre::{eyre, Result, WrapErr};
use log::debug;

use cli::{Command, ServerArgs};
use settings::{ServerConfiguration, Settings};
use store::PassStore;

pub mod api;
pub mod cli;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod settings;
pub mod store;

pub async fn run(settings: Settings, args: ServerArgs) -> Result<()> {
    logging::init(&settings)?;
    debug!("Loaded config: {:?}", &settings);
    match args.cmd {
        Command::Configure => {
            settings::update_config_file(&settings, &args.config_file)?;
            eprintln!("Wrote config file '{}'", &args.config_file);
            Ok(())
        }
        Command::Serve => {
            let store = PassStore::from_file(Path::new(&settings.passes.store_path))?;
            let conf = ServerConfiguration::new(settings, store);
            server::serve_incoming_requests(conf).await
        }
        Command::Generate { code, output } => {
            let store = PassStore::from_file(Path::new(&settings.passes.store_path))?;
            let stored = store
                .lookup(&code)
                .ok_or_else(|| eyre!("No pass with code '{}'", &code))?;
            let template_name = stored
                .template
                .as_deref()
                .unwrap_or(&settings.passes.default_template);
            let pass = giftpass_pkpass::generate_pass(
                Path::new(&settings.passes.templates_dir),
                template_name,
                &stored.data,
                Path::new(&settings.passes.cert_dir),
                &settings.bind_config(),
            )
            .await
            .wrap_err(format!("Can't generate pass '{}'", &code))?;
            let path = output.unwrap_or_else(|| pass.file_name.clone());
            std::fs::write(&path, &pass.bytes)
                .wrap_err(format!("Can't write pass to '{}'", &path))?;
            eprintln!("Wrote {} bytes to '{}'", pass.bytes.len(), &path);
            Ok(())
        }
    }
}
