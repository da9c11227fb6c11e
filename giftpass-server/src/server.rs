/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use eyre::Result;
use log::{error, info};

use giftpass_base::get_first_interrupt;

use crate::api;
use crate::settings::ServerConfiguration;

pub async fn serve_incoming_requests(conf: ServerConfiguration) -> Result<()> {
    let routes = api::routes(conf.clone());
    let bind_addr = conf.settings.bind_addr()?;
    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown(bind_addr, get_first_interrupt());
    info!("Serving pass requests on {:?}...", addr);
    match tokio::task::spawn(server).await {
        Ok(_) => info!("Pass server terminated normally"),
        Err(err) => error!("Pass server terminated abnormally: {:?}", err),
    }
    Ok(())
}
