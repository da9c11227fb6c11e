/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::future::Future;
use std::sync::Mutex;

use log::{debug, error, info};

/// A future that completes when the process receives its first interrupt.
/// Used to drive graceful shutdown of the pass server; later interrupts
/// are logged and otherwise ignored.
pub fn get_first_interrupt() -> impl Future<Output = ()> + Send + 'static {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let first_interrupt = async {
        if rx.await.is_err() {
            debug!("Interrupt sender has closed the channel");
        }
    };
    let sender = Mutex::new(Some(tx));
    ctrlc::set_handler(move || match sender.lock().unwrap().take() {
        Some(tx) => {
            info!("Caught initial interrupt");
            if tx.send(()).is_err() {
                debug!("Interrupt receiver has closed the channel");
            }
        }
        None => error!("Caught subsequent interrupt"),
    })
    .unwrap();
    first_interrupt
}
