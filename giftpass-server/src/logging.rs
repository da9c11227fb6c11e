/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::io;

use eyre::{Result, WrapErr};
use fern::{log_file, Dispatch};
use log::LevelFilter;

use crate::settings::{LogDestination, LogLevel, Settings};

pub fn init(conf: &Settings) -> Result<()> {
    let mut base_config = Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });
    let level = log_level(&conf.logging.level);
    match conf.logging.destination {
        LogDestination::Console => {
            base_config =
                base_config.chain(Dispatch::new().level(level).chain(io::stdout()))
        }
        LogDestination::File => {
            base_config = base_config.chain(
                Dispatch::new().level(level).chain(log_file(&conf.logging.file_path)?),
            )
        }
    }
    base_config.apply().wrap_err("Cannot initialize logging subsystem")?;
    Ok(())
}

fn log_level(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::Off,
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}
