/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ServerArgs {
    #[clap(short, long, default_value = "giftpass-conf.toml")]
    /// Path to config file.
    pub config_file: String,

    #[clap(short, long, action = clap::ArgAction::Count)]
    /// Specify once to force log level to debug.
    /// Specify twice to force log level to trace.
    pub debug: u8,

    #[clap(short, long)]
    /// Override configured log destination: 'console' or 'file'.
    /// You can use just the first letter, so '-l c' and '-l f' work.
    pub log_to: Option<String>,

    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
/// Pass server commands
pub enum Command {
    /// Write a default config file
    Configure,
    /// Start the pass-issuing server
    Serve,
    /// Generate one pass and write it to disk
    Generate {
        /// Unique code of the pass to generate
        code: String,

        #[clap(short, long)]
        /// Output path; defaults to '<code>.pkpass' in the current directory
        output: Option<String>,
    },
}
