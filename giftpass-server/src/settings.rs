/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use config::{Config, File as ConfigFile, FileFormat};
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};

use giftpass_pkpass::BindConfig;

use crate::cli::ServerArgs;
use crate::store::PassStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: String,
}

impl Default for Server {
    fn default() -> Self {
        Server { host: "0.0.0.0".to_string(), port: "8080".to_string() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Passes {
    /// Directory holding signerCert.pem, signerKey.pem, and wwdr.pem.
    pub cert_dir: String,
    /// Directory holding one subdirectory per pass template.
    pub templates_dir: String,
    pub default_template: String,
    /// JSON file mapping unique code to pass data.
    pub store_path: String,
}

impl Default for Passes {
    fn default() -> Self {
        Passes {
            cert_dir: "certificates".to_string(),
            templates_dir: "templates".to_string(),
            default_template: "gift-card".to_string(),
            store_path: "passes.json".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Style {
    pub background_color: String,
    pub foreground_color: String,
    pub label_color: String,
    pub recipient_placeholder: String,
}

impl Default for Style {
    fn default() -> Self {
        let defaults = BindConfig::default();
        Style {
            background_color: defaults.background_color,
            foreground_color: defaults.foreground_color,
            label_color: defaults.label_color,
            recipient_placeholder: defaults.recipient_placeholder,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Currency {
    pub symbols: HashMap<String, String>,
    pub default_symbol: String,
}

impl Default for Currency {
    fn default() -> Self {
        let defaults = BindConfig::default();
        Currency {
            symbols: defaults.currency_symbols,
            default_symbol: defaults.default_symbol,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogDestination {
    Console,
    File,
}

impl std::str::FromStr for LogDestination {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        if "console".starts_with(&s.to_ascii_lowercase()) {
            Ok(LogDestination::Console)
        } else if "file".starts_with(&s.to_ascii_lowercase()) {
            Ok(LogDestination::File)
        } else {
            Err(eyre!("Log destination must be 'console' or 'file'"))
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Logging {
    pub level: LogLevel,
    pub destination: LogDestination,
    pub file_path: String,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: LogLevel::Info,
            destination: LogDestination::Console,
            file_path: "giftpass-log.log".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub passes: Passes,
    pub style: Style,
    pub currency: Currency,
    pub logging: Logging,
}

impl Settings {
    /// The presentation settings handed to the field binder.
    pub fn bind_config(&self) -> BindConfig {
        BindConfig {
            currency_symbols: self.currency.symbols.clone(),
            default_symbol: self.currency.default_symbol.clone(),
            background_color: self.style.background_color.clone(),
            foreground_color: self.style.foreground_color.clone(),
            label_color: self.style.label_color.clone(),
            recipient_placeholder: self.style.recipient_placeholder.clone(),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .wrap_err("Invalid host/port configuration")
    }
}

/// Defaults layered under the optional TOML file, then CLI overrides.
pub fn load_config_file(args: &ServerArgs) -> Result<Settings> {
    let mut settings: Settings = Config::builder()
        .add_source(Config::try_from(&Settings::default())?)
        .add_source(ConfigFile::new(&args.config_file, FileFormat::Toml).required(false))
        .build()
        .wrap_err("Can't read configuration")?
        .try_deserialize()
        .wrap_err("Invalid configuration")?;
    if args.debug == 1 {
        settings.logging.level = LogLevel::Debug;
    } else if args.debug > 1 {
        settings.logging.level = LogLevel::Trace;
    }
    if let Some(destination) = &args.log_to {
        settings.logging.destination = destination.parse()?;
    }
    Ok(settings)
}

/// Write the settings out as a TOML config file.
pub fn update_config_file(settings: &Settings, path: &str) -> Result<()> {
    let body = toml::to_string_pretty(settings).wrap_err("Can't serialize settings")?;
    std::fs::write(path, body).wrap_err(format!("Can't write config file '{}'", path))?;
    Ok(())
}

/// Everything the request handlers need, cheap to clone into filters.
#[derive(Clone)]
pub struct ServerConfiguration {
    pub settings: Arc<Settings>,
    pub store: Arc<PassStore>,
    pub bind: Arc<BindConfig>,
}

impl ServerConfiguration {
    pub fn new(settings: Settings, store: PassStore) -> Self {
        let bind = Arc::new(settings.bind_config());
        ServerConfiguration {
            settings: Arc::new(settings),
            store: Arc::new(store),
            bind,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cli::{Command, ServerArgs};

    fn args(config_file: &str) -> ServerArgs {
        ServerArgs {
            config_file: config_file.to_string(),
            debug: 0,
            log_to: None,
            cmd: Command::Serve,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        let settings = load_config_file(&args("no-such-file.toml")).unwrap();
        assert_eq!(settings.server.port, "8080");
        assert_eq!(settings.passes.default_template, "gift-card");
        let conf = settings.bind_config();
        assert_eq!(conf.currency_symbols.get("INR").unwrap(), "\u{20b9}");
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.toml").display().to_string();
        let mut settings = Settings::default();
        settings.server.port = "9090".to_string();
        update_config_file(&settings, &path).unwrap();
        let loaded = load_config_file(&args(&path)).unwrap();
        assert_eq!(loaded.server.port, "9090");
    }

    #[test]
    fn test_debug_flag_overrides_level() {
        let mut args = args("no-such-file.toml");
        args.debug = 1;
        let settings = load_config_file(&args).unwrap();
        assert!(matches!(settings.logging.level, LogLevel::Debug));
    }
}
