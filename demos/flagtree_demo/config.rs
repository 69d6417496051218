//! Configuration structs for the flagtree demo application.
//!
//! [`DemoConfig`] mixes every field shape flagtree understands: plain leaves,
//! a duration, an embedded struct, an optional sub-config and an optional
//! leaf inside it, plus a list with a custom parser.
//!
//! | Flag                      | Field                              |
//! |---------------------------|------------------------------------|
//! | `--name`, `-n`            | `name`                             |
//! | `--verbose`, `-v`         | `verbose`                          |
//! | `--timeout`               | `timeout`                          |
//! | `--host`, `--port`        | `listen.host`, `listen.port`       |
//! | `--tls`                   | `tls` (optional)                   |
//! | `--tls.cert`              | `tls.cert`                         |
//! | `--tls.password`          | `tls.password` (optional)          |
//! | `--peers`                 | `peers` (repeatable)               |

use std::fmt;

use flagtree::{Configuration, Duration, Field, Parser};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct DemoConfig {
    pub name: String,
    pub verbose: bool,
    pub timeout: Duration,
    pub listen: Listen,
    pub tls: Option<Tls>,
    pub peers: Vec<String>,
    /// Not a flag; survives every load untouched.
    pub build: String,
}

impl DemoConfig {
    /// Defaults shown in `--help` and used when a flag is absent.
    pub fn defaults() -> Self {
        DemoConfig {
            name: "flagtree-demo".into(),
            verbose: false,
            timeout: Duration::from_secs(30),
            listen: Listen {
                host: "127.0.0.1".into(),
                port: 8080,
            },
            tls: Some(Tls {
                cert: "/etc/flagtree/cert.pem".into(),
                password: Some("changeme".into()),
            }),
            peers: Vec::new(),
            build: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

impl Configuration for DemoConfig {
    fn fields() -> Vec<Field> {
        vec![
            Field::leaf::<String>("name")
                .short('n')
                .description("Application name shown in the banner"),
            Field::leaf::<bool>("verbose")
                .short('v')
                .description("Print every resolved value"),
            Field::leaf::<Duration>("timeout").description("Request timeout"),
            Field::embedded::<Listen>("listen"),
            Field::optional_nested::<Tls>("tls").description("Enable TLS"),
            Field::leaf::<Vec<String>>("peers").description("Peer address (repeatable)"),
            Field::leaf::<String>("build"),
        ]
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Listen {
    pub host: String,
    pub port: u16,
}

impl Configuration for Listen {
    fn fields() -> Vec<Field> {
        vec![
            Field::leaf::<String>("host").description("Listen address"),
            Field::leaf::<u16>("port").short('p').description("Listen port"),
        ]
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Tls {
    pub cert: String,
    pub password: Option<String>,
}

impl Configuration for Tls {
    fn fields() -> Vec<Field> {
        vec![
            Field::leaf::<String>("cert").description("Certificate path"),
            Field::optional::<String>("password").description("Key password"),
        ]
    }
}

/// Version sub-command config.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct VersionConfig {
    pub short: bool,
}

impl Configuration for VersionConfig {
    fn fields() -> Vec<Field> {
        vec![Field::leaf::<bool>("short").short('s').description("Print only the number")]
    }
}

/// Each `--peers=<addr>` appends one peer.
#[derive(Debug, Clone, Default)]
pub struct PeerListParser(Vec<String>);

impl Parser for PeerListParser {
    fn set(&mut self, text: &str) -> Result<(), String> {
        self.0.extend(text.split(',').map(str::to_string));
        Ok(())
    }

    fn get(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::String).collect())
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn set_value(&mut self, value: Value) -> Result<(), String> {
        self.0 = serde_json::from_value(value).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn boxed(&self) -> Box<dyn Parser> {
        Box::new(self.clone())
    }
}

impl fmt::Display for PeerListParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}
