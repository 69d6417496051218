//! # flagtree demo application
//!
//! A sample CLI tool showing how flagtree turns a nested config struct into
//! flags. It exists purely to demonstrate and manually verify the library.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example flagtree_demo -- --help
//! cargo run --example flagtree_demo -- -v --port 9000
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                      | How to exercise it                                              |
//! |------------------------------|-----------------------------------------------------------------|
//! | Defaults                     | `cargo run --example flagtree_demo`                             |
//! | Short flags                  | `cargo run --example flagtree_demo -- -v -p9000`                |
//! | Embedded struct              | `cargo run --example flagtree_demo -- --host 0.0.0.0`           |
//! | Optional toggle              | `cargo run --example flagtree_demo -- --tls`                    |
//! | Activation by a child flag   | `cargo run --example flagtree_demo -- --tls.cert=/tmp/c.pem`    |
//! | Optional leaf toggle         | `cargo run --example flagtree_demo -- --tls.password`           |
//! | Custom parser                | `cargo run --example flagtree_demo -- --peers=a:1 --peers=b:2`  |
//! | Help with defaults           | `cargo run --example flagtree_demo -- --help`                   |
//! | Sub-command                  | `cargo run --example flagtree_demo -- version -s`               |
//! | Bad value                    | `cargo run --example flagtree_demo -- --timeout=soon`           |

mod config;

use std::process::ExitCode;

use flagtree::{App, Command, FlagError};

use config::{DemoConfig, PeerListParser, VersionConfig};

fn main() -> ExitCode {
    let root = Command::new(
        "flagtree-demo",
        "flagtree demo: a sample CLI for showcasing flag materialization.",
        DemoConfig::defaults(),
    )
    .run(|config: &DemoConfig| {
        print_config(config);
        Ok::<_, String>(())
    });

    let version = Command::new("version", "Print the demo version", VersionConfig::default()).run(
        |config: &VersionConfig| {
            if config.short {
                println!("{}", env!("CARGO_PKG_VERSION"));
            } else {
                println!("flagtree-demo {}", env!("CARGO_PKG_VERSION"));
            }
            Ok::<_, String>(())
        },
    );

    let mut app = App::new(root, std::env::args().skip(1))
        .add_parser::<Vec<String>>(PeerListParser::default())
        .add_command(version);

    match app.run() {
        Ok(()) | Err(FlagError::HelpRequested) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_config(config: &DemoConfig) {
    println!("{} listening on {}:{}", config.name, config.listen.host, config.listen.port);
    match &config.tls {
        Some(tls) => {
            let password = if tls.password.is_some() { "set" } else { "none" };
            println!("tls: cert={} password={password}", tls.cert);
        }
        None => println!("tls: off"),
    }
    if config.verbose {
        println!("timeout: {}", config.timeout);
        println!("peers: {}", config.peers.join(", "));
        println!("build: {}", config.build);
    }
}
