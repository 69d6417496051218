//! Command dispatch: a root command plus named sub-commands, each owning its
//! own configuration type.
//!
//! The first argument selects the command unless it is a flag (or empty), in
//! which case every argument goes to the root. The selected command's config
//! is loaded with [`resolve`](crate::resolve()) and handed to its run closure.
//!
//! ```ignore
//! let mut app = App::new(
//!     Command::new("server", "Runs the server", ServerConfig::default())
//!         .defaults(ServerConfig::defaults())
//!         .run(|config| serve(config)),
//!     std::env::args().skip(1),
//! )
//! .add_command(Command::new("version", "Print version", Version::default()));
//! app.run()?;
//! ```

use std::any::Any;
use std::fmt;
use std::io::{self, Write};

use crate::args::split_args;
use crate::error::FlagError;
use crate::field::Configuration;
use crate::help::{self, Listing};
use crate::normalize::without_optionals;
use crate::parse::{Parser, Registry};
use crate::resolve::{Loaded, resolve};
use crate::schema::Schema;
use crate::snapshot::Snapshot;

type RunFn<C> = Box<dyn FnMut(&C) -> Result<(), String>>;

/// One command: a name, a description and the configuration it fills.
pub struct Command<C: Configuration> {
    name: String,
    description: String,
    config: C,
    defaults: Option<C>,
    hidden: bool,
    run: Option<RunFn<C>>,
}

impl<C: Configuration> Command<C> {
    /// Without [`defaults`](Self::defaults), `config` doubles as the template
    /// and the live value starts from it with optional fields cleared.
    pub fn new(name: impl Into<String>, description: impl Into<String>, config: C) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            config,
            defaults: None,
            hidden: false,
            run: None,
        }
    }

    /// Use a separate defaults template. `config` is then the fill target as is.
    pub fn defaults(mut self, template: C) -> Self {
        self.defaults = Some(template);
        self
    }

    /// Leave this command out of help listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn run<F, E>(mut self, mut f: F) -> Self
    where
        F: FnMut(&C) -> Result<(), E> + 'static,
        E: fmt::Display,
    {
        self.run = Some(Box::new(move |config| f(config).map_err(|e| e.to_string())));
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

/// Object-safe view of a [`Command`] of any configuration type.
trait Dispatch {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn is_hidden(&self) -> bool;
    fn load(&mut self, args: &[String], registry: &Registry) -> Result<Loaded, FlagError>;
    fn help(&self, registry: &Registry, subcommands: &[Listing]) -> Result<String, FlagError>;
    fn execute(&mut self) -> Result<(), FlagError>;
    fn as_any(&self) -> &dyn Any;
}

impl<C: Configuration> Dispatch for Command<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn load(&mut self, args: &[String], registry: &Registry) -> Result<Loaded, FlagError> {
        match &self.defaults {
            Some(defaults) => resolve(&mut self.config, defaults, args, registry),
            None => {
                let mut target = without_optionals(&self.config)?;
                let loaded = resolve(&mut target, &self.config, args, registry)?;
                self.config = target;
                Ok(loaded)
            }
        }
    }

    fn help(&self, registry: &Registry, subcommands: &[Listing]) -> Result<String, FlagError> {
        let schema = Schema::of::<C>()?;
        let template = self.defaults.as_ref().unwrap_or(&self.config);
        let snapshot = Snapshot::build(&schema, template)?;
        Ok(help::render(
            &self.name,
            &self.description,
            &schema,
            &snapshot,
            registry,
            subcommands,
        ))
    }

    fn execute(&mut self) -> Result<(), FlagError> {
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        run(&self.config).map_err(|reason| FlagError::Run {
            name: self.name.clone(),
            reason,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A root command, its sub-commands and the arguments to dispatch.
pub struct App {
    commands: Vec<Box<dyn Dispatch>>,
    registry: Registry,
    args: Vec<String>,
}

impl App {
    pub fn new<C, I, S>(root: Command<C>, args: I) -> Self
    where
        C: Configuration,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: vec![Box::new(root)],
            registry: Registry::default(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_command<C: Configuration>(mut self, command: Command<C>) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    /// Register a parser for fields of type `T` in every command.
    pub fn add_parser<T: 'static>(mut self, parser: impl Parser + 'static) -> Self {
        self.registry.register::<T>(parser);
        self
    }

    /// The command selected by the arguments; `""` is the root.
    pub fn command_name(&self) -> String {
        split_args(&self.args).0
    }

    /// Load the selected command's configuration without running it.
    /// Returns the command's name.
    pub fn parse(&mut self) -> Result<String, FlagError> {
        let (name, args) = split_args(&self.args);
        let index = self.find(&name)?;
        let command = &mut self.commands[index];
        command.load(&args, &self.registry)?.into_result()?;
        Ok(command.name().to_string())
    }

    /// A command's configuration, as last loaded. `""` names the root.
    pub fn config<C: Configuration>(&self, name: &str) -> Option<&C> {
        let index = self.find(name).ok()?;
        self.commands[index]
            .as_any()
            .downcast_ref::<Command<C>>()
            .map(Command::config)
    }

    /// Dispatch and run, printing help and errors to stdout.
    pub fn run(&mut self) -> Result<(), FlagError> {
        self.run_to(&mut io::stdout())
    }

    pub fn run_to(&mut self, out: &mut impl Write) -> Result<(), FlagError> {
        let (name, args) = split_args(&self.args);
        let index = self.find(&name)?;
        log::debug!("dispatching to {:?}", self.commands[index].name());

        let loaded = self.commands[index].load(&args, &self.registry)?;
        match loaded.error {
            None => self.commands[index].execute(),
            Some(FlagError::HelpRequested) if self.commands[index].is_hidden() => {
                Err(FlagError::CommandNotFound {
                    name: self.commands[index].name().to_string(),
                })
            }
            Some(FlagError::HelpRequested) => {
                write!(out, "{}", self.help_for(index)?)?;
                Err(FlagError::HelpRequested)
            }
            Some(error) => {
                writeln!(out, "Error: {error}\n")?;
                write!(out, "{}", self.help_for(index)?)?;
                Err(error)
            }
        }
    }

    fn help_for(&self, index: usize) -> Result<String, FlagError> {
        let listings: Vec<Listing> = if index == 0 {
            self.commands[1..]
                .iter()
                .filter(|c| !c.is_hidden())
                .map(|c| Listing {
                    name: c.name().to_string(),
                    description: c.description().to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };
        self.commands[index].help(&self.registry, &listings)
    }

    fn find(&self, name: &str) -> Result<usize, FlagError> {
        if name.is_empty() {
            return Ok(0);
        }
        self.commands
            .iter()
            .skip(1)
            .position(|c| c.name() == name)
            .map(|i| i + 1)
            .ok_or_else(|| FlagError::CommandNotFound {
                name: name.to_string(),
            })
    }
}
