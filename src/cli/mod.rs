//! Command-line interface for nlquery
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - The `detect`, `normalize`, `parse`, `run` and `config` subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::{LogicalDatabase, detect};
use crate::config::{Config, LogLevel, OutputFormat};
use crate::error::Result;
use crate::executor::{CommandKind, Interpreter, RawCommand};
use crate::formatter::Formatter;
use crate::parser;
use crate::sql::normalize;

/// Run generated SQL and MongoDB shell commands against logical databases
#[derive(Parser, Debug)]
#[command(
    name = "nlquery",
    version,
    about = "Interpreter for generated SQL and MongoDB shell commands",
    long_about = "Normalizes generated SQL, parses MongoDB shell syntax, and runs either
against the MySQL schema or MongoDB database bound to a logical database
(Bike Store, AdventureWorks, FIFA)."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Output format (json, json-pretty, table)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for nlquery
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the logical database named in a piece of text
    Detect {
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Print generated SQL after normalization
    Normalize {
        #[arg(value_name = "SQL")]
        sql: String,
    },

    /// Parse a MongoDB shell command and print its structure
    Parse {
        #[arg(value_name = "COMMAND")]
        command: String,
    },

    /// Execute a command and print the result
    Run {
        /// Command language (sql, mongo)
        #[arg(long, value_name = "KIND")]
        kind: CommandKind,

        /// Logical database; detected from the question or command when omitted
        #[arg(short = 'd', long, value_name = "NAME")]
        database: Option<LogicalDatabase>,

        /// The natural-language question the command was generated from
        #[arg(short = 'q', long, value_name = "TEXT")]
        question: Option<String>,

        #[arg(value_name = "COMMAND")]
        command: String,
    },

    /// Show the effective configuration, with credentials masked
    Config,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse process arguments and load configuration
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build from already-parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, &args);
        Ok(Self { args, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply CLI arguments on top of the loaded configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(format_str) = &args.format {
            config.display.format = Self::parse_output_format(format_str);
        }

        if args.no_color {
            config.display.color_output = false;
        }

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else {
            config.logging.level
        };
    }

    /// Parse output format string
    fn parse_output_format(format_str: &str) -> OutputFormat {
        match format_str.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "json-pretty" | "jsonpretty" => OutputFormat::JsonPretty,
            "table" => OutputFormat::Table,
            _ => {
                eprintln!("Warning: Unknown format '{}', using json-pretty", format_str);
                OutputFormat::JsonPretty
            }
        }
    }

    /// Run the selected subcommand
    ///
    /// # Returns
    /// * `Result<bool>` - Whether the command succeeded
    pub async fn run(&self) -> Result<bool> {
        match &self.args.command {
            Commands::Detect { text } => match detect(text) {
                Some(db) => {
                    println!("{db}");
                    Ok(true)
                }
                None => {
                    eprintln!("No logical database found");
                    Ok(false)
                }
            },
            Commands::Normalize { sql } => {
                println!("{}", normalize(sql));
                Ok(true)
            }
            Commands::Parse { command } => {
                let parsed = parser::parse(command)?;
                println!("{parsed:#?}");
                println!("{parsed}");
                Ok(true)
            }
            Commands::Run {
                kind,
                database,
                question,
                command,
            } => {
                let database = Self::resolve_database(*database, question.as_deref());
                let raw = RawCommand {
                    text: command.clone(),
                    kind: *kind,
                };

                let interpreter = Interpreter::from_config(&self.config);
                let result = interpreter.run(&raw, database).await;

                let formatter = Formatter::new(
                    self.config.display.format,
                    self.config.display.color_output,
                );
                println!("{}", formatter.format(&result)?);
                Ok(!result.is_error())
            }
            Commands::Config => {
                println!("{}", Self::render_config(&self.config)?);
                Ok(true)
            }
        }
    }

    /// Configuration as TOML, credentials masked
    fn render_config(config: &Config) -> Result<String> {
        toml::to_string_pretty(&config.redacted())
            .map_err(|e| format!("Cannot render configuration: {e}").into())
    }

    /// Explicit database first, then one named in the question
    fn resolve_database(
        explicit: Option<LogicalDatabase>,
        question: Option<&str>,
    ) -> Option<LogicalDatabase> {
        explicit.or_else(|| question.and_then(detect))
    }
}
