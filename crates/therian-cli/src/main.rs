//! Therian CLI - command-line front end for the transformation engine
//!
//! Lists the operator registry and runs conversions and container
//! operations on JSON values.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;

fn main() {
    let cli = Cli::parse_args();

    let result = Config::load_with_file(cli.config.as_deref()).and_then(|config| {
        control::set_override(cli.use_color() && config.output.color);

        if let Err(e) = init_logging(&cli, &config) {
            eprintln!("Failed to initialize logging: {}", e);
        }

        run(cli, config)
    });

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!(
                "{}",
                error::format_error(&e, control::SHOULD_COLORIZE.should_colorize())
            );

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
fn run(cli: Cli, mut config: Config) -> Result<()> {
    if let Some(caching) = cli.caching {
        config.engine.caching = caching.into();
    }

    let mut output = OutputWriter::new(
        cli.output,
        control::SHOULD_COLORIZE.should_colorize(),
        cli.quiet,
    );

    let command = format!("{:?}", cli.command);
    tracing::info!(
        command = %command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );
    let timer = Timer::new(&command);

    let result = match cli.command {
        Commands::Operators(args) => {
            let engine = handlers::build_engine(&config)?;
            handlers::handle_operators(args, &engine, &mut output)
        }
        Commands::Convert(args) => {
            let engine = handlers::build_engine(&config)?;
            handlers::handle_convert(args, &engine, &mut output)
        }
        Commands::Size(args) => {
            let engine = handlers::build_engine(&config)?;
            handlers::handle_size(args, &engine, &mut output)
        }
        Commands::ElementType(args) => {
            let engine = handlers::build_engine(&config)?;
            handlers::handle_element_type(args, &engine, &mut output)
        }
        Commands::Immutable(args) => {
            let engine = handlers::build_engine(&config)?;
            handlers::handle_immutable(args, &engine, &mut output)
        }
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args, &mut std::io::stdout()),
    };

    timer.finish();
    result
}

/// Initialize logging from verbosity flags, the config file and environment
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.apply_file_settings(&config.logging, cli.verbosity_level());
    logging_config.merge_with_env(|key| std::env::var(key).ok());

    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}
