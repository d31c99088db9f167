//! Command-line interface argument parsing and definitions
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Therian CLI - inspect the operator registry and run transformations
///
/// Values are given as JSON; types use the engine's notation, for example
/// `int`, `Integer[]`, `List<String>` or `Map<String, ?>`.
#[derive(Parser, Debug)]
#[command(
    name = "therian",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "THERIAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Override the configured caching level
    #[arg(long, value_enum, global = true)]
    pub caching: Option<CachingArg>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered operators in dispatch order
    Operators(OperatorsArgs),

    /// Convert a JSON value to a target type
    Convert(ConvertArgs),

    /// Report the size of a JSON value
    Size(SizeArgs),

    /// Report the element type of a type
    ElementType(ElementTypeArgs),

    /// Report whether a JSON value is immutable
    Immutable(ImmutableArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the operators command
#[derive(Parser, Debug)]
pub struct OperatorsArgs {
    /// Only list operators for this operation kind
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,
}

/// Arguments for the convert command
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Source value as JSON
    #[arg(value_name = "JSON")]
    pub value: String,

    /// Target type
    #[arg(short, long, value_name = "TYPE")]
    pub to: String,

    /// Declared source type (defaults to the value's runtime type)
    #[arg(long, value_name = "TYPE")]
    pub from: Option<String>,
}

/// Arguments for the size command
#[derive(Parser, Debug)]
pub struct SizeArgs {
    /// Value as JSON
    #[arg(value_name = "JSON")]
    pub value: String,

    /// Declared type (defaults to the value's runtime type)
    #[arg(short, long = "type", value_name = "TYPE")]
    pub ty: Option<String>,
}

/// Arguments for the element-type command
#[derive(Parser, Debug)]
pub struct ElementTypeArgs {
    /// Container type
    #[arg(value_name = "TYPE")]
    pub ty: String,
}

/// Arguments for the immutable command
#[derive(Parser, Debug)]
pub struct ImmutableArgs {
    /// Value as JSON
    #[arg(value_name = "JSON")]
    pub value: String,

    /// Declared type (defaults to the value's runtime type)
    #[arg(short, long = "type", value_name = "TYPE")]
    pub ty: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config location)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Caching levels accepted on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CachingArg {
    None,
    Context,
    Engine,
    All,
}

/// Operation kinds accepted on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Convert,
    Copy,
    Add,
    AddAll,
    Size,
    GetElementType,
    ImmutableCheck,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<CachingArg> for therian_core::Caching {
    fn from(caching: CachingArg) -> Self {
        match caching {
            CachingArg::None => therian_core::Caching::None,
            CachingArg::Context => therian_core::Caching::Context,
            CachingArg::Engine => therian_core::Caching::Engine,
            CachingArg::All => therian_core::Caching::All,
        }
    }
}

impl From<KindArg> for therian_core::OperationKind {
    fn from(kind: KindArg) -> Self {
        use therian_core::OperationKind;
        match kind {
            KindArg::Convert => OperationKind::Convert,
            KindArg::Copy => OperationKind::Copy,
            KindArg::Add => OperationKind::Add,
            KindArg::AddAll => OperationKind::AddAll,
            KindArg::Size => OperationKind::Size,
            KindArg::GetElementType => OperationKind::GetElementType,
            KindArg::ImmutableCheck => OperationKind::ImmutableCheck,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["therian", "-vv", "element-type", "int[]"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["therian", "--quiet", "element-type", "int[]"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_convert_arguments() {
        let cli = Cli::parse_from([
            "therian",
            "convert",
            "\"42\"",
            "--to",
            "int",
            "--caching",
            "none",
            "-o",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.caching, Some(CachingArg::None));
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.value, "\"42\"");
                assert_eq!(args.to, "int");
                assert!(args.from.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_operators_kind_filter() {
        let cli = Cli::parse_from(["therian", "operators", "--kind", "add-all"]);
        match cli.command {
            Commands::Operators(args) => assert_eq!(args.kind, Some(KindArg::AddAll)),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(
            therian_core::OperationKind::from(KindArg::AddAll),
            therian_core::OperationKind::AddAll
        );
    }
}
