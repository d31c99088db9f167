//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to change the engine's caching or logging defaults.")?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let content = config.to_string_as(args.format)?;
    output.writeln(content.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ConfigFormat, OutputFormat};
    use crate::output::tests::writer;
    use tempfile::TempDir;
    use therian_core::Caching;

    #[test]
    fn test_init_writes_default_config_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("therian").join("config.toml");
        let init = |force: bool| ConfigArgs {
            action: ConfigAction::Init(ConfigInitArgs {
                path: Some(path.clone()),
                force,
            }),
        };

        let (mut output, _) = writer(OutputFormat::Human);
        handle_config(init(false), &Config::default(), &mut output).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        std::fs::write(&path, "[engine]\ncaching = \"none\"\n").unwrap();
        let (mut output, buffer) = writer(OutputFormat::Human);
        handle_config(init(false), &Config::default(), &mut output).unwrap();
        assert!(buffer.contents().contains("already exists"));
        assert_eq!(Config::from_file(&path).unwrap().engine.caching, Caching::None);

        let (mut output, _) = writer(OutputFormat::Human);
        handle_config(init(true), &Config::default(), &mut output).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().engine.caching, Caching::All);
    }

    #[test]
    fn test_show_effective_config() {
        let mut config = Config::default();
        config.engine.caching = Caching::Context;

        let (mut output, buffer) = writer(OutputFormat::Human);
        handle_config(
            ConfigArgs {
                action: ConfigAction::Show(ConfigShowArgs {
                    format: ConfigFormat::Json,
                }),
            },
            &config,
            &mut output,
        )
        .unwrap();
        let shown: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(shown["engine"]["caching"], "context");
        assert_eq!(shown["engine"]["standard_operators"], true);
    }
}
