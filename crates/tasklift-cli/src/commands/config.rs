//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// Loads the file itself so `init` works before any file exists.
pub fn execute_config(
    args: ConfigArgs,
    explicit: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::path()?,
    };

    match args.action {
        ConfigAction::Show => {
            let config = Config::load(explicit)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init { force } => {
            init_config(&path, force)?;
            println!("{}", formatter.success(&format!("Wrote {}", path.display())));
        }
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists; use --force to overwrite",
            path.display()
        )));
    }
    Config::default().save_to(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        init_config(&path, false).unwrap();
        assert!(Config::load(Some(&path)).is_ok());

        assert!(matches!(init_config(&path, false), Err(CliError::InvalidInput(_))));
        assert!(init_config(&path, true).is_ok());
    }
}
