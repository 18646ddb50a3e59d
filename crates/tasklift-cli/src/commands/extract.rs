//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::{Config, ModelSettings};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tasklift_domain::InputType;
use tasklift_extractor::{Extractor, RunRequest};
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let request = build_request(&args, &config.settings.timezone)?;
    let model = model_settings(&args, config).build()?;

    let mut extractor_config = config.extractor.clone();
    if args.no_minutes {
        extractor_config.extract_meeting_minutes = false;
    }

    let extractor = Extractor::new(model, extractor_config)?;
    info!(input_type = %request.input_type, timezone = %request.timezone, "Starting extraction");
    let output = extractor.run(request).await?;

    println!("{}", formatter.format_run(&output)?);
    Ok(())
}

/// Apply command-line overrides to the configured model settings.
fn model_settings(args: &ExtractArgs, config: &Config) -> ModelSettings {
    let mut settings = config.model.clone();
    if let Some(provider) = args.provider {
        settings.provider = provider.into();
    }
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = Some(endpoint.clone());
    }
    settings
}

/// Turn the input arguments into a run request.
fn build_request(args: &ExtractArgs, default_timezone: &str) -> Result<RunRequest> {
    let reference_time = parse_reference_time(args.reference_time.as_deref())?;
    let timezone = args.timezone.as_deref().unwrap_or(default_timezone);
    let requested_type = args.input_type.map(InputType::from);

    let request = if let Some(path) = &args.file {
        let input_type = match requested_type {
            Some(input_type) => input_type,
            None => detect_type(path)?,
        };
        let request = if input_type == InputType::Text {
            RunRequest::text(fs::read_to_string(path)?, reference_time, timezone)
        } else {
            RunRequest::document(input_type, fs::read(path)?, reference_time, timezone)
        };
        match path.file_name() {
            Some(name) => request.with_source_name(name.to_string_lossy()),
            None => request,
        }
    } else {
        if matches!(requested_type, Some(t) if t != InputType::Text) {
            return Err(CliError::InvalidInput(
                "--type other than text requires an input file".to_string(),
            ));
        }
        let text = if let Some(text) = &args.text {
            text.clone()
        } else if args.stdin {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            return Err(CliError::InvalidInput(
                "Must specify a file, --text or --stdin".to_string(),
            ));
        };
        RunRequest::text(text, reference_time, timezone)
    };

    Ok(match &args.run_id {
        Some(run_id) => request.with_run_id(run_id.clone()),
        None => request,
    })
}

fn detect_type(path: &Path) -> Result<InputType> {
    path.extension()
        .and_then(|ext| InputType::from_extension(&ext.to_string_lossy()))
        .ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Cannot determine the input type of '{}'; use --type",
                path.display()
            ))
        })
}

fn parse_reference_time(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                CliError::InvalidInput(format!("Invalid reference time '{}': {}", raw, e))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command, ProviderArg};
    use crate::config::Provider;
    use clap::Parser;

    fn extract_args(argv: &[&str]) -> ExtractArgs {
        let mut full = vec!["tasklift", "extract"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Extract(args) => args,
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_text_request() {
        let args = extract_args(&[
            "--text",
            "Alex to send the deck by Friday",
            "--reference-time",
            "2024-01-01T09:00:00Z",
            "--timezone",
            "America/New_York",
            "--run-id",
            "run-7",
        ]);
        let request = build_request(&args, "UTC").unwrap();
        assert_eq!(request.input_type, InputType::Text);
        assert_eq!(request.text.as_deref(), Some("Alex to send the deck by Friday"));
        assert_eq!(request.timezone, "America/New_York");
        assert_eq!(request.reference_time.to_rfc3339(), "2024-01-01T09:00:00+00:00");
        assert_eq!(request.run_id.as_deref(), Some("run-7"));
    }

    #[test]
    fn test_file_type_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "# Sync\nBo to fix login").unwrap();

        let args = extract_args(&[path.to_str().unwrap()]);
        let request = build_request(&args, "Europe/Berlin").unwrap();
        assert_eq!(request.input_type, InputType::Text);
        assert_eq!(request.text.as_deref(), Some("# Sync\nBo to fix login"));
        assert_eq!(request.timezone, "Europe/Berlin");
        assert_eq!(request.source_name.as_deref(), Some("notes.md"));
    }

    #[test]
    fn test_binary_file_with_type_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.bin");
        fs::write(&path, b"From: a@example.com\r\n\r\nhi").unwrap();

        let args = extract_args(&[path.to_str().unwrap(), "--type", "eml"]);
        let request = build_request(&args, "UTC").unwrap();
        assert_eq!(request.input_type, InputType::Eml);
        assert!(request.text.is_none());
        assert!(request.bytes.is_some());
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.bin");
        fs::write(&path, b"data").unwrap();

        let args = extract_args(&[path.to_str().unwrap()]);
        assert!(matches!(build_request(&args, "UTC"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_input() {
        let args = extract_args(&[]);
        assert!(matches!(build_request(&args, "UTC"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_reference_time() {
        let args = extract_args(&["--text", "hi", "--reference-time", "yesterday"]);
        assert!(matches!(build_request(&args, "UTC"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_model_overrides() {
        let args = extract_args(&[
            "--text",
            "hi",
            "--provider",
            "openai",
            "--model",
            "gpt-4o-mini",
            "--endpoint",
            "http://localhost:8000/v1",
        ]);
        assert!(matches!(args.provider, Some(ProviderArg::Openai)));
        let settings = model_settings(&args, &Config::default());
        assert_eq!(settings.provider, Provider::OpenAi);
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.endpoint.as_deref(), Some("http://localhost:8000/v1"));
    }
}
