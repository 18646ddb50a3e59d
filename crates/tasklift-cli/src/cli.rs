//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tasklift_domain::InputType;

/// Tasklift - Turn meeting notes, documents and email threads into action items.
#[derive(Debug, Parser)]
#[command(name = "tasklift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TASKLIFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (task titles only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract action items from a file or text
    Extract(ExtractArgs),

    /// Show the reconstructed thread of an email file
    Thread(ThreadArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Input file (txt, md, pdf, docx, eml)
    pub file: Option<PathBuf>,

    /// Extract from this text instead of a file
    #[arg(short, long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read text from stdin
    #[arg(long, conflicts_with_all = ["file", "text"])]
    pub stdin: bool,

    /// Input type, overriding the file extension
    #[arg(long = "type", value_enum)]
    pub input_type: Option<InputTypeArg>,

    /// Reference time for relative dates (RFC 3339, default: now)
    #[arg(short, long)]
    pub reference_time: Option<String>,

    /// IANA timezone for relative dates
    #[arg(long, env = "TASKLIFT_TIMEZONE")]
    pub timezone: Option<String>,

    /// Run id stamped on every task (default: generated)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Skip meeting minutes extraction
    #[arg(long)]
    pub no_minutes: bool,

    /// Model provider, overriding the config file
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name, overriding the config file
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model endpoint, overriding the config file
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Arguments for the thread command.
#[derive(Debug, Parser)]
pub struct ThreadArgs {
    /// Email file (.eml)
    pub file: PathBuf,

    /// Maximum nesting depth of attached messages
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Arguments for config management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

/// Input type argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum InputTypeArg {
    /// Plain text or markdown
    Text,
    /// PDF document
    Pdf,
    /// Word document
    Docx,
    /// Email message
    Eml,
}

/// Model provider argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProviderArg {
    /// Local Ollama server
    Ollama,
    /// OpenAI or a compatible server
    Openai,
    /// Azure OpenAI deployment
    Azure,
    /// Azure, then OpenAI, then Ollama, depending on what is configured
    Auto,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<InputTypeArg> for InputType {
    fn from(input_type: InputTypeArg) -> Self {
        match input_type {
            InputTypeArg::Text => InputType::Text,
            InputTypeArg::Pdf => InputType::Pdf,
            InputTypeArg::Docx => InputType::Docx,
            InputTypeArg::Eml => InputType::Eml,
        }
    }
}

impl From<ProviderArg> for crate::config::Provider {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Ollama => crate::config::Provider::Ollama,
            ProviderArg::Openai => crate::config::Provider::OpenAi,
            ProviderArg::Azure => crate::config::Provider::Azure,
            ProviderArg::Auto => crate::config::Provider::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_file() {
        let cli = Cli::parse_from([
            "tasklift",
            "extract",
            "notes.md",
            "--timezone",
            "Europe/Berlin",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.file, Some(PathBuf::from("notes.md")));
                assert_eq!(args.timezone.as_deref(), Some("Europe/Berlin"));
                assert!(!args.no_minutes);
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_text_conflicts_with_file() {
        let result = Cli::try_parse_from(["tasklift", "extract", "notes.md", "--text", "hi"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "tasklift",
            "thread",
            "chain.eml",
            "--format",
            "json",
            "--no-color",
        ]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::Thread(_)));
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["tasklift", "config", "init", "--force"]);
        match cli.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { force },
            }) => assert!(force),
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_type_conversion() {
        let input_type: InputType = InputTypeArg::Docx.into();
        assert_eq!(input_type, InputType::Docx);
        let cli = Cli::parse_from(["tasklift", "extract", "scan.bin", "--type", "pdf"]);
        match cli.command {
            Command::Extract(args) => assert!(matches!(args.input_type, Some(InputTypeArg::Pdf))),
            _ => panic!("Expected Extract command"),
        }
    }
}
