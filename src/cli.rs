//! Command-line interface definitions and parsing.

use crate::container::{is_container_format, ContainerExtractor};
use crate::error::{Error, Result};
use crate::output::OutputFormat;
use crate::source::Artifact;
use crate::types::{DecoderConfig, DEFAULT_CODEPAGE, DEFAULT_MAX_SHORT_MESSAGE_LENGTH};
use clap::Parser;
use log::LevelFilter;
use std::path::Path;
use std::str::FromStr;

/// Input kinds supported by the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// A single `$I` file or `INFO2` catalog
    Artifact,
    /// Directory tree, e.g. an exported `$Recycle.Bin` folder
    Directory,
    /// ZIP archive collection (.zip)
    ZipContainer,
}

/// recbin - Windows Recycle Bin deletion timeline
/// Author: Albert Hui <albert@securityronin.com>
#[derive(Parser)]
#[command(name = "recbin")]
#[command(about = "recbin - Windows Recycle Bin Deletion Timeline\nAuthor: Albert Hui <albert@securityronin.com>", version)]
#[command(long_about = "Decodes Windows Recycle Bin metadata into deletion events:
• $I files (Windows Vista and later, versions 1 and 2)
• INFO2 catalogs (Windows 95 to XP, narrow and wide records)
• Directory trees such as $Recycle.Bin or RECYCLER exports
• ZIP triage collections, optionally password protected")]
pub struct Args {
    /// Input paths: $I files, INFO2 catalogs, directories or .zip collections
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Filter by original path (supports regex patterns)
    #[arg(long)]
    pub filter: Option<String>,

    /// Show deletions after this date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub after: Option<String>,

    /// Show deletions before this date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub before: Option<String>,

    /// Output file (use "-" for stdout, default: stdout)
    #[arg(long)]
    pub output: Option<String>,

    /// Display timestamps in specified timezone (e.g., "UTC+8", "UTC-5", "UTC", "Europe/London")
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Password for encrypted ZIP archives (for forensic collections)
    #[arg(long)]
    pub password: Option<String>,

    /// Windows code page for INFO2 single-byte paths
    #[arg(long, default_value_t = DEFAULT_CODEPAGE)]
    pub codepage: u16,

    /// Short message width before truncation
    #[arg(long, default_value_t = DEFAULT_MAX_SHORT_MESSAGE_LENGTH)]
    pub max_short_message_length: usize,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Parsed and validated CLI configuration
#[derive(Debug)]
pub struct Config {
    pub inputs: Vec<(String, InputType)>,
    pub format: OutputFormat,
    pub filter_regex: Option<regex::Regex>,
    pub after_date: Option<chrono::DateTime<chrono::Utc>>,
    pub before_date: Option<chrono::DateTime<chrono::Utc>>,
    pub output: Option<String>,
    pub timezone: chrono_tz::Tz,
    pub password: Option<String>,
    pub decoder: DecoderConfig,
    pub log_level: LevelFilter,
}

impl Config {
    /// Parse and validate CLI arguments into a configuration
    pub fn from_args(args: Args) -> Result<Self> {
        if args.inputs.is_empty() {
            return Err(Error::InvalidInput("At least one input path is required".to_string()));
        }

        let inputs = args
            .inputs
            .into_iter()
            .map(|input| {
                let input_type = Self::detect_input_type(&input);
                (input, input_type)
            })
            .collect();

        let timezone = crate::datetime::parse_timezone(&args.timezone)?;

        let filter_regex = if let Some(filter_pattern) = &args.filter {
            log::info!("Compiling regex filter: {}", filter_pattern);
            Some(
                regex::RegexBuilder::new(filter_pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        Error::InvalidInput(format!("Invalid regex pattern '{}': {}", filter_pattern, e))
                    })?,
            )
        } else {
            None
        };

        let after_date = args.after.as_deref().map(crate::datetime::parse_date_filter).transpose()?;
        let before_date = args.before.as_deref().map(crate::datetime::parse_date_filter).transpose()?;
        if let (Some(after), Some(before)) = (after_date, before_date) {
            if after > before {
                return Err(Error::InvalidInput(format!(
                    "--after ({}) is later than --before ({})",
                    after, before
                )));
            }
        }

        let decoder = DecoderConfig {
            max_short_message_length: args.max_short_message_length,
            codepage: args.codepage,
        };
        decoder.validate()?;

        let log_level = LevelFilter::from_str(&args.log_level)
            .map_err(|_| Error::InvalidInput(format!("Invalid log level '{}'", args.log_level)))?;

        Ok(Config {
            inputs,
            format: args.format,
            filter_regex,
            after_date,
            before_date,
            output: args.output,
            timezone,
            password: args.password,
            decoder,
            log_level,
        })
    }

    /// Classify an input path
    fn detect_input_type(input: &str) -> InputType {
        let path = Path::new(input);
        if path.is_dir() {
            InputType::Directory
        } else if is_container_format(path) {
            InputType::ZipContainer
        } else {
            InputType::Artifact
        }
    }

    /// Expand every input into the artifacts it holds
    pub fn collect_artifacts(&self) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for (input, input_type) in &self.inputs {
            let path = Path::new(input);
            match input_type {
                InputType::Artifact => artifacts.push(Artifact::from_path(path)),
                InputType::Directory => {
                    artifacts.extend(ContainerExtractor::collect_from_directory(path)?)
                }
                InputType::ZipContainer => artifacts.extend(ContainerExtractor::extract_from_zip(
                    path,
                    self.password.as_deref(),
                )?),
            }
        }
        Ok(artifacts)
    }
}
