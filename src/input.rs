//! Provides a means to read, parse and hold configuration options for a run.
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_derive::Deserialize;

use crate::output::OutputOptions;

const CONFIG_FILE_NAME: &str = ".nmap2csv.toml";

/// Parses a CSV delimiter: a single ASCII character, or `tab`.
pub fn parse_delimiter(input: &str) -> Result<u8, String> {
    match input {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }

    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(c as u8),
        (Some(_), None) => Err(format!("Delimiter '{input}' cannot be used in CSV output")),
        _ => Err(format!(
            "Invalid delimiter '{input}'. Expected a single ASCII character, e.g. ';' or ','"
        )),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nmap2csv",
    version = env!("CARGO_PKG_VERSION"),
    max_term_width = 120,
    help_template = "{bin} {version}\n{about}\n\nUSAGE:\n    {usage}\n\nOPTIONS:\n{options}",
)]
#[allow(clippy::struct_excessive_bools)]
/// Convert Nmap XML reports into hosts.csv and services.csv.
/// Duplicate hosts and services across reports are written once; the first
/// report in path order wins.
pub struct Opts {
    /// Nmap XML files, or directories holding them.
    #[arg(short, long = "file", value_name = "PATH", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Directory for the output CSV files (default is the current directory).
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Field delimiter of the CSV files.
    #[arg(short, long, value_parser = parse_delimiter, default_value = ";")]
    pub delimiter: u8,

    /// Separator between vulnerability links inside their field (default is a newline).
    #[arg(long, default_value = "\n", hide_default_value = true)]
    pub link_separator: String,

    /// Leave the cpe column out of services.csv.
    #[arg(long)]
    pub no_cpe: bool,

    /// Descend into subdirectories when a directory is given.
    #[arg(short, long)]
    pub recursive: bool,

    /// Abort on the first report that cannot be parsed instead of skipping it.
    #[arg(long)]
    pub fail_fast: bool,

    /// Only print errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Accessible mode. Turns off features which negatively affect screen readers.
    #[arg(long)]
    pub accessible: bool,

    /// Whether to ignore the configuration file or not.
    #[arg(short, long)]
    pub no_config: bool,

    /// Custom path to config file
    #[arg(short, long, value_parser)]
    pub config_path: Option<PathBuf>,
}

#[cfg(not(tarpaulin_include))]
impl Opts {
    /// Parses the command line.
    pub fn read() -> Self {
        Self::parse()
    }

    /// Merges values found within the user configuration file into the
    /// command line options.
    pub fn merge(&mut self, config: &Config) {
        if !self.no_config {
            self.merge_required(config);
            self.merge_optional(config);
        }
    }

    fn merge_required(&mut self, config: &Config) {
        macro_rules! merge_required {
            ($($field: ident),+) => {
                $(
                    if let Some(e) = &config.$field {
                        self.$field = e.clone();
                    }
                )+
            }
        }

        macro_rules! merge_flags {
            ($($field: ident),+) => {
                $(
                    if config.$field == Some(true) {
                        self.$field = true;
                    }
                )+
            }
        }

        if let Some(delimiter) = config.delimiter {
            match u8::try_from(delimiter) {
                Ok(byte) if parse_delimiter(&delimiter.to_string()).is_ok() => self.delimiter = byte,
                _ => log::warn!("Ignoring configured delimiter {delimiter:?}"),
            }
        }

        merge_required!(link_separator);
        merge_flags!(no_cpe, recursive, fail_fast, quiet, accessible);
    }

    fn merge_optional(&mut self, config: &Config) {
        macro_rules! merge_optional {
            ($($field: ident),+) => {
                $(
                    if self.$field.is_none() && config.$field.is_some() {
                        self.$field = config.$field.clone();
                    }
                )+
            }
        }

        merge_optional!(output);
    }

    /// Directory the CSV files are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Rendering options for the CSV writer.
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            delimiter: self.delimiter,
            link_separator: self.link_separator.clone(),
            include_cpe: !self.no_cpe,
        }
    }
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            files: vec![],
            output: None,
            delimiter: b';',
            link_separator: "\n".to_owned(),
            no_cpe: false,
            recursive: false,
            fail_fast: false,
            quiet: true,
            accessible: false,
            no_config: true,
            config_path: None,
        }
    }
}

/// Struct used to deserialize the options specified within our config file.
/// These will be further merged with our command line arguments in order to
/// generate the final Opts struct.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    output: Option<PathBuf>,
    delimiter: Option<char>,
    link_separator: Option<String>,
    no_cpe: Option<bool>,
    recursive: Option<bool>,
    fail_fast: Option<bool>,
    quiet: Option<bool>,
    accessible: Option<bool>,
}

impl Config {
    /// Reads the configuration file with TOML format and parses it into a
    /// Config struct. A missing file is an empty configuration.
    ///
    /// # Format
    ///
    /// output = "reports/csv"
    /// delimiter = ","
    /// link_separator = " | "
    /// no_cpe = false
    /// recursive = true
    /// accessible = false
    ///
    pub fn read(custom_config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = custom_config_path.unwrap_or_else(default_config_path);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Could not read {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Found an error in configuration file {}", config_path.display()))
    }
}

/// Constructs default path to config toml
pub fn default_config_path() -> PathBuf {
    let mut config_path = dirs::home_dir().unwrap_or_default();
    config_path.push(CONFIG_FILE_NAME);
    config_path
}
