// Sizes and counts are converted for display only
#![allow(
    clippy::cast_possible_truncation,  // counts fit progress bar positions
    clippy::cast_precision_loss,       // f64 sufficient for KB display
    clippy::needless_pass_by_value,    // clap hands over owned values
)]

//! Catastrofe CLI - Split and export Spanish cadastral XML
//!
//! `catastrofe split` cuts one oversized cadastral document into parts below a
//! size ceiling; `catastrofe export` flattens the property records of many
//! documents and archives into a single `;`-separated file.

mod config;
mod progress;

use anyhow::{Context, Result};
use catastrofe_core::{
    export_files, split_file, ExportOutcome, ExportReport, FieldRule, SchemaVersion, SplitReport,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use config::{Config, DEFAULT_CONFIG};
use progress::ConsoleProgress;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status when no XML document was found among the inputs
const EXIT_NO_DOCUMENTS: u8 = 3;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Check if verbose output is requested
    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Default log filter when `RUST_LOG` is unset
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

/// Projection schema selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum SchemaArg {
    /// 19 columns, duplicates dropped by default
    Legacy,
    /// 28 columns, every record kept by default
    Extended,
}

impl From<SchemaArg> for SchemaVersion {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Legacy => Self::Legacy,
            SchemaArg::Extended => Self::Extended,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "catastrofe",
    about = "Split and export Spanish cadastral XML",
    long_about = "Split oversized cadastral XML documents into size-bounded parts and \
                  flatten property records into delimited text.\n\
                  \n\
                  Defaults can be set via .catastrofe.toml configuration files.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a large XML document into smaller parts
    #[command(after_help = "Examples:\n  \
                            catastrofe split girona.xml\n  \
                            catastrofe split girona.xml -o results -s 400")]
    Split {
        /// XML document to split
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long = "output-dir", value_name = "DIR", default_value = "output")]
        output: PathBuf,

        /// Maximum size per part in KB (default: 450, or from config)
        #[arg(short = 's', long, value_name = "KB")]
        max_size: Option<u64>,

        /// Tag-name suffix of record elements (default: DAT, or from config)
        #[arg(long, value_name = "SUFFIX")]
        record_suffix: Option<String>,
    },

    /// Flatten property records of XML documents and archives into CSV
    #[command(after_help = "Examples:\n  \
                            catastrofe export 17_girona.xml\n  \
                            catastrofe export bundle.zip extra.tar.gz -o all.csv --schema extended")]
    Export {
        /// XML documents or archives (.zip, .tar, .tar.gz, .tgz, .tar.bz2, .tbz2)
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Output CSV file
        #[arg(short, long, value_name = "FILE", default_value = "export.csv")]
        output: PathBuf,

        /// Projection schema (default: legacy, or from config)
        #[arg(long, value_enum)]
        schema: Option<SchemaArg>,

        /// Drop records whose cadastral reference was already exported
        #[arg(long, conflicts_with = "no_dedup")]
        dedup: bool,

        /// Keep every record, including repeated references
        #[arg(long)]
        no_dedup: bool,

        /// Field separator (default: ';', or from config)
        #[arg(long, value_name = "CHAR")]
        delimiter: Option<char>,
    },

    /// List the columns of a projection schema
    Fields {
        /// Projection schema
        #[arg(long, value_enum, default_value = "legacy")]
        schema: SchemaArg,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Create a configuration file with commented defaults
    Init {
        /// Write ~/.catastrofe.toml instead of ./.catastrofe.toml
        #[arg(long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print where configuration files are looked up
    Path,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    let env = env_logger::Env::default().default_filter_or(verbosity.log_filter());
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();

    match run(args.command, verbosity) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, verbosity: Verbosity) -> Result<ExitCode> {
    match command {
        Commands::Split {
            input,
            output,
            max_size,
            record_suffix,
        } => {
            let (user_config, project_config) = Config::discover_configs();
            let config = Config::merge(user_config, project_config);
            split_command(&input, &output, &config, max_size, record_suffix, verbosity)
        }
        Commands::Export {
            inputs,
            output,
            schema,
            dedup,
            no_dedup,
            delimiter,
        } => {
            let (user_config, project_config) = Config::discover_configs();
            let config = Config::merge(user_config, project_config);
            let dedup = match (dedup, no_dedup) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let options =
                config
                    .export()
                    .resolve(schema.map(SchemaVersion::from), dedup, delimiter)?;
            export_command(&inputs, &output, &options, verbosity)
        }
        Commands::Fields { schema } => {
            fields_command(schema.into());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => {
            config_command(action, verbosity)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn split_command(
    input: &Path,
    output: &Path,
    config: &Config,
    max_size: Option<u64>,
    record_suffix: Option<String>,
    verbosity: Verbosity,
) -> Result<ExitCode> {
    let options = config.split().resolve(max_size, record_suffix);

    if verbosity.should_show_output() {
        println!();
        println!("{}", "=== Catastrofe XML Splitter ===".cyan().bold());
        println!();
    }

    let mut progress = ConsoleProgress::new(verbosity);
    let result = split_file(input, output, &options, &mut progress);
    progress.finish();
    let report = result.with_context(|| format!("Failed to split {}", input.display()))?;

    if verbosity.should_show_output() {
        print_split_summary(&report, options.max_bytes, output);
    }
    Ok(ExitCode::SUCCESS)
}

/// Colour of a part size relative to the ceiling
fn size_color(bytes: u64, max_bytes: u64) -> colored::Color {
    if bytes <= max_bytes {
        colored::Color::Green
    } else if bytes <= max_bytes.saturating_mul(10) / 9 {
        colored::Color::Yellow
    } else {
        colored::Color::Red
    }
}

fn print_split_summary(report: &SplitReport, max_bytes: u64, output: &Path) {
    println!();
    if report.parts.is_empty() {
        println!(
            "{} No records found in {}",
            "Warning:".yellow().bold(),
            report.input.display()
        );
        return;
    }

    let name_width = report
        .parts
        .iter()
        .filter_map(|p| p.path.file_name())
        .map(|n| n.to_string_lossy().len())
        .max()
        .unwrap_or(0)
        .max("File".len());

    println!("{}", "Generated files".magenta().bold());
    println!(
        "{:<name_width$}  {:>10}  {:>8}",
        "File".bold(),
        "Size".bold(),
        "Records".bold()
    );
    for part in &report.parts {
        let name = part
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = format!("{:.1} KB", part.bytes as f64 / 1024.0);
        println!(
            "{:<name_width$}  {:>10}  {:>8}",
            name.cyan(),
            size.color(size_color(part.bytes, max_bytes)),
            part.records.to_string().yellow()
        );
    }
    println!();
    println!(
        "{} {} parts, {} records, {:.1} KB",
        "Done:".green().bold(),
        report.parts.len(),
        report.total_records(),
        report.total_bytes() as f64 / 1024.0
    );
    println!("{} {}", "Output directory:".green(), output.display());
}

fn export_command(
    inputs: &[PathBuf],
    output: &Path,
    options: &catastrofe_core::ExportOptions,
    verbosity: Verbosity,
) -> Result<ExitCode> {
    let mut progress = ConsoleProgress::new(verbosity);
    let result = export_files(inputs, output, options, &mut progress);
    progress.finish();

    match result.with_context(|| format!("Failed to export to {}", output.display()))? {
        ExportOutcome::Exported(report) => {
            if verbosity.should_show_output() {
                print_export_summary(&report, options.schema);
            }
            Ok(ExitCode::SUCCESS)
        }
        ExportOutcome::NoDocuments => {
            eprintln!(
                "{} No XML documents found among the inputs",
                "Error:".red().bold()
            );
            Ok(ExitCode::from(EXIT_NO_DOCUMENTS))
        }
    }
}

fn print_export_summary(report: &ExportReport, schema: SchemaVersion) {
    println!(
        "{} {} rows from {} documents ({} schema)",
        "Exported:".green().bold(),
        report.rows,
        report.documents,
        schema
    );
    if report.duplicates > 0 {
        println!(
            "{} {} duplicate references dropped",
            "Note:".cyan(),
            report.duplicates
        );
    }
    println!("{} {}", "Output file:".green(), report.output.display());
}

fn fields_command(version: SchemaVersion) {
    let schema = version.schema();
    println!(
        "{} schema, record <{}>, {} columns{}",
        version.to_string().bold(),
        schema.record_tag,
        schema.len(),
        if schema.dedup_by_default {
            ", dedup by default"
        } else {
            ""
        }
    );
    for (i, field) in schema.fields.iter().enumerate() {
        let rule = match field.rule {
            FieldRule::Lookup { scope, tag } => format!("{scope}//{tag}"),
            FieldRule::Concat(parts) => parts.join(" + "),
        };
        println!("{:>3}  {:<6} {}", i + 1, field.name.cyan(), rule);
    }
}

fn config_command(action: ConfigAction, verbosity: Verbosity) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let (user_config, project_config) = Config::discover_configs();
            let merged = Config::merge(user_config, project_config);
            let toml = toml::to_string_pretty(&merged)?;
            println!("{toml}");
            Ok(())
        }
        ConfigAction::Init { global, force } => config_init(global, force, verbosity),
        ConfigAction::Path => {
            let project = Config::project_path();
            println!("project: {} ({})", project.display(), presence(&project));
            match Config::user_path() {
                Some(user) => println!("user:    {} ({})", user.display(), presence(&user)),
                None => println!("user:    (no home directory)"),
            }
            Ok(())
        }
    }
}

fn presence(path: &Path) -> &'static str {
    if path.exists() {
        "found"
    } else {
        "not found"
    }
}

/// Create a new configuration file with commented defaults
fn config_init(global: bool, force: bool, verbosity: Verbosity) -> Result<()> {
    let config_path = if global {
        Config::user_path().context("Could not determine home directory")?
    } else {
        Config::project_path()
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    if verbosity.should_show_output() {
        println!(
            "{} Created configuration file: {}",
            "Success:".green().bold(),
            config_path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::Verbose.log_filter(), "debug");
    }

    #[test]
    fn test_size_color_thresholds() {
        let max = 450 * 1024;
        assert_eq!(size_color(max, max), colored::Color::Green);
        assert_eq!(size_color(500 * 1024, max), colored::Color::Yellow);
        assert_eq!(size_color(501 * 1024, max), colored::Color::Red);
    }
}
