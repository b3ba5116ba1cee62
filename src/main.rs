//! Photo Organizer - sorts photos into a year/month archive
//!
//! A CLI tool that reads the capture time embedded in each photo and copies
//! or moves it into OUTPUT/YYYY/MM/, keeping a JSON record of every photo.

use anyhow::Result;
use clap::Parser;
use photo_organizer::{Cli, Config, Organizer};
use std::path::Path;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colors and layout for the run summary.

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(&format!("{}\n", "─".repeat(60))));
    }

    /// Left padding that centers `title` in the 60 column separator
    pub fn title_padding(title: &str) -> usize {
        let width: usize = 60;
        (width.saturating_sub(title.len()) / 2).saturating_sub(1)
    }

    pub fn print_title(title: &str) {
        let left_pad = " ".repeat(title_padding(title));

        let _ = stdout().execute(Print(&format!(
            "{}{} {}{}\n",
            left_pad,
            "╔".bold(),
            title.bold(),
            "╗".bold(),
        )));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_key_value(key: &str, value: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_stat(key: &str, value: usize, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value.to_string()).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.init_config {
        std::fs::write(path, Config::sample_config())?;
        cli_output::print_hint(&format!("Sample configuration written to {}", path.display()));
        return Ok(());
    }

    let _guard = setup_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Photo Organizer starting");

    let config = load_config(&cli)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    validate_config(&config)?;

    let output_dir = config.output_dir.clone();
    let database = (!config.no_database).then(|| config.get_database());

    let result = Organizer::new(config).and_then(|mut organizer| {
        organizer.run()?;
        Ok(organizer)
    });

    match result {
        Ok(organizer) => {
            use cli_output::*;

            let stats = organizer.stats();

            print_separator();
            print_title("Processing complete");
            print_separator();

            print_blank();
            print_stat("Processed", stats.processed, CliTheme::ACCENT);
            print_stat("Sorted", stats.sorted, CliTheme::SUCCESS);
            print_stat("Unknown", stats.unknown, CliTheme::WARNING);
            print_stat("Untouched", stats.untouched, CliTheme::WARNING);
            print_stat("Failed", stats.failed, CliTheme::ERROR);
            print_blank();

            print_key_value("Output", &output_dir.display().to_string());
            if let Some(database) = database {
                print_key_value("Record store", &database.display().to_string());
            }
            if let Some(ref log_file) = cli.log_file {
                print_key_value("Log file", &log_file.display().to_string());
            }

            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Processing failed");
            cli_output::print_error(&format!("Error: {}", e));
            std::process::exit(1);
        }
    }
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    if config.input_dir.as_os_str().is_empty() {
        anyhow::bail!("No input directory given, use --input or set input_dir in the config file");
    }

    Ok(config)
}

/// Setup logging: console on stderr, plus an optional log file
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (file_layer, guard) = match cli.log_file {
        Some(ref log_path) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(open_log_file(log_path)?);
            let layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if cli.json_log {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}

fn open_log_file(log_path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    Ok(std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?)
}

/// Validate configuration before processing
fn validate_config(config: &Config) -> Result<()> {
    if !config.input_dir.is_dir() {
        anyhow::bail!(
            "Input directory {} does not exist",
            config.input_dir.display()
        );
    }

    if config.output_dir.starts_with(&config.input_dir) {
        anyhow::bail!(
            "Output directory {} is inside the input directory {}",
            config.output_dir.display(),
            config.input_dir.display()
        );
    }

    Ok(())
}
