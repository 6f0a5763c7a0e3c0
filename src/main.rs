//! rollcast - converts piano-roll hole reports and MIDI files into the data
//! files a roll viewer loads.
//!
//! # Usage
//!
//! ```bash
//! rollcast                          # every id listed under input/druids
//! rollcast ab123cd4567 ef890gh1234  # just these rolls
//! rollcast -c input/druids/welte.csv --tempo-maps
//! ```
//!
//! Set `RUST_LOG` to adjust logging (defaults to `info`).

use anyhow::{Context, Result};
use clap::Parser;
use rollcast::{ids, run_batch, Config, FsRollSource, OutputDir};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line options.
#[derive(Parser, Debug)]
#[command(name = "rollcast", version, about = "Build roll viewer data from hole reports and MIDI")]
struct Cli {
    /// Roll ids to process. Overrides any id list file.
    ids: Vec<String>,

    /// Text file with one roll id per line
    #[arg(short = 'f', long)]
    ids_txt_file: Option<PathBuf>,

    /// CSV file with a Druid column
    #[arg(short = 'c', long)]
    ids_csv_file: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Don't write catalog.json
    #[arg(long)]
    no_catalog: bool,

    /// Add tempo maps from the note MIDI to roll documents
    #[arg(long)]
    tempo_maps: bool,

    #[arg(long)]
    analysis_dir: Option<PathBuf>,

    #[arg(long)]
    midi_dir: Option<PathBuf>,

    #[arg(long)]
    metadata_dir: Option<PathBuf>,

    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file, if any, and applies command-line overrides.
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        if self.no_catalog {
            config.write_catalog = false;
        }
        if self.tempo_maps {
            config.write_tempo_maps = true;
        }
        if let Some(dir) = &self.analysis_dir {
            config.analysis_dir = dir.clone();
        }
        if let Some(dir) = &self.midi_dir {
            config.midi_dir = dir.clone();
        }
        if let Some(dir) = &self.metadata_dir {
            config.metadata_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }

    /// Roll ids from the command line, an explicit list file, or every list
    /// in the configured ids folder, in that order of preference.
    fn roll_ids(&self, config: &Config) -> Result<Vec<String>> {
        if !self.ids.is_empty() {
            return Ok(self.ids.clone());
        }
        ids::select_ids(
            self.ids_csv_file.as_deref(),
            self.ids_txt_file.as_deref(),
            &config.ids_dir,
        )
        .context("Failed to read id list")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config()?;
    let roll_ids = cli.roll_ids(&config)?;
    if roll_ids.is_empty() {
        warn!("No roll ids to process");
        return Ok(());
    }

    let source = FsRollSource::from_config(&config);
    let output = OutputDir::new(config.output_dir.clone());
    info!("Processing {} rolls into {}", roll_ids.len(), output.root().display());

    let summary = run_batch(&roll_ids, &source, &config, &output)
        .context("Failed to write the catalog")?;

    info!(
        "Done: {} processed, {} skipped, {} failed",
        summary.processed, summary.skipped, summary.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_tempo_map_help_names_the_note_midi() {
        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "tempo_maps")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert!(help.contains("note MIDI"));
    }

    #[test]
    fn test_flags_override_config() {
        let cli =
            Cli::parse_from(["rollcast", "--no-catalog", "--tempo-maps", "--output-dir", "out"]);
        let config = cli.config().unwrap();
        assert!(!config.write_catalog);
        assert!(config.write_tempo_maps);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_csv_list_is_preferred_to_txt_list() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("rolls.csv");
        let txt = dir.path().join("rolls.txt");
        std::fs::write(&csv, "Druid\ncsv1\n").unwrap();
        std::fs::write(&txt, "txt1\n").unwrap();
        let cli = Cli::parse_from([
            OsStr::new("rollcast"),
            OsStr::new("-f"),
            txt.as_os_str(),
            OsStr::new("-c"),
            csv.as_os_str(),
        ]);
        let ids = cli.roll_ids(&Config::default()).unwrap();
        assert_eq!(ids, vec!["csv1"]);

        let cli = Cli::parse_from(["rollcast", "ab123cd4567"]);
        assert_eq!(cli.roll_ids(&Config::default()).unwrap(), vec!["ab123cd4567"]);
    }
}
