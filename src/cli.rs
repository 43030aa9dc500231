//! Defines command-line interface options using `clap` for lvis2nc.

use crate::convert::{parse_mode, ConvertConfig, DEFAULT_EXTENSION};
use crate::netcdf_io::{WriteOptions, DEFAULT_COMPRESSION_LEVEL};
use crate::parallel::ParallelConfig;
use crate::sync::SyncOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Convert IceBridge LVIS Level-2 text files into netCDF-4/HDF5 documents
#[derive(Parser, Debug)]
#[command(
    version,
    name = "lvis2nc",
    about = "Convert IceBridge LVIS Level-2 elevation files to netCDF-4/HDF5"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert local Level-2 .TXT files
    Convert(ConvertArgs),
    /// Mirror and convert a Level-2 archive
    Sync(SyncArgs),
    /// Describe a converted document
    Inspect(InspectArgs),
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Convert(args) => args.output.verbose,
            Command::Sync(args) => args.output.verbose,
            Command::Inspect(_) => false,
        }
    }

    /// Log level for the `tracing` filter
    pub fn log_level(&self) -> &'static str {
        if self.verbose() {
            "debug"
        } else {
            "info"
        }
    }
}

/// Options shared by every command that writes documents
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Enable verbose output.
    #[arg(short = 'V', long, default_value_t = false)]
    pub verbose: bool,

    /// Permission mode of output files, in octal
    #[arg(short = 'M', long, value_parser = parse_mode_arg, default_value = "775")]
    pub mode: u32,

    /// Deflate level for every dataset, 0 disables compression
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL,
          value_parser = clap::value_parser!(i32).range(0..=9))]
    pub compression_level: i32,

    /// Extension replacing .TXT on output files
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,
}

impl OutputArgs {
    pub fn to_config(&self, output_dir: Option<PathBuf>) -> ConvertConfig {
        ConvertConfig {
            write: WriteOptions {
                compression_level: self.compression_level,
                ..WriteOptions::default()
            },
            mode: Some(self.mode),
            extension: self.extension.clone(),
            output_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Level-2 .TXT files to convert
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory for outputs, defaults to each input's directory
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Number of threads for parallel conversion, 0 uses every core.
    /// Defaults to one file at a time.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl ConvertArgs {
    pub fn convert_config(&self) -> ConvertConfig {
        self.output.to_config(self.output_dir.clone())
    }

    pub fn parallel_config(&self) -> ParallelConfig {
        match self.threads {
            Some(0) => ParallelConfig::all_cores(),
            threads => ParallelConfig::new(threads),
        }
    }
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Root of the archive mirror holding the dated campaign directories
    #[arg(long)]
    pub archive: PathBuf,

    /// Working data directory
    #[arg(short = 'D', long, default_value = ".")]
    pub directory: PathBuf,

    /// Years to sync
    #[arg(short = 'Y', long = "year", value_delimiter = ',')]
    pub years: Vec<i32>,

    /// Subdirectories to sync
    #[arg(short = 'S', long = "subdirectory", value_delimiter = ',')]
    pub subdirectories: Vec<String>,

    /// Overwrite existing data in transfer
    #[arg(short = 'C', long, default_value_t = false)]
    pub clobber: bool,

    /// Files fetched at once
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl SyncArgs {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            directory: self.directory.clone(),
            years: self.years.clone(),
            subdirectories: self.subdirectories.clone(),
            clobber: self.clobber,
            concurrency: self.concurrency,
            convert: self.output.to_config(None),
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Converted document to describe
    pub file: PathBuf,
}

fn parse_mode_arg(s: &str) -> Result<u32, String> {
    parse_mode(s).map_err(|e| e.to_string())
}
