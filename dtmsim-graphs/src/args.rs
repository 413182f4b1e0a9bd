//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Sub-command
	#[command(subcommand)]
	pub sub_cmd: SubCmd,
}

/// Sub-command
#[derive(Debug, clap::Subcommand)]
pub enum SubCmd {
	#[clap(name = "epoch-accesses")]
	EpochAccesses(EpochAccesses),

	#[clap(name = "bank-modes")]
	BankModes(BankModes),
}

/// Accesses per epoch
#[derive(Debug, clap::Args)]
pub struct EpochAccesses {
	/// Input
	pub input_file: PathBuf,

	/// Only show these banks, instead of the totals
	#[clap(long = "bank")]
	pub banks: Vec<usize>,

	/// Output
	#[clap(flatten)]
	pub output: Output,
}

/// Low power banks over time
#[derive(Debug, clap::Args)]
pub struct BankModes {
	/// Input
	pub input_file: PathBuf,

	/// Output
	#[clap(flatten)]
	pub output: Output,
}

/// Output
#[derive(Debug, clap::Args)]
pub struct Output {
	/// Interactive mode
	#[clap(long = "interactive")]
	pub interactive: bool,

	/// Output file
	#[clap(short = 'o', long = "output", group = "output-file")]
	pub file: Option<PathBuf>,

	/// Output file width
	#[clap(long = "output-width", requires = "output-file", default_value_t = 640)]
	pub width: u32,

	/// Output file height
	#[clap(long = "output-height", requires = "output-file", default_value_t = 480)]
	pub height: u32,
}
