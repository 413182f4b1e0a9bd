//! Parses `valgrind`'s `lackey` tool output from stdin,
//! converting it to a DRAM access trace.

// Imports
use {
	anyhow::Context,
	clap::Parser,
	dtmsim::{access_trace, AccessKind, AccessTraceWriter},
	dtmsim_util::{logger, FemtoDuration},
	std::{
		fs,
		io::{BufRead, BufWriter},
		path::PathBuf,
	},
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
struct Args {
	/// Output trace file
	#[clap(short = 'o', long = "output", default_value = "output.trace")]
	output_file: PathBuf,

	/// Requester of all accesses
	#[clap(long = "requester", default_value_t = 0)]
	requester: u32,

	/// Block size.
	///
	/// Addresses are aligned down to it.
	#[clap(long = "block-size", default_value_t = 64)]
	block_size: u32,

	/// Time between accesses, in nano-seconds
	#[clap(long = "access-period-ns", default_value_t = 10)]
	access_period_ns: u64,
}

fn main() -> Result<(), anyhow::Error> {
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));
	logger::init(None, false);

	anyhow::ensure!(
		args.block_size.is_power_of_two() && u64::from(args.block_size) > access_trace::Record::KIND_MASK,
		"Block size must be a power of two larger than {}",
		access_trace::Record::KIND_MASK
	);

	// Create the writer
	let file = fs::File::create(&args.output_file).context("Unable to create output file")?;
	let file = BufWriter::new(file);
	let mut trace_writer = AccessTraceWriter::new(file).context("Unable to create access trace writer")?;

	// Start reading the output
	let access_period = FemtoDuration::from_nanos(args.access_period_ns);
	let mut time = FemtoDuration::ZERO;
	let mut records = 0_u64;
	let mut stdin = std::io::stdin().lock();
	let mut line = String::new();
	while let Ok(1..) = {
		line.clear();
		stdin.read_line(&mut line)
	} {
		// Get the kind of record
		let line = line.trim_end();
		let Some((kind, rest)) = Kind::parse(line) else {
			continue;
		};

		// Parse the address, ignoring the size after it, if any
		let addr = rest.split(',').next().unwrap_or(rest);
		let addr = u64::from_str_radix(addr, 16).with_context(|| format!("Unable to parse address {addr:?}"))?;
		let addr = addr & !(u64::from(args.block_size) - 1);

		// And write the records
		let kinds: &[AccessKind] = match kind {
			// Note: Instruction fetches are served by the caches
			Kind::Inst => continue,
			Kind::Read => &[AccessKind::Read],
			Kind::Write => &[AccessKind::Write],
			Kind::Modify => &[AccessKind::Read, AccessKind::Write],
		};
		for &kind in kinds {
			let record = access_trace::Record {
				time,
				addr,
				kind,
				requester: args.requester,
				size: args.block_size,
			};
			trace_writer.write(&record).context("Unable to write record")?;
			time += access_period;
			records += 1;
		}
	}

	// Finally finish writing the trace
	trace_writer.finish().context("Unable to finish writing trace")?;
	tracing::info!(records, output_file = ?args.output_file, "Wrote access trace");

	Ok(())
}

/// Record kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Kind {
	Inst,
	Read,
	Write,
	Modify,
}

impl Kind {
	/// Parses a `lackey` line into its kind and the rest of the line
	fn parse(line: &str) -> Option<(Self, &str)> {
		let line = line.trim_start();
		let (kind, rest) = line.split_once(' ')?;
		let kind = match kind {
			"I" => Self::Inst,
			"L" => Self::Read,
			"S" => Self::Write,
			"M" => Self::Modify,
			_ => return None,
		};

		Some((kind, rest.trim_start()))
	}
}
