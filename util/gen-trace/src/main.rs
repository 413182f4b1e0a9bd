//! Generates a random DRAM access trace

// Imports
use {
	anyhow::Context,
	clap::Parser,
	dtmsim::{access_trace, AccessKind, AccessTraceWriter},
	dtmsim_util::{logger, FemtoDuration},
	rand::{rngs::StdRng, Rng, SeedableRng},
	std::{fs, io::BufWriter, path::PathBuf},
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
struct Args {
	/// Output trace file
	#[clap(short = 'o', long = "output", default_value = "output.trace")]
	output_file: PathBuf,

	/// Number of records
	#[clap(long = "records", default_value_t = 100_000)]
	records: u64,

	/// Number of requesters
	#[clap(long = "requesters", default_value_t = 4)]
	requesters: u32,

	/// Size of the address space, in bytes
	#[clap(long = "memory-size", default_value_t = 1 << 30)]
	memory_size: u64,

	/// Block size
	#[clap(long = "block-size", default_value_t = 64)]
	block_size: u32,

	/// Fraction of accesses that are writes
	#[clap(long = "write-ratio", default_value_t = 0.3)]
	write_ratio: f64,

	/// Fraction of accesses to the hotspot, at the start of the address space
	#[clap(long = "hotspot-ratio", default_value_t = 0.0)]
	hotspot_ratio: f64,

	/// Size of the hotspot, in bytes
	#[clap(long = "hotspot-size", default_value_t = 1 << 16)]
	hotspot_size: u64,

	/// Time between accesses, in nano-seconds
	#[clap(long = "access-period-ns", default_value_t = 10)]
	access_period_ns: u64,

	/// Random seed
	#[clap(long = "seed")]
	seed: Option<u64>,
}

fn main() -> Result<(), anyhow::Error> {
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));
	logger::init(None, false);

	anyhow::ensure!(args.requesters > 0, "Must have at least 1 requester");
	anyhow::ensure!(
		args.block_size.is_power_of_two() && u64::from(args.block_size) > access_trace::Record::KIND_MASK,
		"Block size must be a power of two larger than {}",
		access_trace::Record::KIND_MASK
	);
	anyhow::ensure!(
		args.memory_size >= u64::from(args.block_size) && args.hotspot_size >= u64::from(args.block_size),
		"Memory and hotspot must hold at least 1 block"
	);
	anyhow::ensure!(
		(0.0..=1.0).contains(&args.write_ratio) && (0.0..=1.0).contains(&args.hotspot_ratio),
		"Ratios must be within 0..=1"
	);

	let mut rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};

	let file = fs::File::create(&args.output_file).context("Unable to create output file")?;
	let mut trace_writer =
		AccessTraceWriter::new(BufWriter::new(file)).context("Unable to create access trace writer")?;

	let block_size = u64::from(args.block_size);
	let access_period = FemtoDuration::from_nanos(args.access_period_ns);
	for record_idx in 0..args.records {
		let region_size = match rng.gen_bool(args.hotspot_ratio) {
			true => args.hotspot_size.min(args.memory_size),
			false => args.memory_size,
		};
		let addr = rng.gen_range(0..region_size / block_size) * block_size;
		let kind = match rng.gen_bool(args.write_ratio) {
			true => AccessKind::Write,
			false => AccessKind::Read,
		};

		let record = access_trace::Record {
			time: access_period * record_idx,
			addr,
			kind,
			requester: rng.gen_range(0..args.requesters),
			size: args.block_size,
		};
		trace_writer.write(&record).context("Unable to write record")?;
	}

	trace_writer.finish().context("Unable to finish writing trace")?;
	tracing::info!(records = args.records, output_file = ?args.output_file, "Wrote access trace");

	Ok(())
}
