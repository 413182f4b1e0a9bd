//! DRAM thermal management simulator (`dtmsim`)

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	dtmsim::{stats, AccessTraceReader, Config, DramSystem, Simulator},
	dtmsim_util::logger,
	std::{fs, io, time::Duration},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the trace file
	let trace_file = fs::File::open(&args.trace_file).context("Unable to open trace file")?;
	let mut trace_reader =
		AccessTraceReader::from_reader(io::BufReader::new(trace_file)).context("Unable to parse access trace")?;
	tracing::debug!(records = trace_reader.records_remaining(), "Parsed access trace");

	// Read the config file
	let config = {
		let config_file = fs::File::open(&args.config_file).context("Unable to open config file")?;
		serde_json::from_reader::<_, Config>(config_file).context("Unable to parse config file")?
	};

	// Run the simulator
	let mut sim = Simulator::new(
		config.trace_skip,
		Duration::from_secs_f64(config.debug_output_period_secs),
	);
	let mut system = DramSystem::from_config(&config).context("Unable to create DRAM system")?;
	system.shared().set_roi(!args.no_roi);

	let run_output = sim
		.run(&mut trace_reader, &mut system)
		.context("Unable to run simulator")?;

	let data = system.finish(run_output.time_span);
	tracing::info!(
		reads = data.stats.sum(stats::COMPONENT, "reads"),
		writes = data.stats.sum(stats::COMPONENT, "writes"),
		epochs = data.epochs.epochs.len(),
		mode_changes = data.mode_changes.len(),
		"Finished simulation"
	);

	if let Some(output_path) = &args.output_file {
		data.write_to(output_path)
			.with_context(|| format!("Unable to write output to {output_path:?}"))?;
	}

	Ok(())
}
