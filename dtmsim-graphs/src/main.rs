//! Creates graphs from `dtmsim`'s output

// Modules
mod args;

// Imports
use {
	anyhow::Context,
	args::Args,
	clap::Parser,
	dtmsim::{bank::BankMode, data::Data, epoch::BankCounts},
	dtmsim_util::{logger, FemtoDuration},
	gnuplot::{AxesCommon, Caption, Figure},
	itertools::Itertools,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Then check the sub-command
	match args.sub_cmd {
		args::SubCmd::EpochAccesses(cmd_args) => draw_epoch_accesses(&cmd_args)?,
		args::SubCmd::BankModes(cmd_args) => draw_bank_modes(&cmd_args)?,
	}

	Ok(())
}

/// Draws the accesses of each epoch
fn draw_epoch_accesses(cmd_args: &args::EpochAccesses) -> Result<(), anyhow::Error> {
	let data = Data::read_from(&cmd_args.input_file).context("Unable to read data")?;
	if let Some(&bank) = cmd_args.banks.iter().find(|&&bank| bank >= data.bank_count) {
		anyhow::bail!("Bank {bank} is out of range, there are only {} banks", data.bank_count);
	}

	let epochs = &data.epochs.epochs;
	let times = epochs
		.iter()
		.map(|epoch| femtos_to_micros(epoch.start))
		.collect::<Vec<_>>();

	let mut fig = Figure::new();
	let axes = fig
		.axes2d()
		.set_x_label("Time (µs)", &[])
		.set_y_label("Accesses", &[]);

	match cmd_args.banks.is_empty() {
		true => {
			let reads = epochs.iter().map(|epoch| epoch.reads as f64).collect::<Vec<_>>();
			let writes = epochs.iter().map(|epoch| epoch.writes as f64).collect::<Vec<_>>();
			axes.lines(&times, &reads, &[Caption("Reads")])
				.lines(&times, &writes, &[Caption("Writes")]);
		},
		false => {
			for &bank in &cmd_args.banks {
				let accesses = epochs
					.iter()
					.map(|epoch| epoch.banks.get(bank).map_or(0, BankCounts::total) as f64)
					.collect::<Vec<_>>();
				axes.lines(&times, &accesses, &[Caption(format!("Bank {bank}").as_str())]);
			}
		},
	}

	handle_output(&cmd_args.output, &mut fig)
}

/// Draws the number of low power banks over time
fn draw_bank_modes(cmd_args: &args::BankModes) -> Result<(), anyhow::Error> {
	let data = Data::read_from(&cmd_args.input_file).context("Unable to read data")?;

	// Note: Mode changes are recorded in order, so we just need to keep a running count,
	//       emitting 2 points per change to get a step.
	let mut low_power_banks = 0_usize;
	let start_time = data.time_span.as_ref().map_or(0, |span| span.start);
	let mut points = vec![(femtos_to_micros(start_time), 0.0)];
	for (time, changes) in &data.mode_changes.iter().group_by(|change| change.time) {
		let prev_low_power_banks = low_power_banks;
		for change in changes {
			match change.mode {
				BankMode::LowPower => low_power_banks += 1,
				BankMode::Normal => low_power_banks = low_power_banks.saturating_sub(1),
			}
		}

		let time = femtos_to_micros(time);
		points.push((time, prev_low_power_banks as f64));
		points.push((time, low_power_banks as f64));
	}
	if let Some(span) = &data.time_span {
		points.push((femtos_to_micros(span.end), low_power_banks as f64));
	}
	tracing::debug!(changes = data.mode_changes.len(), "Collected mode changes");

	let (times, counts): (Vec<_>, Vec<_>) = points.into_iter().unzip();
	let mut fig = Figure::new();
	fig.axes2d()
		.set_x_label("Time (µs)", &[])
		.set_y_label("Low power banks", &[])
		.set_y_range(gnuplot::Fix(0.0), gnuplot::Fix(data.bank_count as f64))
		.lines(&times, &counts, &[Caption("Low power banks")]);

	handle_output(&cmd_args.output, &mut fig)
}

/// Converts a time in femto-seconds to micro-seconds
fn femtos_to_micros(femtos: u64) -> f64 {
	FemtoDuration::from_femtos(femtos).as_nanos_f64() / 1000.0
}

/// Handles the output of a figure
fn handle_output(output: &args::Output, fig: &mut Figure) -> Result<(), anyhow::Error> {
	if let Some(output_file) = &output.file {
		fig.save_to_png(output_file, output.width, output.height)
			.map_err(|err| anyhow::anyhow!("Unable to save output file: {err:?}"))?;
	}

	if output.interactive {
		fig.show()
			.map_err(|err| anyhow::anyhow!("Unable to show figure: {err:?}"))?;
	}

	Ok(())
}
