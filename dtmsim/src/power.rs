//! Bank power model

// Imports
use {
	crate::{bank::BankIdx, telemetry},
	anyhow::Context,
	dtmsim_util::FemtoDuration,
	std::{
		fs,
		io::{self, Write},
		path::{Path, PathBuf},
	},
};

/// Bank power model.
///
/// The power of a bank over a timestep is its dynamic access energy spread over
/// the timestep, plus its static power, plus the average power spent refreshing it.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct BankPowerModel {
	/// Energy per access, in nJ
	energy_per_access: f64,

	/// Static power, in W
	static_power: f64,

	/// Average refresh power, in W
	refresh_power: f64,
}

impl BankPowerModel {
	/// Creates a new power model.
	///
	/// Every `refresh_interval`, `rows_per_refresh` rows are refreshed at
	/// `energy_per_refresh` nJ each.
	pub fn new(
		energy_per_access: f64,
		static_power: f64,
		energy_per_refresh: f64,
		rows_per_refresh: f64,
		refresh_interval: FemtoDuration,
	) -> Self {
		let refresh_power = match refresh_interval.is_zero() {
			true => 0.0,
			// Note: nJ / ns = W
			false => rows_per_refresh * energy_per_refresh / refresh_interval.as_nanos_f64(),
		};

		Self {
			energy_per_access,
			static_power,
			refresh_power,
		}
	}

	/// Returns the average refresh power, in W
	pub fn refresh_power(&self) -> f64 {
		self.refresh_power
	}

	/// Returns the power of a bank with `accesses` accesses over `timestep`, in W.
	///
	/// Rounded to the mW, as the thermal tool expects.
	pub fn bank_power(&self, accesses: u64, timestep: FemtoDuration) -> f64 {
		let dynamic_power = match timestep.is_zero() {
			true => 0.0,
			false => accesses as f64 * self.energy_per_access / timestep.as_nanos_f64(),
		};

		let power = dynamic_power + self.static_power + self.refresh_power;
		(power * 1000.0).round() / 1000.0
	}
}

/// Power trace writer.
///
/// Writes the bank powers of each tick as the thermal tool's instantaneous
/// power log, overwritten every tick, and appends them to a full trace.
#[derive(Debug)]
pub struct PowerTraceWriter {
	/// Instantaneous power log
	instant_path: PathBuf,

	/// Full trace
	full_trace: Option<fs::File>,

	/// Component names
	names: Vec<String>,
}

impl PowerTraceWriter {
	/// Creates a new writer for `bank_count` banks.
	///
	/// If `full_trace_path` is given, it's truncated and the header is written to it.
	pub fn new(instant_path: &Path, full_trace_path: Option<&Path>, bank_count: usize) -> Result<Self, anyhow::Error> {
		let names = (0..bank_count)
			.map(|idx| BankIdx::new(idx).component_name())
			.collect::<Vec<_>>();

		let full_trace = full_trace_path
			.map(|path| {
				let mut file =
					fs::File::create(path).with_context(|| format!("Unable to create full power trace {path:?}"))?;
				writeln!(file, "{}", dtmsim_util::tab_row(&names))
					.with_context(|| format!("Unable to write full power trace {path:?}"))?;
				Ok::<_, anyhow::Error>(file)
			})
			.transpose()?;

		Ok(Self {
			instant_path: instant_path.to_owned(),
			full_trace,
			names,
		})
	}

	/// Writes the powers of a tick
	pub fn write(&mut self, powers: &[f64]) -> Result<(), anyhow::Error> {
		anyhow::ensure!(
			powers.len() == self.names.len(),
			"Expected {} bank powers, found {}",
			self.names.len(),
			powers.len()
		);

		let instant = fs::File::create(&self.instant_path)
			.with_context(|| format!("Unable to create power log {:?}", self.instant_path))?;
		let mut instant = io::BufWriter::new(instant);
		telemetry::write_log(&mut instant, self.names.iter().cloned(), powers)
			.and_then(|()| instant.flush())
			.with_context(|| format!("Unable to write power log {:?}", self.instant_path))?;

		if let Some(full_trace) = &mut self.full_trace {
			writeln!(full_trace, "{}", dtmsim_util::tab_row(powers)).context("Unable to write full power trace")?;
		}

		Ok(())
	}
}
