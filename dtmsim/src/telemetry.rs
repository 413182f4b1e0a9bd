//! Temperature and power telemetry

// Imports
use {
	crate::bank::BankIdx,
	anyhow::Context,
	std::{
		fmt,
		fs,
		io::{self, Write},
		path::{Path, PathBuf},
	},
};

/// Reading returned when a component isn't in the telemetry
pub const UNAVAILABLE: f64 = -1.0;

/// Telemetry provider.
///
/// Supplies the latest temperature and power of each component, by the thermal
/// tool's names, `B_<i>` for banks and `C_<i>` for cores. Components without a
/// reading return [`UNAVAILABLE`].
pub trait Telemetry: fmt::Debug {
	/// Returns the temperature of `component`
	fn temperature(&self, component: &str) -> f64;

	/// Returns the power of `component`
	fn power(&self, component: &str) -> f64;

	/// Returns the peak temperature of all components
	fn peak_temperature(&self) -> f64;

	/// Returns the temperature of `bank`
	fn bank_temperature(&self, bank: BankIdx) -> f64 {
		self.temperature(&bank.component_name())
	}

	/// Returns the temperature of all `bank_count` banks
	fn bank_temperatures(&self, bank_count: usize) -> Vec<f64> {
		(0..bank_count)
			.map(|idx| self.bank_temperature(BankIdx::new(idx)))
			.collect()
	}

	/// Returns the temperature of `core`
	fn core_temperature(&self, core: u64) -> f64 {
		self.temperature(&format!("C_{core}"))
	}

	/// Returns the power of `core`
	fn core_power(&self, core: u64) -> f64 {
		self.power(&format!("C_{core}"))
	}
}

/// Performance counters.
///
/// File-backed telemetry, reading the thermal tool's instantaneous logs: two
/// tab-separated rows, the first with the component names and the second with
/// their values. Files are re-read on every query.
#[derive(Clone, Debug)]
pub struct PerformanceCounters {
	/// Temperature log
	temperature_path: PathBuf,

	/// Power log
	power_path: PathBuf,
}

impl PerformanceCounters {
	/// Creates new performance counters over the logs at `temperature_path` and `power_path`
	pub fn new(temperature_path: impl Into<PathBuf>, power_path: impl Into<PathBuf>) -> Self {
		Self {
			temperature_path: temperature_path.into(),
			power_path:       power_path.into(),
		}
	}

	/// Reads the value of `component` in the log at `path`
	fn read_component(path: &Path, component: &str) -> f64 {
		match self::read_log(path) {
			Ok(log) => log.get(component).unwrap_or(UNAVAILABLE),
			Err(err) => {
				tracing::debug!(?path, ?err, "Unable to read telemetry log");
				UNAVAILABLE
			},
		}
	}
}

impl Telemetry for PerformanceCounters {
	fn temperature(&self, component: &str) -> f64 {
		Self::read_component(&self.temperature_path, component)
	}

	fn power(&self, component: &str) -> f64 {
		Self::read_component(&self.power_path, component)
	}

	fn bank_temperatures(&self, bank_count: usize) -> Vec<f64> {
		// Note: All banks must come from the same snapshot of the log, so we only read it once
		match self::read_log(&self.temperature_path) {
			Ok(log) => (0..bank_count)
				.map(|idx| log.get(&BankIdx::new(idx).component_name()).unwrap_or(UNAVAILABLE))
				.collect(),
			Err(err) => {
				tracing::debug!(path = ?self.temperature_path, ?err, "Unable to read telemetry log");
				vec![UNAVAILABLE; bank_count]
			},
		}
	}

	fn peak_temperature(&self) -> f64 {
		match self::read_log(&self.temperature_path) {
			Ok(log) => log.values.iter().copied().fold(UNAVAILABLE, f64::max),
			Err(err) => {
				tracing::debug!(path = ?self.temperature_path, ?err, "Unable to read telemetry log");
				UNAVAILABLE
			},
		}
	}
}

/// Telemetry log
#[derive(PartialEq, Clone, Debug)]
pub struct TelemetryLog {
	/// Component names
	pub names: Vec<String>,

	/// Values, parallel to `names`
	pub values: Vec<f64>,
}

impl TelemetryLog {
	/// Parses a telemetry log.
	///
	/// Values that fail to parse are unavailable. A missing second row
	/// leaves every component unavailable. Columns without a name are skipped.
	pub fn parse(contents: &str) -> Self {
		let mut lines = contents.lines();
		let names = lines.next().unwrap_or_default().split('\t');
		let values = lines
			.next()
			.unwrap_or_default()
			.split('\t')
			.map(Some)
			.chain(std::iter::repeat(None));

		let (names, values) = names
			.zip(values)
			.filter(|(name, _)| !name.is_empty())
			.map(|(name, value)| {
				let value = value
					.and_then(|value| value.trim().parse::<f64>().ok())
					.unwrap_or(UNAVAILABLE);
				(name.to_owned(), value)
			})
			.unzip();

		Self { names, values }
	}

	/// Returns the value of `component`
	pub fn get(&self, component: &str) -> Option<f64> {
		let idx = self.names.iter().position(|name| name == component)?;
		self.values.get(idx).copied()
	}
}

/// Reads the telemetry log at `path`
pub fn read_log(path: &Path) -> Result<TelemetryLog, anyhow::Error> {
	let contents = fs::read_to_string(path).with_context(|| format!("Unable to read telemetry log {path:?}"))?;
	Ok(TelemetryLog::parse(&contents))
}

/// Writes a telemetry log to `writer`, with `names` and `values` rows
pub fn write_log<W: io::Write, V: fmt::Display>(
	mut writer: W,
	names: impl IntoIterator<Item = String>,
	values: impl IntoIterator<Item = V>,
) -> Result<(), io::Error> {
	writeln!(writer, "{}", dtmsim_util::tab_row(names))?;
	writeln!(writer, "{}", dtmsim_util::tab_row(values))?;
	Ok(())
}
