//! Named statistics

// Imports
use {
	crate::{controller::DramController, shared::SharedState},
	std::fmt,
};

/// Component of all DRAM statistics
pub const COMPONENT: &str = "dram";

/// Statistic metric.
///
/// Identified by component, index (core or bank) and name, as the thermal tool looks them up.
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Metric {
	pub component: String,
	pub idx:       usize,
	pub name:      String,
	pub value:     u64,
}

impl fmt::Display for Metric {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}[{}].{} = {}", self.component, self.idx, self.name, self.value)
	}
}

/// Statistics snapshot
#[derive(PartialEq, Eq, Clone, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Stats {
	pub metrics: Vec<Metric>,
}

impl Stats {
	/// Collects the statistics of all `controllers` and the banks in `shared`.
	///
	/// Per-core metrics are indexed by core, per-bank metrics by bank. Bank
	/// access counters are those of the last closed epoch.
	pub fn collect<'a>(controllers: impl IntoIterator<Item = &'a DramController>, shared: &SharedState) -> Self {
		let mut stats = Self::default();

		for controller in controllers {
			let idx = controller.core() as usize;
			let perf_stats = controller.perf_stats();
			stats.push(idx, "reads", controller.reads());
			stats.push(idx, "writes", controller.writes());
			stats.push(idx, "total-accesses", perf_stats.accesses);
			stats.push(idx, "total-access-latency", perf_stats.total_access_latency.as_femtos());
			stats.push(idx, "total-queueing-delay", perf_stats.total_queueing_delay.as_femtos());
			stats.push(idx, "total-read-queueing-delay", perf_stats.total_read_queueing_delay.as_femtos());
			stats.push(idx, "total-write-queueing-delay", perf_stats.total_write_queueing_delay.as_femtos());
		}

		let exported = shared.epochs().exported().to_vec();
		let bank_modes = shared.bank_modes();
		for ((bank, mode), counts) in bank_modes.iter().zip(exported) {
			let idx = bank.to_usize();
			stats.push(idx, "bank_read_access_counter", counts.reads);
			stats.push(idx, "bank_write_access_counter", counts.writes);
			stats.push(idx, "bank_read_access_counter_lowpower", counts.reads_low_power);
			stats.push(idx, "bank_write_access_counter_lowpower", counts.writes_low_power);
			stats.push(idx, "bank_mode", mode.stat_value());
		}

		stats
	}

	/// Adds a metric
	fn push(&mut self, idx: usize, name: &str, value: u64) {
		self.metrics.push(Metric {
			component: COMPONENT.to_owned(),
			idx,
			name: name.to_owned(),
			value,
		});
	}

	/// Returns the value of a metric
	pub fn get(&self, component: &str, idx: usize, name: &str) -> Option<u64> {
		self.metrics
			.iter()
			.find(|metric| metric.component == component && metric.idx == idx && metric.name == name)
			.map(|metric| metric.value)
	}

	/// Returns the sum of a metric over all indices
	pub fn sum(&self, component: &str, name: &str) -> u64 {
		self.metrics
			.iter()
			.filter(|metric| metric.component == component && metric.name == name)
			.map(|metric| metric.value)
			.sum()
	}
}
