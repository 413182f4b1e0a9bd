//! Per-access latency model

// Imports
use {
	crate::{
		access::{AccessKind, MemoryAccess},
		bandwidth::ComponentBandwidth,
		bank::{BankIdx, BankMode},
		decoder::BankDecoder,
		queue::{QueueModel, QueueModelKind},
		shared::SharedState,
	},
	dtmsim_util::FemtoDuration,
	std::sync::Arc,
};

/// DRAM performance model.
///
/// Computes the latency of each access as its queueing delay, plus the time to
/// transfer it over the bus, plus the device access cost of the bank's current mode
/// for the access kind.
#[derive(Debug)]
pub struct DramPerfModel {
	/// Config
	config: PerfModelConfig,

	/// Queue model, if queueing is enabled.
	///
	/// Shared by reads and writes, unless there's a write queue.
	queue: Option<Box<dyn QueueModel>>,

	/// Write queue, if writes queue separately
	write_queue: Option<Box<dyn QueueModel>>,

	/// Bank decoder
	decoder: BankDecoder,

	/// Shared state
	shared: Arc<SharedState>,

	/// Statistics
	stats: PerfModelStats,
}

impl DramPerfModel {
	/// Creates a new performance model
	pub fn new(config: PerfModelConfig, decoder: BankDecoder, shared: Arc<SharedState>) -> Self {
		let queue = config.queue.map(QueueModelKind::create);
		let write_queue = match config.write.map(|write| write.separate_queue) {
			Some(true) => config.queue.map(QueueModelKind::create),
			_ => None,
		};
		Self {
			config,
			queue,
			write_queue,
			decoder,
			shared,
			stats: PerfModelStats::default(),
		}
	}

	/// Returns the bank decoder
	pub fn decoder(&self) -> &BankDecoder {
		&self.decoder
	}

	/// Returns the statistics
	pub fn stats(&self) -> &PerfModelStats {
		&self.stats
	}

	/// Returns the latency of `access`.
	///
	/// Accesses from requesters other than application cores, or while the model
	/// is disabled, take no time and aren't decoded.
	pub fn access_latency(&mut self, access: &MemoryAccess) -> AccessOutcome {
		if !self.config.enabled || access.requester >= self.config.application_cores {
			return AccessOutcome::free();
		}

		let processing = self.config.bandwidth.rounded_latency(8 * access.size);
		let queue = match (access.kind, &mut self.write_queue) {
			(AccessKind::Write, Some(write_queue)) => Some(write_queue),
			_ => self.queue.as_mut(),
		};
		let queue_delay = match queue {
			Some(queue) => queue.compute_delay(access.time, processing, access.requester),
			None => FemtoDuration::ZERO,
		};

		let bank = self.decoder.decode(access.address, access.requester);
		let mode = self.shared.bank_mode(bank);
		let device_cost = self.config.costs_of(access.kind).of(mode);

		let latency = queue_delay + processing + device_cost;
		tracing::trace!(?access, ?bank, ?mode, %queue_delay, %processing, %device_cost, "Access latency");

		self.stats.accesses += 1;
		self.stats.total_access_latency += latency;
		self.stats.total_queueing_delay += queue_delay;
		match access.kind {
			AccessKind::Read => self.stats.total_read_queueing_delay += queue_delay,
			AccessKind::Write => self.stats.total_write_queueing_delay += queue_delay,
		}

		AccessOutcome {
			latency,
			timeline: Some(AccessTimeline {
				arrival:     access.time,
				queued:      access.time + queue_delay,
				transferred: access.time + queue_delay + processing,
				completed:   access.time + latency,
			}),
			bank: Some((bank, mode)),
		}
	}
}

/// Performance model configuration
#[derive(Clone, Debug)]
pub struct PerfModelConfig {
	/// Whether the model is enabled
	pub enabled: bool,

	/// Number of application cores.
	///
	/// Requesters from this number onwards are system traffic.
	pub application_cores: u64,

	/// Per-controller bandwidth
	pub bandwidth: ComponentBandwidth,

	/// Queue model, if queueing is enabled
	pub queue: Option<QueueModelKind>,

	/// Device access costs of reads, and of writes without their own
	pub costs: AccessCosts,

	/// Writes, if they differ from reads
	pub write: Option<WriteConfig>,
}

impl PerfModelConfig {
	/// Returns the device access costs of `kind`
	pub fn costs_of(&self, kind: AccessKind) -> AccessCosts {
		match (kind, &self.write) {
			(AccessKind::Write, Some(write)) => write.costs,
			_ => self.costs,
		}
	}
}

/// Write configuration
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct WriteConfig {
	/// Device access costs
	pub costs: AccessCosts,

	/// Whether writes have their own queue, of the same kind as the read queue
	pub separate_queue: bool,
}

/// Device access costs
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct AccessCosts {
	/// Cost of an access to a bank in normal mode
	pub normal: FemtoDuration,

	/// Cost of an access to a bank in low power mode
	pub low_power: FemtoDuration,
}

impl AccessCosts {
	/// Returns the cost of an access to a bank in `mode`
	pub fn of(&self, mode: BankMode) -> FemtoDuration {
		match mode {
			BankMode::Normal => self.normal,
			BankMode::LowPower => self.low_power,
		}
	}
}

/// Outcome of [`DramPerfModel::access_latency`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct AccessOutcome {
	/// Latency
	pub latency: FemtoDuration,

	/// Timeline checkpoints, for the caller's critical path accounting
	pub timeline: Option<AccessTimeline>,

	/// Accessed bank and its mode at the time, if decoded
	pub bank: Option<(BankIdx, BankMode)>,
}

impl AccessOutcome {
	/// Outcome of an access that takes no time
	pub fn free() -> Self {
		Self {
			latency:  FemtoDuration::ZERO,
			timeline: None,
			bank:     None,
		}
	}
}

/// Timeline checkpoints of an access
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct AccessTimeline {
	/// Arrival at the controller
	pub arrival: FemtoDuration,

	/// Leaving the queue
	pub queued: FemtoDuration,

	/// Transferred over the bus
	pub transferred: FemtoDuration,

	/// Device access completed
	pub completed: FemtoDuration,
}

/// Performance model statistics.
///
/// Only ever increase during a run.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct PerfModelStats {
	/// Accesses
	pub accesses: u64,

	/// Total access latency
	pub total_access_latency: FemtoDuration,

	/// Total queueing delay
	pub total_queueing_delay: FemtoDuration,

	/// Total queueing delay of reads
	pub total_read_queueing_delay: FemtoDuration,

	/// Total queueing delay of writes
	pub total_write_queueing_delay: FemtoDuration,
}
