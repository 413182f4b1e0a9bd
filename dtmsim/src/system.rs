//! DRAM system

// Imports
use {
	crate::{
		access::AccessKind,
		config::Config,
		controller::DramController,
		data,
		decoder::{BankDecoder, ChannelSelect},
		epoch::{BankCounts, EpochBucket},
		perf_model::DramPerfModel,
		power::PowerTraceWriter,
		scheduler::DtmScheduler,
		shared::SharedState,
		sim,
		stats::Stats,
		telemetry::{PerformanceCounters, Telemetry},
	},
	anyhow::Context,
	average::Estimate,
	dtmsim_util::FemtoDuration,
	itertools::Itertools,
	std::{fmt, ops::Range, sync::Arc},
};

/// DRAM system.
///
/// One controller per requester, all sharing the banks, plus the scheduler
/// that manages the bank modes.
#[derive(Debug)]
pub struct DramSystem {
	/// Shared state
	shared: Arc<SharedState>,

	/// Controllers, indexed by requester
	controllers: Vec<DramController>,

	/// Scheduler
	scheduler: DtmScheduler,

	/// Closed epochs
	epochs: Vec<EpochBucket>,

	/// Access latencies, in nano-seconds
	latencies: average::Variance,
}

impl DramSystem {
	/// Creates the system described by `config`
	pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
		let telemetry = PerformanceCounters::new(&config.dtm.temperature_log, &config.dtm.power_log);
		Self::with_telemetry(config, Box::new(telemetry))
	}

	/// Creates the system described by `config`, reading temperatures from `telemetry`
	pub fn with_telemetry(config: &Config, telemetry: Box<dyn Telemetry + Send>) -> Result<Self, anyhow::Error> {
		let topology = config.topology().context("Invalid memory topology")?;
		let perf_model_config = config.perf_model().context("Invalid DRAM config")?;
		let epoch_width = config.epoch_width().context("Invalid epoch config")?;
		let bank_count = topology.bank_count() as usize;
		let policy = config.policy(bank_count).context("Invalid DTM policy")?;
		let dtm_period = config.dtm_period().context("Invalid DTM config")?;

		let shared = Arc::new(SharedState::new(bank_count, epoch_width));
		let controllers = (0..config.cores.total_requesters)
			.map(|requester| {
				let channel_select = match config.memory.round_robin_channels {
					true => ChannelSelect::RoundRobin(Arc::clone(shared.rotation())),
					false => ChannelSelect::Partitioned,
				};
				let decoder = BankDecoder::new(topology.clone(), channel_select);
				let perf_model = DramPerfModel::new(perf_model_config.clone(), decoder, Arc::clone(&shared));

				let controller =
					DramController::new(requester, config.cores.block_size, perf_model, Arc::clone(&shared));
				match config.dram.track_address_counts {
					true => controller.with_address_counts(),
					false => controller,
				}
			})
			.collect();

		let mut scheduler = DtmScheduler::new(dtm_period, policy, telemetry, Arc::clone(&shared));
		if let (Some(power), Some(power_model)) = (&config.power, config.power_model()) {
			let writer = PowerTraceWriter::new(&power.power_trace, power.full_power_trace.as_deref(), bank_count)
				.context("Unable to create power trace")?;
			scheduler = scheduler.with_power_trace(power_model, writer);
		}

		tracing::debug!(
			?topology,
			?perf_model_config,
			%epoch_width,
			policy = scheduler.policy().name(),
			"Created DRAM system"
		);

		Ok(Self {
			shared,
			controllers,
			scheduler,
			epochs: vec![],
			latencies: average::Variance::new(),
		})
	}

	/// Returns the shared state
	pub fn shared(&self) -> &Arc<SharedState> {
		&self.shared
	}

	/// Returns all controllers
	pub fn controllers(&self) -> &[DramController] {
		&self.controllers
	}

	/// Returns the scheduler
	pub fn scheduler(&self) -> &DtmScheduler {
		&self.scheduler
	}

	/// Returns the current statistics
	pub fn stats(&self) -> Stats {
		Stats::collect(&self.controllers, &self.shared)
	}

	/// Finishes the run, closing the live epoch and returning the output data
	pub fn finish(mut self, time_span: Option<Range<FemtoDuration>>) -> data::Data {
		let epoch_width = {
			let mut epochs = self.shared.epochs();
			epochs.close_live();
			self.epochs.extend(epochs.drain());
			epochs.width()
		};

		for controller in &self.controllers {
			for (address, kind, count) in controller.hot_addresses(HOT_ADDRESS_THRESHOLD) {
				tracing::debug!(
					core = controller.core(),
					address = format_args!("{address:#x}"),
					?kind,
					count,
					"Hot address"
				);
			}
		}

		data::Data {
			time_span:    time_span.map(|span| span.start.as_femtos()..span.end.as_femtos()),
			bank_count:   self.shared.bank_count(),
			epochs:       data::EpochsData {
				width:  epoch_width.as_femtos(),
				epochs: self
					.epochs
					.iter()
					.map(|epoch| data::EpochData {
						start:  epoch.start.as_femtos(),
						reads:  epoch.reads,
						writes: epoch.writes,
						banks:  epoch.banks.clone(),
					})
					.collect(),
			},
			mode_changes: self
				.scheduler
				.mode_changes()
				.iter()
				.map(|change| data::ModeChangeData {
					time: change.time.as_femtos(),
					bank: change.bank.to_usize(),
					mode: change.mode,
				})
				.collect(),
			stats:        self.stats(),
		}
	}
}

/// Accesses an address needs to be reported as hot
const HOT_ADDRESS_THRESHOLD: u64 = 100;

impl sim::Handler for DramSystem {
	fn handle_trace(&mut self, trace: sim::Trace) -> Result<(), anyhow::Error> {
		tracing::trace!(?trace, "Received trace");
		let access = trace.record.access();

		// Run any scheduler ticks due before this access
		self.scheduler
			.advance(access.time)
			.context("Unable to advance scheduler")?;

		let controller = usize::try_from(access.requester)
			.ok()
			.and_then(|requester| self.controllers.get_mut(requester))
			.with_context(|| format!("Unknown requester {}", access.requester))?;
		let latency = match access.kind {
			AccessKind::Read => controller.get_data_from_dram(access.address, access.requester, None, access.time),
			AccessKind::Write => controller.put_data_to_dram(access.address, access.requester, None, access.time),
		};
		self.latencies.add(latency.as_nanos_f64());

		// Move any closed epochs out of the shared state
		self.epochs.extend(self.shared.epochs().drain());

		Ok(())
	}

	fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
		// Note: Start with a newline, since we're a multi-line output
		f.pad("\n")?;

		let reads = self.controllers.iter().map(DramController::reads).sum::<u64>();
		let writes = self.controllers.iter().map(DramController::writes).sum::<u64>();
		writeln!(f, "Accesses: {reads} reads, {writes} writes")?;

		writeln!(
			f,
			"Average latency: {:.4} ± {:.4} ns",
			self.latencies.mean(),
			self.latencies.error()
		)?;

		let bank_modes = self.shared.bank_modes();
		writeln!(
			f,
			"Low power banks: {} / {} ({} ticks, {} mode changes)",
			bank_modes.low_power_count(),
			bank_modes.len(),
			self.scheduler.ticks(),
			self.scheduler.mode_changes().len()
		)?;

		let (min_bank_accesses, max_bank_accesses) = self
			.shared
			.epochs()
			.totals()
			.iter()
			.map(BankCounts::total)
			.minmax()
			.into_option()
			.unwrap_or((0, 0));
		writeln!(
			f,
			"Bank accesses: {min_bank_accesses}..{max_bank_accesses}, {} closed epochs",
			self.epochs.len()
		)?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{access_trace, sim::Handler, telemetry::UNAVAILABLE},
		pretty_assertions::assert_eq,
	};

	/// Telemetry without any readings
	#[derive(Debug)]
	struct NoTelemetry;

	impl Telemetry for NoTelemetry {
		fn temperature(&self, _component: &str) -> f64 {
			UNAVAILABLE
		}

		fn power(&self, _component: &str) -> f64 {
			UNAVAILABLE
		}

		fn peak_temperature(&self) -> f64 {
			UNAVAILABLE
		}
	}

	const CONFIG: &str = r#"{
		"trace_skip": 0,
		"debug_output_period_secs": 60.0,
		"cores": { "application_cores": 2, "total_requesters": 2, "block_size": 64 },
		"memory": {
			"stack_type": "DDR",
			"banks": 8,
			"channels": 1,
			"bank_offset": 14,
			"controllers_interleaving": 1
		},
		"dram": {
			"enabled": true,
			"latency_ns": 45.0,
			"low_power_latency_ns": 90.0,
			"per_controller_bandwidth_gbps": 8.0
		},
		"epoch": { "width_us": 1 },
		"dtm": {
			"policy": "off",
			"critical_temperature": 80.0,
			"recovered_temperature": 60.0,
			"banks_in_x": 2,
			"banks_in_y": 2,
			"banks_in_z": 2,
			"period_us": 10,
			"temperature_log": "InstantaneousTemperature.log",
			"power_log": "InstantaneousPower.log"
		}
	}"#;

	fn trace(time_ns: u64, kind: AccessKind, requester: u32) -> sim::Trace {
		sim::Trace {
			record: access_trace::Record {
				time: FemtoDuration::from_nanos(time_ns),
				addr: 0x4000,
				kind,
				requester,
				size: 64,
			},
		}
	}

	#[test]
	fn debug_output_reports_latencies() {
		let config = serde_json::from_str::<Config>(CONFIG).expect("Unable to parse config");
		let mut system = DramSystem::with_telemetry(&config, Box::new(NoTelemetry)).expect("Unable to create system");

		system
			.handle_trace(trace(0, AccessKind::Read, 0))
			.expect("Unable to handle trace");
		system
			.handle_trace(trace(1_000, AccessKind::Write, 1))
			.expect("Unable to handle trace");
		assert_eq!(system.latencies.len(), 2);

		// 512 bits at 64 bits/ns, plus the access cost
		let output = dtmsim_util::DisplayWrapper::new(|f| system.fmt_debug(f)).to_string();
		assert!(output.contains("Accesses: 1 reads, 1 writes"), "Unexpected output: {output}");
		assert!(
			output.contains("Average latency: 53.0000 ± 0.0000 ns"),
			"Unexpected output: {output}"
		);
	}
}
