//! Dynamic thermal management scheduler

// Imports
use {
	crate::{
		bank::{BankIdx, BankMode},
		policy::{self, BankPolicy},
		power::{BankPowerModel, PowerTraceWriter},
		shared::SharedState,
		telemetry::Telemetry,
	},
	anyhow::Context,
	dtmsim_util::FemtoDuration,
	std::sync::Arc,
};

/// Dynamic thermal management scheduler.
///
/// Every period, writes the bank powers for the thermal tool, reads back the
/// bank temperatures and installs the bank modes decided by the policy.
#[derive(Debug)]
pub struct DtmScheduler {
	/// Tick period
	period: FemtoDuration,

	/// Time of the next tick
	next_tick: FemtoDuration,

	/// Policy
	policy: Box<dyn BankPolicy>,

	/// Telemetry
	telemetry: Box<dyn Telemetry + Send>,

	/// Shared state
	shared: Arc<SharedState>,

	/// Power trace, if any
	power_trace: Option<PowerTrace>,

	/// All mode changes so far
	mode_changes: Vec<ModeChange>,

	/// Ticks so far
	ticks: u64,
}

impl DtmScheduler {
	/// Creates a new scheduler, with the first tick after `period`.
	///
	/// # Panics
	/// Panics if `period` is zero.
	pub fn new(
		period: FemtoDuration,
		policy: Box<dyn BankPolicy>,
		telemetry: Box<dyn Telemetry + Send>,
		shared: Arc<SharedState>,
	) -> Self {
		assert!(!period.is_zero(), "Scheduler period must not be zero");
		Self {
			period,
			next_tick: period,
			policy,
			telemetry,
			shared,
			power_trace: None,
			mode_changes: vec![],
			ticks: 0,
		}
	}

	/// Writes a power trace every tick, computed by `model` and written by `writer`
	pub fn with_power_trace(mut self, model: BankPowerModel, writer: PowerTraceWriter) -> Self {
		let bank_count = self.shared.bank_count();
		self.power_trace = Some(PowerTrace {
			model,
			writer,
			last_accesses: vec![0; bank_count],
		});
		self
	}

	/// Returns the policy
	pub fn policy(&self) -> &dyn BankPolicy {
		&*self.policy
	}

	/// Returns all mode changes so far
	pub fn mode_changes(&self) -> &[ModeChange] {
		&self.mode_changes
	}

	/// Returns the number of ticks so far
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Runs all ticks due by `time`.
	///
	/// Returns the number of ticks run.
	pub fn advance(&mut self, time: FemtoDuration) -> Result<usize, anyhow::Error> {
		let mut ticks = 0;
		while self.next_tick <= time {
			let tick_time = self.next_tick;
			self.tick(tick_time)
				.with_context(|| format!("Unable to run scheduler tick at {tick_time}"))?;
			self.next_tick += self.period;
			ticks += 1;
		}

		Ok(ticks)
	}

	/// Runs a single tick at `time`
	pub fn tick(&mut self, time: FemtoDuration) -> Result<(), anyhow::Error> {
		self.ticks += 1;

		// Note: The power trace must be up to date before the thermal tool
		//       produces the temperatures we read next.
		if let Some(power_trace) = &mut self.power_trace {
			power_trace
				.write(&self.shared, self.period)
				.context("Unable to write power trace")?;
		}

		let bank_count = self.shared.bank_count();
		let temperatures = self.telemetry.bank_temperatures(bank_count);
		let unavailable = temperatures.iter().filter(|&&temperature| !policy::is_available(temperature)).count();
		if unavailable > 0 {
			tracing::debug!(%time, unavailable, "Bank temperatures unavailable, keeping their modes");
		}

		let old_modes = self.shared.bank_modes();
		let new_modes = self.policy.new_bank_modes(&old_modes, &temperatures);
		let changes = self.shared.install_bank_modes(new_modes);

		for (bank, mode) in changes {
			let temperature = temperatures[bank.to_usize()];
			match mode {
				BankMode::LowPower => tracing::info!(%time, temperature, "Thermal violation detected for bank {bank}"),
				BankMode::Normal => tracing::info!(%time, temperature, "Thermal violation ended for bank {bank}"),
			}

			self.mode_changes.push(ModeChange { time, bank, mode });
		}

		Ok(())
	}
}

/// Bank mode change
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ModeChange {
	/// Time of the tick that changed the mode
	pub time: FemtoDuration,

	/// Bank
	pub bank: BankIdx,

	/// New mode
	pub mode: BankMode,
}

/// Power trace state
#[derive(Debug)]
struct PowerTrace {
	/// Power model
	model: BankPowerModel,

	/// Writer
	writer: PowerTraceWriter,

	/// Per-bank accesses as of the last tick
	last_accesses: Vec<u64>,
}

impl PowerTrace {
	/// Writes the bank powers since the last tick
	fn write(&mut self, shared: &SharedState, timestep: FemtoDuration) -> Result<(), anyhow::Error> {
		let accesses = shared
			.epochs()
			.totals()
			.iter()
			.map(|counts| counts.total())
			.collect::<Vec<_>>();

		let powers = accesses
			.iter()
			.zip(&self.last_accesses)
			.map(|(&cur, &last)| self.model.bank_power(cur - last, timestep))
			.collect::<Vec<_>>();
		self.writer.write(&powers)?;
		self.last_accesses = accesses;

		Ok(())
	}
}
