//! Configuration

// Imports
use {
	crate::{
		bandwidth::ComponentBandwidth,
		error::ConfigError,
		perf_model::{AccessCosts, PerfModelConfig, WriteConfig},
		policy::{BankPolicy, GridLayout, NeighboursPolicy, OffPolicy, PolicyKind, ThresholdPolicy, Thresholds},
		power::BankPowerModel,
		queue::QueueModelKind,
		topology::{BankTopology, StackType},
	},
	dtmsim_util::FemtoDuration,
	std::path::PathBuf,
};

/// Configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
	/// Trace skip
	pub trace_skip: usize,

	/// Debug output period (in seconds)
	pub debug_output_period_secs: f64,

	/// Cores
	pub cores: CoresConfig,

	/// Memory organization
	pub memory: MemoryConfig,

	/// DRAM timing
	pub dram: DramConfig,

	/// Epoch statistics
	pub epoch: EpochConfig,

	/// Dynamic thermal management
	pub dtm: DtmConfig,

	/// Bank power, if a power trace should be written
	#[serde(default)]
	pub power: Option<PowerConfig>,
}

/// Cores config
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct CoresConfig {
	pub application_cores: u64,
	pub total_requesters:  u64,
	pub block_size:        u64,
}

/// Memory config
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MemoryConfig {
	pub stack_type:               String,
	pub banks:                    u64,
	pub channels:                 u64,
	pub bank_offset:              u32,
	pub controllers_interleaving: u64,

	/// Whether to select channels round-robin instead of by requester
	#[serde(default)]
	pub round_robin_channels: bool,
}

/// DRAM config
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct DramConfig {
	pub enabled:                       bool,
	pub latency_ns:                    f64,
	pub low_power_latency_ns:          f64,
	pub per_controller_bandwidth_gbps: f64,

	/// Queue model, if queueing is enabled
	#[serde(default)]
	pub queue_model: Option<QueueModelConfig>,

	/// Whether to track per-address access counts
	#[serde(default)]
	pub track_address_counts: bool,

	/// Writes, if they differ from reads
	#[serde(default)]
	pub write: Option<DramWriteConfig>,
}

/// DRAM write config
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct DramWriteConfig {
	pub latency_ns:           f64,
	pub low_power_latency_ns: f64,

	/// Whether writes have their own queue
	#[serde(default)]
	pub separate_queue: bool,
}

/// Queue model config
#[derive(Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueModelConfig {
	Basic,
	WindowedMg1 { window_ns: u64 },
}

/// Epoch config
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct EpochConfig {
	pub width_us: u64,
}

/// Dynamic thermal management config
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct DtmConfig {
	pub policy:                String,
	pub critical_temperature:  f64,
	pub recovered_temperature: f64,
	pub banks_in_x:            usize,
	pub banks_in_y:            usize,
	pub banks_in_z:            usize,
	pub period_us:             u64,
	pub temperature_log:       PathBuf,
	pub power_log:             PathBuf,
}

/// Bank power config
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PowerConfig {
	pub energy_per_access_nj:  f64,
	pub static_power_w:        f64,
	pub energy_per_refresh_nj: f64,
	pub rows_per_refresh:      f64,
	pub refresh_interval_ns:   f64,
	pub power_trace:           PathBuf,

	#[serde(default)]
	pub full_power_trace: Option<PathBuf>,
}

impl Config {
	/// Validates the topology
	pub fn topology(&self) -> Result<BankTopology, ConfigError> {
		let memory = &self.memory;
		let stack_type = memory.stack_type.parse::<StackType>()?;
		let topology = BankTopology::new(
			stack_type,
			memory.banks,
			memory.channels,
			memory.bank_offset,
			memory.controllers_interleaving,
		)?;

		// Note: With round-robin channels, the requester never selects the channel
		if !memory.round_robin_channels {
			topology.check_requesters(self.cores.total_requesters)?;
		}

		Ok(topology)
	}

	/// Validates the performance model config
	pub fn perf_model(&self) -> Result<PerfModelConfig, ConfigError> {
		let cores = &self.cores;
		if cores.application_cores > cores.total_requesters {
			return Err(ConfigError::ApplicationCoresExceedRequesters {
				application_cores: cores.application_cores,
				requesters:        cores.total_requesters,
			});
		}
		if cores.block_size == 0 {
			return Err(ConfigError::Zero { what: "Block size" });
		}

		let dram = &self.dram;
		let queue = match dram.queue_model {
			Some(QueueModelConfig::Basic) => Some(QueueModelKind::Basic),
			Some(QueueModelConfig::WindowedMg1 { window_ns }) => match window_ns {
				0 => return Err(ConfigError::Zero { what: "Queue window" }),
				_ => Some(QueueModelKind::WindowedMg1 {
					window: FemtoDuration::from_nanos(window_ns),
				}),
			},
			None => None,
		};

		Ok(PerfModelConfig {
			enabled: dram.enabled,
			application_cores: cores.application_cores,
			bandwidth: ComponentBandwidth::from_gbytes_per_sec(dram.per_controller_bandwidth_gbps)?,
			queue,
			costs: AccessCosts {
				normal:    FemtoDuration::from_nanos_f64(dram.latency_ns),
				low_power: FemtoDuration::from_nanos_f64(dram.low_power_latency_ns),
			},
			write: dram.write.as_ref().map(|write| WriteConfig {
				costs:          AccessCosts {
					normal:    FemtoDuration::from_nanos_f64(write.latency_ns),
					low_power: FemtoDuration::from_nanos_f64(write.low_power_latency_ns),
				},
				separate_queue: write.separate_queue,
			}),
		})
	}

	/// Validates the epoch width
	pub fn epoch_width(&self) -> Result<FemtoDuration, ConfigError> {
		match self.epoch.width_us {
			0 => Err(ConfigError::Zero { what: "Epoch width" }),
			width => Ok(FemtoDuration::from_micros(width)),
		}
	}

	/// Validates the scheduler period
	pub fn dtm_period(&self) -> Result<FemtoDuration, ConfigError> {
		match self.dtm.period_us {
			0 => Err(ConfigError::Zero { what: "DTM period" }),
			period => Ok(FemtoDuration::from_micros(period)),
		}
	}

	/// Validates and creates the policy for `bank_count` banks
	pub fn policy(&self, bank_count: usize) -> Result<Box<dyn BankPolicy>, ConfigError> {
		let dtm = &self.dtm;
		let kind = dtm.policy.parse::<PolicyKind>()?;
		let thresholds = Thresholds::new(dtm.critical_temperature, dtm.recovered_temperature)?;

		let policy: Box<dyn BankPolicy> = match kind {
			PolicyKind::Off => Box::new(OffPolicy),
			PolicyKind::LowPower => Box::new(ThresholdPolicy::new(thresholds)),
			PolicyKind::Neighbours => {
				let grid = GridLayout::new(dtm.banks_in_x, dtm.banks_in_y, dtm.banks_in_z, bank_count)?;
				Box::new(NeighboursPolicy::new(thresholds, grid))
			},
		};

		Ok(policy)
	}

	/// Creates the bank power model, if any
	pub fn power_model(&self) -> Option<BankPowerModel> {
		self.power.as_ref().map(|power| {
			BankPowerModel::new(
				power.energy_per_access_nj,
				power.static_power_w,
				power.energy_per_refresh_nj,
				power.rows_per_refresh,
				FemtoDuration::from_nanos_f64(power.refresh_interval_ns),
			)
		})
	}
}
