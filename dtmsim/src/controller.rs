//! DRAM controller

// Imports
use {
	crate::{
		access::{AccessKind, MemoryAccess},
		bank::{BankIdx, BankMode},
		perf_model::{AccessOutcome, DramPerfModel, PerfModelStats},
		shared::SharedState,
	},
	dtmsim_util::FemtoDuration,
	std::{
		collections::{BTreeMap, HashMap},
		fmt,
		sync::Arc,
	},
};

/// DRAM controller.
///
/// Entry point of every access that reaches the DRAM from a core. Runs the
/// performance model, counts the access and records it in the epoch statistics.
#[derive(Debug)]
pub struct DramController {
	/// Core this controller belongs to
	core: u64,

	/// Cache block size
	block_size: u64,

	/// Performance model
	perf_model: DramPerfModel,

	/// Shared state
	shared: Arc<SharedState>,

	/// Fault injection, if enabled
	fault_injection: Option<FaultInjection>,

	/// Per-address access counts, if tracked
	address_counts: Option<BTreeMap<(u64, AccessKind), u64>>,

	/// Reads
	reads: u64,

	/// Writes
	writes: u64,
}

impl DramController {
	/// Creates a new controller for `core`
	pub fn new(core: u64, block_size: u64, perf_model: DramPerfModel, shared: Arc<SharedState>) -> Self {
		Self {
			core,
			block_size,
			perf_model,
			shared,
			fault_injection: None,
			address_counts: None,
			reads: 0,
			writes: 0,
		}
	}

	/// Enables fault injection with `injector`
	pub fn with_fault_injector(mut self, injector: Box<dyn FaultInjector>) -> Self {
		self.fault_injection = Some(FaultInjection {
			injector,
			data: HashMap::new(),
		});
		self
	}

	/// Enables tracking of per-address access counts
	pub fn with_address_counts(mut self) -> Self {
		self.address_counts = Some(BTreeMap::new());
		self
	}

	/// Returns the core of this controller
	pub fn core(&self) -> u64 {
		self.core
	}

	/// Returns the number of reads
	pub fn reads(&self) -> u64 {
		self.reads
	}

	/// Returns the number of writes
	pub fn writes(&self) -> u64 {
		self.writes
	}

	/// Returns the performance model statistics
	pub fn perf_stats(&self) -> &PerfModelStats {
		self.perf_model.stats()
	}

	/// Reads the block at `address` for `requester`, returning the access latency.
	///
	/// With fault injection enabled, the stored block is copied into `data`,
	/// after the injector had a chance to corrupt it.
	pub fn get_data_from_dram(
		&mut self,
		address: u64,
		requester: u64,
		data: Option<&mut [u8]>,
		time: FemtoDuration,
	) -> FemtoDuration {
		if let Some(fault_injection) = &mut self.fault_injection {
			let block_size = self.block_size as usize;
			let block = fault_injection
				.data
				.entry(address)
				.or_insert_with(|| vec![0; block_size]);
			fault_injection.injector.pre_read(address, block, time);

			if let Some(data) = data {
				let len = data.len().min(block.len());
				data[..len].copy_from_slice(&block[..len]);
			}
		}

		let latency = self.access(address, requester, AccessKind::Read, time);
		self.reads += 1;
		tracing::trace!(core = self.core, address = format_args!("{address:#x}"), %latency, "Read");

		latency
	}

	/// Writes the block at `address` for `requester`, returning the access latency.
	///
	/// With fault injection enabled, `data` is stored and the injector is then
	/// given a chance to corrupt it.
	pub fn put_data_to_dram(
		&mut self,
		address: u64,
		requester: u64,
		data: Option<&[u8]>,
		time: FemtoDuration,
	) -> FemtoDuration {
		if let Some(fault_injection) = &mut self.fault_injection {
			let block_size = self.block_size as usize;
			let block = fault_injection.data.entry(address).or_insert_with(|| {
				tracing::warn!(address = format_args!("{address:#x}"), "Writing block that was never read");
				vec![0; block_size]
			});
			if let Some(data) = data {
				let len = data.len().min(block.len());
				block[..len].copy_from_slice(&data[..len]);
			}

			fault_injection.injector.post_write(address, block, time);
		}

		let latency = self.access(address, requester, AccessKind::Write, time);
		self.writes += 1;
		tracing::trace!(core = self.core, address = format_args!("{address:#x}"), %latency, "Write");

		latency
	}

	/// Runs the performance model and records the access
	fn access(&mut self, address: u64, requester: u64, kind: AccessKind, time: FemtoDuration) -> FemtoDuration {
		let access = MemoryAccess {
			address,
			requester,
			kind,
			time,
			size: self.block_size,
		};
		let AccessOutcome { latency, bank, .. } = self.perf_model.access_latency(&access);

		if let Some(address_counts) = &mut self.address_counts {
			*address_counts.entry((address, kind)).or_default() += 1;
		}

		if self.shared.in_roi() {
			// Note: Accesses the model didn't decode still count towards the bank statistics.
			let (bank, mode) = bank.unwrap_or_else(|| self.decode(address, requester));
			self.shared.epochs().record(bank, kind, mode, time);
		}

		latency
	}

	/// Decodes the bank of an access and its current mode
	fn decode(&self, address: u64, requester: u64) -> (BankIdx, BankMode) {
		let bank = self.perf_model.decoder().decode(address, requester);
		(bank, self.shared.bank_mode(bank))
	}

	/// Returns all addresses accessed more than `threshold` times, by kind.
	///
	/// Returns an empty list if address counts aren't tracked.
	pub fn hot_addresses(&self, threshold: u64) -> Vec<(u64, AccessKind, u64)> {
		self.address_counts
			.iter()
			.flatten()
			.filter(|&(_, &count)| count > threshold)
			.map(|(&(address, kind), &count)| (address, kind, count))
			.collect()
	}
}

/// Fault injector.
///
/// Given mutable access to the stored contents of a block around each access.
pub trait FaultInjector: fmt::Debug + Send {
	/// Called before the block at `address` is read
	fn pre_read(&mut self, address: u64, data: &mut [u8], time: FemtoDuration);

	/// Called after the block at `address` is written
	fn post_write(&mut self, address: u64, data: &mut [u8], time: FemtoDuration);
}

/// Fault injection state
#[derive(Debug)]
struct FaultInjection {
	/// Injector
	injector: Box<dyn FaultInjector>,

	/// Stored blocks
	data: HashMap<u64, Vec<u8>>,
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{
			bandwidth::ComponentBandwidth,
			bank::BankModes,
			decoder::{BankDecoder, ChannelSelect},
			epoch::BankCounts,
			perf_model::{AccessCosts, PerfModelConfig},
			topology::{BankTopology, StackType},
		},
		pretty_assertions::assert_eq,
		std::sync::Mutex,
	};

	fn controller(shared: &Arc<SharedState>, application_cores: u64) -> DramController {
		let topology = BankTopology::new(StackType::PlanarDdr, 8, 1, 14, 1).expect("Valid topology");
		let config = PerfModelConfig {
			enabled: true,
			application_cores,
			bandwidth: ComponentBandwidth::from_bits_per_micro(64_000).expect("Valid bandwidth"),
			queue: None,
			costs: AccessCosts {
				normal:    FemtoDuration::from_nanos(45),
				low_power: FemtoDuration::from_nanos(90),
			},
			write: None,
		};
		let perf_model = DramPerfModel::new(
			config,
			BankDecoder::new(topology, ChannelSelect::Partitioned),
			Arc::clone(shared),
		);
		DramController::new(0, 64, perf_model, Arc::clone(shared))
	}

	fn shared() -> Arc<SharedState> {
		Arc::new(SharedState::new(8, FemtoDuration::from_micros(1000)))
	}

	#[test]
	fn counts_reads_and_writes() {
		let shared = shared();
		let mut controller = controller(&shared, 4);
		let read_latency = controller.get_data_from_dram(0x10000, 0, None, FemtoDuration::ZERO);
		controller.put_data_to_dram(0x10000, 0, None, FemtoDuration::from_nanos(100));
		controller.put_data_to_dram(0x0, 0, None, FemtoDuration::from_nanos(200));

		assert_eq!(read_latency, FemtoDuration::from_nanos(8 + 45));
		assert_eq!((controller.reads(), controller.writes()), (1, 2));
		assert_eq!(controller.perf_stats().accesses, 3);

		let epochs = shared.epochs();
		let live = epochs.live().expect("Live window");
		assert_eq!((live.reads, live.writes), (1, 2));
	}

	#[test]
	fn write_is_classified_by_its_own_bank() {
		let shared = shared();
		let mut controller = controller(&shared, 4);
		controller.get_data_from_dram(0x10000, 0, None, FemtoDuration::ZERO);
		controller.put_data_to_dram(0x1c000, 0, None, FemtoDuration::ZERO);

		let epochs = shared.epochs();
		let live = epochs.live().expect("Live window");
		assert_eq!(live.banks[4], BankCounts {
			reads: 1,
			..BankCounts::default()
		});
		assert_eq!(live.banks[7], BankCounts {
			writes: 1,
			..BankCounts::default()
		});
	}

	#[test]
	fn low_power_accesses_are_split() {
		let shared = shared();
		let mut modes = BankModes::new(8);
		modes.set(BankIdx::new(4), BankMode::LowPower);
		shared.install_bank_modes(modes);

		let mut controller = controller(&shared, 4);
		let latency = controller.get_data_from_dram(0x10000, 0, None, FemtoDuration::ZERO);
		assert_eq!(latency, FemtoDuration::from_nanos(8 + 90));

		let epochs = shared.epochs();
		assert_eq!(epochs.totals()[4].reads_low_power, 1);
		assert_eq!(epochs.totals()[4].reads, 0);
	}

	#[test]
	fn system_traffic_is_free_but_counted() {
		let shared = shared();
		let mut controller = controller(&shared, 1);
		let latency = controller.get_data_from_dram(0x10000, 3, None, FemtoDuration::ZERO);

		assert_eq!(latency, FemtoDuration::ZERO);
		assert_eq!(controller.reads(), 1);
		assert_eq!(shared.epochs().totals()[4].reads, 1);
	}

	#[test]
	fn outside_roi_isnt_recorded() {
		let shared = shared();
		let mut controller = controller(&shared, 4);
		shared.set_roi(false);
		controller.get_data_from_dram(0x10000, 0, None, FemtoDuration::ZERO);

		assert_eq!(controller.reads(), 1);
		assert!(shared.epochs().live().is_none());
	}

	#[test]
	fn hot_addresses() {
		let shared = shared();
		let mut controller = controller(&shared, 4).with_address_counts();
		for _ in 0..3 {
			controller.get_data_from_dram(0x40, 0, None, FemtoDuration::ZERO);
		}
		controller.get_data_from_dram(0x80, 0, None, FemtoDuration::ZERO);

		assert_eq!(controller.hot_addresses(2), [(0x40, AccessKind::Read, 3)]);
		assert_eq!(controller.hot_addresses(0).len(), 2);
	}

	/// Fault injector that flips the first bit of every block and logs its calls
	#[derive(Debug)]
	struct BitFlipper(Arc<Mutex<Vec<(&'static str, u64)>>>);

	impl FaultInjector for BitFlipper {
		fn pre_read(&mut self, address: u64, data: &mut [u8], _time: FemtoDuration) {
			self.0.lock().expect("Poisoned").push(("pre_read", address));
			data[0] ^= 1;
		}

		fn post_write(&mut self, address: u64, _data: &mut [u8], _time: FemtoDuration) {
			self.0.lock().expect("Poisoned").push(("post_write", address));
		}
	}

	#[test]
	fn fault_injection() {
		let calls = Arc::new(Mutex::new(vec![]));
		let shared = shared();
		let mut controller = controller(&shared, 4).with_fault_injector(Box::new(BitFlipper(Arc::clone(&calls))));

		let mut data = [0xff; 64];
		controller.get_data_from_dram(0x40, 0, Some(&mut data), FemtoDuration::ZERO);
		assert_eq!(data[0], 1);
		assert_eq!(data[1], 0);

		controller.put_data_to_dram(0x40, 0, Some(&[0x10; 64]), FemtoDuration::ZERO);
		controller.get_data_from_dram(0x40, 0, Some(&mut data), FemtoDuration::ZERO);
		assert_eq!(data[0], 0x11);

		assert_eq!(*calls.lock().expect("Poisoned"), [
			("pre_read", 0x40),
			("post_write", 0x40),
			("pre_read", 0x40)
		]);
	}
}
