//! State shared by all controllers of a run

// Imports
use {
	crate::{
		bank::{BankIdx, BankMode, BankModes},
		decoder::ChannelRotation,
		epoch::EpochAggregator,
	},
	dtmsim_util::FemtoDuration,
	std::sync::{
		atomic::{self, AtomicBool},
		Arc,
		Mutex,
		MutexGuard,
		RwLock,
	},
};

/// Shared state.
///
/// Physical banks are shared by every core, so their modes, access statistics
/// and the channel rotation live here, behind an `Arc` handed to every controller.
/// Bank modes are only ever written by the power-state policy tick.
#[derive(Debug)]
pub struct SharedState {
	/// Bank modes
	bank_modes: RwLock<BankModes>,

	/// Epoch statistics
	epochs: Mutex<EpochAggregator>,

	/// Channel rotation
	rotation: Arc<ChannelRotation>,

	/// Whether we're in the region of interest
	in_roi: AtomicBool,
}

impl SharedState {
	/// Creates the shared state, with all banks in normal mode
	pub fn new(bank_count: usize, epoch_width: FemtoDuration) -> Self {
		Self {
			bank_modes: RwLock::new(BankModes::new(bank_count)),
			epochs: Mutex::new(EpochAggregator::new(epoch_width, bank_count)),
			rotation: Arc::new(ChannelRotation::new()),
			in_roi: AtomicBool::new(true),
		}
	}

	/// Returns the number of banks
	pub fn bank_count(&self) -> usize {
		self.bank_modes.read().expect("Bank modes lock was poisoned").len()
	}

	/// Returns the mode of `bank`
	pub fn bank_mode(&self, bank: BankIdx) -> BankMode {
		self.bank_modes.read().expect("Bank modes lock was poisoned").get(bank)
	}

	/// Returns a snapshot of all bank modes
	pub fn bank_modes(&self) -> BankModes {
		self.bank_modes.read().expect("Bank modes lock was poisoned").clone()
	}

	/// Installs new bank modes, returning every bank whose mode changed.
	///
	/// # Panics
	/// Panics if `modes` doesn't have a mode for every bank.
	pub fn install_bank_modes(&self, modes: BankModes) -> Vec<(BankIdx, BankMode)> {
		let mut bank_modes = self.bank_modes.write().expect("Bank modes lock was poisoned");
		assert_eq!(modes.len(), bank_modes.len(), "New bank modes must cover all banks");

		let changes = modes
			.iter()
			.filter(|&(bank, mode)| bank_modes.get(bank) != mode)
			.collect();
		*bank_modes = modes;

		changes
	}

	/// Locks the epoch statistics
	pub fn epochs(&self) -> MutexGuard<'_, EpochAggregator> {
		self.epochs.lock().expect("Epoch statistics lock was poisoned")
	}

	/// Returns the channel rotation
	pub fn rotation(&self) -> &Arc<ChannelRotation> {
		&self.rotation
	}

	/// Returns whether we're in the region of interest
	pub fn in_roi(&self) -> bool {
		self.in_roi.load(atomic::Ordering::Acquire)
	}

	/// Sets whether we're in the region of interest
	pub fn set_roi(&self, in_roi: bool) {
		self.in_roi.store(in_roi, atomic::Ordering::Release);
	}
}
