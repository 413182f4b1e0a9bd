//! Epoch statistics

// Imports
use {
	crate::{
		access::AccessKind,
		bank::{BankIdx, BankMode},
	},
	dtmsim_util::FemtoDuration,
};

/// Epoch statistics aggregator.
///
/// Buckets accesses into consecutive fixed-width windows. The series of closed
/// windows is always dense: windows without any accesses are still emitted, zero-filled.
#[derive(Clone, Debug)]
pub struct EpochAggregator {
	/// Window width
	width: FemtoDuration,

	/// Number of banks
	bank_count: usize,

	/// Live window, if any access was recorded since the last close
	live: Option<EpochBucket>,

	/// Start of the window after the last closed one
	next_start: Option<FemtoDuration>,

	/// Closed windows not yet drained
	closed: Vec<EpochBucket>,

	/// Per-bank counts of the last closed window with accesses
	exported: Vec<BankCounts>,

	/// Per-bank counts since the start
	totals: Vec<BankCounts>,
}

impl EpochAggregator {
	/// Creates an empty aggregator.
	///
	/// # Panics
	/// Panics if `width` is zero.
	pub fn new(width: FemtoDuration, bank_count: usize) -> Self {
		assert!(!width.is_zero(), "Epoch width must not be zero");
		Self {
			width,
			bank_count,
			live: None,
			next_start: None,
			closed: vec![],
			exported: vec![BankCounts::default(); bank_count],
			totals: vec![BankCounts::default(); bank_count],
		}
	}

	/// Returns the window width
	pub fn width(&self) -> FemtoDuration {
		self.width
	}

	/// Records an access to `bank`, in mode `mode`, at `time`.
	///
	/// Accesses earlier than the live window (from requesters running behind)
	/// are counted in the live window.
	///
	/// # Panics
	/// Panics if `bank` is out of range.
	pub fn record(&mut self, bank: BankIdx, kind: AccessKind, mode: BankMode, time: FemtoDuration) {
		let window_start = time.align_down(self.width);

		// If we're past the live window, move on to the new one
		let is_past_live = self.live.as_ref().map_or(true, |live| window_start > live.start);
		if is_past_live {
			self.close_live();
			self.open(window_start);
		}

		let live = self.live.as_mut().expect("Live window was just opened");
		if window_start < live.start {
			tracing::trace!(?time, live_start = ?live.start, "Late access counted in live window");
		}
		live.register(bank, kind, mode);
		self.totals[bank.to_usize()].register(kind, mode);
	}

	/// Closes the live window, if any.
	///
	/// The next recorded access opens a new window, after zero-filling any windows skipped since this one.
	pub fn close_live(&mut self) {
		let Some(live) = self.live.take() else {
			return;
		};

		tracing::trace!(start = ?live.start, reads = live.reads, writes = live.writes, "Closing epoch");
		self.next_start = Some(live.start + self.width);
		self.exported.clone_from(&live.banks);
		self.closed.push(live);
	}

	/// Opens a window at `start`, zero-filling all windows since the last closed one
	fn open(&mut self, start: FemtoDuration) {
		let start = match self.next_start {
			Some(mut next_start) => {
				while next_start < start {
					self.closed.push(EpochBucket::empty(next_start, self.bank_count));
					next_start += self.width;
				}

				// Note: Only after closing a live window explicitly can we be asked to open one in the past
				next_start.max(start)
			},
			None => start,
		};

		self.live = Some(EpochBucket::empty(start, self.bank_count));
	}

	/// Drains all closed windows, oldest first
	pub fn drain(&mut self) -> Vec<EpochBucket> {
		std::mem::take(&mut self.closed)
	}

	/// Returns the live window
	pub fn live(&self) -> Option<&EpochBucket> {
		self.live.as_ref()
	}

	/// Returns the per-bank counts of the last closed window with accesses.
	///
	/// Overwritten every time a window closes.
	pub fn exported(&self) -> &[BankCounts] {
		&self.exported
	}

	/// Returns the per-bank counts since the start
	pub fn totals(&self) -> &[BankCounts] {
		&self.totals
	}
}

/// Epoch bucket
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct EpochBucket {
	/// Window start
	pub start: FemtoDuration,

	/// Total reads
	pub reads: u64,

	/// Total writes
	pub writes: u64,

	/// Per-bank counts
	pub banks: Vec<BankCounts>,
}

impl EpochBucket {
	/// Creates an empty bucket
	pub fn empty(start: FemtoDuration, bank_count: usize) -> Self {
		Self {
			start,
			reads: 0,
			writes: 0,
			banks: vec![BankCounts::default(); bank_count],
		}
	}

	/// Returns if this bucket has no accesses
	pub fn is_empty(&self) -> bool {
		self.reads == 0 && self.writes == 0
	}

	/// Registers an access
	fn register(&mut self, bank: BankIdx, kind: AccessKind, mode: BankMode) {
		match kind {
			AccessKind::Read => self.reads += 1,
			AccessKind::Write => self.writes += 1,
		}
		self.banks[bank.to_usize()].register(kind, mode);
	}
}

/// Per-bank access counts, split by the mode the bank was in
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct BankCounts {
	pub reads:            u64,
	pub reads_low_power:  u64,
	pub writes:           u64,
	pub writes_low_power: u64,
}

impl BankCounts {
	/// Registers an access
	pub fn register(&mut self, kind: AccessKind, mode: BankMode) {
		let count = match (kind, mode) {
			(AccessKind::Read, BankMode::Normal) => &mut self.reads,
			(AccessKind::Read, BankMode::LowPower) => &mut self.reads_low_power,
			(AccessKind::Write, BankMode::Normal) => &mut self.writes,
			(AccessKind::Write, BankMode::LowPower) => &mut self.writes_low_power,
		};
		*count += 1;
	}

	/// Returns all accesses, in either mode
	pub fn total(&self) -> u64 {
		self.reads + self.reads_low_power + self.writes + self.writes_low_power
	}
}
