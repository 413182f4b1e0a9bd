//! Queueing delay models

// Modules
pub mod fcfs;
pub mod windowed_mg1;

// Exports
pub use self::{fcfs::Fcfs, windowed_mg1::WindowedMg1};

// Imports
use {dtmsim_util::FemtoDuration, std::fmt};

/// Queue model.
///
/// Models contention on a shared memory channel. Computing a delay never
/// blocks, it only returns how long the job would have waited.
pub trait QueueModel: fmt::Debug + Send {
	/// Admits a job arriving at `arrival`, taking `processing` to serve,
	/// and returns how long it waits before being served.
	fn compute_delay(&mut self, arrival: FemtoDuration, processing: FemtoDuration, requester: u64) -> FemtoDuration;

	/// Returns the name of this model
	fn name(&self) -> &'static str;
}

/// Queue model kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum QueueModelKind {
	/// First-come first-served single server
	Basic,

	/// M/G/1 over a sliding window of recent jobs
	WindowedMg1 {
		/// Window size
		window: FemtoDuration,
	},
}

impl QueueModelKind {
	/// Creates a queue model of this kind
	pub fn create(self) -> Box<dyn QueueModel> {
		match self {
			Self::Basic => Box::new(Fcfs::new()),
			Self::WindowedMg1 { window } => Box::new(WindowedMg1::new(window)),
		}
	}
}
