//! First-come first-served queue

// Imports
use {super::QueueModel, dtmsim_util::FemtoDuration};

/// First-come first-served single server queue.
///
/// Each job waits until the server finishes every job admitted before it.
#[derive(Clone, Default, Debug)]
pub struct Fcfs {
	/// Time at which the server finishes all admitted jobs
	free_at: FemtoDuration,
}

impl Fcfs {
	/// Creates an empty queue
	pub fn new() -> Self {
		Self {
			free_at: FemtoDuration::ZERO,
		}
	}

	/// Returns the time at which the server finishes all admitted jobs
	pub fn free_at(&self) -> FemtoDuration {
		self.free_at
	}
}

impl QueueModel for Fcfs {
	fn compute_delay(&mut self, arrival: FemtoDuration, processing: FemtoDuration, _requester: u64) -> FemtoDuration {
		let delay = self.free_at.saturating_sub(arrival);
		self.free_at = self.free_at.max(arrival).saturating_add(processing);

		delay
	}

	fn name(&self) -> &'static str {
		"basic"
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	#[test]
	fn idle_server_has_no_delay() {
		let mut queue = Fcfs::new();
		let processing = FemtoDuration::from_nanos(10);
		assert_eq!(queue.compute_delay(FemtoDuration::from_nanos(0), processing, 0), FemtoDuration::ZERO);
		assert_eq!(queue.compute_delay(FemtoDuration::from_nanos(10), processing, 0), FemtoDuration::ZERO);
		assert_eq!(queue.compute_delay(FemtoDuration::from_nanos(100), processing, 0), FemtoDuration::ZERO);
	}

	#[test]
	fn burst_waits_for_previous_jobs() {
		let mut queue = Fcfs::new();
		let processing = FemtoDuration::from_nanos(8);
		let arrival = FemtoDuration::from_micros(1);

		let delays = (0..5)
			.map(|_| queue.compute_delay(arrival, processing, 0))
			.collect::<Vec<_>>();
		for (idx, delay) in delays.into_iter().enumerate() {
			assert!(delay >= processing * idx as u64, "Job {idx} waited only {delay}");
		}
	}

	#[test]
	fn partially_overlapping_job() {
		let mut queue = Fcfs::new();
		let processing = FemtoDuration::from_nanos(10);
		queue.compute_delay(FemtoDuration::ZERO, processing, 0);
		assert_eq!(
			queue.compute_delay(FemtoDuration::from_nanos(4), processing, 1),
			FemtoDuration::from_nanos(6)
		);
		assert_eq!(queue.free_at(), FemtoDuration::from_nanos(20));
	}
}
