//! Windowed M/G/1 queue

// Imports
use {super::QueueModel, dtmsim_util::FemtoDuration, std::collections::VecDeque};

/// M/G/1 queue estimated over a sliding window of recent jobs.
///
/// Returns the Pollaczek-Khinchine mean waiting time of the jobs admitted
/// within the window, `Σs² / (2·(W - Σs))`, in integer femto-seconds.
#[derive(Clone, Debug)]
pub struct WindowedMg1 {
	/// Window size
	window: FemtoDuration,

	/// Jobs within the window, as `(arrival, service)`
	jobs: VecDeque<(FemtoDuration, FemtoDuration)>,

	/// Sum of the service times within the window
	service_sum: u128,

	/// Sum of the squared service times within the window
	service_sq_sum: u128,
}

impl WindowedMg1 {
	/// Utilization cap, in parts per `UTILIZATION_SCALE`
	const MAX_UTILIZATION: u128 = 9_999;
	/// Utilization scale
	const UTILIZATION_SCALE: u128 = 10_000;

	/// Creates an empty queue with window `window`.
	///
	/// # Panics
	/// Panics if `window` is zero.
	pub fn new(window: FemtoDuration) -> Self {
		assert!(!window.is_zero(), "Window must not be zero");
		Self {
			window,
			jobs: VecDeque::new(),
			service_sum: 0,
			service_sq_sum: 0,
		}
	}

	/// Drops all jobs that arrived before the window ending at `now`
	fn drop_old_jobs(&mut self, now: FemtoDuration) {
		// Note: Jobs arriving out of order from other requesters may linger a bit longer,
		//       we only ever look at the front.
		while let Some(&(arrival, service)) = self.jobs.front() {
			if arrival.saturating_add(self.window) > now {
				break;
			}

			let service = u128::from(service.as_femtos());
			self.service_sum -= service;
			self.service_sq_sum -= service * service;
			self.jobs.pop_front();
		}
	}
}

impl QueueModel for WindowedMg1 {
	fn compute_delay(&mut self, arrival: FemtoDuration, processing: FemtoDuration, _requester: u64) -> FemtoDuration {
		self.drop_old_jobs(arrival);

		let window = u128::from(self.window.as_femtos());
		let delay = match self.jobs.is_empty() {
			true => 0,
			false => {
				let max_busy = window * Self::MAX_UTILIZATION / Self::UTILIZATION_SCALE;
				let idle = window - self.service_sum.min(max_busy);
				self.service_sq_sum / (2 * idle)
			},
		};

		let service = u128::from(processing.as_femtos());
		self.jobs.push_back((arrival, processing));
		self.service_sum += service;
		self.service_sq_sum += service * service;

		FemtoDuration::from_femtos(u64::try_from(delay).unwrap_or(u64::MAX))
	}

	fn name(&self) -> &'static str {
		"windowed_mg1"
	}
}
