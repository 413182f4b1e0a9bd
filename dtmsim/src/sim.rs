//! Simulator

// Imports
use {
	crate::{access_trace, access_trace::AccessTraceReader},
	anyhow::Context,
	dtmsim_util::FemtoDuration,
	std::{
		fmt,
		io,
		ops::Range,
		time::{Duration, Instant},
	},
};

/// Simulator
#[derive(Debug)]
pub struct Simulator {
	/// Trace skip
	///
	/// Dictates how many records are skipped for each trace.
	/// A value of 0 implies that the handler receives all records as traces,
	/// while a value of 1 implies it receives every other record as a trace.
	trace_skip: usize,

	/// Debug output period
	///
	/// Interval in which to output debug output for the handler
	debug_output_period: Duration,
}

impl Simulator {
	/// Creates a new simulator
	pub fn new(trace_skip: usize, debug_output_period: Duration) -> Self {
		Self {
			trace_skip,
			debug_output_period,
		}
	}

	/// Runs the simulator on all traces from `trace_reader` with handler `handler`
	pub fn run<H: Handler>(
		&mut self,
		trace_reader: &mut AccessTraceReader<impl io::Read + io::Seek>,
		handler: &mut H,
	) -> Result<RunOutput, anyhow::Error> {
		// Note: We start in the past so that we output right away at the start
		let mut last_debug_time = Instant::now()
			.checked_sub(self.debug_output_period)
			.unwrap_or_else(Instant::now);

		// Create the record iterator
		let total_records = trace_reader.records_remaining();
		let record_it = std::iter::from_fn(|| trace_reader.read_next().transpose());

		// Go through all records
		let mut first_time = None;
		let mut last_time = None;
		for (record_idx, record_res) in record_it.enumerate().step_by(self.trace_skip + 1) {
			let record = record_res.context("Unable to read next record")?;

			// Update the first and last time.
			// Note: Records are only ordered per requester, so we keep the extremes.
			first_time = Some(first_time.map_or(record.time, |time: FemtoDuration| time.min(record.time)));
			last_time = Some(last_time.map_or(record.time, |time: FemtoDuration| time.max(record.time)));

			// Handle each trace
			let trace = Trace { record };
			handler.handle_trace(trace).context("Unable to handle trace")?;

			// Then show debug output, if it's been long enough
			let cur_time = Instant::now();
			if cur_time.duration_since(last_debug_time) >= self.debug_output_period {
				let records_processed_percentage = 100.0 * (record_idx as f64 / total_records as f64);
				tracing::info!(
					"[{records_processed_percentage:.2}%] Debug: {}",
					dtmsim_util::DisplayWrapper::new(|f| handler.fmt_debug(f))
				);
				last_debug_time = cur_time;
			}
		}

		Ok(RunOutput {
			time_span: first_time
				.zip(last_time)
				.map(|(first, last)| first..(last + FemtoDuration::from_femtos(1))),
		})
	}
}

/// Output for [`Simulator::run`]
#[derive(Clone, Debug)]
pub struct RunOutput {
	/// Time span
	pub time_span: Option<Range<FemtoDuration>>,
}

/// Trace handler
pub trait Handler {
	/// Handles a trace
	fn handle_trace(&mut self, trace: Trace) -> Result<(), anyhow::Error>;

	/// Formats debug output to `f`.
	fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error>;
}

/// Trace
#[derive(Clone, Copy, Debug)]
pub struct Trace {
	/// Record that originated this trace
	pub record: access_trace::Record,
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{access::AccessKind, access_trace::AccessTraceWriter},
		pretty_assertions::assert_eq,
		std::io::Cursor,
	};

	/// Handler that keeps every trace
	#[derive(Default)]
	struct Collect(Vec<Trace>);

	impl Handler for Collect {
		fn handle_trace(&mut self, trace: Trace) -> Result<(), anyhow::Error> {
			self.0.push(trace);
			Ok(())
		}

		fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
			write!(f, "{} traces", self.0.len())
		}
	}

	fn trace_reader(times_ns: &[u64]) -> AccessTraceReader<Cursor<Vec<u8>>> {
		let mut writer = AccessTraceWriter::new(Cursor::new(vec![])).expect("Unable to create writer");
		for &time_ns in times_ns {
			writer
				.write(&access_trace::Record {
					time:      FemtoDuration::from_nanos(time_ns),
					addr:      0x40,
					kind:      AccessKind::Read,
					requester: 0,
					size:      64,
				})
				.expect("Unable to write record");
		}
		let mut cursor = writer.finish().expect("Unable to finish writer");
		cursor.set_position(0);
		AccessTraceReader::from_reader(cursor).expect("Unable to create reader")
	}

	#[test]
	fn runs_all_traces() {
		let mut reader = trace_reader(&[10, 5, 20]);
		let mut handler = Collect::default();
		let output = Simulator::new(0, Duration::from_secs(60))
			.run(&mut reader, &mut handler)
			.expect("Unable to run");

		assert_eq!(handler.0.len(), 3);
		assert_eq!(
			output.time_span,
			Some(FemtoDuration::from_nanos(5)..FemtoDuration::from_nanos(20) + FemtoDuration::from_femtos(1))
		);
	}

	#[test]
	fn skips_traces() {
		let mut reader = trace_reader(&[0, 1, 2, 3, 4]);
		let mut handler = Collect::default();
		Simulator::new(1, Duration::from_secs(60))
			.run(&mut reader, &mut handler)
			.expect("Unable to run");

		let times = handler.0.iter().map(|trace| trace.record.time).collect::<Vec<_>>();
		assert_eq!(times, [0, 2, 4].map(FemtoDuration::from_nanos));
	}
}
