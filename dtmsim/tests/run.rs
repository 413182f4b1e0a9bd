//! End-to-end runs over generated access traces

// Imports
use {
	dtmsim::{
		access_trace::Record,
		bank::BankMode,
		data::Data,
		telemetry::{Telemetry, UNAVAILABLE},
		AccessKind,
		AccessTraceReader,
		AccessTraceWriter,
		Config,
		DramSystem,
		Simulator,
	},
	dtmsim_util::FemtoDuration,
	pretty_assertions::assert_eq,
	std::{fs, io, path::Path, time::Duration},
};

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
		"policy": "lowpower",
		"critical_temperature": 80.0,
		"recovered_temperature": 60.0,
		"banks_in_x": 2,
		"banks_in_y": 2,
		"banks_in_z": 2,
		"period_us": 2,
		"temperature_log": "InstantaneousTemperature.log",
		"power_log": "InstantaneousPower.log"
	}
}"#;

/// Telemetry with a single hot bank
#[derive(Debug)]
struct HotBank(usize);

impl Telemetry for HotBank {
	fn temperature(&self, component: &str) -> f64 {
		match component.strip_prefix("B_").and_then(|idx| idx.parse::<usize>().ok()) {
			Some(bank) if bank == self.0 => 90.0,
			Some(_) => 40.0,
			None => UNAVAILABLE,
		}
	}

	fn power(&self, _component: &str) -> f64 {
		UNAVAILABLE
	}

	fn peak_temperature(&self) -> f64 {
		90.0
	}
}

fn record(time_ns: u64, bank: u64, kind: AccessKind, requester: u32) -> Record {
	Record {
		time: FemtoDuration::from_nanos(time_ns),
		addr: bank << 14,
		kind,
		requester,
		size: 64,
	}
}

fn write_trace(path: &Path, records: &[Record]) {
	let file = fs::File::create(path).expect("Unable to create trace");
	let mut writer = AccessTraceWriter::new(io::BufWriter::new(file)).expect("Unable to create trace writer");
	for record in records {
		writer.write(record).expect("Unable to write record");
	}
	writer.finish().expect("Unable to finish trace");
}

fn run(trace_path: &Path, config: &Config) -> Data {
	let file = fs::File::open(trace_path).expect("Unable to open trace");
	let mut reader = AccessTraceReader::from_reader(io::BufReader::new(file)).expect("Unable to read trace");

	let mut system = DramSystem::with_telemetry(config, Box::new(HotBank(3))).expect("Unable to create system");
	let output = Simulator::new(config.trace_skip, Duration::from_secs_f64(config.debug_output_period_secs))
		.run(&mut reader, &mut system)
		.expect("Unable to run simulator");

	system.finish(output.time_span)
}

#[test]
fn hot_bank_is_throttled() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let trace_path = dir.path().join("input.trace");
	write_trace(&trace_path, &[
		record(500, 3, AccessKind::Read, 0),
		record(3_500, 3, AccessKind::Write, 1),
		record(5_500, 0, AccessKind::Read, 0),
	]);

	let config = serde_json::from_str::<Config>(CONFIG).expect("Unable to parse config");
	let data = run(&trace_path, &config);

	// Dense epochs, from the first access to the last
	assert_eq!(data.bank_count, 8);
	assert_eq!(data.epochs.width, FemtoDuration::from_micros(1).as_femtos());
	let starts = data.epochs.epochs.iter().map(|epoch| epoch.start).collect::<Vec<_>>();
	assert_eq!(starts, (0..6).map(|us| FemtoDuration::from_micros(us).as_femtos()).collect::<Vec<_>>());

	let accesses = data
		.epochs
		.epochs
		.iter()
		.map(|epoch| epoch.reads + epoch.writes)
		.collect::<Vec<_>>();
	assert_eq!(accesses, [1, 0, 0, 1, 0, 1]);

	// The bank was throttled on the first tick, so the write happened in low power
	let throttled_epoch = &data.epochs.epochs[3];
	assert_eq!(throttled_epoch.banks[3].writes_low_power, 1);
	assert_eq!(throttled_epoch.banks[3].writes, 0);
	assert_eq!(data.epochs.epochs[0].banks[3].reads, 1);

	assert_eq!(data.mode_changes.len(), 1);
	assert_eq!(data.mode_changes[0].time, FemtoDuration::from_micros(2).as_femtos());
	assert_eq!(data.mode_changes[0].bank, 3);
	assert_eq!(data.mode_changes[0].mode, BankMode::LowPower);

	assert_eq!(data.stats.sum("dram", "reads"), 2);
	assert_eq!(data.stats.sum("dram", "writes"), 1);
	assert_eq!(data.stats.get("dram", 3, "bank_mode"), Some(BankMode::LowPower.stat_value()));
	assert_eq!(data.stats.get("dram", 0, "bank_read_access_counter"), Some(1));

	// The output reads back the same, in either format
	for name in ["output.json", "output.bin"] {
		let output_path = dir.path().join(name);
		data.write_to(&output_path).expect("Unable to write output");
		assert_eq!(Data::read_from(&output_path).expect("Unable to read output"), data);
	}
}

#[test]
fn off_policy_never_throttles() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let trace_path = dir.path().join("input.trace");
	let records = (0..50)
		.map(|idx| record(idx * 200, 3, AccessKind::Read, (idx % 2) as u32))
		.collect::<Vec<_>>();
	write_trace(&trace_path, &records);

	let mut config = serde_json::from_str::<Config>(CONFIG).expect("Unable to parse config");
	config.dtm.policy = "off".to_owned();
	let data = run(&trace_path, &config);

	assert!(data.mode_changes.is_empty());
	assert_eq!(data.epochs.epochs.len(), 10);
	assert!(data.epochs.epochs.iter().all(|epoch| epoch.reads == 5));
	assert_eq!(data.stats.sum("dram", "reads"), 50);
}

#[test]
fn requester_past_controllers_is_an_error() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let trace_path = dir.path().join("input.trace");
	write_trace(&trace_path, &[record(0, 0, AccessKind::Read, 5)]);

	let config = serde_json::from_str::<Config>(CONFIG).expect("Unable to parse config");
	let file = fs::File::open(&trace_path).expect("Unable to open trace");
	let mut reader = AccessTraceReader::from_reader(io::BufReader::new(file)).expect("Unable to read trace");
	let mut system = DramSystem::with_telemetry(&config, Box::new(HotBank(3))).expect("Unable to create system");
	assert!(Simulator::new(0, Duration::from_secs(60))
		.run(&mut reader, &mut system)
		.is_err());
}
