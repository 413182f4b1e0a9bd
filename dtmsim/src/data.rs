//! Output data

// Imports
use {
	crate::{bank::BankMode, epoch::BankCounts, stats::Stats},
	anyhow::Context,
	std::{fs, io, ops::Range, path::Path},
};

/// Output data.
///
/// All times are in femto-seconds.
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Data {
	pub time_span:    Option<Range<u64>>,
	pub bank_count:   usize,
	pub epochs:       EpochsData,
	pub mode_changes: Vec<ModeChangeData>,
	pub stats:        Stats,
}

impl Data {
	/// Writes this data to `path`.
	///
	/// Written as bincode if the extension is `bin`, else as json.
	pub fn write_to(&self, path: &Path) -> Result<(), anyhow::Error> {
		let file = fs::File::create(path).context("Unable to create output file")?;
		let mut writer = io::BufWriter::new(file);
		match DataFormat::from_path(path) {
			DataFormat::Json => serde_json::to_writer(&mut writer, self).context("Unable to write json output")?,
			DataFormat::Bincode => {
				bincode::encode_into_std_write(self, &mut writer, bincode::config::standard())
					.context("Unable to write bincode output")?;
			},
		}

		io::Write::flush(&mut writer).context("Unable to flush output file")
	}

	/// Reads data from `path`, in the format given by its extension
	pub fn read_from(path: &Path) -> Result<Self, anyhow::Error> {
		let file = fs::File::open(path).context("Unable to open input file")?;
		let mut reader = io::BufReader::new(file);
		let data = match DataFormat::from_path(path) {
			DataFormat::Json => serde_json::from_reader(reader).context("Unable to parse json input")?,
			DataFormat::Bincode => bincode::decode_from_std_read(&mut reader, bincode::config::standard())
				.context("Unable to parse bincode input")?,
		};

		Ok(data)
	}
}

/// Data format
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum DataFormat {
	Json,
	Bincode,
}

impl DataFormat {
	/// Returns the format of `path`, by its extension
	pub fn from_path(path: &Path) -> Self {
		match path.extension().and_then(|ext| ext.to_str()) {
			Some("bin") => Self::Bincode,
			_ => Self::Json,
		}
	}
}

/// Epochs data
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct EpochsData {
	pub width:  u64,
	pub epochs: Vec<EpochData>,
}

/// Epoch data
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct EpochData {
	pub start:  u64,
	pub reads:  u64,
	pub writes: u64,
	pub banks:  Vec<BankCounts>,
}

/// Mode change data
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct ModeChangeData {
	pub time: u64,
	pub bank: usize,
	pub mode: BankMode,
}

#[cfg(test)]
mod tests {
	use {super::*, crate::stats::Metric, pretty_assertions::assert_eq};

	fn data() -> Data {
		Data {
			time_span:    Some(0..2_000),
			bank_count:   2,
			epochs:       EpochsData {
				width:  1_000,
				epochs: vec![EpochData {
					start:  0,
					reads:  1,
					writes: 0,
					banks:  vec![
						BankCounts {
							reads: 1,
							..BankCounts::default()
						},
						BankCounts::default(),
					],
				}],
			},
			mode_changes: vec![ModeChangeData {
				time: 1_000,
				bank: 1,
				mode: BankMode::LowPower,
			}],
			stats:        Stats {
				metrics: vec![Metric {
					component: "dram".to_owned(),
					idx:       0,
					name:      "reads".to_owned(),
					value:     1,
				}],
			},
		}
	}

	#[test]
	fn format_by_extension() {
		assert_eq!(DataFormat::from_path(Path::new("out.bin")), DataFormat::Bincode);
		assert_eq!(DataFormat::from_path(Path::new("out.json")), DataFormat::Json);
		assert_eq!(DataFormat::from_path(Path::new("out")), DataFormat::Json);
	}

	#[test]
	fn written_data_reads_back() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		for name in ["output.json", "output.bin"] {
			let path = dir.path().join(name);
			data().write_to(&path).expect("Unable to write data");
			assert_eq!(Data::read_from(&path).expect("Unable to read data"), data());
		}
	}
}
