//! DRAM access traces

// Imports
use {
	crate::access::{AccessKind, MemoryAccess},
	anyhow::Context,
	byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
	dtmsim_util::{FemtoDuration, ReadByteArray},
	std::io,
};

/// Access trace reader
#[derive(Clone, Debug)]
pub struct AccessTraceReader<R> {
	/// Header
	header: Header,

	/// Records remaining
	records_remaining: u64,

	/// Reader
	reader: R,
}

impl<R: io::Read + io::Seek> AccessTraceReader<R> {
	/// Parses an access trace from a reader
	pub fn from_reader(mut reader: R) -> Result<Self, anyhow::Error> {
		// Read the magic
		let magic = reader.read_byte_array().context("Unable to read magic")?;
		anyhow::ensure!(magic == MAGIC, "Found wrong magic {magic:?}, expected {MAGIC:?}");

		// Read the header
		let header = Header::from_reader(&mut reader).context("Unable to read header")?;
		tracing::trace!(?header, "Parsed header");

		// Then check how many records there actually are
		let records_start = reader.stream_position().context("Unable to get stream position")?;
		let total_actual_size = reader.seek(io::SeekFrom::End(0)).context("Unable to get stream length")?;
		reader
			.seek(io::SeekFrom::Start(records_start))
			.context("Unable to seek back to records")?;

		let record_size = Record::BYTE_SIZE as u64;
		let total_expected_size = records_start + header.records * record_size;
		if total_actual_size != total_expected_size {
			tracing::warn!(
				"Access trace size differs from expected. Found {total_actual_size}, expected {total_expected_size}"
			);
		}
		let total_records = total_actual_size.saturating_sub(records_start) / record_size;

		Ok(Self {
			header,
			records_remaining: total_records.min(header.records),
			reader,
		})
	}

	/// Reads the next record
	pub fn read_next(&mut self) -> Result<Option<Record>, anyhow::Error> {
		// If we're done, return `None`
		if self.records_remaining == 0 {
			return Ok(None);
		}

		// Else parse the next record and reduce the remaining records
		let record = Record::from_reader(&mut self.reader).context("Unable to read record")?;
		self.records_remaining -= 1;

		Ok(Some(record))
	}

	/// Returns the remaining records
	pub fn records_remaining(&self) -> u64 {
		self.records_remaining
	}

	/// Returns the header
	pub fn header(&self) -> &Header {
		&self.header
	}
}

/// Access trace writer
#[derive(Clone, Debug)]
pub struct AccessTraceWriter<W> {
	/// Records written
	records_written: u64,

	/// Writer
	writer: W,
}

impl<W: io::Write + io::Seek> AccessTraceWriter<W> {
	/// Creates a new writer
	pub fn new(mut writer: W) -> Result<Self, anyhow::Error> {
		// Write the magic
		// Note: We rewind to ensure we write at the start, because we then
		//       later come back to write the header
		writer.rewind().context("Unable to rewind to start")?;
		writer.write_all(&MAGIC).context("Unable to write magic")?;

		// Then a placeholder header
		Header { records: 0 }
			.to_writer(&mut writer)
			.context("Unable to write header")?;

		Ok(Self {
			writer,
			records_written: 0,
		})
	}

	/// Writes a record
	pub fn write(&mut self, record: &Record) -> Result<(), anyhow::Error> {
		record.to_writer(&mut self.writer).context("Unable to write record")?;

		self.records_written += 1;
		Ok(())
	}

	/// Finishes writing
	pub fn finish(mut self) -> Result<W, anyhow::Error> {
		// Rewind the writer and write the header
		self.writer
			.seek(io::SeekFrom::Start(MAGIC.len() as u64))
			.context("Unable to seek to header")?;

		let header = Header {
			records: self.records_written,
		};
		header.to_writer(&mut self.writer).context("Unable to write header")?;
		self.writer.flush().context("Unable to flush writer")?;

		Ok(self.writer)
	}
}

/// Magic
pub const MAGIC: [u8; 8] = *b"DRAMTv0\0";

/// Header
#[derive(Clone, Copy, Debug)]
pub struct Header {
	/// Total records
	pub records: u64,
}

impl Header {
	/// Returns the size of this header
	pub const BYTE_SIZE: usize = 0x8;

	/// Parses a header from a reader
	pub fn from_reader<R: io::Read>(reader: &mut R) -> Result<Self, anyhow::Error> {
		let records = reader.read_u64::<LittleEndian>().context("Unable to read records")?;

		Ok(Self { records })
	}

	/// Writes a header to a writer
	pub fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<(), anyhow::Error> {
		writer
			.write_u64::<LittleEndian>(self.records)
			.context("Unable to write records")?;

		Ok(())
	}
}

/// Record
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Record {
	/// Timestamp
	pub time: FemtoDuration,

	/// Address, with the bits under [`Record::KIND_MASK`] cleared
	pub addr: u64,

	/// Access kind
	pub kind: AccessKind,

	/// Requester
	pub requester: u32,

	/// Size, in bytes
	pub size: u32,
}

impl Record {
	/// Returns the size of this record
	pub const BYTE_SIZE: usize = 0x18;
	/// Mask of the address bits that encode the kind
	pub const KIND_MASK: u64 = 0x3f;

	/// Parses a record from a reader
	pub fn from_reader<R: io::Read>(reader: &mut R) -> Result<Self, anyhow::Error> {
		let time = reader.read_u64::<LittleEndian>().context("Unable to read time")?;
		let addr_with_kind = reader
			.read_u64::<LittleEndian>()
			.context("Unable to read address + kind")?;
		let requester = reader.read_u32::<LittleEndian>().context("Unable to read requester")?;
		let size = reader.read_u32::<LittleEndian>().context("Unable to read size")?;

		let addr = addr_with_kind & !Self::KIND_MASK;
		let kind = match addr_with_kind & Self::KIND_MASK {
			0 => AccessKind::Read,
			1 => AccessKind::Write,
			kind => anyhow::bail!("Unknown access kind: {kind}"),
		};

		Ok(Self {
			time: FemtoDuration::from_femtos(time),
			addr,
			kind,
			requester,
			size,
		})
	}

	/// Writes a record to a writer
	pub fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<(), anyhow::Error> {
		writer
			.write_u64::<LittleEndian>(self.time.as_femtos())
			.context("Unable to write time")?;

		let kind_encoded = match self.kind {
			AccessKind::Read => 0b0,
			AccessKind::Write => 0b1,
		};
		let addr_with_kind = (self.addr & !Self::KIND_MASK) | kind_encoded;
		writer
			.write_u64::<LittleEndian>(addr_with_kind)
			.context("Unable to write address + kind")?;
		writer
			.write_u32::<LittleEndian>(self.requester)
			.context("Unable to write requester")?;
		writer
			.write_u32::<LittleEndian>(self.size)
			.context("Unable to write size")?;

		Ok(())
	}

	/// Returns the access of this record
	pub fn access(&self) -> MemoryAccess {
		MemoryAccess {
			address:   self.addr,
			requester: u64::from(self.requester),
			kind:      self.kind,
			time:      self.time,
			size:      u64::from(self.size),
		}
	}
}
