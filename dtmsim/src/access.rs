//! Memory accesses

// Imports
use dtmsim_util::FemtoDuration;

/// A simulated memory access
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct MemoryAccess {
	/// Physical address
	pub address: u64,

	/// Requester core
	pub requester: u64,

	/// Access kind
	pub kind: AccessKind,

	/// Arrival time
	pub time: FemtoDuration,

	/// Payload size, in bytes
	pub size: u64,
}

/// Access kind
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub enum AccessKind {
	/// Read
	Read,

	/// Write
	Write,
}
