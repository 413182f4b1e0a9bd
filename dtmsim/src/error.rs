//! Errors

/// Configuration error.
///
/// Detected while validating the configuration, before any access is simulated.
#[derive(PartialEq, Clone, Debug, thiserror::Error)]
pub enum ConfigError {
	/// Unknown stack type name
	#[error("Unknown stack type {name:?}, expected one of \"DDR\", \"3D\", \"3Dmem\" or \"2.5D\"")]
	UnknownStackType { name: String },

	/// A count that must be positive was zero
	#[error("{what} must not be zero")]
	Zero { what: &'static str },

	/// Channel count doesn't divide the bank count
	#[error("Channel count {channels} does not divide bank count {banks}")]
	ChannelsDontDivideBanks { banks: u64, channels: u64 },

	/// Planar bank count isn't a power of two, so some bank addresses would be out of range
	#[error("Planar bank count ({banks}) must be a power of two")]
	PlanarBanksNotPowerOfTwo { banks: u64 },

	/// Bank address bits don't fit in an address
	#[error("Bank address (offset {offset}, {bits} bits) does not fit in a 64-bit address")]
	BankAddressOutOfRange { offset: u32, bits: u32 },

	/// Requesters would be mapped past the last channel
	#[error("{requesters} requesters with controller interleaving {interleaving} exceed {channels} channels")]
	RequestersExceedChannels {
		requesters:   u64,
		interleaving: u64,
		channels:     u64,
	},

	/// Application cores exceed total requesters
	#[error("Application cores ({application_cores}) exceed total requesters ({requesters})")]
	ApplicationCoresExceedRequesters { application_cores: u64, requesters: u64 },

	/// Critical temperature is below the recovered temperature
	#[error("Critical temperature ({critical}) must not be below recovered temperature ({recovered})")]
	ThresholdsInverted { critical: f64, recovered: f64 },

	/// Bank grid doesn't cover every bank exactly once
	#[error("Bank grid {x}x{y}x{z} does not match bank count {banks}")]
	GridMismatch { x: u64, y: u64, z: u64, banks: u64 },

	/// Unknown policy name
	#[error("Unknown DTM policy {name:?}, expected one of \"off\", \"lowpower\" or \"neighbours\"")]
	UnknownPolicy { name: String },
}
