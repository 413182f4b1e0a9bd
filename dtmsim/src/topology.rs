//! Bank topology

// Imports
use {crate::error::ConfigError, std::str::FromStr};

/// Stack type
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum StackType {
	/// Planar DDR, a single layer of banks
	#[serde(rename = "DDR")]
	PlanarDdr,

	/// 3D-stacked memory on top of the cores
	#[serde(rename = "3D")]
	Stacked3d,

	/// 2.5D memory cube, beside the cores on an interposer
	#[serde(rename = "2.5D")]
	Stacked2_5d,

	/// Stand-alone 3D memory cube
	#[serde(rename = "3Dmem")]
	MemoryCube,
}

impl StackType {
	/// Returns if this is a stacked topology, with banks split into layers by channel
	pub fn is_stacked(self) -> bool {
		!matches!(self, Self::PlanarDdr)
	}

	/// Returns the configuration name of this stack type
	pub fn name(self) -> &'static str {
		match self {
			Self::PlanarDdr => "DDR",
			Self::Stacked3d => "3D",
			Self::Stacked2_5d => "2.5D",
			Self::MemoryCube => "3Dmem",
		}
	}
}

impl FromStr for StackType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"DDR" => Ok(Self::PlanarDdr),
			"3D" => Ok(Self::Stacked3d),
			"2.5D" => Ok(Self::Stacked2_5d),
			"3Dmem" => Ok(Self::MemoryCube),
			_ => Err(ConfigError::UnknownStackType { name: s.to_owned() }),
		}
	}
}

/// Bank topology.
///
/// Immutable once created. All derived fields are computed by [`BankTopology::new`],
/// which also validates that every decodable bank index is in range.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct BankTopology {
	/// Stack type
	stack_type: StackType,

	/// Total number of banks
	bank_count: u64,

	/// Number of channels
	channel_count: u64,

	/// Bits of the bank address, `ceil(log2(bank_count))`
	bank_address_bits: u32,

	/// Offset of the bank address in the physical address
	bank_offset: u32,

	/// Banks per layer
	banks_per_layer: u64,

	/// Banks per channel, minus one, used as a mask
	banks_per_channel_mask: u64,

	/// Requesters sharing a memory controller
	controllers_interleaving: u64,
}

impl BankTopology {
	/// Creates and validates a topology.
	///
	/// # Errors
	/// Returns an error if any bank index this topology decodes to could be out of range.
	pub fn new(
		stack_type: StackType,
		bank_count: u64,
		channel_count: u64,
		bank_offset: u32,
		controllers_interleaving: u64,
	) -> Result<Self, ConfigError> {
		if bank_count == 0 {
			return Err(ConfigError::Zero { what: "Bank count" });
		}
		if channel_count == 0 {
			return Err(ConfigError::Zero { what: "Channel count" });
		}
		if controllers_interleaving == 0 {
			return Err(ConfigError::Zero {
				what: "Controllers interleaving",
			});
		}
		if bank_count % channel_count != 0 {
			return Err(ConfigError::ChannelsDontDivideBanks {
				banks:    bank_count,
				channels: channel_count,
			});
		}

		let bank_address_bits = bank_count.next_power_of_two().trailing_zeros();
		// Note: The offset itself must also be a valid shift, even without any bank address bits
		if bank_offset >= u64::BITS || u64::from(bank_offset) + u64::from(bank_address_bits) > u64::from(u64::BITS) {
			return Err(ConfigError::BankAddressOutOfRange {
				offset: bank_offset,
				bits:   bank_address_bits,
			});
		}

		let banks_per_channel = bank_count / channel_count;
		let banks_per_layer = match stack_type.is_stacked() {
			true => {
				// Note: The mask still keeps decoded banks in range, but some layers are never decoded
				if !banks_per_channel.is_power_of_two() {
					tracing::warn!(
						banks_per_channel,
						mask = banks_per_channel - 1,
						"Banks per channel isn't a power of two, some layers will never be accessed"
					);
				}
				channel_count
			},
			false => {
				if !bank_count.is_power_of_two() {
					return Err(ConfigError::PlanarBanksNotPowerOfTwo { banks: bank_count });
				}
				bank_count
			},
		};

		Ok(Self {
			stack_type,
			bank_count,
			channel_count,
			bank_address_bits,
			bank_offset,
			banks_per_layer,
			banks_per_channel_mask: banks_per_channel - 1,
			controllers_interleaving,
		})
	}

	/// Checks that `requesters` partitioned requesters all map to a channel
	///
	/// # Errors
	/// Returns an error if the last requester's channel is past the last channel.
	pub fn check_requesters(&self, requesters: u64) -> Result<(), ConfigError> {
		if self.stack_type.is_stacked() && requesters.div_ceil(self.controllers_interleaving) > self.channel_count {
			return Err(ConfigError::RequestersExceedChannels {
				requesters,
				interleaving: self.controllers_interleaving,
				channels: self.channel_count,
			});
		}

		Ok(())
	}

	/// Returns the stack type
	pub fn stack_type(&self) -> StackType {
		self.stack_type
	}

	/// Returns the total number of banks
	pub fn bank_count(&self) -> u64 {
		self.bank_count
	}

	/// Returns the number of channels
	pub fn channel_count(&self) -> u64 {
		self.channel_count
	}

	/// Returns the number of bank address bits
	pub fn bank_address_bits(&self) -> u32 {
		self.bank_address_bits
	}

	/// Returns the offset of the bank address in the physical address
	pub fn bank_offset(&self) -> u32 {
		self.bank_offset
	}

	/// Returns the number of banks per layer
	pub fn banks_per_layer(&self) -> u64 {
		self.banks_per_layer
	}

	/// Returns the banks per channel mask
	pub fn banks_per_channel_mask(&self) -> u64 {
		self.banks_per_channel_mask
	}

	/// Returns the number of requesters sharing a memory controller
	pub fn controllers_interleaving(&self) -> u64 {
		self.controllers_interleaving
	}

	/// Returns the mask of the bank address within a physical address
	pub fn bank_mask(&self) -> u64 {
		// Note: Can't overflow, `new` ensures the mask fits in 64 bits
		let low_mask = match self.bank_address_bits {
			u64::BITS.. => u64::MAX,
			bits => (1 << bits) - 1,
		};
		low_mask << self.bank_offset
	}
}
