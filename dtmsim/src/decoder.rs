//! Bank address decoder

// Imports
use {
	crate::{bank::BankIdx, topology::BankTopology},
	std::sync::{
		atomic::{self, AtomicU64},
		Arc,
	},
};

/// Bank address decoder.
///
/// Maps a physical address and requester to the bank it accesses.
#[derive(Debug)]
pub struct BankDecoder {
	/// Topology
	topology: BankTopology,

	/// Channel selection for stacked topologies
	channel_select: ChannelSelect,
}

impl BankDecoder {
	/// Creates a new decoder
	pub fn new(topology: BankTopology, channel_select: ChannelSelect) -> Self {
		Self {
			topology,
			channel_select,
		}
	}

	/// Returns the topology
	pub fn topology(&self) -> &BankTopology {
		&self.topology
	}

	/// Returns the channel selection
	pub fn channel_select(&self) -> &ChannelSelect {
		&self.channel_select
	}

	/// Decodes the bank accessed by `requester` at `address`.
	///
	/// With [`ChannelSelect::RoundRobin`], this advances the shared rotation,
	/// so repeated calls with the same inputs may return different banks.
	///
	/// # Panics
	/// In debug builds, panics if the decoded bank is out of range, which can only
	/// happen for requesters outside of those the topology was checked against.
	/// In release builds the bank is clamped to the last bank instead.
	pub fn decode(&self, address: u64, requester: u64) -> BankIdx {
		let topology = &self.topology;
		let bank_address = (address & topology.bank_mask()) >> topology.bank_offset();

		let bank = match topology.stack_type().is_stacked() {
			true => {
				let channel = match &self.channel_select {
					ChannelSelect::Partitioned => requester / topology.controllers_interleaving(),
					ChannelSelect::RoundRobin(rotation) => rotation.next(topology.channel_count()),
				};

				(bank_address & topology.banks_per_channel_mask()) * topology.banks_per_layer() + channel
			},
			false => bank_address,
		};

		if bank >= topology.bank_count() {
			debug_assert!(
				false,
				"Decoded bank {bank} out of range for {} banks (address: {address:#x}, requester: {requester})",
				topology.bank_count()
			);
			tracing::warn!(
				bank,
				address = format_args!("{address:#x}"),
				requester,
				"Decoded bank out of range, clamping to last bank"
			);
			return BankIdx::new((topology.bank_count() - 1) as usize);
		}

		BankIdx::new(bank as usize)
	}
}

/// Channel selection for stacked topologies
#[derive(Clone, Debug)]
pub enum ChannelSelect {
	/// Requesters are partitioned over the channels by the controllers interleaving.
	Partitioned,

	/// Every decode selects the next channel of a shared rotation.
	///
	/// Impure: decoding advances the rotation.
	RoundRobin(Arc<ChannelRotation>),
}

/// Channel rotation.
///
/// Shared by all decoders of a run that use [`ChannelSelect::RoundRobin`].
#[derive(Default, Debug)]
pub struct ChannelRotation {
	/// Next rotation value
	next: AtomicU64,
}

impl ChannelRotation {
	/// Creates a new rotation, starting at the first channel
	pub fn new() -> Self {
		Self {
			next: AtomicU64::new(0),
		}
	}

	/// Returns the next channel out of `channel_count`, advancing the rotation.
	pub fn next(&self, channel_count: u64) -> u64 {
		// Note: Only the relative order of the calls matters, so relaxed is enough
		self.next.fetch_add(1, atomic::Ordering::Relaxed) % channel_count
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::topology::StackType,
		pretty_assertions::assert_eq,
		proptest::prelude::*,
		std::collections::BTreeSet,
	};

	fn planar() -> BankDecoder {
		let topology = BankTopology::new(StackType::PlanarDdr, 8, 1, 14, 1).expect("Valid topology");
		BankDecoder::new(topology, ChannelSelect::Partitioned)
	}

	fn stacked(stack_type: StackType, channel_select: ChannelSelect) -> BankDecoder {
		let topology = BankTopology::new(stack_type, 128, 16, 6, 1).expect("Valid topology");
		BankDecoder::new(topology, channel_select)
	}

	#[test]
	fn planar_example() {
		assert_eq!(planar().decode(0x10000, 0), BankIdx::new(4));
	}

	#[test]
	fn planar_ignores_requester() {
		let decoder = planar();
		for requester in 0..16 {
			assert_eq!(decoder.decode(0x1c000, requester), BankIdx::new(7));
		}
	}

	#[test]
	fn stacked_partitioned() {
		let decoder = stacked(StackType::Stacked3d, ChannelSelect::Partitioned);

		// Layer selector 0b101 (address bits 6..13), requester 3 -> 5 * 16 + 3
		assert_eq!(decoder.decode(0b101 << 6, 3), BankIdx::new(83));

		// Layer selector bits above the channel mask are dropped
		assert_eq!(decoder.decode(0b1101 << 6, 3), BankIdx::new(83));
	}

	#[test]
	fn stacked_partitioned_is_deterministic() {
		let decoder = stacked(StackType::MemoryCube, ChannelSelect::Partitioned);
		let first = decoder.decode(0xdead_beef, 7);
		for _ in 0..10 {
			assert_eq!(decoder.decode(0xdead_beef, 7), first);
		}
	}

	#[test]
	fn round_robin_cycles_through_all_channels() {
		let rotation = Arc::new(ChannelRotation::new());
		let decoder = stacked(StackType::Stacked2_5d, ChannelSelect::RoundRobin(Arc::clone(&rotation)));

		// The same access visits every channel once before any repeats
		let banks = (0..16).map(|_| decoder.decode(0, 0)).collect::<Vec<_>>();
		let channels = banks.iter().map(|bank| bank.to_usize() % 16).collect::<BTreeSet<_>>();
		assert_eq!(channels.len(), 16);

		// And then starts over
		assert_eq!(decoder.decode(0, 0), banks[0]);
	}

	#[test]
	fn round_robin_rotation_is_shared() {
		let rotation = Arc::new(ChannelRotation::new());
		let decoder0 = stacked(StackType::Stacked3d, ChannelSelect::RoundRobin(Arc::clone(&rotation)));
		let decoder1 = stacked(StackType::Stacked3d, ChannelSelect::RoundRobin(Arc::clone(&rotation)));

		assert_eq!(decoder0.decode(0, 0), BankIdx::new(0));
		assert_eq!(decoder1.decode(0, 0), BankIdx::new(1));
		assert_eq!(decoder0.decode(0, 0), BankIdx::new(2));
	}

	proptest! {
		#[test]
		fn decode_in_bounds(
			address: u64,
			requester in 0u64..16,
			stack_type in prop_oneof![
				Just(StackType::PlanarDdr),
				Just(StackType::Stacked3d),
				Just(StackType::Stacked2_5d),
				Just(StackType::MemoryCube),
			],
			round_robin: bool,
		) {
			let topology = BankTopology::new(stack_type, 128, 16, 6, 1).expect("Valid topology");
			topology.check_requesters(16).expect("Requesters fit");
			let channel_select = match round_robin {
				true => ChannelSelect::RoundRobin(Arc::new(ChannelRotation::new())),
				false => ChannelSelect::Partitioned,
			};
			let decoder = BankDecoder::new(topology, channel_select);

			for _ in 0..4 {
				let bank = decoder.decode(address, requester);
				prop_assert!(bank.to_usize() < 128);
			}
		}

		#[test]
		fn decode_in_bounds_without_mask_banks_per_channel(address: u64, requester in 0u64..8) {
			let topology = BankTopology::new(StackType::MemoryCube, 48, 8, 6, 1).expect("Valid topology");
			let decoder = BankDecoder::new(topology, ChannelSelect::Partitioned);
			prop_assert!(decoder.decode(address, requester).to_usize() < 48);
		}
	}
}
