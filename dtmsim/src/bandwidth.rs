//! Bandwidth

// Imports
use {crate::error::ConfigError, dtmsim_util::FemtoDuration};

/// Component bandwidth.
///
/// Kept as an integer number of bits per micro-second, so transfer times
/// are computed without floating point.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ComponentBandwidth {
	/// Bits per micro-second
	bits_per_micro: u64,
}

impl ComponentBandwidth {
	/// Creates a bandwidth from bits per micro-second
	///
	/// # Errors
	/// Returns an error if `bits_per_micro` is zero.
	pub fn from_bits_per_micro(bits_per_micro: u64) -> Result<Self, ConfigError> {
		match bits_per_micro {
			0 => Err(ConfigError::Zero { what: "Bandwidth" }),
			_ => Ok(Self { bits_per_micro }),
		}
	}

	/// Creates a bandwidth from gigabytes per second.
	///
	/// # Errors
	/// Returns an error if the bandwidth rounds to zero bits per micro-second.
	pub fn from_gbytes_per_sec(gbytes_per_sec: f64) -> Result<Self, ConfigError> {
		// Note: 1 GB/s = 8 Gbit/s = 8 bits/ns = 8000 bits/µs
		let bits_per_micro = (gbytes_per_sec * 8000.0).round();
		match bits_per_micro >= 1.0 {
			true => Self::from_bits_per_micro(bits_per_micro as u64),
			false => Err(ConfigError::Zero { what: "Bandwidth" }),
		}
	}

	/// Returns the bandwidth in bits per micro-second
	pub fn bits_per_micro(&self) -> u64 {
		self.bits_per_micro
	}

	/// Returns the time to transfer `bits`, rounded up to whole nano-seconds.
	///
	/// Never decreases as `bits` increases.
	pub fn rounded_latency(&self, bits: u64) -> FemtoDuration {
		// Note: bits / (bits/µs) = µs = 1000 ns
		let nanos = (u128::from(bits) * 1000).div_ceil(u128::from(self.bits_per_micro));
		let max_nanos = u64::MAX / FemtoDuration::FEMTOS_PER_NANO;
		FemtoDuration::from_nanos(u64::try_from(nanos).map_or(max_nanos, |nanos| nanos.min(max_nanos)))
	}
}

#[cfg(test)]
mod tests {
	use {super::*, proptest::prelude::*};

	#[test]
	fn cache_block_transfer() {
		// 7.6 GB/s, 64 byte block: 512 bits / 60.8 bits/ns = 8.42 ns -> 9 ns
		let bandwidth = ComponentBandwidth::from_gbytes_per_sec(7.6).expect("Valid bandwidth");
		assert_eq!(bandwidth.bits_per_micro(), 60_800);
		assert_eq!(bandwidth.rounded_latency(512), FemtoDuration::from_nanos(9));
	}

	#[test]
	fn exact_transfer_isnt_rounded() {
		let bandwidth = ComponentBandwidth::from_bits_per_micro(64_000).expect("Valid bandwidth");
		assert_eq!(bandwidth.rounded_latency(512), FemtoDuration::from_nanos(8));
		assert_eq!(bandwidth.rounded_latency(0), FemtoDuration::ZERO);
	}

	#[test]
	fn rejects_zero() {
		assert!(ComponentBandwidth::from_gbytes_per_sec(0.0).is_err());
		assert!(ComponentBandwidth::from_bits_per_micro(0).is_err());
	}

	proptest! {
		#[test]
		fn latency_monotonic_in_size(
			bits_per_micro in 1u64..1_000_000,
			bits in 0u64..1_000_000,
			extra in 0u64..1_000_000,
		) {
			let bandwidth = ComponentBandwidth::from_bits_per_micro(bits_per_micro).expect("Valid bandwidth");
			prop_assert!(bandwidth.rounded_latency(bits) <= bandwidth.rounded_latency(bits + extra));
		}
	}
}
