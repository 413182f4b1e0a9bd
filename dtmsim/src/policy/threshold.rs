//! Threshold policy

// Imports
use {
	super::{BankPolicy, Thresholds},
	crate::bank::BankModes,
};

/// Threshold policy.
///
/// Each bank is throttled once it's above the critical temperature and
/// recovers once it's below the recovered temperature.
#[derive(Clone, Debug)]
pub struct ThresholdPolicy {
	thresholds: Thresholds,
}

impl ThresholdPolicy {
	/// Creates a new threshold policy
	pub fn new(thresholds: Thresholds) -> Self {
		Self { thresholds }
	}
}

impl BankPolicy for ThresholdPolicy {
	fn name(&self) -> &'static str {
		"lowpower"
	}

	fn new_bank_modes(&self, old: &BankModes, temperatures: &[f64]) -> BankModes {
		assert_eq!(temperatures.len(), old.len(), "Expected one temperature per bank");

		old.iter()
			.zip(temperatures)
			.map(|((_, mode), &temperature)| self.thresholds.next_mode(mode, temperature))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::bank::{BankIdx, BankMode},
		pretty_assertions::assert_eq,
	};

	#[test]
	fn throttle_then_recover() {
		let policy = ThresholdPolicy::new(Thresholds::new(80.0, 60.0).expect("Valid thresholds"));

		let modes = policy.new_bank_modes(&BankModes::new(2), &[85.0, 70.0]);
		assert_eq!(modes.get(BankIdx::new(0)), BankMode::LowPower);
		assert_eq!(modes.get(BankIdx::new(1)), BankMode::Normal);

		let modes = policy.new_bank_modes(&modes, &[70.0, 70.0]);
		assert_eq!(modes.get(BankIdx::new(0)), BankMode::LowPower);

		let modes = policy.new_bank_modes(&modes, &[55.0, 70.0]);
		assert_eq!(modes, BankModes::new(2));
	}

	#[test]
	fn unavailable_reading_keeps_mode() {
		let policy = ThresholdPolicy::new(Thresholds::new(80.0, 60.0).expect("Valid thresholds"));
		let old = [BankMode::LowPower, BankMode::Normal].into_iter().collect::<BankModes>();
		assert_eq!(policy.new_bank_modes(&old, &[-1.0, -1.0]), old);
	}
}
