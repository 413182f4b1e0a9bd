//! Neighbours policy

// Imports
use {
	super::{BankPolicy, GridLayout, Thresholds},
	crate::bank::{BankMode, BankModes},
};

/// Neighbours policy.
///
/// Like the threshold policy, but a bank that gets throttled also throttles
/// all of its grid neighbours in the same tick. Recovery is per-bank.
#[derive(Clone, Debug)]
pub struct NeighboursPolicy {
	thresholds: Thresholds,
	grid:       GridLayout,
}

impl NeighboursPolicy {
	/// Creates a new neighbours policy
	pub fn new(thresholds: Thresholds, grid: GridLayout) -> Self {
		Self { thresholds, grid }
	}
}

impl BankPolicy for NeighboursPolicy {
	fn name(&self) -> &'static str {
		"neighbours"
	}

	fn new_bank_modes(&self, old: &BankModes, temperatures: &[f64]) -> BankModes {
		assert_eq!(temperatures.len(), old.len(), "Expected one temperature per bank");
		assert_eq!(self.grid.bank_count(), old.len(), "Grid must cover all banks");

		let mut modes = old
			.iter()
			.zip(temperatures)
			.map(|((_, mode), &temperature)| self.thresholds.next_mode(mode, temperature))
			.collect::<BankModes>();

		// Note: Only banks throttled this tick spread, so contagion doesn't chain further
		let throttled = old
			.iter()
			.filter(|&(bank, mode)| mode == BankMode::Normal && modes.get(bank) == BankMode::LowPower)
			.map(|(bank, _)| bank)
			.collect::<Vec<_>>();
		for bank in throttled {
			for neighbour in self.grid.neighbours(bank) {
				if modes.set(neighbour, BankMode::LowPower) == BankMode::Normal {
					tracing::trace!(%bank, %neighbour, "Throttling neighbour");
				}
			}
		}

		modes
	}
}

#[cfg(test)]
mod tests {
	use {super::*, crate::bank::BankIdx, pretty_assertions::assert_eq};

	fn policy() -> NeighboursPolicy {
		NeighboursPolicy::new(
			Thresholds::new(80.0, 60.0).expect("Valid thresholds"),
			GridLayout::new(3, 3, 1, 9).expect("Valid grid"),
		)
	}

	fn low_power_banks(modes: &BankModes) -> Vec<usize> {
		modes
			.iter()
			.filter(|(_, mode)| mode.is_low_power())
			.map(|(bank, _)| bank.to_usize())
			.collect()
	}

	#[test]
	fn hot_bank_throttles_neighbours() {
		let mut temperatures = [70.0; 9];
		temperatures[4] = 85.0;

		let modes = policy().new_bank_modes(&BankModes::new(9), &temperatures);
		assert_eq!(low_power_banks(&modes), [1, 3, 4, 5, 7]);
	}

	#[test]
	fn contagion_is_instant_but_recovery_is_local() {
		let policy = policy();
		let mut temperatures = [70.0; 9];
		temperatures[0] = 85.0;
		let modes = policy.new_bank_modes(&BankModes::new(9), &temperatures);
		assert_eq!(low_power_banks(&modes), [0, 1, 3]);

		// Neighbours cool down and recover while the hot bank stays throttled
		let mut temperatures = [50.0; 9];
		temperatures[0] = 85.0;
		let modes = policy.new_bank_modes(&modes, &temperatures);
		assert_eq!(low_power_banks(&modes), [0]);

		// An already throttled bank doesn't spread again
		assert_eq!(modes.get(BankIdx::new(1)), BankMode::Normal);
	}

	#[test]
	fn between_thresholds_neighbours_stay_throttled() {
		let policy = policy();
		let mut temperatures = [70.0; 9];
		temperatures[8] = 85.0;
		let modes = policy.new_bank_modes(&BankModes::new(9), &temperatures);
		assert_eq!(low_power_banks(&modes), [5, 7, 8]);

		let modes = policy.new_bank_modes(&modes, &[70.0; 9]);
		assert_eq!(low_power_banks(&modes), [5, 7, 8]);
	}
}
