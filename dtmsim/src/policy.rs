//! Bank power-state policies

// Modules
pub mod neighbours;
pub mod threshold;

// Exports
pub use self::{neighbours::NeighboursPolicy, threshold::ThresholdPolicy};

// Imports
use {
	crate::{
		bank::{BankIdx, BankMode, BankModes},
		error::ConfigError,
	},
	std::{fmt, str::FromStr},
};

/// Bank power-state policy.
///
/// Decides the new mode of every bank from the old modes and the current
/// bank temperatures. Must be pure, the caller installs the result.
pub trait BankPolicy: fmt::Debug + Send {
	/// Returns the name of this policy
	fn name(&self) -> &'static str;

	/// Returns the new bank modes.
	///
	/// `temperatures` has one reading per bank. Readings that aren't
	/// finite or are negative are unavailable, and the bank keeps its mode.
	fn new_bank_modes(&self, old: &BankModes, temperatures: &[f64]) -> BankModes;
}

/// Policy that never throttles any bank
#[derive(Clone, Copy, Default, Debug)]
pub struct OffPolicy;

impl BankPolicy for OffPolicy {
	fn name(&self) -> &'static str {
		"off"
	}

	fn new_bank_modes(&self, old: &BankModes, _temperatures: &[f64]) -> BankModes {
		BankModes::new(old.len())
	}
}

/// Temperature thresholds
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Thresholds {
	/// Temperature above which a bank is throttled
	critical: f64,

	/// Temperature below which a throttled bank recovers
	recovered: f64,
}

impl Thresholds {
	/// Creates new thresholds
	///
	/// # Errors
	/// Returns an error if `critical` is below `recovered`.
	pub fn new(critical: f64, recovered: f64) -> Result<Self, ConfigError> {
		// Note: Written so that `NaN`s are rejected too
		if !(critical >= recovered) {
			return Err(ConfigError::ThresholdsInverted { critical, recovered });
		}

		Ok(Self { critical, recovered })
	}

	/// Returns the critical temperature
	pub fn critical(&self) -> f64 {
		self.critical
	}

	/// Returns the recovered temperature
	pub fn recovered(&self) -> f64 {
		self.recovered
	}

	/// Returns the next mode of a bank in mode `mode` at `temperature`.
	///
	/// Between both thresholds, the bank stays in its current mode.
	pub fn next_mode(&self, mode: BankMode, temperature: f64) -> BankMode {
		if !is_available(temperature) {
			return mode;
		}

		match mode {
			BankMode::Normal if temperature > self.critical => BankMode::LowPower,
			BankMode::LowPower if temperature < self.recovered => BankMode::Normal,
			_ => mode,
		}
	}
}

/// Returns if `temperature` is an available reading
pub fn is_available(temperature: f64) -> bool {
	temperature.is_finite() && temperature >= 0.0
}

/// Physical bank grid.
///
/// Banks are laid out row-major, `x` banks per row, `y` rows per layer and `z` layers.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct GridLayout {
	x: usize,
	y: usize,
	z: usize,
}

impl GridLayout {
	/// Creates a grid covering `bank_count` banks
	///
	/// # Errors
	/// Returns an error if the grid doesn't have exactly `bank_count` cells.
	pub fn new(x: usize, y: usize, z: usize, bank_count: usize) -> Result<Self, ConfigError> {
		let mismatch = || ConfigError::GridMismatch {
			x:     x as u64,
			y:     y as u64,
			z:     z as u64,
			banks: bank_count as u64,
		};
		let cells = x.checked_mul(y).and_then(|xy| xy.checked_mul(z)).ok_or_else(mismatch)?;
		if cells != bank_count || cells == 0 {
			return Err(mismatch());
		}

		Ok(Self { x, y, z })
	}

	/// Returns the number of banks
	pub fn bank_count(&self) -> usize {
		self.x * self.y * self.z
	}

	/// Returns the `(x, y, z)` position of `bank`
	pub fn position(&self, bank: BankIdx) -> (usize, usize, usize) {
		let idx = bank.to_usize();
		(idx % self.x, (idx / self.x) % self.y, idx / (self.x * self.y))
	}

	/// Returns the bank at `(x, y, z)`
	pub fn bank_at(&self, x: usize, y: usize, z: usize) -> BankIdx {
		BankIdx::new(z * self.x * self.y + y * self.x + x)
	}

	/// Returns all direct neighbours of `bank`.
	///
	/// Neighbours are adjacent in the same row, in the same column of the
	/// layer, or in the same position of the adjacent layers.
	pub fn neighbours(&self, bank: BankIdx) -> impl Iterator<Item = BankIdx> + '_ {
		let (x, y, z) = self.position(bank);
		let candidates = [
			x.checked_sub(1).map(|x| (x, y, z)),
			(x + 1 < self.x).then_some((x + 1, y, z)),
			y.checked_sub(1).map(|y| (x, y, z)),
			(y + 1 < self.y).then_some((x, y + 1, z)),
			z.checked_sub(1).map(|z| (x, y, z)),
			(z + 1 < self.z).then_some((x, y, z + 1)),
		];

		candidates
			.into_iter()
			.flatten()
			.map(|(x, y, z)| self.bank_at(x, y, z))
	}
}

/// Policy kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum PolicyKind {
	/// Never throttle
	Off,

	/// Throttle each bank by its own temperature
	LowPower,

	/// Throttle each bank by its own temperature, and its neighbours with it
	Neighbours,
}

impl PolicyKind {
	/// Returns the configuration name of this policy
	pub fn name(self) -> &'static str {
		match self {
			Self::Off => "off",
			Self::LowPower => "lowpower",
			Self::Neighbours => "neighbours",
		}
	}
}

impl FromStr for PolicyKind {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"off" => Ok(Self::Off),
			"lowpower" => Ok(Self::LowPower),
			"neighbours" => Ok(Self::Neighbours),
			_ => Err(ConfigError::UnknownPolicy { name: s.to_owned() }),
		}
	}
}

#[cfg(test)]
mod tests {
	use {super::*, pretty_assertions::assert_eq};

	#[test]
	fn thresholds_reject_inverted() {
		assert_eq!(
			Thresholds::new(60.0, 80.0),
			Err(ConfigError::ThresholdsInverted {
				critical:  60.0,
				recovered: 80.0,
			})
		);
		assert!(Thresholds::new(f64::NAN, 80.0).is_err());
		assert!(Thresholds::new(70.0, 70.0).is_ok());
	}

	#[test]
	fn hysteresis() {
		let thresholds = Thresholds::new(80.0, 60.0).expect("Valid thresholds");

		assert_eq!(thresholds.next_mode(BankMode::Normal, 85.0), BankMode::LowPower);
		assert_eq!(thresholds.next_mode(BankMode::Normal, 80.0), BankMode::Normal);
		assert_eq!(thresholds.next_mode(BankMode::Normal, 70.0), BankMode::Normal);
		assert_eq!(thresholds.next_mode(BankMode::LowPower, 70.0), BankMode::LowPower);
		assert_eq!(thresholds.next_mode(BankMode::LowPower, 60.0), BankMode::LowPower);
		assert_eq!(thresholds.next_mode(BankMode::LowPower, 55.0), BankMode::Normal);
	}

	#[test]
	fn unavailable_keeps_mode() {
		let thresholds = Thresholds::new(80.0, 60.0).expect("Valid thresholds");
		for mode in [BankMode::Normal, BankMode::LowPower] {
			assert_eq!(thresholds.next_mode(mode, -1.0), mode);
			assert_eq!(thresholds.next_mode(mode, f64::NAN), mode);
		}
	}

	#[test]
	fn grid_mismatch() {
		assert!(GridLayout::new(4, 4, 2, 32).is_ok());
		assert_eq!(
			GridLayout::new(4, 4, 2, 16),
			Err(ConfigError::GridMismatch {
				x:     4,
				y:     4,
				z:     2,
				banks: 16,
			})
		);
		assert!(GridLayout::new(0, 4, 2, 0).is_err());
	}

	#[test]
	fn grid_neighbours() {
		let grid = GridLayout::new(4, 4, 2, 32).expect("Valid grid");

		// Corner of the bottom layer
		let mut neighbours = grid.neighbours(BankIdx::new(0)).collect::<Vec<_>>();
		neighbours.sort();
		assert_eq!(neighbours, [1, 4, 16].map(BankIdx::new));

		// Middle of the top layer
		let mut neighbours = grid.neighbours(BankIdx::new(21)).collect::<Vec<_>>();
		neighbours.sort();
		assert_eq!(neighbours, [5, 17, 20, 22, 25].map(BankIdx::new));

		// Row ends don't wrap onto the next row
		assert!(!grid.neighbours(BankIdx::new(3)).any(|bank| bank == BankIdx::new(4)));
	}

	#[test]
	fn off_never_throttles() {
		let old = [BankMode::LowPower, BankMode::Normal].into_iter().collect::<BankModes>();
		assert_eq!(OffPolicy.new_bank_modes(&old, &[100.0, 100.0]), BankModes::new(2));
	}

	#[test]
	fn policy_kind_names() {
		for kind in [PolicyKind::Off, PolicyKind::LowPower, PolicyKind::Neighbours] {
			assert_eq!(kind.name().parse::<PolicyKind>(), Ok(kind));
		}
		assert!("hot".parse::<PolicyKind>().is_err());
	}
}
