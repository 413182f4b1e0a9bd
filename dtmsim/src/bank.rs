//! Banks

// Imports
use std::fmt;

/// Bank index
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BankIdx(usize);

impl BankIdx {
	/// Creates a bank index
	pub const fn new(idx: usize) -> Self {
		Self(idx)
	}

	/// Returns this index as a `usize`
	pub const fn to_usize(self) -> usize {
		self.0
	}

	/// Returns the thermal tool's component name of this bank
	pub fn component_name(self) -> String {
		format!("B_{}", self.0)
	}
}

impl fmt::Display for BankIdx {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Bank power mode
#[derive(PartialEq, Eq, Clone, Copy, Default, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub enum BankMode {
	/// Normal operation
	#[default]
	Normal,

	/// Throttled operation, slower accesses with less heat output
	LowPower,
}

impl BankMode {
	/// Returns if this is the low power mode
	pub fn is_low_power(self) -> bool {
		matches!(self, Self::LowPower)
	}

	/// Returns the statistic value of this mode.
	///
	/// Follows the thermal tool's convention, where `0` is low power and `1` is normal.
	pub fn stat_value(self) -> u64 {
		match self {
			Self::Normal => 1,
			Self::LowPower => 0,
		}
	}
}

/// Bank mode table, indexed by bank
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct BankModes(Vec<BankMode>);

impl BankModes {
	/// Creates a table with all `bank_count` banks in normal mode
	pub fn new(bank_count: usize) -> Self {
		Self(vec![BankMode::Normal; bank_count])
	}

	/// Returns the mode of `bank`
	///
	/// # Panics
	/// Panics if `bank` is out of range.
	pub fn get(&self, bank: BankIdx) -> BankMode {
		self.0[bank.0]
	}

	/// Sets the mode of `bank`, returning the previous mode
	///
	/// # Panics
	/// Panics if `bank` is out of range.
	pub fn set(&mut self, bank: BankIdx, mode: BankMode) -> BankMode {
		std::mem::replace(&mut self.0[bank.0], mode)
	}

	/// Returns the number of banks
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns if there are no banks
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns the number of banks in low power mode
	pub fn low_power_count(&self) -> usize {
		self.0.iter().filter(|mode| mode.is_low_power()).count()
	}

	/// Returns an iterator over all banks and their modes
	pub fn iter(&self) -> impl Iterator<Item = (BankIdx, BankMode)> + '_ {
		self.0.iter().enumerate().map(|(idx, &mode)| (BankIdx(idx), mode))
	}

	/// Returns all modes as a slice
	pub fn as_slice(&self) -> &[BankMode] {
		&self.0
	}
}

impl FromIterator<BankMode> for BankModes {
	fn from_iter<T: IntoIterator<Item = BankMode>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}
