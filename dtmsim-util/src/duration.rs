//! Duration

// Imports
use std::{
	fmt,
	iter,
	ops::{Add, AddAssign, Div, Mul, Rem, Sub, SubAssign},
};

/// Duration with femto-second precision.
///
/// All simulated time is kept as an integer number of femto-seconds, so sums
/// of latencies are exact and reproducible across runs.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FemtoDuration(u64);

impl FemtoDuration {
	/// Number of femto-seconds per micro-second
	pub const FEMTOS_PER_MICRO: u64 = 1_000_000_000;
	/// Number of femto-seconds per milli-second
	pub const FEMTOS_PER_MILLI: u64 = 1_000_000_000_000;
	/// Number of femto-seconds per nano-second
	pub const FEMTOS_PER_NANO: u64 = 1_000_000;
	/// Number of femto-seconds per pico-second
	pub const FEMTOS_PER_PICO: u64 = 1_000;
	/// Number of femto-seconds per second
	pub const FEMTOS_PER_SEC: u64 = 1_000_000_000_000_000;
	/// Maximum duration
	pub const MAX: Self = Self(u64::MAX);
	/// Zero duration
	pub const ZERO: Self = Self(0);

	/// Creates a duration from femto-seconds
	#[must_use]
	pub const fn from_femtos(femtos: u64) -> Self {
		Self(femtos)
	}

	/// Creates a duration from nano-seconds
	#[must_use]
	pub const fn from_nanos(nanos: u64) -> Self {
		Self(nanos * Self::FEMTOS_PER_NANO)
	}

	/// Creates a duration from micro-seconds
	#[must_use]
	pub const fn from_micros(micros: u64) -> Self {
		Self(micros * Self::FEMTOS_PER_MICRO)
	}

	/// Creates a new duration from floating-point nanoseconds.
	///
	/// Only meant for converting configuration values, the result is rounded
	/// to the nearest femto-second and negative values are clamped to zero.
	#[must_use]
	pub fn from_nanos_f64(nanos: f64) -> Self {
		let femtos = (nanos * Self::FEMTOS_PER_NANO as f64).round();
		match femtos > 0.0 {
			true => Self(femtos as u64),
			false => Self::ZERO,
		}
	}

	/// Returns this duration in femto-seconds
	#[must_use]
	pub const fn as_femtos(self) -> u64 {
		self.0
	}

	/// Returns this duration in whole nano-seconds
	#[must_use]
	pub const fn as_nanos(self) -> u64 {
		self.0 / Self::FEMTOS_PER_NANO
	}

	/// Returns this duration in whole micro-seconds
	#[must_use]
	pub const fn as_micros(self) -> u64 {
		self.0 / Self::FEMTOS_PER_MICRO
	}

	/// Returns this duration in floating-point nano-seconds, for reporting
	#[must_use]
	pub fn as_nanos_f64(self) -> f64 {
		self.0 as f64 / Self::FEMTOS_PER_NANO as f64
	}

	/// Returns this duration in floating-point seconds, for reporting
	#[must_use]
	pub fn as_secs_f64(self) -> f64 {
		self.0 as f64 / Self::FEMTOS_PER_SEC as f64
	}

	/// Returns if this duration is zero
	#[must_use]
	pub const fn is_zero(self) -> bool {
		self.0 == 0
	}

	/// Subtracts `rhs`, clamping at zero
	#[must_use]
	pub const fn saturating_sub(self, rhs: Self) -> Self {
		Self(self.0.saturating_sub(rhs.0))
	}

	/// Adds `rhs`, clamping at [`Self::MAX`]
	#[must_use]
	pub const fn saturating_add(self, rhs: Self) -> Self {
		Self(self.0.saturating_add(rhs.0))
	}

	/// Subtracts `rhs`, returning `None` on underflow
	#[must_use]
	pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
		match self.0.checked_sub(rhs.0) {
			Some(femtos) => Some(Self(femtos)),
			None => None,
		}
	}

	/// Rounds this duration down to a multiple of `width`.
	///
	/// # Panics
	/// Panics if `width` is zero.
	#[must_use]
	pub fn align_down(self, width: Self) -> Self {
		self - self % width
	}
}

impl Add for FemtoDuration {
	type Output = Self;

	fn add(self, rhs: Self) -> Self::Output {
		Self(self.0 + rhs.0)
	}
}

impl AddAssign for FemtoDuration {
	fn add_assign(&mut self, rhs: Self) {
		self.0 += rhs.0;
	}
}

impl Sub for FemtoDuration {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self::Output {
		Self(self.0 - rhs.0)
	}
}

impl SubAssign for FemtoDuration {
	fn sub_assign(&mut self, rhs: Self) {
		self.0 -= rhs.0;
	}
}

impl Mul<u64> for FemtoDuration {
	type Output = Self;

	fn mul(self, rhs: u64) -> Self::Output {
		Self(self.0 * rhs)
	}
}

impl Div<u64> for FemtoDuration {
	type Output = Self;

	fn div(self, rhs: u64) -> Self::Output {
		Self(self.0 / rhs)
	}
}

impl Div for FemtoDuration {
	type Output = u64;

	fn div(self, rhs: Self) -> Self::Output {
		self.0 / rhs.0
	}
}

impl Rem for FemtoDuration {
	type Output = Self;

	fn rem(self, rhs: Self) -> Self::Output {
		Self(self.0 % rhs.0)
	}
}

impl iter::Sum for FemtoDuration {
	fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.fold(Self::ZERO, |acc, duration| acc + duration)
	}
}

impl fmt::Display for FemtoDuration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// Note: We display in the largest unit that keeps the integer part non-zero
		let (unit, femtos_per_unit) = match self.0 {
			0 => return f.pad("0s"),
			femtos if femtos >= Self::FEMTOS_PER_SEC => ("s", Self::FEMTOS_PER_SEC),
			femtos if femtos >= Self::FEMTOS_PER_MILLI => ("ms", Self::FEMTOS_PER_MILLI),
			femtos if femtos >= Self::FEMTOS_PER_MICRO => ("µs", Self::FEMTOS_PER_MICRO),
			femtos if femtos >= Self::FEMTOS_PER_NANO => ("ns", Self::FEMTOS_PER_NANO),
			femtos if femtos >= Self::FEMTOS_PER_PICO => ("ps", Self::FEMTOS_PER_PICO),
			_ => ("fs", 1),
		};

		let whole = self.0 / femtos_per_unit;
		let frac = self.0 % femtos_per_unit;
		match frac {
			0 => write!(f, "{whole}{unit}"),
			_ => {
				let digits = femtos_per_unit.ilog10() as usize;
				let frac = format!("{frac:0digits$}");
				write!(f, "{whole}.{}{unit}", frac.trim_end_matches('0'))
			},
		}
	}
}
