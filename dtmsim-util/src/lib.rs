//! Utilities

// Modules
pub mod duration;
pub mod logger;

// Exports
pub use duration::FemtoDuration;

// Imports
use {
	itertools::Itertools,
	std::{cell::RefCell, fmt, io},
};

/// Extension trait for `R: io::Read` types to read a byte array
#[extend::ext(name = ReadByteArray)]
pub impl<R: io::Read> R {
	/// Reads a byte array `[u8; N]` from this reader.
	///
	/// Returns `Err` if unable to read exactly `N` bytes.
	fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], io::Error> {
		let mut array = [0u8; N];
		self.read_exact(&mut array)?;
		Ok(array)
	}
}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}


impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}

/// Joins `values` into a single tab-separated row.
///
/// This is the row format of the thermal tool's power and temperature logs.
pub fn tab_row<T: fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
	values.into_iter().join("\t")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tab_row_joins_with_tabs() {
		assert_eq!(tab_row(["B_0", "B_1", "B_2"]), "B_0\tB_1\tB_2");
		assert_eq!(tab_row(Vec::<f64>::new()), "");
	}

	#[test]
	fn read_byte_array_reads_exact() {
		let mut reader = &b"DRAMTv0\0rest"[..];
		let magic: [u8; 8] = reader.read_byte_array().expect("Unable to read");
		assert_eq!(&magic, b"DRAMTv0\0");
		assert_eq!(reader, b"rest");
	}
}
