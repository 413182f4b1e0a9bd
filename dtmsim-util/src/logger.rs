//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG`, and, optionally, to a file,
//! filtered by `RUST_LOG_FILE`.

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing::metadata::LevelFilter,
	tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

/// Initializes the logger.
///
/// Any messages logged through [`pre_init`] are emitted right after.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	// Create the stderr layer
	let stderr_filter = self::env_filter("RUST_LOG", LevelFilter::INFO);
	let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(stderr_filter);

	// Then the file layer, if any
	let mut file_open_err = None;
	let file_layer = log_file.and_then(|log_file| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(log_file);
		match file {
			Ok(file) => {
				let file_filter = self::env_filter("RUST_LOG_FILE", LevelFilter::DEBUG);
				let layer = fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(file_filter);
				Some(layer)
			},
			Err(err) => {
				file_open_err = Some(err);
				None
			},
		}
	});

	tracing_subscriber::registry().with(stderr_layer).with(file_layer).init();

	if let Some(err) = file_open_err {
		tracing::warn!(?log_file, ?err, "Unable to open log file, logging only to stderr");
	}

	// Finally emit everything logged before we were initialized
	for (level, msg) in pre_init::take() {
		match level {
			pre_init::Level::Debug => tracing::debug!("{msg}"),
			pre_init::Level::Warn => tracing::warn!("{msg}"),
		}
	}
}

/// Creates an env filter from `var`, defaulting to `default` if unset or invalid
fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
	EnvFilter::builder()
		.with_default_directive(default.into())
		.with_env_var(var)
		.from_env_lossy()
}

/// Logging before the logger is initialized.
///
/// Messages are buffered and emitted once [`init`](super::init) is called.
pub mod pre_init {
	// Imports
	use std::sync::Mutex;

	/// Buffered messages
	static MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	/// Level of a buffered message
	#[derive(Clone, Copy, Debug)]
	pub(super) enum Level {
		Debug,
		Warn,
	}

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		self::push(Level::Debug, msg.into());
	}

	/// Buffers a warning message
	pub fn warn(msg: impl Into<String>) {
		self::push(Level::Warn, msg.into());
	}

	fn push(level: Level, msg: String) {
		// Note: A poisoned buffer only means another thread panicked mid-push, the messages are still usable
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		messages.push((level, msg));
	}

	/// Takes all buffered messages
	pub(super) fn take() -> Vec<(Level, String)> {
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		std::mem::take(&mut *messages)
	}
}
