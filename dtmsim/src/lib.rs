//! DRAM thermal management simulator (`dtmsim`)
//!
//! Models the latency of DRAM accesses from a multicore, with per-bank power
//! modes driven by temperature telemetry, and collects per-epoch bank statistics.

// Modules
pub mod access;
pub mod access_trace;
pub mod bandwidth;
pub mod bank;
pub mod config;
pub mod controller;
pub mod data;
pub mod decoder;
pub mod epoch;
pub mod error;
pub mod perf_model;
pub mod policy;
pub mod power;
pub mod queue;
pub mod scheduler;
pub mod shared;
pub mod sim;
pub mod stats;
pub mod system;
pub mod telemetry;
pub mod topology;

// Exports
pub use self::{
	access::{AccessKind, MemoryAccess},
	access_trace::{AccessTraceReader, AccessTraceWriter},
	bank::{BankIdx, BankMode, BankModes},
	config::Config,
	controller::DramController,
	error::ConfigError,
	perf_model::DramPerfModel,
	shared::SharedState,
	sim::{Handler, Simulator},
	system::DramSystem,
};
