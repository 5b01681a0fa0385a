//! Helpers around the archiver core.
//!
//! - cli: Command line interface and the interactive prompt.
//! - freq_count: Byte frequency counting over all input files.
//! - paths: Turning user supplied paths into archive inputs and outputs.
//!
pub mod cli;
pub mod freq_count;
pub mod paths;
