//! Command-line parsing and the per-command drivers of the binary.

pub(crate) mod cli;
